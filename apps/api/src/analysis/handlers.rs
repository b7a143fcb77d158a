use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::ats::{check_keywords, extract_keywords, KeywordCheck};
use crate::analysis::models::{AnalysisRequest, TaskKind};
use crate::analysis::pipeline::{run_analysis, AnalysisOutcome};
use crate::errors::{AppError, FieldErrors};
use crate::extraction::{extract_text, ExtractedDocument};
use crate::llm_client::CompletionClient;
use crate::models::analysis::StoredAnalysisRow;
use crate::state::AppState;
use crate::storage::analyses::{
    create_analysis, fail_analysis, finish_analysis, get_for_user, latest_with_resume,
    list_for_user, mark_processing, NewAnalysis,
};
use crate::storage::blobs::{resume_key, BlobStore};

const NO_RESUME_MESSAGE: &str = "Please upload and analyze your resume first";

// ────────────────────────────────────────────────────────────────────────────
// Response shape
// ────────────────────────────────────────────────────────────────────────────

/// A stored analysis with its result fields flattened next to the metadata.
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub id: Uuid,
    pub task_kind: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: Map<String, Value>,
}

impl AnalysisResponse {
    pub fn from_row(row: StoredAnalysisRow, blobs: &dyn BlobStore) -> Self {
        let result = match row.result {
            Some(Value::Object(mut fields)) => {
                fields.remove("task_kind");
                fields
            }
            _ => Map::new(),
        };
        Self {
            id: row.id,
            task_kind: row.task_kind,
            status: row.status,
            job_id: row.job_id,
            resume_url: row.subject_file_key.as_deref().map(|key| blobs.public_url(key)),
            error_message: row.error_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
            result,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Upload handling
// ────────────────────────────────────────────────────────────────────────────

struct UploadedFile {
    filename: Option<String>,
    bytes: Bytes,
}

#[derive(Default)]
struct UploadForm {
    user_id: Option<String>,
    resume: Option<UploadedFile>,
    job_description: Option<String>,
    job_id: Option<String>,
}

async fn read_upload_form(
    mut multipart: Multipart,
    max_upload_bytes: usize,
    max_upload_mb: usize,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::field("resume", format!("Could not read upload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => {
                let filename = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::field("resume", format!("Could not read upload: {e}"))
                })?;
                if bytes.len() > max_upload_bytes {
                    return Err(AppError::field(
                        "resume",
                        format!("File size must not exceed {max_upload_mb}MB"),
                    ));
                }
                form.resume = Some(UploadedFile { filename, bytes });
            }
            "user_id" | "job_description" | "job_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::field(&name, format!("Could not read field: {e}")))?;
                let slot = match name.as_str() {
                    "user_id" => &mut form.user_id,
                    "job_description" => &mut form.job_description,
                    _ => &mut form.job_id,
                };
                *slot = Some(text).filter(|t| !t.trim().is_empty());
            }
            other => debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    Ok(form)
}

fn parse_uuid(field: &str, raw: Option<&str>, errors: &mut FieldErrors) -> Option<Uuid> {
    let raw = raw?;
    match Uuid::parse_str(raw.trim()) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.insert(field.to_string(), format!("'{raw}' is not a valid id"));
            None
        }
    }
}

fn require_user_id(raw: Option<&str>, errors: &mut FieldErrors) -> Option<Uuid> {
    match raw.filter(|r| !r.trim().is_empty()) {
        None => {
            errors.insert("user_id".into(), "User id is required".into());
            None
        }
        raw => parse_uuid("user_id", raw, errors),
    }
}

/// Validated multipart upload: an owner, a non-empty resume file, and the
/// optional job context.
struct ValidatedUpload {
    user_id: Uuid,
    resume: UploadedFile,
    job_description: Option<String>,
    job_id: Option<Uuid>,
}

fn validate_upload(
    form: UploadForm,
    require_job_description: bool,
) -> Result<ValidatedUpload, AppError> {
    let mut errors = FieldErrors::new();

    let user_id = require_user_id(form.user_id.as_deref(), &mut errors);
    let job_id = parse_uuid("job_id", form.job_id.as_deref(), &mut errors);

    match &form.resume {
        None => {
            errors.insert("resume".into(), "Resume file is required".into());
        }
        Some(file) if file.bytes.is_empty() => {
            errors.insert("resume".into(), "Resume file is empty".into());
        }
        Some(_) => {}
    }
    if require_job_description && form.job_description.is_none() {
        errors.insert("job_description".into(), "Job description is required".into());
    }

    match (user_id, form.resume) {
        (Some(user_id), Some(resume)) if errors.is_empty() => Ok(ValidatedUpload {
            user_id,
            resume,
            job_description: form.job_description,
            job_id,
        }),
        _ => Err(AppError::Validation(errors)),
    }
}

/// Extracts text off the async runtime.
async fn extract_off_thread(
    bytes: Bytes,
    filename: Option<String>,
) -> Result<ExtractedDocument, AppError> {
    let document = tokio::task::spawn_blocking(move || extract_text(&bytes, filename.as_deref()))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("extraction task failed: {e}")))??;

    if document.text.trim().is_empty() {
        return Err(AppError::UnprocessableEntity(
            "No text could be extracted from the resume".into(),
        ));
    }
    Ok(document)
}

/// Extracts the resume text and stores the original bytes. Returns the text
/// and the blob key.
async fn ingest_resume(state: &AppState, file: UploadedFile) -> Result<(String, String), AppError> {
    let document = extract_off_thread(file.bytes.clone(), file.filename).await?;
    let key = resume_key(Uuid::new_v4(), document.format.extension());
    state
        .blobs
        .put(&key, file.bytes, document.format.content_type())
        .await?;
    info!(
        key = %key,
        format = ?document.format,
        text_chars = document.text.len(),
        "Stored uploaded resume"
    );
    Ok((document.text, key))
}

/// Text and key of the resume stored with `row`, if it has one.
async fn read_stored_resume(
    blobs: &dyn BlobStore,
    row: Option<StoredAnalysisRow>,
) -> Result<Option<(String, String)>, AppError> {
    let Some(key) = row.and_then(|row| row.subject_file_key) else {
        return Ok(None);
    };
    let bytes = blobs.get(&key).await?;
    let document = extract_off_thread(bytes, Some(key.clone())).await?;
    Ok(Some((document.text, key)))
}

/// Like `read_stored_resume`, for callers that can do without the resume: a
/// stored resume that can no longer be read is logged and skipped.
async fn optional_resume_context(
    blobs: &dyn BlobStore,
    row: Option<StoredAnalysisRow>,
) -> Option<(String, String)> {
    match read_stored_resume(blobs, row).await {
        Ok(context) => context,
        Err(e) => {
            warn!(error = %e, "Latest resume unavailable, continuing without it");
            None
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Shared persistence flow
// ────────────────────────────────────────────────────────────────────────────

struct Subject {
    user_id: Uuid,
    job_id: Option<Uuid>,
    file_key: Option<String>,
}

/// Runs the analysis and hands the outcome to `persist` on a spawned task, so
/// both complete even if the caller's future is dropped mid-request.
async fn run_detached<T, F, Fut>(
    llm: Arc<dyn CompletionClient>,
    request: AnalysisRequest,
    persist: F,
) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(AnalysisOutcome) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, AppError>> + Send + 'static,
{
    tokio::spawn(async move {
        let outcome = run_analysis(llm.as_ref(), &request).await;
        persist(outcome).await
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("analysis task failed: {e}")))?
}

/// Best-effort failed status for a record whose request is aborting.
async fn abandon(db: &PgPool, id: Uuid, reason: &str) {
    if let Err(e) = fail_analysis(db, id, reason).await {
        warn!(analysis_id = %id, error = %e, "Could not mark analysis as failed");
    }
}

/// pending → processing → run → completed/failed, returning the final record.
async fn run_and_store(
    state: &AppState,
    subject: Subject,
    request: AnalysisRequest,
) -> Result<(StatusCode, Json<AnalysisResponse>), AppError> {
    let record = create_analysis(
        &state.db,
        NewAnalysis {
            user_id: subject.user_id,
            task_kind: request.task_kind,
            job_id: subject.job_id,
            subject_file_key: subject.file_key.as_deref(),
        },
    )
    .await?;
    let id = record.id;

    if let Err(e) = mark_processing(&state.db, id).await {
        abandon(&state.db, id, &e.to_string()).await;
        return Err(e.into());
    }

    let db = state.db.clone();
    let row = run_detached(state.llm.clone(), request, move |outcome| async move {
        match finish_analysis(&db, id, &outcome).await {
            Ok(row) => Ok(row),
            Err(e) => {
                abandon(&db, id, &e.to_string()).await;
                Err(AppError::from(e))
            }
        }
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(AnalysisResponse::from_row(row, state.blobs.as_ref())),
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/ai/resume-analysis
pub async fn handle_resume_analysis(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<AnalysisResponse>), AppError> {
    let config = &state.config;
    let form = read_upload_form(multipart, config.max_upload_bytes, config.max_upload_mb()).await?;
    let upload = validate_upload(form, false)?;

    let (text, key) = ingest_resume(&state, upload.resume).await?;
    let request = AnalysisRequest::new(TaskKind::ResumeQuality, text)
        .with_reference(upload.job_description);

    run_and_store(
        &state,
        Subject {
            user_id: upload.user_id,
            job_id: upload.job_id,
            file_key: Some(key),
        },
        request,
    )
    .await
}

/// POST /api/v1/ai/ats-review
pub async fn handle_ats_review(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<AnalysisResponse>), AppError> {
    let config = &state.config;
    let form = read_upload_form(multipart, config.max_upload_bytes, config.max_upload_mb()).await?;
    let upload = validate_upload(form, true)?;

    let (text, key) = ingest_resume(&state, upload.resume).await?;
    let request =
        AnalysisRequest::new(TaskKind::AtsReview, text).with_reference(upload.job_description);

    run_and_store(
        &state,
        Subject {
            user_id: upload.user_id,
            job_id: upload.job_id,
            file_key: Some(key),
        },
        request,
    )
    .await
}

#[derive(Debug, Deserialize)]
pub struct KeywordCheckRequest {
    #[serde(default)]
    pub resume_text: String,
    #[serde(default)]
    pub job_description: String,
}

/// POST /api/v1/ai/ats-review/check-keywords
pub async fn handle_check_keywords(
    payload: Result<Json<KeywordCheckRequest>, JsonRejection>,
) -> Result<Json<KeywordCheck>, AppError> {
    let Json(req) = payload?;
    let mut errors = FieldErrors::new();
    if req.resume_text.trim().is_empty() {
        errors.insert("resume_text".into(), "Resume text is required".into());
    }
    if req.job_description.trim().is_empty() {
        errors.insert("job_description".into(), "Job description is required".into());
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    Ok(Json(check_keywords(&req.resume_text, &req.job_description)))
}

#[derive(Debug, Deserialize)]
pub struct InterviewPrepRequest {
    pub user_id: Option<String>,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub company: String,
}

/// POST /api/v1/ai/interview-prep
pub async fn handle_interview_prep(
    State(state): State<AppState>,
    payload: Result<Json<InterviewPrepRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AnalysisResponse>), AppError> {
    let Json(req) = payload?;
    let mut errors = FieldErrors::new();
    let user_id = require_user_id(req.user_id.as_deref(), &mut errors);
    if req.job_title.trim().is_empty() {
        errors.insert("job_title".into(), "Job title is required".into());
    }
    if req.company.trim().is_empty() {
        errors.insert("company".into(), "Company is required".into());
    }
    let Some(user_id) = user_id.filter(|_| errors.is_empty()) else {
        return Err(AppError::Validation(errors));
    };

    let latest = latest_with_resume(&state.db, user_id).await?;
    let (text, key) = read_stored_resume(state.blobs.as_ref(), latest)
        .await?
        .ok_or_else(|| AppError::field("resume", NO_RESUME_MESSAGE))?;

    let request = AnalysisRequest::new(TaskKind::InterviewPrep, text)
        .with_param("job_title", req.job_title.trim())
        .with_param("company", req.company.trim());

    run_and_store(
        &state,
        Subject {
            user_id,
            job_id: None,
            file_key: Some(key),
        },
        request,
    )
    .await
}

#[derive(Debug, Deserialize)]
pub struct CareerRoadmapRequest {
    pub user_id: Option<String>,
    #[serde(default)]
    pub current_skills: Vec<String>,
    #[serde(default)]
    pub target_goal: String,
    #[serde(default)]
    pub preferences: BTreeMap<String, String>,
}

fn render_preferences(preferences: &BTreeMap<String, String>) -> String {
    preferences
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(key, value)| format!("{key}: {}", value.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Skills given in the request, or the technical keywords of the resume when
/// the request names none.
fn resolve_skills(requested: &[String], resume_text: Option<&str>) -> Vec<String> {
    let skills: Vec<String> = requested
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if !skills.is_empty() {
        return skills;
    }
    let Some(text) = resume_text else {
        return skills;
    };
    let derived: Vec<String> = extract_keywords(text).into_iter().map(String::from).collect();
    debug!(derived = derived.len(), "Derived current skills from latest resume");
    derived
}

/// POST /api/v1/ai/career-roadmap
pub async fn handle_career_roadmap(
    State(state): State<AppState>,
    payload: Result<Json<CareerRoadmapRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AnalysisResponse>), AppError> {
    let Json(req) = payload?;
    let mut errors = FieldErrors::new();
    let user_id = require_user_id(req.user_id.as_deref(), &mut errors);
    if req.target_goal.trim().is_empty() {
        errors.insert("target_goal".into(), "Target goal is required".into());
    }
    let Some(user_id) = user_id.filter(|_| errors.is_empty()) else {
        return Err(AppError::Validation(errors));
    };

    let latest = latest_with_resume(&state.db, user_id).await?;
    let context = optional_resume_context(state.blobs.as_ref(), latest).await;
    let skills = resolve_skills(
        &req.current_skills,
        context.as_ref().map(|(text, _)| text.as_str()),
    );

    let (text, key) = match context {
        Some((text, key)) => (text, Some(key)),
        None => (String::new(), None),
    };
    let request = AnalysisRequest::new(TaskKind::CareerRoadmap, text)
        .with_param("target_goal", req.target_goal.trim())
        .with_param("current_skills", skills.join(", "))
        .with_param("preferences", render_preferences(&req.preferences));

    run_and_store(
        &state,
        Subject {
            user_id,
            job_id: None,
            file_key: key,
        },
        request,
    )
    .await
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub user_id: Option<String>,
    pub task_kind: Option<String>,
}

/// GET /api/v1/ai/analyses
pub async fn handle_list_analyses(
    State(state): State<AppState>,
    params: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<AnalysisResponse>>, AppError> {
    let Query(params) = params?;
    let mut errors = FieldErrors::new();
    let user_id = require_user_id(params.user_id.as_deref(), &mut errors);
    let task_kind = match params.task_kind.as_deref() {
        None | Some("") => None,
        Some(raw) => {
            let kind = TaskKind::parse(raw);
            if kind.is_none() {
                errors.insert("task_kind".into(), format!("Unknown task kind '{raw}'"));
            }
            kind
        }
    };
    let Some(user_id) = user_id.filter(|_| errors.is_empty()) else {
        return Err(AppError::Validation(errors));
    };

    let rows = list_for_user(&state.db, user_id, task_kind).await?;
    Ok(Json(
        rows.into_iter()
            .map(|row| AnalysisResponse::from_row(row, state.blobs.as_ref()))
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Option<String>,
}

/// GET /api/v1/ai/analyses/:id
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    params: Result<Query<UserIdQuery>, QueryRejection>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let Path(id) = id?;
    let Query(params) = params?;
    let mut errors = FieldErrors::new();
    let Some(user_id) = require_user_id(params.user_id.as_deref(), &mut errors) else {
        return Err(AppError::Validation(errors));
    };

    let row = get_for_user(&state.db, id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Analysis {id} not found")))?;
    Ok(Json(AnalysisResponse::from_row(row, state.blobs.as_ref())))
}
