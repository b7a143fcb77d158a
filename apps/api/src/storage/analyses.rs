//! Analysis records. Each record is written by exactly one request and its
//! result is set once, together with the terminal status.
//!
//! Every status change is guarded in its `WHERE` clause, so an update against
//! a record in the wrong state matches no row and surfaces as
//! `sqlx::Error::RowNotFound`.

use sqlx::{types::Json, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::models::TaskKind;
use crate::analysis::pipeline::AnalysisOutcome;
use crate::models::analysis::{AnalysisStatus, StoredAnalysisRow};

/// Inputs for a new pending record.
pub struct NewAnalysis<'a> {
    pub user_id: Uuid,
    pub task_kind: TaskKind,
    pub job_id: Option<Uuid>,
    pub subject_file_key: Option<&'a str>,
}

pub async fn create_analysis(
    pool: &PgPool,
    new: NewAnalysis<'_>,
) -> Result<StoredAnalysisRow, sqlx::Error> {
    let row = sqlx::query_as::<_, StoredAnalysisRow>(
        r#"
        INSERT INTO analyses (id, user_id, task_kind, job_id, subject_file_key, status, score)
        VALUES ($1, $2, $3, $4, $5, $6, 0)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.user_id)
    .bind(new.task_kind.as_str())
    .bind(new.job_id)
    .bind(new.subject_file_key)
    .bind(AnalysisStatus::Pending.as_str())
    .fetch_one(pool)
    .await?;

    info!(
        analysis_id = %row.id,
        user_id = %row.user_id,
        task = new.task_kind.as_str(),
        "Created pending analysis"
    );
    Ok(row)
}

/// pending → processing.
pub async fn mark_processing(pool: &PgPool, id: Uuid) -> Result<StoredAnalysisRow, sqlx::Error> {
    let row = sqlx::query_as::<_, StoredAnalysisRow>(
        r#"
        UPDATE analyses SET status = $2, updated_at = NOW()
        WHERE id = $1 AND status = $3
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(AnalysisStatus::Processing.as_str())
    .bind(AnalysisStatus::Pending.as_str())
    .fetch_one(pool)
    .await?;

    info!(analysis_id = %id, "Analysis processing");
    Ok(row)
}

/// Terminal status for an outcome: fallback results are stored as failed.
pub fn terminal_status(outcome: &AnalysisOutcome) -> AnalysisStatus {
    if outcome.is_degraded() {
        AnalysisStatus::Failed
    } else {
        AnalysisStatus::Completed
    }
}

/// processing → completed/failed. Writes result, score and terminal status in
/// one statement.
pub async fn finish_analysis(
    pool: &PgPool,
    id: Uuid,
    outcome: &AnalysisOutcome,
) -> Result<StoredAnalysisRow, sqlx::Error> {
    let status = terminal_status(outcome);

    let row = sqlx::query_as::<_, StoredAnalysisRow>(
        r#"
        UPDATE analyses
        SET status = $2, score = $3, result = $4, error_message = $5, updated_at = NOW()
        WHERE id = $1 AND status = $6 AND task_kind = $7 AND result IS NULL
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .bind(outcome.result.score())
    .bind(Json(&outcome.result))
    .bind(outcome.degraded.as_deref())
    .bind(AnalysisStatus::Processing.as_str())
    .bind(outcome.result.task_kind().as_str())
    .fetch_one(pool)
    .await?;

    info!(analysis_id = %id, status = status.as_str(), score = row.score, "Analysis finished");
    Ok(row)
}

/// Moves a record that never got its result to failed. Used when the request
/// aborts between creation and `finish_analysis`; a record that already
/// reached a terminal status is left untouched.
pub async fn fail_analysis(pool: &PgPool, id: Uuid, reason: &str) -> Result<(), sqlx::Error> {
    let updated = sqlx::query(
        r#"
        UPDATE analyses SET status = $2, error_message = $3, updated_at = NOW()
        WHERE id = $1 AND status IN ($4, $5)
        "#,
    )
    .bind(id)
    .bind(AnalysisStatus::Failed.as_str())
    .bind(reason)
    .bind(AnalysisStatus::Pending.as_str())
    .bind(AnalysisStatus::Processing.as_str())
    .execute(pool)
    .await?
    .rows_affected();

    if updated == 1 {
        warn!(analysis_id = %id, error = reason, "Analysis aborted, marked failed");
    }
    Ok(())
}

/// Most recent record of the user that has an uploaded resume.
pub async fn latest_with_resume(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<StoredAnalysisRow>, sqlx::Error> {
    Ok(sqlx::query_as::<_, StoredAnalysisRow>(
        r#"
        SELECT * FROM analyses
        WHERE user_id = $1 AND subject_file_key IS NOT NULL
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?)
}

/// The user's records, newest first, optionally limited to one task kind.
pub async fn list_for_user(
    pool: &PgPool,
    user_id: Uuid,
    task_kind: Option<TaskKind>,
) -> Result<Vec<StoredAnalysisRow>, sqlx::Error> {
    Ok(sqlx::query_as::<_, StoredAnalysisRow>(
        r#"
        SELECT * FROM analyses
        WHERE user_id = $1 AND ($2::TEXT IS NULL OR task_kind = $2)
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .bind(task_kind.map(|k| k.as_str()))
    .fetch_all(pool)
    .await?)
}

pub async fn get_for_user(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<StoredAnalysisRow>, sqlx::Error> {
    Ok(
        sqlx::query_as::<_, StoredAnalysisRow>(
            "SELECT * FROM analyses WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?,
    )
}
