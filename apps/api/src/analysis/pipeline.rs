//! Analysis pipeline: prompt → completion → normalize, or fallback.
//!
//! Never fails. Upstream and parse failures are absorbed into a fallback
//! result and reported through `AnalysisOutcome::degraded` so the caller can
//! mark the stored record as failed.

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::ats::merge_heuristics;
use crate::analysis::fallback::fallback_result;
use crate::analysis::models::{
    AnalysisRequest, AnalysisResult, AtsReviewResult, CareerRoadmapResult, InterviewPrepResult,
    ResultSchema, ResumeQualityResult, TaskKind,
};
use crate::analysis::normalizer::{normalize, UnparseableResponse};
use crate::analysis::prompts::build_prompt;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{CompletionClient, CompletionError};

#[derive(Debug, Error)]
pub enum AnalysisFailure {
    #[error(transparent)]
    Upstream(#[from] CompletionError),

    #[error(transparent)]
    Unparseable(#[from] UnparseableResponse),
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    /// Error description when the result is a fallback.
    pub degraded: Option<String>,
}

impl AnalysisOutcome {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Runs one analysis end to end.
///
/// ATS results always get the heuristic format and section checks merged in,
/// since those do not depend on the model.
pub async fn run_analysis(
    client: &dyn CompletionClient,
    request: &AnalysisRequest,
) -> AnalysisOutcome {
    let task = request.task_kind.as_str();
    let prompt = build_prompt(request);
    debug!(task, prompt_chars = prompt.len(), "Built analysis prompt");

    let started = Instant::now();
    let attempt = complete_and_normalize(client, request.task_kind, &prompt).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let (mut result, degraded) = match attempt {
        Ok(result) => {
            info!(task, elapsed_ms, score = result.score(), "Analysis completed");
            (result, None)
        }
        Err(failure) => {
            let reason = failure.to_string();
            warn!(task, elapsed_ms, error = %reason, "Analysis failed, using fallback");
            (fallback_result(request.task_kind, &reason), Some(reason))
        }
    };

    if let AnalysisResult::AtsReview(review) = &mut result {
        merge_heuristics(review, &request.subject_text);
    }

    AnalysisOutcome { result, degraded }
}

async fn complete_and_normalize(
    client: &dyn CompletionClient,
    kind: TaskKind,
    prompt: &str,
) -> Result<AnalysisResult, AnalysisFailure> {
    let raw = client.complete(prompt, JSON_ONLY_SYSTEM).await?;
    debug!(task = kind.as_str(), response_chars = raw.len(), "Completion received");

    let result = match kind {
        TaskKind::ResumeQuality => normalize::<ResumeQualityResult>(&raw)?.into_result(),
        TaskKind::AtsReview => normalize::<AtsReviewResult>(&raw)?.into_result(),
        TaskKind::InterviewPrep => normalize::<InterviewPrepResult>(&raw)?.into_result(),
        TaskKind::CareerRoadmap => normalize::<CareerRoadmapResult>(&raw)?.into_result(),
    };
    Ok(result)
}
