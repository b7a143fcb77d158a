//! Response normalizer: raw model text → typed, bounded result.
//!
//! Models ignore "JSON only" instructions often enough that the raw text is
//! recovered in three steps, stopping at the first that parses:
//! 1. the whole trimmed text
//! 2. the content of the first fenced code block
//! 3. the greedy span from the first `{` to the last `}`
//!
//! A parsed document with an empty required list is rejected as well.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::analysis::models::ResultSchema;

#[derive(Debug, Error, PartialEq)]
#[error("unparseable response: {0}")]
pub struct UnparseableResponse(pub String);

static FENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\r?\n?(.*?)```").expect("fence regex is valid")
});

/// Recovers a JSON document of type `T` from raw model text.
pub fn recover_json<T: DeserializeOwned>(raw: &str) -> Result<T, UnparseableResponse> {
    let trimmed = raw.trim();

    let direct_error = match serde_json::from_str::<T>(trimmed) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    if let Some(fenced) = strip_fence(trimmed) {
        if let Ok(value) = serde_json::from_str::<T>(fenced) {
            debug!("Recovered JSON from fenced block");
            return Ok(value);
        }
    }

    if let Some(span) = brace_span(trimmed) {
        return serde_json::from_str::<T>(span).map_err(|e| {
            UnparseableResponse(format!("no valid JSON object in response: {e}"))
        });
    }

    Err(UnparseableResponse(format!(
        "no JSON object in response: {direct_error}"
    )))
}

fn strip_fence(text: &str) -> Option<&str> {
    FENCE_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Recovers, validates and bounds a task result.
pub fn normalize<T: ResultSchema>(raw: &str) -> Result<T, UnparseableResponse> {
    let mut parsed: T = recover_json(raw)?;

    let empty = parsed.empty_required_fields();
    debug_assert!(empty.iter().all(|f| T::TASK.required_fields().contains(f)));
    if !empty.is_empty() {
        return Err(UnparseableResponse(format!(
            "{} required fields are empty: {}",
            T::TASK.as_str(),
            empty.join(", ")
        )));
    }

    parsed.bound_scores();
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::analysis::models::{
        AtsReviewResult, CareerRoadmapResult, InterviewPrepResult, ResumeQualityResult, TaskKind,
    };

    const QUALITY_JSON: &str = r#"{"score": 81, "strengths": ["Clear layout"], "weaknesses": ["No metrics"], "improvements": ["Quantify results"]}"#;

    #[test]
    fn test_direct_parse() {
        let value: Value = recover_json(&format!("  {QUALITY_JSON}\n")).unwrap();
        assert_eq!(value["score"], 81);
    }

    #[test]
    fn test_fenced_block_with_language_tag() {
        let raw = format!("Here is the analysis:\n```json\n{QUALITY_JSON}\n```\nHope it helps!");
        let fenced: Value = recover_json(&raw).unwrap();
        let direct: Value = serde_json::from_str(QUALITY_JSON).unwrap();
        assert_eq!(fenced, direct);
    }

    #[test]
    fn test_bare_fence() {
        let raw = format!("```\n{QUALITY_JSON}\n```");
        let value: Value = recover_json(&raw).unwrap();
        assert_eq!(value["strengths"][0], "Clear layout");
    }

    #[test]
    fn test_brace_span_inside_prose() {
        let raw = format!("Sure! {QUALITY_JSON} Let me know if you need more.");
        let value: Value = recover_json(&raw).unwrap();
        assert_eq!(value, serde_json::from_str::<Value>(QUALITY_JSON).unwrap());
    }

    #[test]
    fn test_brace_span_after_broken_fence() {
        // Unclosed fence: step 2 fails, step 3 still finds the object.
        let raw = format!("```json\n{QUALITY_JSON}");
        let value: Value = recover_json(&raw).unwrap();
        assert_eq!(value["score"], 81);
    }

    #[test]
    fn test_no_json_at_all() {
        let err = recover_json::<Value>("I cannot help with that.").unwrap_err();
        assert!(err.0.contains("no JSON object"));
    }

    #[test]
    fn test_malformed_json_is_unparseable() {
        assert!(recover_json::<Value>(r#"{"score": 81, "strengths": [}"#).is_err());
    }

    #[test]
    fn test_missing_required_field_is_unparseable() {
        let raw = r#"{"score": 81, "strengths": ["a"], "weaknesses": ["b"]}"#;
        let err = normalize::<ResumeQualityResult>(raw).unwrap_err();
        assert!(err.0.contains("improvements"));
    }

    #[test]
    fn test_empty_required_list_is_unparseable() {
        let raw = r#"{"score": 81, "strengths": [], "weaknesses": ["b"], "improvements": ["c"]}"#;
        let err = normalize::<ResumeQualityResult>(raw).unwrap_err();
        assert_eq!(
            err,
            UnparseableResponse("resume_quality required fields are empty: strengths".into())
        );
    }

    fn empty_fields<T: ResultSchema>(document: Value) -> Vec<&'static str> {
        serde_json::from_value::<T>(document)
            .unwrap()
            .empty_required_fields()
    }

    #[test]
    fn test_blank_documents_report_exactly_the_required_fields() {
        let quality = json!({"score": 0, "strengths": [], "weaknesses": [], "improvements": []});
        assert_eq!(
            empty_fields::<ResumeQualityResult>(quality),
            TaskKind::ResumeQuality.required_fields()
        );

        let ats = json!({
            "score": 0,
            "keyword_analysis": {"matched": [], "missing": [], "density": {}},
            "format_analysis": {"is_ats_friendly": true, "issues": [], "recommendations": []},
            "content_analysis": {
                "section_completeness": {},
                "content_quality": {},
                "improvement_suggestions": []
            },
            "optimization_tips": []
        });
        assert_eq!(
            empty_fields::<AtsReviewResult>(ats),
            TaskKind::AtsReview.required_fields()
        );

        let interview = json!({
            "preparation_content": " ",
            "common_questions": [],
            "technical_questions": [],
            "behavioral_questions": [],
            "tips": []
        });
        assert_eq!(
            empty_fields::<InterviewPrepResult>(interview),
            TaskKind::InterviewPrep.required_fields()
        );

        let roadmap = json!({
            "roadmap": {"summary": "", "phases": []},
            "milestones": [],
            "skills_to_acquire": [],
            "timeline": {"short_term": "", "medium_term": "", "long_term": ""}
        });
        assert_eq!(
            empty_fields::<CareerRoadmapResult>(roadmap),
            TaskKind::CareerRoadmap.required_fields()
        );
    }

    #[test]
    fn test_scores_bounded_after_acceptance() {
        let raw = json!({
            "score": 112.345,
            "keyword_analysis": {"matched": [], "missing": [], "density": {}},
            "format_analysis": {"is_ats_friendly": true, "issues": [], "recommendations": []},
            "content_analysis": {
                "section_completeness": {"skills": -4.0, "summary": 66.666},
                "content_quality": {},
                "improvement_suggestions": ["Add metrics"]
            },
            "optimization_tips": ["Use standard headers"]
        })
        .to_string();
        let result = normalize::<AtsReviewResult>(&raw).unwrap();
        assert_eq!(result.score, 100.0);
        assert_eq!(result.content_analysis.section_completeness["skills"], 0.0);
        assert_eq!(result.content_analysis.section_completeness["summary"], 66.67);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = json!({
            "score": 55.556,
            "preparation_content": "Focus on system design.",
            "common_questions": ["Why this company?"],
            "technical_questions": ["Explain database indexing."],
            "behavioral_questions": ["Describe a conflict."],
            "tips": ["Use STAR."]
        })
        .to_string();
        let once = normalize::<InterviewPrepResult>(&raw).unwrap();
        let again =
            normalize::<InterviewPrepResult>(&serde_json::to_string(&once).unwrap()).unwrap();
        assert_eq!(once, again);
        assert_eq!(once.score, 55.56);
    }
}
