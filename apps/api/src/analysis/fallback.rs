//! Fallback policy: a shape-identical "unavailable" result for any task.

use std::collections::BTreeMap;

use crate::analysis::models::{
    AnalysisResult, AtsReviewResult, CareerRoadmapResult, ContentAnalysis, FormatAnalysis,
    InterviewPrepResult, KeywordAnalysis, ResumeQualityResult, Roadmap, RoadmapPhase, TaskKind,
    Timeline,
};

pub fn sentinel(error: &str) -> String {
    format!("Analysis unavailable: {error}")
}

/// Builds the fallback result for `kind`.
///
/// Score 0, every string list holds the sentinel once, free text is the
/// sentinel, `is_ats_friendly` is false. The output passes the normalizer.
pub fn fallback_result(kind: TaskKind, error: &str) -> AnalysisResult {
    let message = sentinel(error);
    let list = || vec![message.clone()];

    match kind {
        TaskKind::ResumeQuality => AnalysisResult::ResumeQuality(ResumeQualityResult {
            score: 0,
            strengths: list(),
            weaknesses: list(),
            improvements: list(),
        }),
        TaskKind::AtsReview => AnalysisResult::AtsReview(AtsReviewResult {
            score: 0.0,
            keyword_analysis: KeywordAnalysis {
                matched: list(),
                missing: list(),
                density: BTreeMap::new(),
            },
            format_analysis: FormatAnalysis {
                is_ats_friendly: false,
                issues: list(),
                recommendations: list(),
            },
            content_analysis: ContentAnalysis {
                section_completeness: BTreeMap::new(),
                content_quality: BTreeMap::from([("overall".to_string(), message.clone())]),
                improvement_suggestions: list(),
            },
            optimization_tips: list(),
        }),
        TaskKind::InterviewPrep => AnalysisResult::InterviewPrep(InterviewPrepResult {
            score: 0.0,
            preparation_content: message.clone(),
            common_questions: list(),
            technical_questions: list(),
            behavioral_questions: list(),
            tips: list(),
        }),
        TaskKind::CareerRoadmap => AnalysisResult::CareerRoadmap(CareerRoadmapResult {
            score: 0.0,
            roadmap: Roadmap {
                summary: message.clone(),
                phases: vec![RoadmapPhase {
                    title: message.clone(),
                    duration: message.clone(),
                    milestones: list(),
                    skills: list(),
                    projects: list(),
                    resources: list(),
                }],
            },
            milestones: list(),
            skills_to_acquire: list(),
            timeline: Timeline {
                short_term: message.clone(),
                medium_term: message.clone(),
                long_term: message.clone(),
            },
        }),
    }
}
