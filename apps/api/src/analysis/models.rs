//! Result schemas for every analysis task.
//!
//! Each task has its own struct; `AnalysisResult` is the tagged union that is
//! returned to clients and persisted as JSON. Field names are the wire names
//! the prompt templates ask the model for.

use std::collections::{BTreeMap, HashMap};

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Task kinds and requests
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    ResumeQuality,
    AtsReview,
    InterviewPrep,
    CareerRoadmap,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::ResumeQuality => "resume_quality",
            TaskKind::AtsReview => "ats_review",
            TaskKind::InterviewPrep => "interview_prep",
            TaskKind::CareerRoadmap => "career_roadmap",
        }
    }

    /// Fields the task's result must not leave empty. Named by their path in
    /// the JSON document, as `ResultSchema::empty_required_fields` reports them.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            TaskKind::ResumeQuality => &["strengths", "weaknesses", "improvements"],
            TaskKind::AtsReview => &["content_analysis.improvement_suggestions", "optimization_tips"],
            TaskKind::InterviewPrep => &[
                "preparation_content",
                "common_questions",
                "technical_questions",
                "behavioral_questions",
                "tips",
            ],
            TaskKind::CareerRoadmap => &["roadmap.phases", "milestones", "skills_to_acquire"],
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "resume_quality" => Some(TaskKind::ResumeQuality),
            "ats_review" => Some(TaskKind::AtsReview),
            "interview_prep" => Some(TaskKind::InterviewPrep),
            "career_roadmap" => Some(TaskKind::CareerRoadmap),
            _ => None,
        }
    }
}

/// One analysis call's inputs. Built per request, never stored.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Resume text (may be empty for roadmaps without an uploaded resume).
    pub subject_text: String,
    /// Job description, when the task compares against one.
    pub reference_text: Option<String>,
    pub task_kind: TaskKind,
    /// Task-specific named inputs: job_title, company, current_skills, ...
    pub extra_params: BTreeMap<String, String>,
}

impl AnalysisRequest {
    pub fn new(task_kind: TaskKind, subject_text: impl Into<String>) -> Self {
        Self {
            subject_text: subject_text.into(),
            reference_text: None,
            task_kind,
            extra_params: BTreeMap::new(),
        }
    }

    pub fn with_reference(mut self, reference: Option<String>) -> Self {
        self.reference_text = reference.filter(|r| !r.trim().is_empty());
        self
    }

    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.extra_params.insert(key.to_string(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.extra_params
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Schema contract shared by all variants
// ────────────────────────────────────────────────────────────────────────────

/// Contract every task result implements so the normalizer can accept or
/// reject a parsed document generically.
pub trait ResultSchema: DeserializeOwned + Serialize {
    const TASK: TaskKind;

    /// Names of required fields that parsed but carry no content. Always a
    /// subset of `TASK.required_fields()`.
    fn empty_required_fields(&self) -> Vec<&'static str>;

    /// Clamps scores into [0, 100] and rounds them.
    fn bound_scores(&mut self);

    fn into_result(self) -> AnalysisResult;
}

/// Clamp into [0, 100] and round to 2 decimals. NaN becomes 0.
pub fn bound_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    (score.clamp(0.0, 100.0) * 100.0).round() / 100.0
}

fn is_blank_list(list: &[String]) -> bool {
    list.iter().all(|item| item.trim().is_empty())
}

/// Accepts any JSON number and rounds it to a whole 0–100 score.
fn whole_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    Ok(bound_score(raw).round() as u8)
}

/// Keyword counts may come back as floats; they are counts, so round them.
fn keyword_counts<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, u32>, D::Error> {
    let raw = HashMap::<String, f64>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(k, v)| (k, v.max(0.0).round() as u32))
        .collect())
}

// ────────────────────────────────────────────────────────────────────────────
// Resume quality
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeQualityResult {
    #[serde(deserialize_with = "whole_score")]
    pub score: u8,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub improvements: Vec<String>,
}

impl ResultSchema for ResumeQualityResult {
    const TASK: TaskKind = TaskKind::ResumeQuality;

    fn empty_required_fields(&self) -> Vec<&'static str> {
        let mut empty = Vec::new();
        if is_blank_list(&self.strengths) {
            empty.push("strengths");
        }
        if is_blank_list(&self.weaknesses) {
            empty.push("weaknesses");
        }
        if is_blank_list(&self.improvements) {
            empty.push("improvements");
        }
        empty
    }

    fn bound_scores(&mut self) {
        self.score = self.score.min(100);
    }

    fn into_result(self) -> AnalysisResult {
        AnalysisResult::ResumeQuality(self)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ATS review
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordAnalysis {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    #[serde(deserialize_with = "keyword_counts")]
    pub density: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatAnalysis {
    pub is_ats_friendly: bool,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub section_completeness: BTreeMap<String, f64>,
    pub content_quality: BTreeMap<String, String>,
    pub improvement_suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtsReviewResult {
    pub score: f64,
    pub keyword_analysis: KeywordAnalysis,
    pub format_analysis: FormatAnalysis,
    pub content_analysis: ContentAnalysis,
    pub optimization_tips: Vec<String>,
}

impl ResultSchema for AtsReviewResult {
    const TASK: TaskKind = TaskKind::AtsReview;

    fn empty_required_fields(&self) -> Vec<&'static str> {
        let mut empty = Vec::new();
        if is_blank_list(&self.content_analysis.improvement_suggestions) {
            empty.push("content_analysis.improvement_suggestions");
        }
        if is_blank_list(&self.optimization_tips) {
            empty.push("optimization_tips");
        }
        empty
    }

    fn bound_scores(&mut self) {
        self.score = bound_score(self.score);
        for value in self.content_analysis.section_completeness.values_mut() {
            *value = bound_score(*value);
        }
    }

    fn into_result(self) -> AnalysisResult {
        AnalysisResult::AtsReview(self)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Interview preparation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewPrepResult {
    /// Readiness estimate. Optional in model output.
    #[serde(default)]
    pub score: f64,
    pub preparation_content: String,
    pub common_questions: Vec<String>,
    pub technical_questions: Vec<String>,
    pub behavioral_questions: Vec<String>,
    pub tips: Vec<String>,
}

impl ResultSchema for InterviewPrepResult {
    const TASK: TaskKind = TaskKind::InterviewPrep;

    fn empty_required_fields(&self) -> Vec<&'static str> {
        let mut empty = Vec::new();
        if self.preparation_content.trim().is_empty() {
            empty.push("preparation_content");
        }
        if is_blank_list(&self.common_questions) {
            empty.push("common_questions");
        }
        if is_blank_list(&self.technical_questions) {
            empty.push("technical_questions");
        }
        if is_blank_list(&self.behavioral_questions) {
            empty.push("behavioral_questions");
        }
        if is_blank_list(&self.tips) {
            empty.push("tips");
        }
        empty
    }

    fn bound_scores(&mut self) {
        self.score = bound_score(self.score);
    }

    fn into_result(self) -> AnalysisResult {
        AnalysisResult::InterviewPrep(self)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Career roadmap
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapPhase {
    pub title: String,
    pub duration: String,
    pub milestones: Vec<String>,
    pub skills: Vec<String>,
    pub projects: Vec<String>,
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roadmap {
    pub summary: String,
    pub phases: Vec<RoadmapPhase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub short_term: String,
    pub medium_term: String,
    pub long_term: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerRoadmapResult {
    /// Feasibility estimate for the goal. Optional in model output.
    #[serde(default)]
    pub score: f64,
    pub roadmap: Roadmap,
    pub milestones: Vec<String>,
    pub skills_to_acquire: Vec<String>,
    pub timeline: Timeline,
}

impl ResultSchema for CareerRoadmapResult {
    const TASK: TaskKind = TaskKind::CareerRoadmap;

    fn empty_required_fields(&self) -> Vec<&'static str> {
        let mut empty = Vec::new();
        if self.roadmap.phases.is_empty() {
            empty.push("roadmap.phases");
        }
        if is_blank_list(&self.milestones) {
            empty.push("milestones");
        }
        if is_blank_list(&self.skills_to_acquire) {
            empty.push("skills_to_acquire");
        }
        empty
    }

    fn bound_scores(&mut self) {
        self.score = bound_score(self.score);
    }

    fn into_result(self) -> AnalysisResult {
        AnalysisResult::CareerRoadmap(self)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tagged union
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task_kind", rename_all = "snake_case")]
pub enum AnalysisResult {
    ResumeQuality(ResumeQualityResult),
    AtsReview(AtsReviewResult),
    InterviewPrep(InterviewPrepResult),
    CareerRoadmap(CareerRoadmapResult),
}

impl AnalysisResult {
    pub fn task_kind(&self) -> TaskKind {
        match self {
            AnalysisResult::ResumeQuality(_) => TaskKind::ResumeQuality,
            AnalysisResult::AtsReview(_) => TaskKind::AtsReview,
            AnalysisResult::InterviewPrep(_) => TaskKind::InterviewPrep,
            AnalysisResult::CareerRoadmap(_) => TaskKind::CareerRoadmap,
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            AnalysisResult::ResumeQuality(r) => f64::from(r.score),
            AnalysisResult::AtsReview(r) => r.score,
            AnalysisResult::InterviewPrep(r) => r.score,
            AnalysisResult::CareerRoadmap(r) => r.score,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Heuristic section scores
// ────────────────────────────────────────────────────────────────────────────

/// Per-section completeness, 0–100, computed without the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionScores {
    pub contact: f64,
    pub summary: f64,
    pub experience: f64,
    pub education: f64,
    pub skills: f64,
}

impl SectionScores {
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("contact".to_string(), self.contact),
            ("summary".to_string(), self.summary),
            ("experience".to_string(), self.experience),
            ("education".to_string(), self.education),
            ("skills".to_string(), self.skills),
        ])
    }
}
