// Prompt templates for the four analysis tasks.
// Shared system instruction and the required-fields rule live in llm_client::prompts.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::analysis::models::{AnalysisRequest, TaskKind};
use crate::llm_client::prompts::required_fields_rule;

/// Rendered for every placeholder without a value.
pub const NOT_PROVIDED: &str = "Not provided";

/// Resume quality template.
/// Replace: {resume_text}, {job_description}, {list_rule}
pub const RESUME_QUALITY_PROMPT_TEMPLATE: &str = r#"Analyze the following resume as an experienced technical recruiter.

RESUME:
{resume_text}

TARGET JOB DESCRIPTION:
{job_description}

Assess overall quality, clarity, impact and (when a job description is given) fit for the role.

Return a JSON object with this EXACT schema (no extra fields):
{
  "score": 78,
  "strengths": ["Quantified impact in most experience bullets"],
  "weaknesses": ["No summary section"],
  "improvements": ["Add a three-line summary targeting backend roles"]
}

Rules:
- "score" is a whole number from 0 to 100
- Each list holds short, specific, actionable sentences
{list_rule}"#;

/// ATS review template.
/// Replace: {resume_text}, {job_description}, {list_rule}
pub const ATS_REVIEW_PROMPT_TEMPLATE: &str = r#"As an ATS (Applicant Tracking System) expert, analyze this resume against the job description.
Focus on ATS optimization and keyword matching.

JOB DESCRIPTION:
{job_description}

RESUME:
{resume_text}

Return a JSON object with this EXACT schema (no extra fields):
{
  "score": 72.5,
  "keyword_analysis": {
    "matched": ["python", "rest"],
    "missing": ["kubernetes"],
    "density": {"python": 3, "rest": 1}
  },
  "format_analysis": {
    "is_ats_friendly": true,
    "issues": ["Two-column layout in header"],
    "recommendations": ["Use a single-column layout"]
  },
  "content_analysis": {
    "section_completeness": {"contact": 100, "summary": 50, "experience": 75, "education": 100, "skills": 75},
    "content_quality": {"experience": "Strong action verbs, few metrics"},
    "improvement_suggestions": ["Quantify results in the two most recent roles"]
  },
  "optimization_tips": ["Mirror the job title wording in the summary"]
}

Rules:
- "score" is ATS compatibility from 0 to 100
- "matched" lists job description keywords found in the resume, "missing" the important ones absent
- "density" counts occurrences of each matched keyword in the resume (whole numbers)
- "matched", "missing" and "issues" are empty lists when nothing applies
{list_rule}"#;

/// Interview preparation template.
/// Replace: {job_title}, {company}, {resume_text}, {list_rule}
pub const INTERVIEW_PREP_PROMPT_TEMPLATE: &str = r#"Prepare interview content for a {job_title} position at {company}.

CANDIDATE RESUME:
{resume_text}

Return a JSON object with this EXACT schema (no extra fields):
{
  "score": 65,
  "preparation_content": "A short briefing on what this interview will probe and how to prepare.",
  "common_questions": ["Walk me through your most recent project."],
  "technical_questions": ["How would you design an idempotent payment endpoint?"],
  "behavioral_questions": ["Tell me about a time you disagreed with a teammate."],
  "tips": ["Prepare two STAR stories about production incidents."]
}

Rules:
- "score" is the candidate's current readiness for this interview, 0 to 100
- Technical questions are based on the candidate's actual experience
- Tips cover answering each question type and questions to ask the interviewer
{list_rule}"#;

/// Career roadmap template.
/// Replace: {target_goal}, {current_skills}, {preferences}, {resume_text}, {list_rule}
pub const CAREER_ROADMAP_PROMPT_TEMPLATE: &str = r#"Create a detailed career roadmap for reaching this goal: {target_goal}

CURRENT SKILLS:
{current_skills}

PREFERENCES:
{preferences}

RESUME:
{resume_text}

Return a JSON object with this EXACT schema (no extra fields):
{
  "score": 70,
  "roadmap": {
    "summary": "Two sentences on the overall path.",
    "phases": [
      {
        "title": "Foundations",
        "duration": "0-3 months",
        "milestones": ["Ship a small REST service to production"],
        "skills": ["SQL", "HTTP APIs"],
        "projects": ["Personal finance tracker with a Postgres backend"],
        "resources": ["PostgreSQL official tutorial"]
      }
    ]
  },
  "milestones": ["First backend role or internship"],
  "skills_to_acquire": ["Docker"],
  "timeline": {
    "short_term": "Next 3 months: ...",
    "medium_term": "3-12 months: ...",
    "long_term": "1-3 years: ..."
  }
}

Rules:
- "score" is the feasibility of the goal given the current skills, 0 to 100
- Include between 2 and 5 phases, in order
- Include intermediate roles and certifications where relevant
{list_rule}"#;

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder regex is valid"));

fn template_for(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::ResumeQuality => RESUME_QUALITY_PROMPT_TEMPLATE,
        TaskKind::AtsReview => ATS_REVIEW_PROMPT_TEMPLATE,
        TaskKind::InterviewPrep => INTERVIEW_PREP_PROMPT_TEMPLATE,
        TaskKind::CareerRoadmap => CAREER_ROADMAP_PROMPT_TEMPLATE,
    }
}

/// Renders the template for `request.task_kind`.
///
/// Substitution is a single pass over the template, so placeholder-looking
/// text inside a resume or job description is never expanded.
pub fn build_prompt(request: &AnalysisRequest) -> String {
    let template = template_for(request.task_kind);
    let list_rule = required_fields_rule(request.task_kind.required_fields());
    PLACEHOLDER_REGEX
        .replace_all(template, |caps: &Captures| {
            let value = match &caps[1] {
                "resume_text" => non_blank(&request.subject_text),
                "job_description" => request.reference_text.as_deref().and_then(non_blank),
                "list_rule" => Some(list_rule.as_str()),
                name => request.param(name),
            };
            value.unwrap_or(NOT_PROVIDED).to_string()
        })
        .into_owned()
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
