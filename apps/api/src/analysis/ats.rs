//! ATS heuristics that run without the model: format compatibility, the
//! fixed technical keyword list, and the quick keyword check.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::analysis::models::{AtsReviewResult, FormatAnalysis};
use crate::analysis::sections::analyze_sections;

/// Technical keywords looked for in job descriptions.
pub const TECHNICAL_KEYWORDS: [&str; 20] = [
    "python",
    "java",
    "javascript",
    "react",
    "angular",
    "vue",
    "node.js",
    "sql",
    "nosql",
    "aws",
    "azure",
    "docker",
    "kubernetes",
    "git",
    "agile",
    "scrum",
    "ci/cd",
    "rest",
    "api",
    "microservices",
];

const STANDARD_SECTIONS: [&str; 3] = ["experience", "education", "skills"];

static KEYWORD_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    TECHNICAL_KEYWORDS
        .iter()
        .map(|&kw| {
            let re = Regex::new(&format!(r"\b{}\b", regex::escape(kw)))
                .expect("keyword regex is valid");
            (kw, re)
        })
        .collect()
});

static SECTION_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    STANDARD_SECTIONS
        .iter()
        .map(|&s| (s, Regex::new(&format!(r"\b{s}\b")).expect("section regex is valid")))
        .collect()
});

static NON_ASCII: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\x00-\x7F]").expect("non-ascii regex is valid"));
static HTML_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img|<table|<div").expect("html regex is valid"));
static SPECIAL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.,;:()\-]").expect("special char regex is valid"));

const NON_ASCII_ISSUE: &str = "Contains non-ASCII characters";
const HTML_ISSUE: &str = "Contains HTML tags";
const SPECIAL_CHARS_ISSUE: &str = "Contains special characters that might confuse ATS";
const MISSING_SECTIONS_PREFIX: &str = "Missing standard sections";

// ────────────────────────────────────────────────────────────────────────────
// Format compatibility
// ────────────────────────────────────────────────────────────────────────────

/// Flags resume content that ATS parsers commonly mishandle.
pub fn check_format_compatibility(text: &str) -> FormatAnalysis {
    let mut issues = Vec::new();

    if NON_ASCII.is_match(text) {
        issues.push(NON_ASCII_ISSUE.to_string());
    }
    if HTML_TAGS.is_match(text) {
        issues.push(HTML_ISSUE.to_string());
    }
    if SPECIAL_CHARS.is_match(text) {
        issues.push(SPECIAL_CHARS_ISSUE.to_string());
    }

    let lowered = text.to_lowercase();
    let missing: Vec<&str> = SECTION_PATTERNS
        .iter()
        .filter(|(_, re)| !re.is_match(&lowered))
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        issues.push(format!("{MISSING_SECTIONS_PREFIX}: {}", missing.join(", ")));
    }

    let recommendations = issues.iter().filter_map(|i| recommendation_for(i)).collect();

    FormatAnalysis {
        is_ats_friendly: issues.is_empty(),
        issues,
        recommendations,
    }
}

fn recommendation_for(issue: &str) -> Option<String> {
    let text = if issue == NON_ASCII_ISSUE {
        "Replace any special characters with standard ASCII equivalents"
    } else if issue == HTML_ISSUE {
        "Remove all HTML formatting and use plain text"
    } else if issue == SPECIAL_CHARS_ISSUE {
        "Use only standard punctuation marks"
    } else if issue.starts_with(MISSING_SECTIONS_PREFIX) {
        "Add clear section headers for Experience, Education, and Skills"
    } else {
        return None;
    };
    Some(text.to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Keywords
// ────────────────────────────────────────────────────────────────────────────

/// Technical keywords present in `text`, in list order.
pub fn extract_keywords(text: &str) -> Vec<&'static str> {
    let lowered = text.to_lowercase();
    KEYWORD_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(&lowered))
        .map(|(kw, _)| *kw)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordCheck {
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub total_keywords: usize,
    pub match_percentage: f64,
}

/// Splits the job description's technical keywords by presence in the resume.
pub fn check_keywords(resume_text: &str, job_description: &str) -> KeywordCheck {
    let resume_keywords = extract_keywords(resume_text);
    let (matched, missing): (Vec<&str>, Vec<&str>) = extract_keywords(job_description)
        .into_iter()
        .partition(|kw| resume_keywords.contains(kw));

    let total = matched.len() + missing.len();
    let match_percentage = if total == 0 {
        0.0
    } else {
        ((matched.len() as f64 / total as f64) * 100.0 * 100.0).round() / 100.0
    };

    KeywordCheck {
        matched_keywords: matched.into_iter().map(String::from).collect(),
        missing_keywords: missing.into_iter().map(String::from).collect(),
        total_keywords: total,
        match_percentage,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Merge into the model's review
// ────────────────────────────────────────────────────────────────────────────

/// Folds the heuristic checks into an ATS result.
///
/// Section completeness is replaced by the heuristic scores; format issues and
/// recommendations are unioned; the resume is ATS friendly only if both the
/// model and the heuristics say so.
pub fn merge_heuristics(result: &mut AtsReviewResult, resume_text: &str) {
    let heuristic = check_format_compatibility(resume_text);

    let format = &mut result.format_analysis;
    format.is_ats_friendly = format.is_ats_friendly && heuristic.is_ats_friendly;
    union_into(&mut format.issues, heuristic.issues);
    union_into(&mut format.recommendations, heuristic.recommendations);

    result.content_analysis.section_completeness = analyze_sections(resume_text).to_map();
}

fn union_into(target: &mut Vec<String>, extra: Vec<String>) {
    for item in extra {
        if !target.iter().any(|existing| existing.eq_ignore_ascii_case(&item)) {
            target.push(item);
        }
    }
}
