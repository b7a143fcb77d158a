//! Heuristic section analyzer. No model call: keyword and regex rules over
//! lowercased resume text, all matches word-bounded.

use std::sync::LazyLock;

use regex::Regex;

use crate::analysis::models::SectionScores;

fn word_regex(alternatives: &str) -> Regex {
    Regex::new(&format!(r"\b(?:{alternatives})\b")).expect("section regex is valid")
}

static CONTACT_FIELDS: LazyLock<[Regex; 3]> =
    LazyLock::new(|| [word_regex("email"), word_regex("phone"), word_regex("location")]);

static SUMMARY_HEADER: LazyLock<Regex> = LazyLock::new(|| word_regex("summary|objective|profile"));
static EXPERIENCE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| word_regex("experience|work history|employment"));
static EDUCATION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| word_regex("education|academic|degree"));
static SKILLS_HEADER: LazyLock<Regex> =
    LazyLock::new(|| word_regex("skills|technical skills|competencies"));

/// Where the summary segment ends.
static SUMMARY_END: LazyLock<Regex> = LazyLock::new(|| word_regex("experience|education|skills"));
static EXPERIENCE_END: LazyLock<Regex> = LazyLock::new(|| word_regex("education|skills"));
static EDUCATION_END: LazyLock<Regex> = LazyLock::new(|| word_regex("skills|experience"));
/// The skills segment starts after the last of these.
static SKILLS_START: LazyLock<Regex> = LazyLock::new(|| word_regex("experience|education"));

static DATE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}[-–]\d{4}|\d{4}[-–]present").expect("date range regex is valid")
});
static DEGREE_TERMS: LazyLock<Regex> =
    LazyLock::new(|| word_regex("bachelor|master|phd|degree|diploma"));
static SKILL_TERMS: LazyLock<Regex> = LazyLock::new(|| {
    word_regex(
        r"python|java|javascript|sql|aws|react|angular|vue|node\.js|git|docker|kubernetes|agile|scrum",
    )
});

const CONTACT_POINTS_PER_FIELD: f64 = 33.33;

/// Scores the five standard sections of a resume, each 0–100.
pub fn analyze_sections(text: &str) -> SectionScores {
    let text = text.to_lowercase();
    SectionScores {
        contact: contact_score(&text),
        summary: summary_score(&text),
        experience: experience_score(&text),
        education: education_score(&text),
        skills: skills_score(&text),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn contact_score(text: &str) -> f64 {
    let matched = CONTACT_FIELDS.iter().filter(|re| re.is_match(text)).count();
    round2(matched as f64 * CONTACT_POINTS_PER_FIELD)
}

fn summary_score(text: &str) -> f64 {
    if !SUMMARY_HEADER.is_match(text) {
        return 0.0;
    }
    let end = SUMMARY_END.find(text).map_or(text.len(), |m| m.start());
    match text[..end].split_whitespace().count() {
        n if n >= 50 => 100.0,
        n if n >= 25 => 50.0,
        _ => 25.0,
    }
}

/// Slice from the first `header` match up to the next `end` match after it.
fn segment_after<'a>(text: &'a str, header: &Regex, end: &Regex) -> Option<&'a str> {
    let start = header.find(text)?;
    let rest = &text[start.end()..];
    let stop = end.find(rest).map_or(rest.len(), |m| m.start());
    Some(&rest[..stop])
}

fn experience_score(text: &str) -> f64 {
    let Some(segment) = segment_after(text, &EXPERIENCE_HEADER, &EXPERIENCE_END) else {
        return 0.0;
    };
    match DATE_RANGE.find_iter(segment).count() {
        n if n >= 3 => 100.0,
        2 => 75.0,
        1 => 50.0,
        _ => 25.0,
    }
}

fn education_score(text: &str) -> f64 {
    let Some(header) = EDUCATION_HEADER.find(text) else {
        return 0.0;
    };
    // The header itself may be a degree term ("degree"), so count from its start.
    let rest = &text[header.start()..];
    let stop = EDUCATION_END.find(rest).map_or(rest.len(), |m| m.start());
    match DEGREE_TERMS.find_iter(&rest[..stop]).count() {
        n if n >= 2 => 100.0,
        1 => 75.0,
        _ => 50.0,
    }
}

fn skills_score(text: &str) -> f64 {
    if !SKILLS_HEADER.is_match(text) {
        return 0.0;
    }
    let start = SKILLS_START.find_iter(text).last().map_or(0, |m| m.end());
    match SKILL_TERMS.find_iter(&text[start..]).count() {
        n if n >= 5 => 100.0,
        n if n >= 3 => 75.0,
        n if n >= 1 => 50.0,
        _ => 25.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_fields_sum_to_99_99() {
        let scores = analyze_sections("Contact: email phone location");
        assert_eq!(scores.contact, 99.99);
    }

    #[test]
    fn test_contact_partial_and_word_bounded() {
        assert_eq!(analyze_sections("Email: jane@x.io").contact, 33.33);
        assert_eq!(analyze_sections("emails telephone relocation").contact, 0.0);
    }

    #[test]
    fn test_experience_three_ranges_scores_full() {
        let text = "Experience\nAcme 2015-2017\nGlobex 2017-2019\nInitech 2019-2023\nEducation\nBSc";
        assert_eq!(analyze_sections(text).experience, 100.0);
    }

    #[test]
    fn test_experience_ranges_after_next_header_not_counted() {
        let text = "EXPERIENCE\nAcme 2019–present\nEDUCATION\nUniversity 2012-2016\nSkills";
        assert_eq!(analyze_sections(text).experience, 50.0);
    }

    #[test]
    fn test_experience_header_without_ranges() {
        assert_eq!(analyze_sections("Work history: various roles").experience, 25.0);
    }

    #[test]
    fn test_empty_text_scores_zero_everywhere() {
        assert_eq!(analyze_sections(""), SectionScores::default());
    }

    #[test]
    fn test_summary_word_thresholds() {
        let short = format!("Summary {}\nExperience", "word ".repeat(10));
        assert_eq!(analyze_sections(&short).summary, 25.0);
        let medium = format!("Profile {}\nSkills", "word ".repeat(30));
        assert_eq!(analyze_sections(&medium).summary, 50.0);
        let long = format!("Objective {}", "word ".repeat(60));
        assert_eq!(analyze_sections(&long).summary, 100.0);
    }

    #[test]
    fn test_education_degree_terms() {
        let text = "Education\nBachelor of Science\nMaster of Engineering\nSkills: git";
        assert_eq!(analyze_sections(text).education, 100.0);
        assert_eq!(analyze_sections("Academic record: honours").education, 50.0);
        assert_eq!(analyze_sections("Education: Diploma in IT").education, 75.0);
    }

    #[test]
    fn test_skills_counted_after_last_experience_or_education() {
        let text = "Experience: python at Acme\nEducation: BSc\nSkills: Python, SQL, AWS, Docker, Git";
        assert_eq!(analyze_sections(text).skills, 100.0);

        let text = "Skills: python java sql\nExperience: Acme";
        assert_eq!(analyze_sections(text).skills, 25.0);

        let text = "Technical skills: node.js, react, vue";
        assert_eq!(analyze_sections(text).skills, 75.0);
    }
}
