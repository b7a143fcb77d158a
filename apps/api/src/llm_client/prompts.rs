// Shared prompt fragments used by every analysis template.
// Task-specific templates live in analysis::prompts.

/// System instruction that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise career-services assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

const SCORE_RANGE_RULE: &str = "- Every score is a number between 0 and 100";

/// Rule block naming the fields a task cannot return empty. Lists not named
/// here may be empty when nothing applies.
pub fn required_fields_rule(fields: &[&str]) -> String {
    format!(
        "- These fields are REQUIRED and must not be empty: {}\n\
         - Any other list may be empty when nothing applies; never invent entries to fill it\n\
         {SCORE_RANGE_RULE}",
        fields.join(", ")
    )
}
