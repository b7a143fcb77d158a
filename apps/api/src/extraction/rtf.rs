//! Permissive RTF cleaner. Not a parser: control words, hex escapes and group
//! braces are stripped with regexes, and some mangled output is accepted.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Header groups whose content is never document text. One level of nesting.
static IGNORED_GROUP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\{\\(?:fonttbl|colortbl|stylesheet|info|\*)[^{}]*(?:\{[^{}]*\}[^{}]*)*\}",
    )
    .expect("ignored group regex is valid")
});

static TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\([{}\\])|\\'([0-9a-fA-F]{2})|\\([a-zA-Z]+)(-?\d+)? ?|\\[^a-zA-Z]|[{}]")
        .expect("rtf token regex is valid")
});

static SPACE_RUN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("space run regex is valid"));

pub(super) fn strip(rtf: &str) -> String {
    let without_headers = IGNORED_GROUP_REGEX.replace_all(rtf, "");
    // Raw line breaks in RTF source carry no meaning; \par does.
    let flattened = without_headers.replace("\r\n", "").replace('\n', "");

    let text = TOKEN_REGEX.replace_all(&flattened, |caps: &Captures| {
        if let Some(literal) = caps.get(1) {
            return literal.as_str().to_string();
        }
        if let Some(hex) = caps.get(2) {
            return u8::from_str_radix(hex.as_str(), 16)
                .map(|b| char::from(b).to_string())
                .unwrap_or_default();
        }
        match caps.get(3).map(|m| m.as_str()) {
            Some("par") | Some("line") => "\n".to_string(),
            Some("tab") => "\t".to_string(),
            _ => String::new(),
        }
    });

    text.lines()
        .map(|line| SPACE_RUN_REGEX.replace_all(line.trim(), " ").into_owned())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_control_words_and_braces() {
        let rtf = r"{\rtf1\ansi\deff0 {\fonttbl {\f0 Times New Roman;}}\f0\fs24 Jane Doe\par Experience\par}";
        assert_eq!(strip(rtf), "Jane Doe\nExperience");
    }

    #[test]
    fn test_escaped_literals_survive() {
        let rtf = r"{\rtf1 Use \{braces\} and a back\\slash}";
        assert_eq!(strip(rtf), r"Use {braces} and a back\slash");
    }

    #[test]
    fn test_hex_escapes_decode_as_latin1() {
        let rtf = r"{\rtf1 Caf\'e9 manager}";
        assert_eq!(strip(rtf), "Café manager");
    }

    #[test]
    fn test_destination_groups_removed() {
        let rtf = r"{\rtf1{\*\generator Riched20 10.0;}{\colortbl ;\red0\green0\blue0;}Skills: Python\par}";
        assert_eq!(strip(rtf), "Skills: Python");
    }
}
