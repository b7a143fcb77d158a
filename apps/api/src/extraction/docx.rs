//! DOCX reader: paragraph text from `word/document.xml`, one paragraph per line.

use std::io::{Cursor, Read};
use std::sync::LazyLock;

use regex::Regex;

pub(super) const DOCUMENT_PART: &str = "word/document.xml";

/// A paragraph element, with or without content. `<w:pPr>` is not a paragraph.
static PARAGRAPH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:p(?:\s[^>]*)?/>|<w:p(?:\s[^>]*)?>(.*?)</w:p>")
        .expect("paragraph regex is valid")
});

/// Text runs, tabs and line breaks inside a paragraph, in order.
static RUN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>|<w:tab\s*/>|<w:br\s*/>")
        .expect("run regex is valid")
});

pub(super) fn extract(bytes: &[u8]) -> Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| e.to_string())?
        .read_to_string(&mut xml)
        .map_err(|e| e.to_string())?;

    Ok(paragraphs_to_text(&xml))
}

fn paragraphs_to_text(xml: &str) -> String {
    PARAGRAPH_REGEX
        .captures_iter(xml)
        .map(|paragraph| {
            let body = paragraph.get(1).map(|m| m.as_str()).unwrap_or_default();
            let mut line = String::new();
            for run in RUN_REGEX.captures_iter(body) {
                match run.get(1) {
                    Some(text) => line.push_str(&decode_entities(text.as_str())),
                    None if run[0].starts_with("<w:tab") => line.push('\t'),
                    None => line.push('\n'),
                }
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
