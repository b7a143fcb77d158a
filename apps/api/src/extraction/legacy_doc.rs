//! Legacy Word (OLE compound document) reader.
//!
//! Best-effort: collects runs of printable text from both the 8-bit and the
//! UTF-16LE encodings Word uses for its text stream. Binary noise shorter than
//! `MIN_RUN_CHARS` is dropped.

const MIN_RUN_CHARS: usize = 4;

pub(super) fn extract(bytes: &[u8]) -> String {
    let wide = utf16_runs(bytes);
    let narrow = ascii_runs(bytes);
    // Word stores text in one encoding; the richer scan is the real one.
    let runs = if char_total(&wide) >= char_total(&narrow) {
        wide
    } else {
        narrow
    };
    runs.join("\n")
}

fn char_total(runs: &[String]) -> usize {
    runs.iter().map(|r| r.chars().count()).sum()
}

/// Latin scripts plus general punctuation. 8-bit text misread as UTF-16
/// lands in CJK ranges, which keeps the two scans apart.
fn is_wide_text_unit(unit: u16) -> bool {
    unit < 0x0250 || (0x2000..=0x206F).contains(&unit)
}

fn is_text_char(c: char) -> bool {
    !c.is_control() || c == '\t'
}

fn flush(current: &mut String, runs: &mut Vec<String>) {
    let trimmed = current.trim();
    if trimmed.chars().count() >= MIN_RUN_CHARS && trimmed.chars().any(char::is_alphabetic) {
        runs.push(trimmed.to_string());
    }
    current.clear();
}

fn ascii_runs(bytes: &[u8]) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current = String::new();
    for &b in bytes {
        let c = char::from(b);
        if b.is_ascii() && is_text_char(c) {
            current.push(c);
        } else {
            flush(&mut current, &mut runs);
        }
    }
    flush(&mut current, &mut runs);
    runs
}

fn utf16_runs(bytes: &[u8]) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current = String::new();
    for pair in bytes.chunks_exact(2) {
        let unit = u16::from_le_bytes([pair[0], pair[1]]);
        match char::from_u32(u32::from(unit)) {
            Some(c) if is_wide_text_unit(unit) && is_text_char(c) => current.push(c),
            _ => flush(&mut current, &mut runs),
        }
    }
    flush(&mut current, &mut runs);
    runs
}
