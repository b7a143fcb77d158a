//! Text extraction from uploaded resume documents.
//!
//! Format is decided by content sniffing first and by the filename extension
//! second. Extraction borrows the upload buffer, so the caller still owns the
//! untouched bytes afterwards (they are stored as-is in blob storage).

mod docx;
mod legacy_doc;
mod rtf;

use std::io::Cursor;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported document format")]
    UnsupportedFormat,

    #[error("could not read {format:?} document: {reason}")]
    Malformed {
        format: DocumentFormat,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Doc,
    Rtf,
    PlainText,
}

impl DocumentFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Doc => "doc",
            DocumentFormat::Rtf => "rtf",
            DocumentFormat::PlainText => "txt",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DocumentFormat::Doc => "application/msword",
            DocumentFormat::Rtf => "application/rtf",
            DocumentFormat::PlainText => "text/plain; charset=utf-8",
        }
    }

    fn from_extension(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            "doc" => Some(DocumentFormat::Doc),
            "rtf" => Some(DocumentFormat::Rtf),
            "txt" => Some(DocumentFormat::PlainText),
            _ => None,
        }
    }
}

/// Plain text recovered from a document, plus the format it was read as.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub format: DocumentFormat,
    pub text: String,
}

const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Detects the document format from magic bytes, falling back to the filename.
pub fn detect_format(bytes: &[u8], filename: Option<&str>) -> Option<DocumentFormat> {
    sniff(bytes).or_else(|| filename.and_then(DocumentFormat::from_extension))
}

fn sniff(bytes: &[u8]) -> Option<DocumentFormat> {
    if bytes.starts_with(b"%PDF") {
        return Some(DocumentFormat::Pdf);
    }
    if bytes.starts_with(&ZIP_MAGIC) {
        // Any other ZIP (xlsx, odt, ...) is not a resume format we read.
        let is_docx = zip::ZipArchive::new(Cursor::new(bytes))
            .map(|mut archive| {
                let found = archive.by_name(docx::DOCUMENT_PART).is_ok();
                found
            })
            .unwrap_or(false);
        return is_docx.then_some(DocumentFormat::Docx);
    }
    if bytes.starts_with(&OLE_MAGIC) {
        return Some(DocumentFormat::Doc);
    }
    if bytes.starts_with(b"{\\rtf") {
        return Some(DocumentFormat::Rtf);
    }
    None
}

/// Extracts plain text from a document buffer.
///
/// CPU-bound for PDFs; async callers run it on `spawn_blocking`.
pub fn extract_text(
    bytes: &[u8],
    filename: Option<&str>,
) -> Result<ExtractedDocument, ExtractError> {
    let format = detect_format(bytes, filename).ok_or(ExtractError::UnsupportedFormat)?;
    debug!(?format, size = bytes.len(), "Extracting document text");

    let text = match format {
        DocumentFormat::Pdf => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Malformed {
                format,
                reason: e.to_string(),
            })?
        }
        DocumentFormat::Docx => docx::extract(bytes).map_err(|reason| ExtractError::Malformed {
            format,
            reason,
        })?,
        DocumentFormat::Doc => legacy_doc::extract(bytes),
        DocumentFormat::Rtf => rtf::strip(&String::from_utf8_lossy(bytes)),
        DocumentFormat::PlainText => {
            String::from_utf8(bytes.to_vec()).map_err(|e| ExtractError::Malformed {
                format,
                reason: e.to_string(),
            })?
        }
    };

    Ok(ExtractedDocument { format, text })
}
