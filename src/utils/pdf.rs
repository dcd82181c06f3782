// PDF utilities for the download pipeline: signature sniffing and
// page-by-page text extraction on top of `lopdf`.

use lopdf::Document;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to parse PDF: {0}")]
    Load(String),

    #[error("Encrypted PDF is not supported")]
    Encrypted,

    #[error("Downloaded file is not a PDF (content type: {content_type})")]
    NotPdf { content_type: String },

    #[error("PDF exceeds the allowed size limit ({size} bytes, limit {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },
}

/// Text of one page, trimmed. `number` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

/// Returns true if given content-type or head indicates a PDF file.
/// - Content-Type: application/pdf (case-insensitive, substring match)
/// - Magic bytes: %PDF-
pub fn is_pdf(content_type: Option<&str>, head: &[u8]) -> bool {
    let ct = content_type.unwrap_or("").to_ascii_lowercase();
    ct.contains("application/pdf") || head.starts_with(b"%PDF-")
}

/// Extracts text from a PDF stored fully in memory, one entry per page that
/// has any non-whitespace text, in document order.
///
/// A page whose text cannot be extracted is skipped, including when the
/// decoder panics on it; only a document that cannot be opened at all is an
/// error.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<PageText>, PdfError> {
    let mut doc = Document::load_mem(bytes).map_err(|e| {
        let msg = e.to_string();
        let lower = msg.to_ascii_lowercase();
        if lower.contains("encrypt") || lower.contains("decrypt") || lower.contains("password") {
            PdfError::Encrypted
        } else if declares_encryption(bytes) {
            debug!(target: "pdf", "Load failed on a document with an /Encrypt entry: {}", msg);
            PdfError::Encrypted
        } else {
            PdfError::Load(msg)
        }
    })?;

    // Documents with an empty user password open without prompting
    if doc.is_encrypted() {
        if let Err(e) = doc.decrypt("") {
            debug!(target: "pdf", "Empty-password decryption failed: {}", e);
            return Err(PdfError::Encrypted);
        }
        debug!(target: "pdf", "Decrypted PDF with empty user password");
    }

    let pages = doc.get_pages();
    debug!(target: "pdf", page_count = pages.len(), "PDF document loaded");

    let extracted = pages
        .keys()
        .filter_map(|&number| page_text(number, || doc.extract_text(&[number])))
        .collect();

    Ok(extracted)
}

/// Runs one page's extraction, turning an error, a panic or a blank result
/// into `None`.
fn page_text<F, E>(number: u32, extract: F) -> Option<PageText>
where
    F: FnOnce() -> Result<String, E>,
    E: Display,
{
    match panic::catch_unwind(AssertUnwindSafe(extract)) {
        Ok(Ok(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                debug!(target: "pdf", page = number, "Page has no text; omitted");
                None
            } else {
                Some(PageText {
                    number,
                    text: trimmed.to_string(),
                })
            }
        }
        Ok(Err(e)) => {
            debug!(target: "pdf", page = number, "Page text extraction failed, skipping: {}", e);
            None
        }
        Err(_) => {
            warn!(target: "pdf", page = number, "Page text extraction panicked, skipping");
            None
        }
    }
}

fn declares_encryption(bytes: &[u8]) -> bool {
    bytes.windows(8).any(|w| w == b"/Encrypt")
}
