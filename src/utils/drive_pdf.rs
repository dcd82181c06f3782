//! Google Drive PDF pipeline: resolve the share link, download the file,
//! extract page text and render the outcome as markdown.
//!
//! The pipeline itself returns a typed [`Result`]. Hosts that only understand
//! plain text use [`render_result`], which produces either the markdown
//! document or a message prefixed with a bold category label
//! (`**Error:**`, `**Network Error:**`, `**Processing Error:**`).

use std::error::Error as StdError;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

use crate::utils::drive_fetch::DriveFetcher;
use crate::utils::drive_url::{resolve_download_url, DriveUrlError};
use crate::utils::pdf::{extract_pages, is_pdf, PageText, PdfError};

#[derive(Debug, Error)]
pub enum DrivePdfError {
    #[error(transparent)]
    Validation(#[from] DriveUrlError),

    #[error("{}", error_chain(.0))]
    Network(#[from] reqwest::Error),

    #[error("Could not extract text from PDF. File might be image-based or corrupted.")]
    NoText,

    #[error(transparent)]
    Processing(#[from] PdfError),

    #[error("PDF extraction worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl DrivePdfError {
    /// Bold category label that prefixes the rendered message.
    pub fn label(&self) -> &'static str {
        match self {
            DrivePdfError::Validation(_) | DrivePdfError::NoText => "**Error:**",
            DrivePdfError::Network(_) => "**Network Error:**",
            DrivePdfError::Processing(_) | DrivePdfError::Worker(_) => "**Processing Error:**",
        }
    }

    pub fn render(&self) -> String {
        format!("{} {}", self.label(), self)
    }
}

/// Joins an error with its sources, skipping causes already spelled out by
/// the outer message.
fn error_chain(err: &reqwest::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}

/// Non-empty pages of a downloaded PDF, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfContent {
    pub pages: Vec<PageText>,
}

impl PdfContent {
    pub fn to_markdown(&self) -> String {
        let sections: Vec<String> = self
            .pages
            .iter()
            .map(|page| format!("## Page {}\n\n{}", page.number, page.text.trim()))
            .collect();

        format!("# PDF Content\n\n{}", sections.join("\n\n"))
    }
}

pub fn render_result(result: &Result<PdfContent, DrivePdfError>) -> String {
    match result {
        Ok(content) => content.to_markdown(),
        Err(e) => e.render(),
    }
}

/// Downloads the PDF behind a Drive share link and extracts its text.
pub async fn download_drive_pdf(
    url: &str,
    fetcher: &DriveFetcher,
) -> Result<PdfContent, DrivePdfError> {
    let config = fetcher.config();
    let download_url = resolve_download_url(url, &config.download_base)?;
    info!(target: "drive_pdf", share_url = %url, download_url = %download_url, "Resolved Drive download URL");

    let file = fetcher.fetch(&download_url).await?;
    let size = file.bytes.len() as u64;

    if size > config.max_body_bytes {
        info!(target: "drive_pdf", size = size, limit = config.max_body_bytes, "PDF too large; refusing");
        return Err(PdfError::TooLarge {
            size,
            limit: config.max_body_bytes,
        }
        .into());
    }

    let head = &file.bytes[..file.bytes.len().min(512)];
    if !is_pdf(file.content_type.as_deref(), head) {
        warn!(target: "drive_pdf", ct = ?file.content_type, "Downloaded body is not a PDF");
        return Err(PdfError::NotPdf {
            content_type: file
                .content_type
                .unwrap_or_else(|| "unknown".to_string()),
        }
        .into());
    }

    info!(target: "drive_pdf", size = size, "Starting PDF text extraction");
    let started = Instant::now();
    let bytes = file.bytes;
    let pages = tokio::task::spawn_blocking(move || extract_pages(&bytes)).await??;

    if pages.is_empty() {
        warn!(target: "drive_pdf", "PDF contains no extractable text");
        return Err(DrivePdfError::NoText);
    }

    info!(
        target: "drive_pdf",
        pages = pages.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "PDF extraction succeeded"
    );
    Ok(PdfContent { pages })
}
