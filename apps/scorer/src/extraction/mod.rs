//! Document Extractor: turns an uploaded PDF into plain résumé text.
//!
//! Flow: magic-header check → lopdf load → drop pages past the limit →
//!       pdf-extract → whitespace normalisation.
//!
//! Extraction is CPU-bound and must run inside `tokio::task::spawn_blocking`;
//! `extract_resume_blocking` does that for async callers.

pub mod condense;

use bytes::Bytes;
use lopdf::Document;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, warn};

use crate::errors::AppError;

pub use condense::condense;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("The uploaded file is empty")]
    Empty,

    #[error("The uploaded file is not a PDF")]
    NotPdf,

    #[error("The PDF could not be read: {0}")]
    Malformed(String),

    #[error("The PDF contains no extractable text (is it a scanned image?)")]
    NoText,
}

/// Limits applied while reading a résumé.
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    /// Only the first `max_pages` pages are read. `0` reads every page.
    pub max_pages: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { max_pages: 3 }
    }
}

/// An uploaded résumé and the text extracted from it. Immutable once built.
#[derive(Debug, Clone)]
pub struct ResumeDocument {
    raw: Bytes,
    text: String,
    total_pages: usize,
    pages_read: usize,
}

impl ResumeDocument {
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn pages_read(&self) -> usize {
        self.pages_read
    }
}

/// Returns true if the bytes start with the `%PDF-` header.
pub fn is_pdf(head: &[u8]) -> bool {
    head.starts_with(PDF_MAGIC)
}

/// Extracts text from the first `options.max_pages` pages of a PDF.
///
/// Never returns empty text: a PDF without a text layer is `ExtractError::NoText`.
pub fn extract_resume(raw: Bytes, options: &ExtractOptions) -> Result<ResumeDocument, ExtractError> {
    if raw.is_empty() {
        return Err(ExtractError::Empty);
    }
    if !is_pdf(&raw) {
        return Err(ExtractError::NotPdf);
    }

    let mut document =
        Document::load_mem(&raw).map_err(|e| ExtractError::Malformed(e.to_string()))?;

    let total_pages = document.get_pages().len();
    if total_pages == 0 {
        return Err(ExtractError::NoText);
    }

    let (pages_read, text) = if options.max_pages > 0 && total_pages > options.max_pages {
        let dropped: Vec<u32> = ((options.max_pages as u32 + 1)..=(total_pages as u32)).collect();
        debug!(
            "Reading {} of {} pages, dropping {:?}",
            options.max_pages, total_pages, dropped
        );
        document.delete_pages(&dropped);

        let mut trimmed = Vec::with_capacity(raw.len());
        document
            .save_to(&mut trimmed)
            .map_err(|e| ExtractError::Malformed(e.to_string()))?;
        (options.max_pages, read_text(&trimmed)?)
    } else {
        (total_pages, read_text(&raw)?)
    };

    let text = normalize_whitespace(&text);
    if text.is_empty() {
        return Err(ExtractError::NoText);
    }

    Ok(ResumeDocument {
        raw,
        text,
        total_pages,
        pages_read,
    })
}

/// Runs `extract_resume` on the blocking pool.
pub async fn extract_resume_blocking(
    raw: Bytes,
    options: ExtractOptions,
) -> Result<ResumeDocument, AppError> {
    match tokio::task::spawn_blocking(move || extract_resume(raw, &options)).await {
        Ok(result) => Ok(result?),
        Err(e) => Err(join_failure(e)),
    }
}

/// A panic inside the PDF libraries is reported as a malformed document.
/// Any other join failure (the task was cancelled) is internal.
fn join_failure(e: JoinError) -> AppError {
    if e.is_panic() {
        warn!("PDF extraction task panicked: {e}");
        ExtractError::Malformed("the PDF reader crashed on this file".to_string()).into()
    } else {
        AppError::Internal(anyhow::Error::new(e).context("PDF extraction task did not complete"))
    }
}

fn read_text(pdf: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(pdf).map_err(|e| ExtractError::Malformed(e.to_string()))
}

/// Trims every line and collapses runs of blank lines into one.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_pending = false;

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            blank_pending = !out.is_empty();
            continue;
        }
        if blank_pending {
            out.push('\n');
            blank_pending = false;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }

    out
}
