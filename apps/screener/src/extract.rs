//! Text Extractor — one PDF file to bounded plain text.

use std::path::Path;

use tracing::debug;

use crate::config::ScoringConfig;
use crate::errors::ScreenError;

/// Extracts the text of every page in page order, truncated to
/// `max_text_chars` and trimmed.
///
/// An unreadable or unparseable file is an `Extraction` error. A document
/// with no extractable text (e.g. a scanned image without an OCR layer)
/// returns `Ok("")` — callers treat empty text as a distinct failure.
pub fn extract_text(path: &Path, config: &ScoringConfig) -> Result<String, ScreenError> {
    let text = pdf_extract::extract_text(path).map_err(|e| ScreenError::Extraction {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let bounded = truncate_chars(&text, config.max_text_chars);
    debug!(
        "extracted {} chars from {} ({} after truncation)",
        text.chars().count(),
        path.display(),
        bounded.chars().count()
    );
    Ok(bounded.trim().to_string())
}

/// Truncates on a char boundary, never mid code point.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
