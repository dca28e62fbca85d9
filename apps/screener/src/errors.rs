use std::path::PathBuf;

use thiserror::Error;

use crate::llm_client::LlmError;

/// Pipeline-level error type.
///
/// Per-resume failures (`Extraction`, `EmptyContent`, model errors) are folded
/// into `Verdict::Error` assessments by the orchestrator and never abort a
/// run. Only `Setup` and artifact I/O errors terminate early.
#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("failed to extract text from {}: {message}", path.display())]
    Extraction { path: PathBuf, message: String },

    #[error("empty text extracted from {} (maybe scanned without OCR)", path.display())]
    EmptyContent { path: PathBuf },

    #[error("setup error: {0}")]
    Setup(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
