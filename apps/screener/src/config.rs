use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub model_name: String,
    pub top_k: usize,
    pub default_pdf_dir: Option<PathBuf>,
    /// Persistent output root. Unset → a fresh temp directory per run.
    pub persist_root: Option<PathBuf>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            api_key: require_env("GEMINI_API_KEY")?,
            model_name: std::env::var("DEFAULT_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-pro".to_string()),
            top_k: std::env::var("TOP_K")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<usize>()
                .context("TOP_K must be a non-negative integer")?,
            default_pdf_dir: std::env::var("DEFAULT_PDF_DIR").ok().map(PathBuf::from),
            persist_root: std::env::var("RESUME_SCREEN_OUT").ok().map(PathBuf::from),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Per-run scoring constants. Constructed once per run and passed by reference
/// to every component — never ambient process-wide state.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Ceiling on extracted text length, in chars.
    pub max_text_chars: usize,
    pub use_chunking: bool,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k_sampling: u32,
    /// Attempts per chunk, covering both invocation and parse failures.
    pub max_retries: u32,
    /// Backoff between attempts is this delay × the attempt number.
    pub retry_base_delay: Duration,
    /// When set, every raw model response is appended to a per-chunk sink
    /// file under `output/raw/`.
    pub debug_save_raw: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            max_text_chars: 120_000,
            use_chunking: true,
            chunk_size: 60_000,
            chunk_overlap: 5_000,
            temperature: 0.2,
            top_p: 0.8,
            top_k_sampling: 40,
            max_retries: 3,
            retry_base_delay: Duration::from_millis(1500),
            debug_save_raw: true,
        }
    }
}
