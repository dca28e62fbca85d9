//! Pipeline Orchestrator — one end-to-end run over a fixed resume set.
//!
//! Flow: setup (output dirs + model client) → per-resume extract → score →
//!       progress notification → rank → artifacts → archive.
//!
//! A single resume's failure never aborts the run: every extraction or
//! scoring failure is folded into an Error assessment, so the ranked output
//! always has exactly one entry per input resume. Only setup failures and
//! artifact I/O are fatal.

use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::artifacts::{bundle_outputs, write_artifacts};
use crate::assessment::{Assessment, ScoredResume};
use crate::config::ScoringConfig;
use crate::errors::ScreenError;
use crate::extract::extract_text;
use crate::llm_client::{GeminiClient, GenerativeModel};
use crate::scorer::score_resume;

/// Per-resume progress notification: `(index_1based, total, path, assessment)`.
/// Fire-and-forget — a panicking observer is swallowed and the run continues.
pub type ProgressFn<'a> = dyn Fn(usize, usize, &Path, &Assessment) + Send + Sync + 'a;

/// The unit of execution: fixed JD, fixed ordered resume set, one model
/// configuration, one `top_k` bound.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub resume_paths: Vec<PathBuf>,
    pub jd_text: String,
    pub model_name: String,
    pub top_k: usize,
    pub api_key: String,
    /// Persistent output root; `None` → fresh temp directory for this run.
    pub persist_root: Option<PathBuf>,
}

#[derive(Debug)]
pub struct RunOutput {
    pub archive_path: PathBuf,
    pub ranked: Vec<ScoredResume>,
}

/// Runs the whole pipeline and returns the archive location plus the ranked
/// results. Resumes are processed strictly one at a time in input order.
pub async fn run_pipeline(
    params: &RunParams,
    config: &ScoringConfig,
    progress: Option<&ProgressFn<'_>>,
) -> Result<RunOutput, ScreenError> {
    if params.api_key.trim().is_empty() {
        return Err(ScreenError::Setup("API key is empty".to_string()));
    }

    let root = prepare_root_dir(params.persist_root.as_deref())?;
    let output_dir = root.join("output");
    let raw_dir = output_dir.join("raw");
    fs::create_dir_all(&raw_dir)?;
    info!("run root: {}", root.display());

    let model = GeminiClient::new(params.api_key.clone(), params.model_name.clone(), config)
        .map_err(|e| ScreenError::Setup(format!("failed to build model client: {e}")))?;

    let results = score_all(
        &model,
        &params.resume_paths,
        &params.jd_text,
        config,
        &raw_dir,
        progress,
    )
    .await;

    let ranked = rank(results);
    write_artifacts(&ranked, &output_dir, params.top_k)?;
    let archive_path = bundle_outputs(&root, &output_dir)?;

    Ok(RunOutput {
        archive_path,
        ranked,
    })
}

/// Scores every resume sequentially, isolating per-resume failures. Public
/// at the model seam so the loop is exercisable without a network.
pub async fn score_all(
    model: &dyn GenerativeModel,
    resume_paths: &[PathBuf],
    jd_text: &str,
    config: &ScoringConfig,
    raw_dir: &Path,
    progress: Option<&ProgressFn<'_>>,
) -> Vec<ScoredResume> {
    let total = resume_paths.len();
    let mut results = Vec::with_capacity(total);

    for (idx, path) in resume_paths.iter().enumerate() {
        let assessment = score_one(model, path, jd_text, config, raw_dir).await;
        info!(
            "[{}/{total}] {} → {} ({})",
            idx + 1,
            path.display(),
            assessment.verdict.as_label(),
            assessment.score
        );
        notify_progress(progress, idx + 1, total, path, &assessment);
        results.push(ScoredResume {
            path: path.clone(),
            assessment,
        });
    }

    results
}

async fn score_one(
    model: &dyn GenerativeModel,
    path: &Path,
    jd_text: &str,
    config: &ScoringConfig,
    raw_dir: &Path,
) -> Assessment {
    let text = match extract_text(path, config) {
        Ok(text) => text,
        Err(e) => return Assessment::error(format!("Pipeline failed: {e}")),
    };
    if text.is_empty() {
        let e = ScreenError::EmptyContent {
            path: path.to_path_buf(),
        };
        return Assessment::error(format!("Pipeline failed: {e}"));
    }

    let sink = config
        .debug_save_raw
        .then(|| raw_dir.join(format!("{}.txt", file_stem(path))));
    score_resume(model, &text, jd_text, config, sink.as_deref()).await
}

fn notify_progress(
    progress: Option<&ProgressFn<'_>>,
    index: usize,
    total: usize,
    path: &Path,
    assessment: &Assessment,
) {
    let Some(callback) = progress else { return };
    if catch_unwind(AssertUnwindSafe(|| callback(index, total, path, assessment))).is_err() {
        debug!("progress observer panicked; ignoring");
    }
}

/// Stable sort by descending score: equal scores keep processing order.
pub fn rank(mut results: Vec<ScoredResume>) -> Vec<ScoredResume> {
    results.sort_by(|a, b| b.assessment.score.cmp(&a.assessment.score));
    results
}

fn prepare_root_dir(persist_root: Option<&Path>) -> Result<PathBuf, ScreenError> {
    match persist_root {
        Some(root) => {
            fs::create_dir_all(root)?;
            Ok(root.to_path_buf())
        }
        None => {
            let dir = tempfile::Builder::new()
                .prefix("resume_screen_")
                .tempdir()?;
            // The run's outputs outlive this function; keep the directory.
            Ok(dir.keep())
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resume".to_string())
}
