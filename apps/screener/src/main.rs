mod artifacts;
mod assessment;
mod chunk;
mod config;
mod errors;
mod extract;
mod llm_client;
mod normalize;
mod pipeline;
mod scorer;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use walkdir::WalkDir;

use crate::assessment::Assessment;
use crate::config::{Config, ScoringConfig};
use crate::pipeline::{run_pipeline, ProgressFn, RunParams};

/// Screen PDF resumes against a job description with Gemini.
#[derive(Debug, Parser)]
#[command(name = "screener", version)]
struct Cli {
    /// Folder containing PDF resumes (defaults to DEFAULT_PDF_DIR)
    #[arg(long, value_name = "DIR")]
    resumes: Option<PathBuf>,

    /// Include PDFs in all subfolders
    #[arg(long, default_value_t = false)]
    recursive: bool,

    /// Job description text file
    #[arg(
        long,
        value_name = "FILE",
        required_unless_present = "jd_text",
        conflicts_with = "jd_text"
    )]
    jd: Option<PathBuf>,

    /// Job description passed inline instead of as a file
    #[arg(long, value_name = "TEXT")]
    jd_text: Option<String>,

    /// Model name (defaults to DEFAULT_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Number of candidates in the narrative report (defaults to TOP_K)
    #[arg(long)]
    top_k: Option<usize>,

    /// Output root directory (defaults to RESUME_SCREEN_OUT or a fresh tempdir)
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Skip the per-chunk raw model-response capture under output/raw/
    #[arg(long, default_value_t = false)]
    no_raw: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    info!("Starting screener v{}", env!("CARGO_PKG_VERSION"));

    let jd_text = resolve_jd(cli.jd.as_deref(), cli.jd_text)?;

    let resumes_dir = cli
        .resumes
        .or_else(|| config.default_pdf_dir.clone())
        .context("no resumes folder given (use --resumes or DEFAULT_PDF_DIR)")?;
    let resume_paths = collect_pdfs(&resumes_dir, cli.recursive)?;
    info!(
        "Found {} PDF(s) in {}",
        resume_paths.len(),
        resumes_dir.display()
    );

    let params = RunParams {
        resume_paths,
        jd_text,
        model_name: cli.model.unwrap_or_else(|| config.model_name.clone()),
        top_k: cli.top_k.unwrap_or(config.top_k),
        api_key: config.api_key.clone(),
        persist_root: cli.out.or_else(|| config.persist_root.clone()),
    };
    let scoring = ScoringConfig {
        debug_save_raw: !cli.no_raw,
        ..ScoringConfig::default()
    };

    let bar = ProgressBar::new(params.resume_paths.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let progress = |_idx: usize, _total: usize, path: &Path, assessment: &Assessment| {
        bar.set_message(format!(
            "{} — {} ({})",
            path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
            assessment.verdict.as_label(),
            assessment.score
        ));
        bar.inc(1);
    };

    let output = run_pipeline(&params, &scoring, Some(&progress as &ProgressFn)).await?;
    bar.finish_and_clear();

    println!("\nRanked candidates:");
    for (idx, result) in output.ranked.iter().enumerate() {
        let a = &result.assessment;
        let who = if a.name.is_empty() {
            result
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            a.name.clone()
        };
        println!(
            "{:>4}. [{:>3}] {:<12} {}",
            idx + 1,
            a.score,
            a.verdict.as_label(),
            who
        );
    }
    println!("\nArchive: {}", output.archive_path.display());

    Ok(())
}

/// Resolves the job description from either an inline argument or a file.
fn resolve_jd(jd_file: Option<&Path>, jd_text: Option<String>) -> Result<String> {
    let text = match (jd_file, jd_text) {
        (_, Some(text)) => text,
        (Some(path), None) => fs::read_to_string(path)
            .with_context(|| format!("failed to read JD file {}", path.display()))?,
        (None, None) => anyhow::bail!("no job description given (use --jd or --jd-text)"),
    };
    anyhow::ensure!(!text.trim().is_empty(), "job description is empty");
    Ok(text)
}

/// Collects `*.pdf` files under `dir`, sorted by path for a deterministic
/// input order (which also fixes tie-break order in the ranking).
fn collect_pdfs(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    anyhow::ensure!(
        dir.is_dir(),
        "resumes folder {} does not exist or is not a directory",
        dir.display()
    );

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();
    Ok(paths)
}
