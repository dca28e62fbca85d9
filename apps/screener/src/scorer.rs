//! Resume Scorer — chunk-wise best-of scoring for one resume.
//!
//! Flow: chunk the extracted text → render the recruiter prompt per chunk →
//! score each chunk independently → keep the assessment with the strictly
//! highest score (ties keep the earliest chunk). Scoring windows
//! independently and taking the best avoids truncation bias on long resumes
//! while tolerating parse failures on individual windows.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::assessment::Assessment;
use crate::chunk::chunk_text;
use crate::config::ScoringConfig;
use crate::llm_client::prompts::render_scoring_prompt;
use crate::llm_client::{score_prompt, GenerativeModel};

/// Scores one resume's extracted text against the job description and
/// returns its best chunk-level assessment. Never fails: chunks that fail to
/// score contribute Error assessments like any other.
pub async fn score_resume(
    model: &dyn GenerativeModel,
    resume_text: &str,
    jd_text: &str,
    config: &ScoringConfig,
    raw_sink: Option<&Path>,
) -> Assessment {
    let chunks = chunk_text(resume_text, config);
    let total = chunks.len();

    let mut best: Option<Assessment> = None;
    for (idx, chunk) in chunks.iter().enumerate() {
        let part = idx + 1;
        let sink = raw_sink
            .filter(|_| config.debug_save_raw)
            .map(|base| chunk_sink_path(base, part));
        let prompt = render_scoring_prompt(jd_text, chunk);
        let assessment = score_prompt(model, &prompt, config, sink.as_deref()).await;
        debug!(
            "chunk {part}/{total}: score={} verdict={}",
            assessment.score,
            assessment.verdict.as_label()
        );
        match &best {
            Some(current) if assessment.score <= current.score => {}
            _ => best = Some(assessment),
        }
    }

    best.unwrap_or_else(|| Assessment::error("No chunks produced a valid score."))
}

/// Per-chunk sink file: `resume.txt` → `resume.part3.txt`.
fn chunk_sink_path(base: &Path, part: usize) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resume".to_string());
    base.with_file_name(format!("{stem}.part{part}.txt"))
}
