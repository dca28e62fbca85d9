//! LLM Client — the single point of entry for all Gemini API calls in the
//! screener.
//!
//! ARCHITECTURAL RULE: no other module may call the provider API directly.
//! The scorer sees only the `GenerativeModel` trait and `score_prompt`, which
//! absorbs every failure mode (HTTP, API, parse) into retries and, on
//! exhaustion, a terminal Error assessment — never an exception.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::assessment::Assessment;
use crate::config::ScoringConfig;
use crate::normalize::parse_assessment;

pub mod prompts;
#[cfg(test)]
pub(crate) mod testkit;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const JSON_MIME_TYPE: &str = "application/json";
/// Marker written to the raw debug sink before any retried attempt's output.
const RETRY_MARKER: &str = "\n\n--- RETRY ---\n";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("blocked by safety filter: {0}")]
    Blocked(String),

    #[error("model returned empty content")]
    EmptyContent,
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types for the generateContent endpoint
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: &'a GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl GenerateResponse {
    /// Extracts the payload text in fixed priority order: safety-block check
    /// first, then the first candidate's parts concatenated. The provider has
    /// returned its payload through different shapes across versions; this is
    /// the one place that variability is allowed to live.
    fn text(&self) -> Result<String, LlmError> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|pf| pf.block_reason.as_deref())
        {
            return Err(LlmError::Blocked(reason.to_string()));
        }

        let text: String = self
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(text)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Model capability seam
// ────────────────────────────────────────────────────────────────────────────

/// The generative-model capability: a fully-rendered prompt in, raw response
/// text out. Implemented by `GeminiClient`; mocked in tests.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Gemini `generateContent` client with fixed sampling parameters and a JSON
/// response schema. One instance is shared read-only across a whole run.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    generation_config: GenerationConfig,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, config: &ScoringConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        Ok(GeminiClient {
            client,
            api_key,
            model,
            generation_config: GenerationConfig {
                temperature: config.temperature,
                top_p: config.top_p,
                top_k: config.top_k_sampling,
                response_mime_type: JSON_MIME_TYPE,
                response_schema: prompts::assessment_schema(),
            },
        })
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let request_body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: &self.generation_config,
        };

        let response = self
            .client
            .post(format!("{GEMINI_API_BASE}/{}:generateContent", self.model))
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", JSON_MIME_TYPE)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        parsed.text()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Retry loop
// ────────────────────────────────────────────────────────────────────────────

/// Scores one rendered prompt, retrying up to `max_retries` times on any
/// failure — invocation errors and malformed output alike, with no
/// distinction between transient and permanent causes (known limitation,
/// preserved deliberately). Backoff grows linearly with the attempt number.
///
/// A safety-blocked response short-circuits to an Error assessment without
/// further retries. On exhaustion the last failure is folded into the
/// `reasoning` of an Error assessment; this function never fails.
pub async fn score_prompt(
    model: &dyn GenerativeModel,
    prompt: &str,
    config: &ScoringConfig,
    raw_sink: Option<&Path>,
) -> Assessment {
    let mut last_failure = String::new();

    for attempt in 1..=config.max_retries.max(1) {
        if attempt > 1 {
            let delay = config.retry_base_delay * (attempt - 1);
            warn!(
                "scoring attempt {} failed ({last_failure}), retrying after {}ms",
                attempt - 1,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        match model.generate(prompt).await {
            Ok(raw) => {
                append_raw(raw_sink, &raw);
                match parse_assessment(&raw) {
                    Some(assessment) => {
                        debug!("scored prompt on attempt {attempt}: {}", assessment.score);
                        return assessment;
                    }
                    None => last_failure = "model did not return valid JSON".to_string(),
                }
            }
            Err(LlmError::Blocked(reason)) => {
                let message = format!("Blocked by safety filter: {reason}");
                append_raw(raw_sink, &message);
                return Assessment::error(message);
            }
            Err(e) => last_failure = e.to_string(),
        }
    }

    Assessment::error(format!("Scoring failed: {last_failure}"))
}

/// Appends one attempt's raw output to the per-chunk debug sink. The sink is
/// a side channel: write failures are logged, never surfaced to scoring.
fn append_raw(sink: Option<&Path>, text: &str) {
    let Some(path) = sink else { return };
    let retried = path.exists();
    let result = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| {
            if retried {
                file.write_all(RETRY_MARKER.as_bytes())?;
            }
            file.write_all(text.as_bytes())
        });
    if let Err(e) = result {
        warn!("failed to append raw model output to {}: {e}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::testkit::ScriptedModel;
    use super::*;
    use crate::assessment::Verdict;

    fn quick_config() -> ScoringConfig {
        ScoringConfig {
            retry_base_delay: std::time::Duration::from_millis(1),
            ..ScoringConfig::default()
        }
    }

    #[tokio::test]
    async fn test_first_attempt_success_consumes_one_call() {
        let model = ScriptedModel::new(vec![
            Ok(r#"{"score": 88, "verdict": "Strong Fit"}"#.to_string()),
            Ok(r#"{"score": 1, "verdict": "Not a Fit"}"#.to_string()),
        ]);
        let a = score_prompt(&model, "prompt", &quick_config(), None).await;
        assert_eq!(a.score, 88);
        assert_eq!(a.verdict, Verdict::StrongFit);
        assert_eq!(model.remaining(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_then_succeeds() {
        let model = ScriptedModel::new(vec![
            Err(LlmError::Api {
                status: 503,
                message: "overloaded".to_string(),
            }),
            Ok("total garbage, not json".to_string()),
            Ok(r#"{"score": 64, "verdict": "Good Fit"}"#.to_string()),
        ]);
        let a = score_prompt(&model, "prompt", &ScoringConfig::default(), None).await;
        assert_eq!(a.score, 64);
        assert_eq!(model.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_yield_error_assessment() {
        let model = ScriptedModel::new(vec![
            Ok("nope".to_string()),
            Ok("still nope".to_string()),
            Ok("never json".to_string()),
        ]);
        let a = score_prompt(&model, "prompt", &ScoringConfig::default(), None).await;
        assert_eq!(a.verdict, Verdict::Error);
        assert_eq!(a.score, 0);
        assert!(a.reasoning.starts_with("Scoring failed:"));
        assert!(a.reasoning.contains("valid JSON"));
    }

    #[tokio::test]
    async fn test_blocked_response_short_circuits_without_retry() {
        let model = ScriptedModel::new(vec![
            Err(LlmError::Blocked("SAFETY".to_string())),
            Ok(r#"{"score": 99, "verdict": "Strong Fit"}"#.to_string()),
        ]);
        let a = score_prompt(&model, "prompt", &quick_config(), None).await;
        assert_eq!(a.verdict, Verdict::Error);
        assert!(a.reasoning.contains("Blocked by safety filter: SAFETY"));
        // The second scripted response was never requested.
        assert_eq!(model.remaining(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_raw_sink_collects_attempts_with_retry_marker() {
        let dir = tempfile::tempdir().unwrap();
        let sink = dir.path().join("resume.part1.txt");
        let model = ScriptedModel::new(vec![
            Ok("bad output".to_string()),
            Ok(r#"{"score": 12, "verdict": "Not a Fit"}"#.to_string()),
        ]);
        let a = score_prompt(&model, "prompt", &ScoringConfig::default(), Some(&sink)).await;
        assert_eq!(a.score, 12);

        let contents = std::fs::read_to_string(&sink).unwrap();
        assert!(contents.starts_with("bad output"));
        assert!(contents.contains("--- RETRY ---"));
        assert!(contents.contains("\"score\": 12"));
    }

    #[test]
    fn test_response_text_prefers_block_reason() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{
                "candidates": [{"content": {"parts": [{"text": "ignored"}]}}],
                "promptFeedback": {"blockReason": "SAFETY"}
            }"#,
        )
        .unwrap();
        assert!(matches!(response.text(), Err(LlmError::Blocked(r)) if r == "SAFETY"));
    }

    #[test]
    fn test_response_text_concatenates_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "{\"score\""}, {"text": ": 5}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.text().unwrap(), "{\"score\": 5}");
    }

    #[test]
    fn test_response_without_candidates_is_empty_content() {
        let response: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(response.text(), Err(LlmError::EmptyContent)));
    }
}
