//! Core data model — the normalized scoring result for one resume (or one
//! chunk of it) and the carriers the pipeline hands around.
//!
//! Every `Assessment` has all seven fields populated after normalization,
//! regardless of what the model returned. Partial failures become ordinary
//! `Verdict::Error` records, never exceptions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Closed-set fit classification for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Strong Fit")]
    StrongFit,
    #[serde(rename = "Good Fit")]
    GoodFit,
    Borderline,
    #[serde(rename = "Not a Fit")]
    NotAFit,
    Error,
}

impl Verdict {
    /// Parses the wire label the model is instructed to emit.
    pub fn from_label(label: &str) -> Option<Verdict> {
        match label {
            "Strong Fit" => Some(Verdict::StrongFit),
            "Good Fit" => Some(Verdict::GoodFit),
            "Borderline" => Some(Verdict::Borderline),
            "Not a Fit" => Some(Verdict::NotAFit),
            "Error" => Some(Verdict::Error),
            _ => None,
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            Verdict::StrongFit => "Strong Fit",
            Verdict::GoodFit => "Good Fit",
            Verdict::Borderline => "Borderline",
            Verdict::NotAFit => "Not a Fit",
            Verdict::Error => "Error",
        }
    }
}

/// Normalized scoring result. `score` is 0–100 by prompt contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub score: i64,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    pub verdict: Verdict,
    pub reasoning: String,
}

impl Assessment {
    /// Terminal error record — score 0, all free-text fields empty except the
    /// human-readable reason. This is a normal return value, not a failure.
    pub fn error(reasoning: impl Into<String>) -> Self {
        Assessment {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            score: 0,
            strengths: Vec::new(),
            gaps: Vec::new(),
            verdict: Verdict::Error,
            reasoning: reasoning.into(),
        }
    }
}

/// A resume's file identity paired with its best assessment. Created once per
/// input resume by the orchestrator, immutable thereafter.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredResume {
    pub path: PathBuf,
    pub assessment: Assessment,
}
