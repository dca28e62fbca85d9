// Prompt template and response schema for resume scoring.
// The schema is sent as `response_schema` so the provider constrains output
// shape; the normalizer still validates and coerces on our side.

use serde_json::{json, Value};

/// Scoring prompt. Replace `{job_desc}` and `{resume_text}` before sending.
pub const SCORING_PROMPT_TEMPLATE: &str = r#"You are an expert technical recruiter. Evaluate the CANDIDATE_RESUME against the JOB_DESCRIPTION and return a single JSON object (fitting the provided schema).

JOB_DESCRIPTION:
"""{job_desc}"""

CANDIDATE_RESUME (raw extracted text from PDF):
"""{resume_text}"""

Scoring rubric (0-100):
- Skills match (40): overlap with must-have tech/tools/skills.
- Relevant experience (30): years, domain fit, responsibilities aligned to JD.
- Impact & outcomes (15): quantifiable results, ownership.
- Communication & clarity (10): well-structured, concise profile.
- Bonus fit (5): preferred qualifications (e.g., location, domain).

Output only the JSON object fitting the provided schema.
"#;

/// Renders the scoring prompt for one resume chunk.
pub fn render_scoring_prompt(jd_text: &str, resume_text: &str) -> String {
    SCORING_PROMPT_TEMPLATE
        .replace("{job_desc}", jd_text)
        .replace("{resume_text}", resume_text)
}

/// JSON schema for the seven assessment fields, with `verdict` constrained to
/// the closed verdict set and `score` constrained to an integer.
pub fn assessment_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "email": {"type": "string"},
            "phone": {"type": "string"},
            "score": {"type": "integer"},
            "strengths": {"type": "array", "items": {"type": "string"}},
            "gaps": {"type": "array", "items": {"type": "string"}},
            "verdict": {
                "type": "string",
                "enum": ["Strong Fit", "Good Fit", "Borderline", "Not a Fit", "Error"]
            },
            "reasoning": {"type": "string"},
        },
        "required": ["name", "email", "phone", "score", "strengths", "gaps", "verdict", "reasoning"],
    })
}
