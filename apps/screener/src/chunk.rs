//! Chunker — overlapping windows over extracted resume text.
//!
//! Long resumes may exceed a single context window; each window is scored
//! independently downstream and the best result wins.

use crate::config::ScoringConfig;

/// Splits `text` into windows of at most `chunk_size` chars, consecutive
/// windows overlapping by `chunk_overlap` chars, the last window running to
/// the end of the text.
///
/// Text at or below `chunk_size` (or chunking disabled) comes back as a
/// single-element vec with the full text unchanged; an empty string yields a
/// single empty chunk. Offsets are char-based, so multi-byte input never
/// splits inside a code point.
pub fn chunk_text(text: &str, config: &ScoringConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();

    if !config.use_chunking || config.chunk_size == 0 || n <= config.chunk_size {
        return vec![text.to_string()];
    }

    // Clamp so the window start always advances, even with a misconfigured
    // overlap at or above the window size.
    let overlap = config.chunk_overlap.min(config.chunk_size - 1);

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + config.chunk_size).min(n);
        chunks.push(chars[start..end].iter().collect());
        if end == n {
            break;
        }
        start = end - overlap;
    }
    chunks
}
