//! Transcript normalization
//!
//! Flattens speaker turns into the block embedded in the evaluation prompt.

use crate::types::TranscriptEntry;

/// Render one `- <role>: <content>` line per entry, in input order
///
/// Line breaks inside content are folded to spaces so each entry stays on a
/// single line. An empty transcript yields an empty string.
pub fn normalize(transcript: &[TranscriptEntry]) -> String {
    transcript
        .iter()
        .map(|entry| format!("- {}: {}\n", entry.role, single_line(&entry.content)))
        .collect()
}

fn single_line(content: &str) -> String {
    if !content.contains(['\n', '\r']) {
        return content.to_string();
    }
    content
        .split(['\n', '\r'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
