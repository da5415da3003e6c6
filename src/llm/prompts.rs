//! Prompt and request constants for the answer backend.

/// Answers are one word or a short phrase; 30 tokens is generous.
pub const MAX_TOKENS: u32 = 30;

/// Deterministic output — the same question should get the same answer.
pub const TEMPERATURE: f64 = 0.0;

/// Question text is truncated to this many characters before sending.
pub const MAX_QUESTION_CHARS: usize = 600;

pub const SYSTEM_PROMPT: &str = "You are a quiz assistant. The user sends text captured from a screen \
that contains a quiz question, possibly with answer options and OCR noise. \
Reply with ONLY the correct answer, as briefly as possible. No explanation, \
no punctuation beyond the answer itself.";

/// Clean OCR output before it goes into the request body.
///
/// Drops blank lines and fragments of two characters or fewer (OCR specks,
/// stray option letters), then truncates to [`MAX_QUESTION_CHARS`].
pub fn clean_question(text: &str) -> String {
    let cleaned = text
        .lines()
        .map(str::trim)
        .filter(|line| line.chars().count() > 2)
        .collect::<Vec<_>>()
        .join("\n");
    cleaned.chars().take(MAX_QUESTION_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_blank_lines_and_specks() {
        let raw = "What is 2+2?\n\n  \nA.\n4\nB)\nfive";
        assert_eq!(clean_question(raw), "What is 2+2?\nfive");
    }

    #[test]
    fn truncates_to_limit() {
        let raw = "q".repeat(2000);
        assert_eq!(clean_question(&raw).chars().count(), MAX_QUESTION_CHARS);
    }

    #[test]
    fn keeps_short_text_intact() {
        assert_eq!(clean_question("Who wrote Hamlet?"), "Who wrote Hamlet?");
    }
}
