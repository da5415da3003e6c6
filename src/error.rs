//! Error taxonomy for the scan pipeline.
//!
//! Recognition failures are deliberately NOT here: absence of text is a
//! normal outcome (blank screen), so the recognizer returns an empty string
//! instead of an error. Everything that can abort a scan lands in
//! [`ScanError`]; the orchestrator converts it into a terminal overlay state
//! and returns to idle — nothing in this enum is fatal to the process.

use thiserror::Error;

/// Failures that terminate a single scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Neither the cached frame nor a waited-for frame was available.
    #[error("no frame available")]
    CaptureFailed,

    /// The API key is missing or empty — checked before any request is sent.
    #[error("API key missing")]
    CredentialMissing,

    /// Connect/read failure on the answer request or mid-stream.
    #[error("request failed: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status.
    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// A raw producer buffer could not be decoded.
    #[error("frame decode failed: {0}")]
    FrameDecode(String),

    /// Catch-all for invariant violations that should not happen.
    #[error("unexpected: {0}")]
    Unexpected(String),
}

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        ScanError::Network(err.to_string())
    }
}

/// Shorten an error message for the overlay, which has room for one line.
pub fn truncate_message(msg: &str, max_chars: usize) -> String {
    if msg.chars().count() <= max_chars {
        msg.to_string()
    } else {
        msg.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_messages() {
        assert_eq!(truncate_message("timeout", 40), "timeout");
    }

    #[test]
    fn truncate_cuts_at_char_boundary() {
        let long = "x".repeat(100);
        assert_eq!(truncate_message(&long, 40).chars().count(), 40);
        // multi-byte safe
        let accented = "é".repeat(50);
        assert_eq!(truncate_message(&accented, 40).chars().count(), 40);
    }

    #[test]
    fn network_error_message_is_prefixed() {
        let err = ScanError::Network("connection reset".to_string());
        assert_eq!(err.to_string(), "request failed: connection reset");
    }

    #[test]
    fn api_error_carries_status_and_body() {
        let err = ScanError::Api {
            status: 429,
            body: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "API returned 429: rate limited");
    }
}
