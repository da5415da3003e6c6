//! SSE parsing for the chat-completions stream.
//!
//! The stream is newline-delimited `data: <json>` frames terminated by
//! `data: [DONE]`. Network chunks split frames arbitrarily, so callers
//! append chunks to a rolling `String` buffer and drain complete lines
//! from it here; the trailing partial line stays in the buffer for the
//! next chunk.

use serde_json::Value;

/// Terminator payload — ends the stream without a further emission.
pub const DONE_FRAME: &str = "[DONE]";

/// Drain complete `data:` payloads from `buffer`, leaving any partial
/// trailing line in place.
pub fn drain_data_frames(buffer: &mut String) -> Vec<String> {
    let mut frames = Vec::new();

    while let Some(newline) = buffer.find('\n') {
        let line: String = buffer.drain(..=newline).collect();
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(payload) = line.strip_prefix("data:") {
            frames.push(payload.trim().to_string());
        }
        // Non-data lines (comments, event names) are ignored.
    }

    frames
}

/// Pull the incremental token out of a streaming frame:
/// `choices[0].delta.content`. `Ok(None)` for valid frames without a
/// content delta (role prelude, finish_reason).
pub fn extract_delta(data: &str) -> Result<Option<String>, serde_json::Error> {
    let json: Value = serde_json::from_str(data)?;
    Ok(json["choices"][0]["delta"]["content"]
        .as_str()
        .map(|s| s.to_string()))
}

/// Pull the complete answer out of a non-streaming response body:
/// `choices[0].message.content`.
pub fn extract_message_content(body: &Value) -> Option<String> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_complete_frames_keeps_partial() {
        let mut buf = "data: {\"a\":1}\n\ndata: {\"b\":2}\ndata: {\"part".to_string();
        let frames = drain_data_frames(&mut buf);
        assert_eq!(frames, vec!["{\"a\":1}", "{\"b\":2}"]);
        assert_eq!(buf, "data: {\"part");

        buf.push_str("\":3}\n");
        let frames = drain_data_frames(&mut buf);
        assert_eq!(frames, vec!["{\"part\":3}"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn recognizes_done_frame() {
        let mut buf = "data: [DONE]\n".to_string();
        let frames = drain_data_frames(&mut buf);
        assert_eq!(frames, vec![DONE_FRAME]);
    }

    #[test]
    fn ignores_non_data_lines() {
        let mut buf = ": keep-alive\nevent: ping\ndata: {}\n".to_string();
        assert_eq!(drain_data_frames(&mut buf), vec!["{}"]);
    }

    #[test]
    fn extracts_content_delta() {
        let frame = r#"{"choices":[{"delta":{"content":"Par"}}]}"#;
        assert_eq!(extract_delta(frame).unwrap(), Some("Par".to_string()));
    }

    #[test]
    fn frame_without_delta_is_ok_none() {
        let frame = r#"{"choices":[{"delta":{"role":"assistant"},"finish_reason":null}]}"#;
        assert_eq!(extract_delta(frame).unwrap(), None);
    }

    #[test]
    fn malformed_frame_is_an_error_not_a_panic() {
        assert!(extract_delta("{not json").is_err());
    }

    #[test]
    fn extracts_single_shot_content() {
        let body: Value = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Paris"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_message_content(&body), Some("Paris".to_string()));
    }
}
