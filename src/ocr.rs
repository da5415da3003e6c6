//! OCR seam — the engine itself lives outside this crate.
//!
//! The pipeline consumes recognition as an opaque `frame -> text`
//! capability: Vision/ML Kit/tesseract, whatever the host wires in.

use crate::capture::DecodedFrame;
use async_trait::async_trait;

/// Text recognition over a decoded frame.
///
/// A single async call, no retry. Implementations return an empty string
/// on failure: a blank screen with no readable text is a normal outcome,
/// not an error, and the pipeline treats the two identically.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, frame: &DecodedFrame) -> String;
}
