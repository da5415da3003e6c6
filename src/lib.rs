//! quiz-lens — screen quiz assistant pipeline.
//!
//! Continuously captures device screen frames, extracts text via OCR, and
//! streams answers from a language-model backend into a floating overlay.
//! This crate is the capture/OCR/answer core; the overlay renderer, the
//! real OCR engine, and the capture hardware are external collaborators
//! wired in through the seam traits:
//!
//!   - [`capture::RawImage`] / [`capture::FrameSource`] — the push-based
//!     pixel producer
//!   - [`ocr::TextRecognizer`] — `frame -> text`
//!   - [`llm::AnswerClient`] — streaming answer backend (HTTP
//!     implementation included)
//!
//! Data flows one way: producer → [`capture::FrameBuffer`] → prefetch loop
//! and [`scan::ScanOrchestrator`] → recognizer → cache / streaming client →
//! published [`scan::OverlayState`].

pub mod cache;
pub mod capture;
pub mod error;
pub mod llm;
pub mod ocr;
pub mod prefetch;
pub mod scan;
pub mod settings;

pub use cache::AnswerCache;
pub use capture::{DecodedFrame, FrameBuffer, FrameSource, RawImage};
pub use error::ScanError;
pub use llm::{AnswerClient, StreamingAnswerClient};
pub use ocr::TextRecognizer;
pub use prefetch::{PrefetchLoop, PrefetchSlot};
pub use scan::{OverlayState, ScanOrchestrator};
pub use settings::ApiConfig;

/// One-time process setup: load `.env.local`/`.env`, initialize logging.
/// Safe to call more than once; later calls are no-ops for the logger.
pub fn init() {
    settings::load_env_files();
    let _ = env_logger::Builder::from_default_env().try_init();
}
