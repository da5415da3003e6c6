//! Speculative OCR prefetch.
//!
//! A background loop pulls the latest frame every two seconds, runs
//! recognition, and parks the text with a timestamp. When a scan request
//! lands, fresh-enough prefetched text skips the capture + OCR latency
//! entirely.

use crate::capture::FrameBuffer;
use crate::ocr::TextRecognizer;
use crate::scan::MIN_QUESTION_LEN;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Interval between prefetch iterations.
pub const PREFETCH_INTERVAL: Duration = Duration::from_millis(2000);

/// Maximum age at which prefetched text may replace a fresh capture.
pub const FRESHNESS_WINDOW: Duration = Duration::from_millis(3000);

/// Recognized text plus the moment it was captured.
#[derive(Debug, Clone)]
pub struct PrefetchedText {
    pub text: String,
    pub captured_at: Instant,
}

/// Single-slot mailbox for the most recent prefetched text.
///
/// One writer (the loop), one reader at a time (the active scan); the
/// mutex only guards the swap.
#[derive(Default)]
pub struct PrefetchSlot {
    slot: Mutex<Option<PrefetchedText>>,
}

impl PrefetchSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, text: String) {
        *self.slot.lock().unwrap() = Some(PrefetchedText {
            text,
            captured_at: Instant::now(),
        });
    }

    /// Return the stored text if it is long enough (in characters) and
    /// strictly younger than `max_age`.
    pub fn fresh(&self, min_len: usize, max_age: Duration) -> Option<String> {
        let guard = self.slot.lock().unwrap();
        guard
            .as_ref()
            .filter(|p| {
                p.text.trim().chars().count() >= min_len && p.captured_at.elapsed() < max_age
            })
            .map(|p| p.text.clone())
    }
}

/// Handle to the running prefetch task.
pub struct PrefetchLoop {
    cancel: CancellationToken,
}

impl PrefetchLoop {
    /// Spawn the loop. Runs until [`stop`](Self::stop).
    pub fn spawn(
        frames: Arc<FrameBuffer>,
        recognizer: Arc<dyn TextRecognizer>,
        slot: Arc<PrefetchSlot>,
    ) -> Self {
        let cancel = CancellationToken::new();
        tokio::spawn(prefetch_loop(frames, recognizer, slot, cancel.clone()));
        Self { cancel }
    }

    /// Idempotent, non-blocking stop.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

async fn prefetch_loop(
    frames: Arc<FrameBuffer>,
    recognizer: Arc<dyn TextRecognizer>,
    slot: Arc<PrefetchSlot>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(PREFETCH_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Never wait for a frame here — a missed iteration costs
                // nothing, stalling the loop costs freshness.
                let Some(frame) = frames.capture_frame() else { continue };
                let text = recognizer.recognize(&frame).await;
                if text.trim().chars().count() >= MIN_QUESTION_LEN {
                    log::debug!("[PREFETCH] stored {} chars", text.chars().count());
                    slot.store(text);
                } else {
                    // Keep whatever we had; stale-but-present beats nothing.
                    log::trace!("[PREFETCH] below threshold, skipped");
                }
            }
            _ = cancel.cancelled() => {
                log::info!("[PREFETCH] loop shutting down");
                break;
            }
        }
    }
}
