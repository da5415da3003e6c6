//! Scan orchestration — the top-level state machine.
//!
//! A scan request resolves question text (prefetched if fresh, else a
//! fresh capture + OCR), short-circuits through the answer cache and a
//! fuzzy comparison against the previous question, and otherwise streams
//! an answer from the backend, publishing every partial into the overlay
//! state. One scan at a time; requests while busy are dropped, not queued.

pub mod similarity;

use crate::cache::AnswerCache;
use crate::capture::FrameBuffer;
use crate::error::{truncate_message, ScanError};
use crate::llm::AnswerClient;
use crate::ocr::TextRecognizer;
use crate::prefetch::{PrefetchLoop, PrefetchSlot, FRESHNESS_WINDOW};
use serde::Serialize;
use similarity::{jaccard, normalize_question};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Text shorter than this is not a question worth answering.
pub const MIN_QUESTION_LEN: usize = 10;

/// Word-set similarity at or above this redisplays the previous answer.
pub const SIMILARITY_THRESHOLD: f64 = 0.85;

/// How long step 2 waits for a frame when none is cached yet.
pub const FRAME_WAIT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Overlay error messages are cut to this many characters.
const ERROR_MESSAGE_MAX: usize = 40;

pub const INITIAL_PROMPT: &str = "Ready to scan";
pub const MSG_NO_QUESTION: &str = "No question found";
pub const MSG_CAPTURE_FAILED: &str = "Capture failed";
pub const MSG_SCANNING: &str = "Scanning...";
pub const MSG_THINKING: &str = "Thinking...";
const ERROR_PREFIX: &str = "Error: ";

/// Immutable snapshot published to the overlay renderer.
///
/// Replaced wholesale on each transition; readers never see a partially
/// updated state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayState {
    pub answer: String,
    pub is_loading: bool,
    pub status_text: String,
}

impl OverlayState {
    fn initial() -> Self {
        Self {
            answer: INITIAL_PROMPT.to_string(),
            is_loading: false,
            status_text: String::new(),
        }
    }
}

/// A displayed answer that is a placeholder, not a real answer.
/// Placeholders are never redisplayed by the fuzzy path and never cached.
fn is_placeholder_answer(answer: &str) -> bool {
    answer.is_empty()
        || answer == INITIAL_PROMPT
        || answer == MSG_NO_QUESTION
        || answer == MSG_CAPTURE_FAILED
        || answer.starts_with(ERROR_PREFIX)
}

struct ScanInner {
    frames: Arc<FrameBuffer>,
    recognizer: Arc<dyn TextRecognizer>,
    client: Arc<dyn AnswerClient>,
    prefetch: Arc<PrefetchSlot>,
    cache: Mutex<AnswerCache>,
    last_question: Mutex<Option<String>>,
    state_tx: watch::Sender<OverlayState>,
    in_flight: AtomicBool,
    cancel: CancellationToken,
}

/// Clears the in-flight flag on every exit path of a scan task,
/// cancellation included.
struct InFlightGuard(Arc<ScanInner>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::Release);
    }
}

pub struct ScanOrchestrator {
    inner: Arc<ScanInner>,
    prefetch_loop: Mutex<Option<PrefetchLoop>>,
}

impl ScanOrchestrator {
    pub fn new(
        frames: Arc<FrameBuffer>,
        recognizer: Arc<dyn TextRecognizer>,
        client: Arc<dyn AnswerClient>,
    ) -> Self {
        let (state_tx, _) = watch::channel(OverlayState::initial());
        Self {
            inner: Arc::new(ScanInner {
                frames,
                recognizer,
                client,
                prefetch: Arc::new(PrefetchSlot::new()),
                cache: Mutex::new(AnswerCache::default()),
                last_question: Mutex::new(None),
                state_tx,
                in_flight: AtomicBool::new(false),
                cancel: CancellationToken::new(),
            }),
            prefetch_loop: Mutex::new(None),
        }
    }

    /// Read-only observable of the published overlay state.
    pub fn subscribe(&self) -> watch::Receiver<OverlayState> {
        self.inner.state_tx.subscribe()
    }

    /// The slot the prefetch loop writes into. Fresh-enough text in here
    /// lets a scan skip capture and recognition entirely.
    pub fn prefetch_slot(&self) -> Arc<PrefetchSlot> {
        Arc::clone(&self.inner.prefetch)
    }

    /// Spawn the speculative OCR loop. No effect if already running.
    pub fn start_prefetch(&self) {
        let mut guard = self.prefetch_loop.lock().unwrap();
        if guard.is_none() {
            *guard = Some(PrefetchLoop::spawn(
                Arc::clone(&self.inner.frames),
                Arc::clone(&self.inner.recognizer),
                Arc::clone(&self.inner.prefetch),
            ));
        }
    }

    /// Fire-and-forget scan trigger.
    ///
    /// Returns false when a scan is already in flight (the request is
    /// dropped — no queueing) or the orchestrator is stopped.
    pub fn scan_once(&self) -> bool {
        if self.inner.cancel.is_cancelled() {
            return false;
        }
        if self
            .inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("[SCAN] already in flight — request dropped");
            return false;
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let _guard = InFlightGuard(Arc::clone(&inner));
            tokio::select! {
                _ = inner.cancel.cancelled() => {
                    log::info!("[SCAN] scan cancelled mid-flight");
                }
                _ = inner.run_scan() => {}
            }
        });
        true
    }

    /// Peek the cached answer for a question. Counts as a use for LRU
    /// eviction, same as the scan path's own lookup.
    pub fn cached_answer(&self, question: &str) -> Option<String> {
        self.inner
            .cache
            .lock()
            .unwrap()
            .get(&normalize_question(question))
    }

    /// Idempotent teardown: cancels the in-flight scan and the prefetch
    /// loop, releases the frame buffer.
    pub fn stop(&self) {
        self.inner.cancel.cancel();
        if let Some(prefetch) = self.prefetch_loop.lock().unwrap().take() {
            prefetch.stop();
        }
        self.inner.frames.release();
        log::info!("[SCAN] orchestrator stopped");
    }
}

impl ScanInner {
    fn publish(&self, answer: Option<String>, is_loading: bool, status_text: &str) {
        let answer = answer.unwrap_or_else(|| self.state_tx.borrow().answer.clone());
        self.state_tx.send_replace(OverlayState {
            answer,
            is_loading,
            status_text: status_text.to_string(),
        });
    }

    fn publish_error(&self, err: &ScanError) {
        let msg = truncate_message(&err.to_string(), ERROR_MESSAGE_MAX);
        self.publish(Some(format!("{}{}", ERROR_PREFIX, msg)), false, "");
    }

    async fn run_scan(&self) {
        // Step 1: in-flight is already claimed by scan_once.
        self.publish(None, true, MSG_SCANNING);

        // Step 2: resolve question text — prefetched if fresh, else capture.
        let text = match self.prefetch.fresh(MIN_QUESTION_LEN, FRESHNESS_WINDOW) {
            Some(text) => {
                log::info!("[SCAN] using prefetched text ({} chars)", text.len());
                text
            }
            None => {
                let frame = match self.frames.capture_frame() {
                    Some(frame) => Some(frame),
                    None => self.frames.capture_next_frame(FRAME_WAIT_TIMEOUT).await,
                };
                let Some(frame) = frame else {
                    log::warn!("[SCAN] no frame available");
                    self.publish(Some(MSG_CAPTURE_FAILED.to_string()), false, "");
                    return;
                };
                let text = self.recognizer.recognize(&frame).await;
                log::info!("[SCAN] OCR: {} chars", text.len());
                text
            }
        };

        // Step 3: length gate. Counted in characters, not bytes —
        // multibyte scripts reach the threshold the same way ASCII does.
        if text.trim().chars().count() < MIN_QUESTION_LEN {
            self.publish(Some(MSG_NO_QUESTION.to_string()), false, "");
            return;
        }

        // Step 4: exact cache check.
        let key = normalize_question(&text);
        if let Some(answer) = self.cache.lock().unwrap().get(&key) {
            log::info!("[SCAN] cache hit");
            self.publish(Some(answer), false, "");
            return;
        }

        // Step 5: fuzzy dedup against the previous question.
        let previous = self.last_question.lock().unwrap().clone();
        if let Some(previous) = previous {
            let similarity = jaccard(&text, &previous);
            if similarity >= SIMILARITY_THRESHOLD {
                let prior_answer = self.state_tx.borrow().answer.clone();
                if !is_placeholder_answer(&prior_answer) {
                    log::info!("[SCAN] fuzzy match ({:.2}) — redisplaying previous answer", similarity);
                    self.publish(Some(prior_answer), false, "");
                    return;
                }
            }
        }

        // Step 6: stream the answer.
        *self.last_question.lock().unwrap() = Some(text.clone());
        self.publish(None, true, MSG_THINKING);

        let mut rx = self.client.stream_answer(&text);
        let mut final_answer: Option<String> = None;

        while let Some(event) = rx.recv().await {
            match event {
                Ok(partial) => {
                    final_answer = Some(partial.clone());
                    self.publish(Some(partial), true, "");
                }
                Err(e) => {
                    log::error!("[SCAN] answer stream failed: {}", e);
                    self.publish_error(&e);
                    return;
                }
            }
        }

        // Channel closed: stream completed.
        match final_answer {
            Some(answer) if !answer.trim().is_empty() && !is_placeholder_answer(&answer) => {
                self.cache.lock().unwrap().put(key, answer.clone());
                self.publish(Some(answer), false, "");
            }
            Some(answer) => {
                // Completed but with nothing worth caching.
                self.publish(Some(answer), false, "");
            }
            None => {
                self.publish_error(&ScanError::Unexpected("empty response".into()));
            }
        }
    }
}
