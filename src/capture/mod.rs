//! Frame capture domain — bridges the push-based producer into a pull API.
//!
//! The capture surface pushes raw pixel buffers at us from its own callback
//! context; downstream consumers (the prefetch loop and the scan
//! orchestrator) want "give me the latest frame, now or soon". The
//! [`FrameBuffer`] sits between the two, holding exactly one decoded frame
//! at a time and guaranteeing the producer's buffer slot is returned before
//! each callback completes — the producer pool only has 2 slots, and a held
//! buffer stalls capture.

mod decode;

pub use decode::decode_raw;

use image::RgbaImage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::oneshot;

/// A raw pixel buffer handed over by the capture surface.
///
/// The buffer belongs to the producer's fixed-size pool; dropping the value
/// returns the slot. [`FrameBuffer::on_frame_arrived`] drops it before
/// returning on every path, success or failure.
pub trait RawImage: Send {
    /// Logical width in pixels.
    fn width(&self) -> u32;
    /// Logical height in pixels.
    fn height(&self) -> u32;
    /// Bytes per row. May exceed `width * pixel_stride` (row padding).
    fn row_stride(&self) -> usize;
    /// Bytes per pixel. The pipeline expects 4 (RGBA).
    fn pixel_stride(&self) -> usize;
    /// The pixel plane, at least `row_stride * height` bytes.
    fn data(&self) -> &[u8];
}

/// Teardown handle for the producer and its callback context.
/// Held by the [`FrameBuffer`] so `release()` can stop capture.
pub trait FrameSource: Send {
    fn stop(&mut self);
}

/// An owned, decoded frame, independent of the producer's buffer pool.
///
/// Hand-outs are clones; dropping one never affects the cached original.
#[derive(Clone)]
pub struct DecodedFrame {
    pub image: RgbaImage,
}

impl DecodedFrame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

impl std::fmt::Debug for DecodedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedFrame")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Owns the single "latest decoded frame" plus at most one pending waiter.
///
/// Mutation happens from the producer's callback context; `capture_frame`
/// may run concurrently from any task. Both slots are behind short `Mutex`
/// critical sections — the hot read path never awaits while locked.
pub struct FrameBuffer {
    latest: Mutex<Option<DecodedFrame>>,
    waiter: Mutex<Option<oneshot::Sender<DecodedFrame>>>,
    source: Mutex<Option<Box<dyn FrameSource>>>,
    closed: AtomicBool,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            latest: Mutex::new(None),
            waiter: Mutex::new(None),
            source: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Register the producer teardown handle so [`release`](Self::release)
    /// can stop capture.
    pub fn attach_source(&self, source: Box<dyn FrameSource>) {
        *self.source.lock().unwrap() = Some(source);
    }

    /// Producer callback: decode, return the raw buffer, deliver.
    ///
    /// The raw buffer is dropped (slot returned) immediately after decode,
    /// before any delivery or locking. A pending waiter gets the frame
    /// directly; otherwise it replaces the cached latest, releasing the one
    /// it replaces. Most-recent-wins: there is no queue.
    pub fn on_frame_arrived(&self, raw: Box<dyn RawImage>) {
        let decoded = decode_raw(raw.as_ref());
        drop(raw);

        let frame = match decoded {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("[FRAME] dropping undecodable frame: {}", e);
                return;
            }
        };

        if self.closed.load(Ordering::Acquire) {
            return;
        }

        // Exchange-and-clear: take the waiter slot so a concurrently
        // timing-out caller cannot also be delivered to.
        let pending = self.waiter.lock().unwrap().take();
        match pending {
            Some(tx) => {
                if let Err(frame) = tx.send(frame) {
                    // Waiter gave up between registration and delivery;
                    // keep the frame as the new latest instead.
                    self.store_latest(frame);
                }
            }
            None => self.store_latest(frame),
        }
    }

    fn store_latest(&self, frame: DecodedFrame) {
        *self.latest.lock().unwrap() = Some(frame);
    }

    /// Instant, non-blocking read of the latest frame.
    /// `None` only before the first frame has ever arrived.
    pub fn capture_frame(&self) -> Option<DecodedFrame> {
        self.latest.lock().unwrap().clone()
    }

    /// Wait for the next frame, up to `timeout`.
    ///
    /// Falls back to the cached latest frame (possibly still `None`) on
    /// timeout. The waiter slot is cleared on the way out so a late frame
    /// lands in the latest slot rather than a dead channel.
    pub async fn capture_next_frame(&self, timeout: Duration) -> Option<DecodedFrame> {
        let (tx, rx) = oneshot::channel();
        *self.waiter.lock().unwrap() = Some(tx);

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(frame)) => Some(frame),
            // Timed out, or the sender was dropped by release().
            _ => {
                self.waiter.lock().unwrap().take();
                log::debug!("[FRAME] wait for next frame expired, using cached");
                self.capture_frame()
            }
        }
    }

    /// Idempotent teardown: drop the pending waiter and cached frame, stop
    /// the producer. Frames arriving afterwards are decoded-and-dropped so
    /// the producer slot is still returned.
    pub fn release(&self) {
        self.closed.store(true, Ordering::Release);
        self.waiter.lock().unwrap().take();
        self.latest.lock().unwrap().take();
        if let Some(mut source) = self.source.lock().unwrap().take() {
            source.stop();
            log::info!("[FRAME] capture source stopped");
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
