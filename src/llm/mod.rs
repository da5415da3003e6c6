//! LLM domain — the streaming answer backend.
//!
//! External code should only use the types exported here:
//!   - client.rs  — request/stream lifecycle, cancellation
//!   - sse.rs     — `data:`-frame parsing over a rolling buffer
//!   - prompts.rs — system prompt, model constants, question cleanup

pub mod client;
pub mod prompts;
pub mod sse;

pub use client::{AnswerClient, StreamingAnswerClient};
