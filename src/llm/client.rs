//! Streaming answer client for the chat-completions backend.
//!
//! One request per question. The streaming variant runs in a spawned task
//! and feeds cumulative partial answers through a channel: each token
//! appends to a running string and the whole running string is emitted.
//! Dropping the receiver cancels the call — the next send fails, the task
//! returns, and dropping the response releases the connection.

use super::prompts::{self, MAX_TOKENS, SYSTEM_PROMPT, TEMPERATURE};
use super::sse;
use crate::error::ScanError;
use crate::settings::ApiConfig;
use tokio::sync::mpsc;

/// Seam for the scan orchestrator: anything that can stream an answer.
///
/// Emissions are cumulative partial answers; the channel closing marks
/// stream completion. An error emission is terminal. Dropping the receiver
/// must cancel the underlying work.
pub trait AnswerClient: Send + Sync {
    fn stream_answer(&self, question: &str) -> mpsc::Receiver<Result<String, ScanError>>;
}

/// HTTP implementation over a chat-completions endpoint with SSE streaming.
pub struct StreamingAnswerClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl StreamingAnswerClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Non-streaming variant: exactly one emission, the complete answer.
    pub async fn answer_once(&self, question: &str) -> Result<String, ScanError> {
        if !self.config.is_configured() {
            return Err(ScanError::CredentialMissing);
        }
        let question = prompts::clean_question(question);

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request_body(&self.config.model, &question, false))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("[LLM] API returned {}: {}", status, body);
            return Err(ScanError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response.json().await?;
        sse::extract_message_content(&body)
            .ok_or_else(|| ScanError::Unexpected("response missing message content".into()))
    }
}

impl AnswerClient for StreamingAnswerClient {
    fn stream_answer(&self, question: &str) -> mpsc::Receiver<Result<String, ScanError>> {
        let (tx, rx) = mpsc::channel(16);
        let http = self.http.clone();
        let config = self.config.clone();
        let question = prompts::clean_question(question);
        tokio::spawn(stream_task(http, config, question, tx));
        rx
    }
}

fn request_body(model: &str, question: &str, stream: bool) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "messages": [
            {"role": "system", "content": SYSTEM_PROMPT},
            {"role": "user", "content": question},
        ],
        "temperature": TEMPERATURE,
        "max_tokens": MAX_TOKENS,
        "stream": stream,
    })
}

async fn stream_task(
    http: reqwest::Client,
    config: ApiConfig,
    question: String,
    tx: mpsc::Sender<Result<String, ScanError>>,
) {
    if !config.is_configured() {
        log::warn!("[LLM] no API key set — aborting before request");
        let _ = tx.send(Err(ScanError::CredentialMissing)).await;
        return;
    }

    log::info!("[LLM] model: {} ({} chars of question)", config.model, question.len());
    let start = std::time::Instant::now();

    let mut response = match http
        .post(&config.endpoint)
        .bearer_auth(&config.api_key)
        .json(&request_body(&config.model, &question, true))
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            log::error!("[LLM] HTTP request failed: {}", e);
            let _ = tx.send(Err(e.into())).await;
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        log::error!("[LLM] API returned {}: {}", status, body);
        let _ = tx
            .send(Err(ScanError::Api {
                status: status.as_u16(),
                body,
            }))
            .await;
        return;
    }

    log::info!("[LLM] TTFB: {}ms", start.elapsed().as_millis());

    let mut answer = String::new();
    let mut sse_buffer = String::new();

    'stream: loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                sse_buffer.push_str(&String::from_utf8_lossy(&chunk));

                for data in sse::drain_data_frames(&mut sse_buffer) {
                    if data == sse::DONE_FRAME {
                        break 'stream;
                    }
                    match sse::extract_delta(&data) {
                        Ok(Some(token)) => {
                            answer.push_str(&token);
                            if tx.send(Ok(answer.clone())).await.is_err() {
                                // Consumer cancelled; dropping the response
                                // closes the connection.
                                log::info!("[LLM] consumer gone, cancelling stream");
                                return;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            // Per-frame parse failures are not fatal.
                            log::warn!("[LLM] skipping malformed frame: {}", e);
                        }
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                log::error!("[LLM] stream error: {}", e);
                let _ = tx.send(Err(e.into())).await;
                return;
            }
        }
    }

    log::info!(
        "[LLM] stream complete: {}ms, {} chars",
        start.elapsed().as_millis(),
        answer.len()
    );
}
