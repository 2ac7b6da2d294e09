//! Answer generation: prompt the model with retrieved context, stream back
//! fragments as the backend produces them.
//!
//! The backend speaks newline-delimited JSON, one `{response, done}` object
//! per line. Fragments are forwarded the moment a line parses; the caller
//! can start rendering before generation finishes. A reader task owns the
//! connection; dropping the stream closes the channel, the task exits on
//! its next send, and the connection is released.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{GenerateError, SearchError};
use crate::models::{Config, RetrievalResult};
use crate::services::retriever::Retriever;

/// Notice emitted when retrieval finds nothing; the model is not called.
pub const NO_CONTEXT_NOTICE: &str =
    "No relevant context found in the index. Ingest some documents first.";

/// Separator between context chunks inside the prompt.
const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

const PROMPT_TEMPLATE: &str = "\
Use the following CONTEXT (only these texts) to answer the QUESTION.
If the answer cannot be found in the context, say that it is not in the indexed documents.

CONTEXT:
{context}

QUESTION:
{question}

Answer succinctly.";

/// One element of an answer stream.
///
/// Variants are distinguishable so a caller can style errors and citations
/// differently from answer text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum AnswerFragment {
    /// Incremental answer text from the model.
    Token(String),
    /// A defined non-answer outcome, e.g. empty retrieval.
    Notice(String),
    /// Stable ids of the chunks the answer was grounded on. Always the
    /// final fragment of a successful generation.
    Citations(Vec<String>),
    /// Terminal failure. Fragments already produced remain valid.
    Error(String),
}

/// Pull-based, finite, non-restartable fragment sequence.
pub struct AnswerStream {
    rx: mpsc::Receiver<AnswerFragment>,
}

impl AnswerStream {
    fn new(rx: mpsc::Receiver<AnswerFragment>) -> Self {
        Self { rx }
    }

    /// Next fragment, `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<AnswerFragment> {
        self.rx.recv().await
    }

    /// Drain the stream into a vector. Defeats the latency hiding; meant
    /// for callers that need the whole answer at once (JSON output, tests).
    pub async fn collect(mut self) -> Vec<AnswerFragment> {
        let mut fragments = Vec::new();
        while let Some(fragment) = self.recv().await {
            fragments.push(fragment);
        }
        fragments
    }
}

/// Request body for the streaming generate endpoint.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// One line of the backend's NDJSON stream.
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

/// Parse one stream line; `None` for lines that are not valid JSON.
fn parse_stream_line(line: &str) -> Option<GenerateChunk> {
    serde_json::from_str(line).ok()
}

fn build_prompt(retrieval: &RetrievalResult, question: &str) -> String {
    let context = retrieval
        .chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_DELIMITER);

    PROMPT_TEMPLATE
        .replace("{context}", &context)
        .replace("{question}", question)
}

pub struct AnswerGenerator {
    retriever: Arc<Retriever>,
    client: Client,
    base_url: String,
    default_model: String,
}

impl AnswerGenerator {
    pub fn new(config: &Config, retriever: Arc<Retriever>) -> Result<Self, GenerateError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.generation.timeout_secs))
            .build()
            .map_err(|e| GenerateError::ConnectionError(e.to_string()))?;

        Ok(Self {
            retriever,
            client,
            base_url: config.generation.url.trim_end_matches('/').to_string(),
            default_model: config.generation.model.clone(),
        })
    }

    /// Answer a question with retrieved context, streaming fragments.
    ///
    /// Retrieval failures surface as the error return; once a stream is
    /// handed back, every further failure arrives as a terminal
    /// [`AnswerFragment::Error`] instead.
    pub async fn generate(
        &self,
        question: &str,
        k: u32,
        model: Option<&str>,
    ) -> Result<AnswerStream, SearchError> {
        let retrieval = self.retriever.retrieve(question, k).await?;

        let (tx, rx) = mpsc::channel(32);

        if retrieval.is_empty() {
            let _ = tx.send(AnswerFragment::Notice(NO_CONTEXT_NOTICE.into())).await;
            return Ok(AnswerStream::new(rx));
        }

        let prompt = build_prompt(&retrieval, question);
        let citations = retrieval.chunk_ids();
        let model = model.unwrap_or(&self.default_model).to_string();
        let url = format!("{}/api/generate", self.base_url);
        let client = self.client.clone();

        tokio::spawn(async move {
            stream_completion(client, url, model, prompt, citations, tx).await;
        });

        Ok(AnswerStream::new(rx))
    }
}

/// Drive one generation request, forwarding fragments until the backend
/// reports completion, the receiver goes away, or the connection fails.
async fn stream_completion(
    client: Client,
    url: String,
    model: String,
    prompt: String,
    citations: Vec<String>,
    tx: mpsc::Sender<AnswerFragment>,
) {
    let request = GenerateRequest {
        model: &model,
        prompt: &prompt,
        stream: true,
    };

    let response = match client.post(&url).json(&request).send().await {
        Ok(response) => response,
        Err(e) => {
            let error = if e.is_timeout() {
                GenerateError::Timeout
            } else {
                GenerateError::ConnectionError(e.to_string())
            };
            let _ = tx.send(AnswerFragment::Error(error.to_string())).await;
            return;
        }
    };

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let error = GenerateError::ServerError(format!("status {}: {}", status, body));
        let _ = tx.send(AnswerFragment::Error(error.to_string())).await;
        return;
    }

    let mut stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(item) = stream.next().await {
        let bytes = match item {
            Ok(bytes) => bytes,
            Err(e) => {
                let error = if e.is_timeout() {
                    GenerateError::Timeout
                } else {
                    GenerateError::StreamError(e.to_string())
                };
                let _ = tx.send(AnswerFragment::Error(error.to_string())).await;
                return;
            }
        };

        // A network read can split a JSON line, or even a multi-byte char;
        // buffer bytes and cut on newlines only
        buffer.extend_from_slice(&bytes);
        while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
            let line_bytes: Vec<u8> = buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line_bytes);
            if forward_line(line.trim(), &citations, &tx).await.is_break() {
                return;
            }
        }
    }

    // Stream ended; a last line without a trailing newline may remain
    let line = String::from_utf8_lossy(&buffer);
    if forward_line(line.trim(), &citations, &tx).await.is_break() {
        return;
    }

    let error = GenerateError::StreamError("stream ended before completion".into());
    let _ = tx.send(AnswerFragment::Error(error.to_string())).await;
}

/// Forward one NDJSON line. Break means the stream is finished, either
/// because the backend said done (citations sent) or the receiver is gone.
async fn forward_line(
    line: &str,
    citations: &[String],
    tx: &mpsc::Sender<AnswerFragment>,
) -> std::ops::ControlFlow<()> {
    use std::ops::ControlFlow;

    if line.is_empty() {
        return ControlFlow::Continue(());
    }

    let Some(chunk) = parse_stream_line(line) else {
        tracing::debug!("skipping malformed stream line: {line}");
        return ControlFlow::Continue(());
    };

    if !chunk.response.is_empty()
        && tx
            .send(AnswerFragment::Token(chunk.response))
            .await
            .is_err()
    {
        // Receiver dropped; stop reading so the connection is released
        return ControlFlow::Break(());
    }

    if chunk.done {
        let _ = tx.send(AnswerFragment::Citations(citations.to_vec())).await;
        return ControlFlow::Break(());
    }

    ControlFlow::Continue(())
}
