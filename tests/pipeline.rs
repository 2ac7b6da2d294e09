//! End-to-end pipeline tests: loader through generator, using the in-memory
//! index, a deterministic stub embedder, and a canned NDJSON fixture server
//! for the model backend.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use ragdex::error::{EmbeddingError, IndexError, SearchError};
use ragdex::loader::DocumentLoader;
use ragdex::models::{Config, VectorDriver};
use ragdex::services::{
    AnswerFragment, AnswerGenerator, EmbeddingProvider, Indexer, MemoryBackend, NO_CONTEXT_NOTICE,
    Retriever, TextChunker, VectorIndex, assign_identities,
};

/// Deterministic bag-of-keywords embedder. Counts batch calls so tests can
/// assert that an unchanged corpus costs zero embedding requests.
struct StubEmbedder {
    model: String,
    batch_calls: AtomicU32,
}

const VOCAB: [&str; 8] = [
    "paris", "capital", "france", "rome", "italy", "hello", "world", "weather",
];

impl StubEmbedder {
    fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            batch_calls: AtomicU32::new(0),
        }
    }

    fn embed_text(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let mut vector: Vec<f32> = VOCAB
            .iter()
            .map(|word| if lower.contains(word) { 1.0 } else { 0.0 })
            .collect();
        // Texts with no vocabulary hits still get a nonzero direction
        vector.push(if vector.iter().all(|x| *x == 0.0) {
            1.0
        } else {
            0.0
        });
        vector
    }

    fn calls(&self) -> u32 {
        self.batch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::embed_text(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(Self::embed_text(text))
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> u32 {
        (VOCAB.len() + 1) as u32
    }
}

fn test_config(manifest_dir: &Path) -> Config {
    let mut config = Config::default();
    config.vector_store.driver = VectorDriver::Memory;
    config.vector_store.manifest_dir = Some(manifest_dir.to_path_buf());
    config
}

fn shared_index() -> Arc<dyn VectorIndex> {
    Arc::new(MemoryBackend::new("ragdex", 9))
}

/// Serve one HTTP request with a fixed NDJSON body, then close.
async fn spawn_ndjson_server(lines: Vec<&str>) -> String {
    spawn_http_server(200, lines.join("\n") + "\n").await
}

async fn spawn_http_server(status: u16, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            // Drain the request headers before answering
            let mut buf = [0u8; 4096];
            let mut request = Vec::new();
            loop {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        request.extend_from_slice(&buf[..n]);
                        if request.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                }
            }

            let reason = if status == 200 { "OK" } else { "Error" };
            let response = format!(
                "HTTP/1.1 {status} {reason}\r\ncontent-type: application/x-ndjson\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len(),
            );
            socket.write_all(response.as_bytes()).await.ok();
            socket.shutdown().await.ok();
        }
    });

    format!("http://{addr}")
}

fn write_corpus(dir: &Path) {
    std::fs::write(
        dir.join("notes.txt"),
        "Paris is the capital of France.",
    )
    .unwrap();
    std::fs::write(
        dir.join("other.txt"),
        "Rome is the capital of Italy.",
    )
    .unwrap();
}

#[tokio::test]
async fn test_ingest_is_idempotent() {
    let data = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();
    write_corpus(data.path());

    let config = test_config(state.path());
    let embedder = Arc::new(StubEmbedder::new("stub-embed"));
    let index = shared_index();
    let indexer = Indexer::new(&config, embedder.clone(), index.clone());

    let first = indexer.ingest(data.path()).await.unwrap();
    assert_eq!(first.documents_loaded, 2);
    assert_eq!(first.chunks_created, 2);
    assert_eq!(first.chunks_added, 2);
    let calls_after_first = embedder.calls();
    assert!(calls_after_first > 0);

    let second = indexer.ingest(data.path()).await.unwrap();
    assert_eq!(second.chunks_created, 2);
    assert_eq!(second.chunks_added, 0);
    // Unchanged corpus: zero embedding calls, zero writes
    assert_eq!(embedder.calls(), calls_after_first);
    assert_eq!(index.existing_ids().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_new_file_adds_only_new_chunks() {
    let data = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();
    write_corpus(data.path());

    let config = test_config(state.path());
    let embedder = Arc::new(StubEmbedder::new("stub-embed"));
    let index = shared_index();
    let indexer = Indexer::new(&config, embedder, index.clone());

    indexer.ingest(data.path()).await.unwrap();

    std::fs::write(data.path().join("weather.txt"), "The weather is mild.").unwrap();
    let report = indexer.ingest(data.path()).await.unwrap();

    assert_eq!(report.chunks_created, 3);
    assert_eq!(report.chunks_added, 1);
    assert_eq!(index.existing_ids().await.unwrap().len(), 3);
}

#[test]
fn test_pipeline_determinism() {
    let data = tempfile::tempdir().unwrap();
    write_corpus(data.path());

    let config = Config::default();
    let run = || {
        let outcome = DocumentLoader::new(&config.indexing)
            .load_dir(data.path())
            .unwrap();
        let mut chunks = TextChunker::new(&config.indexing).split(&outcome.documents);
        assign_identities(&mut chunks);
        chunks
            .into_iter()
            .map(|c| c.stable_id)
            .collect::<Vec<String>>()
    };

    let first = run();
    let second = run();
    assert_eq!(first, second);
    assert!(first.iter().any(|id| id.ends_with("notes.txt:None:0")));

    // No two chunks of one run share an id
    let mut deduped = first.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), first.len());
}

#[tokio::test]
async fn test_retrieval_ranks_by_similarity() {
    let data = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();
    write_corpus(data.path());

    let config = test_config(state.path());
    let embedder = Arc::new(StubEmbedder::new("stub-embed"));
    let index = shared_index();
    let indexer = Indexer::new(&config, embedder.clone(), index.clone());
    indexer.ingest(data.path()).await.unwrap();

    let retriever = Retriever::new(&config, embedder, index);
    let result = retriever
        .retrieve("What is the capital of France?", 2)
        .await
        .unwrap();

    assert_eq!(result.len(), 2);
    assert!(result.chunks[0].score >= result.chunks[1].score);
    assert!(result.chunks[0].chunk_id.ends_with("notes.txt:None:0"));
    assert!(result.chunks[0].content.contains("Paris"));
}

#[tokio::test]
async fn test_retrieve_on_empty_index() {
    let state = tempfile::tempdir().unwrap();
    let config = test_config(state.path());
    let embedder = Arc::new(StubEmbedder::new("stub-embed"));

    let retriever = Retriever::new(&config, embedder, shared_index());
    let result = retriever.retrieve("anything", 5).await.unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_model_mismatch_rejected() {
    let data = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();
    write_corpus(data.path());

    let config = test_config(state.path());
    let index = shared_index();
    let indexer = Indexer::new(
        &config,
        Arc::new(StubEmbedder::new("stub-embed")),
        index.clone(),
    );
    indexer.ingest(data.path()).await.unwrap();

    // Query-time mismatch
    let retriever = Retriever::new(&config, Arc::new(StubEmbedder::new("other-model")), index.clone());
    let err = retriever.retrieve("capital of France", 2).await.unwrap_err();
    assert!(matches!(err, SearchError::ModelMismatch { .. }));

    // Ingest-time mismatch
    let other_indexer = Indexer::new(&config, Arc::new(StubEmbedder::new("other-model")), index);
    let err = other_indexer.ingest(data.path()).await.unwrap_err();
    assert!(matches!(err, IndexError::ModelMismatch { .. }));
}

#[tokio::test]
async fn test_reset_clears_index_and_manifest() {
    let data = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();
    write_corpus(data.path());

    let config = test_config(state.path());
    let index = shared_index();
    let indexer = Indexer::new(
        &config,
        Arc::new(StubEmbedder::new("stub-embed")),
        index.clone(),
    );
    indexer.ingest(data.path()).await.unwrap();
    indexer.reset().await.unwrap();

    assert!(index.existing_ids().await.unwrap().is_empty());

    // After a reset a different model is accepted again
    let other_indexer = Indexer::new(&config, Arc::new(StubEmbedder::new("other-model")), index);
    let report = other_indexer.ingest(data.path()).await.unwrap();
    assert_eq!(report.chunks_added, 2);
}

/// Build a generator over an ingested corpus pointed at `backend_url`.
async fn generator_with_corpus(
    data: &Path,
    state: &Path,
    backend_url: &str,
) -> AnswerGenerator {
    let mut config = test_config(state);
    config.generation.url = backend_url.to_string();

    let embedder = Arc::new(StubEmbedder::new("stub-embed"));
    let index = shared_index();
    let indexer = Indexer::new(&config, embedder.clone(), index.clone());
    indexer.ingest(data).await.unwrap();

    let retriever = Arc::new(Retriever::new(&config, embedder, index));
    AnswerGenerator::new(&config, retriever).unwrap()
}

#[tokio::test]
async fn test_streaming_contract() {
    let data = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();
    write_corpus(data.path());

    let url = spawn_ndjson_server(vec![
        r#"{"response":"Hel","done":false}"#,
        "this line is not json and must be skipped",
        r#"{"response":"lo","done":false}"#,
        r#"{"response":"","done":true}"#,
    ])
    .await;

    let generator = generator_with_corpus(data.path(), state.path(), &url).await;
    let fragments = generator
        .generate("What is the capital of France?", 2, None)
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(fragments.len(), 3);
    assert_eq!(fragments[0], AnswerFragment::Token("Hel".to_string()));
    assert_eq!(fragments[1], AnswerFragment::Token("lo".to_string()));
    match &fragments[2] {
        AnswerFragment::Citations(ids) => {
            assert_eq!(ids.len(), 2);
            assert!(ids[0].ends_with("notes.txt:None:0"));
        }
        other => panic!("expected citations, got {other:?}"),
    }
}

#[tokio::test]
async fn test_zero_token_completion_still_cites() {
    let data = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();
    write_corpus(data.path());

    let url = spawn_ndjson_server(vec![r#"{"done":true}"#]).await;
    let generator = generator_with_corpus(data.path(), state.path(), &url).await;
    let fragments = generator
        .generate("capital of France", 1, None)
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(fragments.len(), 1);
    assert!(matches!(&fragments[0], AnswerFragment::Citations(ids) if ids.len() == 1));
}

#[tokio::test]
async fn test_empty_retrieval_yields_single_notice() {
    let state = tempfile::tempdir().unwrap();
    let mut config = test_config(state.path());
    // Closed port: any attempted backend call would surface as an error
    config.generation.url = "http://127.0.0.1:9".to_string();

    let embedder = Arc::new(StubEmbedder::new("stub-embed"));
    let retriever = Arc::new(Retriever::new(&config, embedder, shared_index()));
    let generator = AnswerGenerator::new(&config, retriever).unwrap();

    let fragments = generator
        .generate("anything at all", 3, None)
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(
        fragments,
        vec![AnswerFragment::Notice(NO_CONTEXT_NOTICE.to_string())]
    );
}

#[tokio::test]
async fn test_backend_unreachable_yields_single_error() {
    let data = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();
    write_corpus(data.path());

    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let generator = generator_with_corpus(data.path(), state.path(), &url).await;
    let fragments = generator
        .generate("capital of France", 2, None)
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(fragments.len(), 1);
    assert!(matches!(fragments[0], AnswerFragment::Error(_)));
}

#[tokio::test]
async fn test_backend_error_status_yields_single_error() {
    let data = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();
    write_corpus(data.path());

    let url = spawn_http_server(500, "model not found".to_string()).await;
    let generator = generator_with_corpus(data.path(), state.path(), &url).await;
    let fragments = generator
        .generate("capital of France", 2, None)
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(fragments.len(), 1);
    match &fragments[0] {
        AnswerFragment::Error(message) => assert!(message.contains("500")),
        other => panic!("expected error fragment, got {other:?}"),
    }
}

#[tokio::test]
async fn test_stream_ending_without_done_is_an_error() {
    let data = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();
    write_corpus(data.path());

    let url = spawn_ndjson_server(vec![r#"{"response":"partial","done":false}"#]).await;
    let generator = generator_with_corpus(data.path(), state.path(), &url).await;
    let fragments = generator
        .generate("capital of France", 2, None)
        .await
        .unwrap()
        .collect()
        .await;

    // Partial output stands; the failure arrives as the final fragment
    assert_eq!(fragments.len(), 2);
    assert_eq!(fragments[0], AnswerFragment::Token("partial".to_string()));
    assert!(matches!(fragments[1], AnswerFragment::Error(_)));
}

#[tokio::test]
async fn test_corrupt_file_does_not_block_ingest() {
    let data = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();
    write_corpus(data.path());
    std::fs::write(data.path().join("broken.pdf"), b"not a pdf").unwrap();

    let config = test_config(state.path());
    let index = shared_index();
    let indexer = Indexer::new(
        &config,
        Arc::new(StubEmbedder::new("stub-embed")),
        index.clone(),
    );
    let report = indexer.ingest(data.path()).await.unwrap();

    assert_eq!(report.files_scanned, 3);
    assert_eq!(report.files_skipped, 1);
    assert_eq!(report.chunks_added, 2);
}
