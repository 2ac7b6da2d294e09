pub mod chunker;
pub mod embedding;
pub mod generator;
pub mod identity;
pub mod indexer;
pub mod retriever;
pub mod vector_store;

pub use chunker::TextChunker;
pub use embedding::{EmbeddingProvider, OllamaEmbedding};
pub use generator::{AnswerFragment, AnswerGenerator, AnswerStream, NO_CONTEXT_NOTICE};
pub use identity::assign_identities;
pub use indexer::Indexer;
pub use retriever::Retriever;
pub use vector_store::{CollectionInfo, MemoryBackend, QdrantBackend, VectorIndex, create_backend};
