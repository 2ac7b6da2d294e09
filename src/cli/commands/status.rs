use anyhow::Result;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, IndexManifest, OutputFormat, VectorDriver};
use crate::services::{OllamaEmbedding, VectorIndex, create_backend};

pub async fn handle_status(format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let (backend_connected, backend_version) = match OllamaEmbedding::new(&config.embedding) {
        Ok(client) => match client.health_check().await {
            Ok(version) => (true, Some(version.version)),
            Err(_) => (false, None),
        },
        Err(_) => (false, None),
    };

    let (vector_store_connected, vector_store_points) =
        if let Ok(store) = create_backend(&config.vector_store, config.embedding.dimension) {
            let connected = store.health_check().await.unwrap_or(false);
            let points = if connected {
                store
                    .collection_info()
                    .await
                    .ok()
                    .flatten()
                    .map_or(0, |info| info.points_count)
            } else {
                0
            };
            (connected, points)
        } else {
            (false, 0)
        };

    let indexed_model = config
        .manifest_dir()
        .and_then(|dir| IndexManifest::load(&dir, &config.vector_store.collection).ok())
        .flatten()
        .map(|manifest| manifest.embedding_model);

    let status = StatusInfo {
        backend_url: config.embedding.url.clone(),
        backend_connected,
        backend_version,
        embedding_model: config.embedding.model.clone(),
        generation_model: config.generation.model.clone(),
        vector_store_driver: config.vector_store.driver.to_string(),
        vector_store_url: config.vector_store.url.clone(),
        vector_store_connected,
        vector_store_points,
        collection: config.vector_store.collection.clone(),
        indexed_model,
    };

    print!("{}", formatter.format_status(&status));

    if !backend_connected || !vector_store_connected {
        eprintln!();
        if !backend_connected {
            eprintln!("Warning: model backend not reachable. Start it with: ollama serve");
        }
        if !vector_store_connected {
            match config.vector_store.driver {
                VectorDriver::Qdrant => {
                    eprintln!(
                        "Warning: Qdrant not running. Start with: docker run -p 6334:6334 qdrant/qdrant"
                    );
                }
                VectorDriver::Memory => {
                    eprintln!("Warning: in-memory index unavailable.");
                }
            }
        }
    }

    Ok(())
}
