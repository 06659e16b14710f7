//! Document Loader
//!
//! Reads a shard's collection from a JSON file holding an array of
//! `{"title", "abstract", "label"}` objects. Order in the file is load order.

use super::types::Document;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read data file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse data file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Loads the whole collection or fails; never returns a partial collection.
pub async fn load_documents(path: &Path) -> Result<Vec<Document>, LoadError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let documents = parse_documents(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(
        "Loaded {} documents from {}",
        documents.len(),
        path.display()
    );

    Ok(documents)
}

pub fn parse_documents(content: &str) -> Result<Vec<Document>, serde_json::Error> {
    serde_json::from_str(content)
}
