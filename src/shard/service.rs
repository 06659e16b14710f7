//! Shard Search Service
//!
//! Answers queries against one shard's in-memory collection.
//!
//! The collection is fixed at construction and shared read-only between all
//! concurrent queries, so searching needs no locking. A query matches a document
//! when the case-folded term occurs in the folded title or the folded abstract.
//! Hits keep document load order.

use super::loader::{LoadError, load_documents};
use super::protocol::{ShardReply, ShardRequest, ShardResults};
use super::types::{Document, SearchHit};
use crate::config::ShardConfig;
use crate::matcher::{BoyerMoore, Matcher};
use std::sync::Arc;

pub struct ShardSearchService {
    shard_id: String,
    documents: Arc<[Document]>,
    matcher: Arc<dyn Matcher>,
}

impl ShardSearchService {
    pub fn new(
        shard_id: impl Into<String>,
        documents: Vec<Document>,
        matcher: Arc<dyn Matcher>,
    ) -> Self {
        Self {
            shard_id: shard_id.into(),
            documents: documents.into(),
            matcher,
        }
    }

    /// A service using the default Boyer-Moore matcher.
    pub fn with_documents(shard_id: impl Into<String>, documents: Vec<Document>) -> Self {
        Self::new(shard_id, documents, Arc::new(BoyerMoore::new()))
    }

    /// Loads the configured data file. The service only exists once the whole
    /// collection is in memory.
    pub async fn load(config: &ShardConfig) -> Result<Self, LoadError> {
        let documents = load_documents(&config.data_file).await?;
        let service = Self::with_documents(config.shard_id.clone(), documents);
        tracing::info!(
            "{} ready with {} documents",
            service.shard_id,
            service.document_count()
        );
        Ok(service)
    }

    pub fn shard_id(&self) -> &str {
        &self.shard_id
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Scans every document for `query`. An empty or blank query yields nothing.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let folded_query = query.to_lowercase();

        let hits: Vec<SearchHit> = self
            .documents
            .iter()
            .filter(|document| self.matches(document, &folded_query))
            .map(|document| SearchHit::from_document(document, &self.shard_id))
            .collect();

        tracing::debug!(
            "{}: '{}' matched {} of {} documents",
            self.shard_id,
            query,
            hits.len(),
            self.documents.len()
        );

        hits
    }

    fn matches(&self, document: &Document, folded_query: &str) -> bool {
        self.matcher
            .contains(&document.title.to_lowercase(), folded_query)
            || self
                .matcher
                .contains(&document.abstract_text.to_lowercase(), folded_query)
    }

    pub fn handle_request(&self, request: ShardRequest) -> ShardReply {
        match request {
            ShardRequest::Search { query } => {
                ShardReply::Results(ShardResults::new(self.shard_id.clone(), self.search(&query)))
            }
            ShardRequest::Status => ShardReply::Status {
                shard: self.shard_id.clone(),
                documents: self.document_count(),
            },
        }
    }
}
