//! Shard Search Module
//!
//! One partition of the document collection, served by an independent process.
//!
//! ## Lifecycle
//! 1. **Load**: The shard reads its whole collection from a JSON file. A load
//!    failure is fatal; the shard never serves a partial collection.
//! 2. **Serve**: Only after loading does the shard bind its listener. Every query
//!    scans every document; there is no index.
//!
//! ## Submodules
//! - **`types`**: Documents and the hits derived from them.
//! - **`loader`**: Reads a collection from disk.
//! - **`service`**: The query logic (`ShardSearchService`).
//! - **`protocol`**: Request/reply messages exchanged with the coordinator.
//! - **`handlers`**: Adapts the service to the line server.

pub mod handlers;
pub mod loader;
pub mod protocol;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;
