//! Sharded Exact-Match Search Library
//!
//! This library crate defines the core modules of the search system.
//! It serves as the foundation for the binary executable (`main.rs`), which
//! runs one of three process kinds: a shard, the coordinator, or a client.
//!
//! ## Architecture Modules
//! - **`matcher`**: Exact substring search (Boyer-Moore) behind the `Matcher` trait.
//! - **`shard`**: One partition of the collection. Loads its documents once and
//!   answers queries by scanning all of them.
//! - **`coordinator`**: Fans each query out to every shard in parallel, waits a
//!   bounded time per shard and merges whatever arrived.
//! - **`server`**: The newline-delimited TCP listener shared by shards and the
//!   coordinator.
//! - **`client`**: Sends terms to the coordinator and renders the results.
//! - **`config`**: Addresses, shard lists and timeouts for every process kind.

pub mod client;
pub mod config;
pub mod coordinator;
pub mod matcher;
pub mod server;
pub mod shard;
