//! Coordinator Module
//!
//! The query front door. Fans every query out to all shards at once, waits a
//! bounded time for each, and merges whatever arrived.
//!
//! ## Fan-out protocol
//! 1. **Dispatch**: One task per shard, all spawned before any result is awaited.
//! 2. **Bounded wait**: Each task applies its own timeout, so a slow shard never
//!    eats into a fast shard's budget.
//! 3. **Merge**: Results are concatenated in the order shards answered. Shards
//!    that timed out or failed simply contribute nothing.
//!
//! A query never fails as a whole: with every shard down the client still gets
//! a valid, empty result.
//!
//! ## Submodules
//! - **`types`**: Aggregated results and per-shard outcomes.
//! - **`transport`**: How a request reaches a shard (TCP line protocol).
//! - **`service`**: The `Coordinator` itself.
//! - **`protocol`**: HTTP endpoints and DTOs.
//! - **`handlers`**: Line-protocol and HTTP handlers.

pub mod handlers;
pub mod protocol;
pub mod service;
pub mod transport;
pub mod types;
