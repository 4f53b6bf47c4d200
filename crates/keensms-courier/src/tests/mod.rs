//! Scenario tests for the courier.
//!
//! - `harness.rs`        - MockRouter, MockAction, MockPublisher and builders
//! - `filtering.rs`      - read messages, access list, skip cache
//! - `reconciliation.rs` - mark-as-read / delete / leave batching
//! - `failures.rs`       - contained and fatal failures
//! - `end_to_end.rs`     - publish path through the real payload encoder
//! - `poll_loop.rs`      - interval driver and shutdown

mod failures;
mod filtering;
mod poll_loop;
