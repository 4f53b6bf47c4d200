//! keensms courier: moves SMS from the router to the message bus.
//!
//! Each cycle fetches messages of every known mobile interface, drops the
//! ones the router already reports as read, filters senders against the
//! access list, runs the accept action and then updates router-side state
//! with one batched call per interface.
//!
//! # Core Invariants
//!
//! 1. **Skip Forever**: a message from an unauthorized sender is remembered
//!    and never filtered, published, marked or deleted again
//! 2. **Read Is Final**: a message reported as read is never evaluated
//! 3. **Act Once Per Cycle**: an accepted message is handed to the action
//!    at most once per cycle in which it is fetched unread
//! 4. **At-Least-Once**: a message is only reconciled after its action
//!    succeeded, so a failed reconcile means a repeated publish, never a
//!    lost one
//!
//! # Architecture
//!
//! ```text
//! PollLoop -> ReconciliationEngine -> RouterGateway::list_unread
//!                  |                       |
//!                  |   SkipCache -> AccessList -> MessageAction (publish)
//!                  |
//!                  +-> RouterGateway::mark_as_read / delete (batched)
//! ```

pub mod action;
pub mod engine;
pub mod error;
pub mod filter;
pub mod payload;
pub mod poll_loop;
pub mod skip_cache;

#[cfg(test)]
mod tests;

pub use action::{LogAction, MessageAction, PublishAction};
pub use engine::{CycleReport, ReconciliationEngine, DEFAULT_OUTAGE_LIMIT};
pub use error::{ActionError, ActionResult, CourierError, CourierResult};
pub use filter::AccessList;
pub use payload::{serialize, PAYLOAD_TIMESTAMP_FORMAT};
pub use poll_loop::PollLoop;
pub use skip_cache::{MessageKey, SkipCache};
