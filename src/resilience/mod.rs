//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Hop-2 request:
//!     → retries.rs (attempt schedule from RetryConfig)
//!     → timeouts.rs (per-attempt deadline)
//!     → On transport failure: backoff.rs delay, next attempt
//!     → On any HTTP response: stop, caller classifies it
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline
//! - Only delivery failures are retried, never application-level answers
//! - Backoff delays carry up to 10% jitter

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use retries::{RetryAttempt, RetryPolicy};
