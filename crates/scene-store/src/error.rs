//! # Error Types
//!
//! Failures that can occur when talking to a store, kept separate from
//! domain errors so callers can tell "the store is gone" apart from "the
//! operation was rejected".

use thiserror::Error;

/// Errors produced by the store runtime itself.
///
/// Domain failures (validation messages, API rejections) travel inside
/// actions and state; `StoreError` only covers the plumbing.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store task has stopped and its mailbox is closed.
    #[error("Store mailbox closed")]
    StoreClosed,

    /// The store dropped a reply channel without answering.
    #[error("Store dropped the reply channel")]
    StoreDropped,

    /// The declared listener graph contains a cycle, so dispatch chains
    /// could never be guaranteed to terminate.
    #[error("Listener graph cycle through `{0}`")]
    CyclicEffects(String),
}
