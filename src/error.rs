//! Errors that can occur in store operations.
//!
//! The taxonomy distinguishes transport failures, server rejections, decode
//! failures, bad field paths, and the two advisory refusals (save already in
//! flight, plan limit reached). `Display` yields the user-facing banner
//! text.

use thiserror::Error;

use crate::path::PathError;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Network or transport failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body was not the expected JSON.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Path(#[from] PathError),

    /// A save was requested while one is still in flight.
    #[error("a save is already in progress")]
    SaveInFlight,

    /// The plan's item cap for a list was reached. Soft: surfaced to the
    /// user, never enforced during save.
    #[error("item limit reached ({limit} allowed on this plan)")]
    LimitReached { limit: usize },

    /// A list operation addressed a field that is not a declared list.
    #[error("'{0}' is not a list field")]
    NotAList(String),
}
