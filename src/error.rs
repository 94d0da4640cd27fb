//! Errors surfaced by the recommendation path.
//!
//! An absent record is never an error: it sends the selector to its
//! fallback. What does reach the caller is listed here.

use crate::codec::DecodeError;
use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A stored record is present but unreadable. Points at a loading bug.
    #[error("stored record is corrupt: {0}")]
    Decode(#[from] DecodeError),

    /// The fallback has nothing to choose from.
    #[error("fallback pool is empty, no track can be recommended")]
    PoolEmpty,

    /// The store backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, Error>;
