//! Listing persistence.
//!
//! Defines the [`ListingStore`] trait (keyed lookup plus version-guarded
//! upsert) and an in-memory implementation ([`MemoryListingStore`]) that can
//! mirror its contents to a JSONL file.

mod jsonl;
mod memory;

pub use memory::MemoryListingStore;

use async_trait::async_trait;

use crate::types::Listing;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("listing {ordinal_id} is at version {found:?}, expected {expected:?}")]
    Conflict {
        ordinal_id: String,
        expected: Option<u64>,
        found: Option<u64>,
    },

    #[error("listing store parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("listing store I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

/// A listing together with the store-assigned version it was read or
/// written at. Versions start at 1 and increase by one per overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredListing {
    pub listing: Listing,
    pub version: u64,
}

#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Look up the record for `ordinal_id`. `Ok(None)` when no record exists.
    async fn find(&self, ordinal_id: &str) -> Result<Option<StoredListing>, StoreError>;

    /// Insert or overwrite the record keyed by `listing.ordinal_id`.
    ///
    /// `expected_version` is the version the caller last observed: `None`
    /// requires that no record exists yet, `Some(v)` requires the record to
    /// still be at `v`. Anything else fails with [`StoreError::Conflict`]
    /// and leaves the store untouched.
    async fn upsert(
        &self,
        listing: Listing,
        expected_version: Option<u64>,
    ) -> Result<StoredListing, StoreError>;
}
