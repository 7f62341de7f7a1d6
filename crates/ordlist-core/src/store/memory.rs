use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::types::Listing;

use super::jsonl::{export_listings_to_jsonl, parse_jsonl_listings};
use super::{ListingStore, StoreError, StoredListing};

/// In-memory listing store, optionally mirrored to a JSONL file.
///
/// Shared across request tasks via `Arc`. Every upsert runs its version check
/// and write under one write lock, so the check-and-set is atomic for all
/// callers of this instance. When persistence is enabled the whole file is
/// rewritten (via a temp file and rename) before the lock is released; a
/// failed write rolls the in-memory change back.
pub struct MemoryListingStore {
    listings: RwLock<HashMap<String, StoredListing>>,
    path: Option<PathBuf>,
}

impl Default for MemoryListingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryListingStore {
    pub fn new() -> Self {
        Self {
            listings: RwLock::new(HashMap::new()),
            path: None,
        }
    }

    /// Load listings from `path` (if the file exists) and persist every
    /// later mutation back to it.
    pub fn with_persistence(path: &Path) -> Result<Self, StoreError> {
        let listings = match std::fs::read_to_string(path) {
            Ok(content) => parse_jsonl_listings(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(StoreError::Io(e)),
        };

        Ok(Self {
            listings: RwLock::new(listings),
            path: Some(path.to_path_buf()),
        })
    }

    pub async fn len(&self) -> usize {
        self.listings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.listings.read().await.is_empty()
    }

    async fn flush(&self, map: &HashMap<String, StoredListing>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = export_listings_to_jsonl(map)?;
        let tmp = path.with_extension("jsonl.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, path).await?;
        debug!(path = %path.display(), listings = map.len(), "flushed listing store");
        Ok(())
    }
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    async fn find(&self, ordinal_id: &str) -> Result<Option<StoredListing>, StoreError> {
        Ok(self.listings.read().await.get(ordinal_id).cloned())
    }

    async fn upsert(
        &self,
        listing: Listing,
        expected_version: Option<u64>,
    ) -> Result<StoredListing, StoreError> {
        let mut map = self.listings.write().await;
        let ordinal_id = listing.ordinal_id.clone();

        let found = map.get(&ordinal_id).map(|s| s.version);
        if found != expected_version {
            return Err(StoreError::Conflict {
                ordinal_id,
                expected: expected_version,
                found,
            });
        }

        let stored = StoredListing {
            listing,
            version: found.map_or(1, |v| v + 1),
        };
        let previous = map.insert(ordinal_id.clone(), stored.clone());

        if let Err(err) = self.flush(&map).await {
            match previous {
                Some(prev) => map.insert(ordinal_id, prev),
                None => map.remove(&ordinal_id),
            };
            return Err(err);
        }

        Ok(stored)
    }
}
