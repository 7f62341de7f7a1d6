use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::types::{ListingNetwork, OrdinalUtxo};

use super::{OrdinalResolver, ResolverError};

/// A mock resolver for testing. Returns canned UTXOs from a `HashMap`
/// populated via the builder pattern, and counts calls.
pub struct MockResolver {
    utxos: Mutex<HashMap<String, OrdinalUtxo>>,
    unavailable: bool,
    calls: AtomicUsize,
}

impl MockResolver {
    pub fn builder() -> MockResolverBuilder {
        MockResolverBuilder {
            utxos: HashMap::new(),
            unavailable: false,
        }
    }

    /// Simulate the inscription moving to a new UTXO between requests.
    pub fn move_inscription(&self, ordinal_id: &str, utxo: OrdinalUtxo) {
        self.utxos
            .lock()
            .expect("mock resolver lock poisoned")
            .insert(ordinal_id.to_string(), utxo);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub struct MockResolverBuilder {
    utxos: HashMap<String, OrdinalUtxo>,
    unavailable: bool,
}

impl MockResolverBuilder {
    pub fn with_inscription(mut self, ordinal_id: &str, utxo: OrdinalUtxo) -> Self {
        self.utxos.insert(ordinal_id.to_string(), utxo);
        self
    }

    /// Every lookup fails as if the indexer were down.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn build(self) -> MockResolver {
        MockResolver {
            utxos: Mutex::new(self.utxos),
            unavailable: self.unavailable,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl OrdinalResolver for MockResolver {
    async fn resolve(
        &self,
        ordinal_id: &str,
        _network: ListingNetwork,
    ) -> Result<OrdinalUtxo, ResolverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(ResolverError::Unavailable("mock outage".to_string()));
        }
        self.utxos
            .lock()
            .expect("mock resolver lock poisoned")
            .get(ordinal_id)
            .copied()
            .ok_or_else(|| ResolverError::NotFound(ordinal_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;

    #[tokio::test]
    async fn move_inscription_changes_answer() {
        let resolver = MockResolver::builder()
            .with_inscription("insc", utxo(1, 0, 546))
            .build();
        let first = resolver
            .resolve("insc", ListingNetwork::Mainnet)
            .await
            .unwrap();
        resolver.move_inscription("insc", utxo(2, 1, 546));
        let second = resolver
            .resolve("insc", ListingNetwork::Mainnet)
            .await
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(second.vout, 1);
        assert_eq!(resolver.call_count(), 2);
    }

    #[tokio::test]
    async fn unknown_and_unavailable_fail() {
        let resolver = MockResolver::builder().build();
        assert!(matches!(
            resolver.resolve("nope", ListingNetwork::Mainnet).await,
            Err(ResolverError::NotFound(_))
        ));

        let down = MockResolver::builder().unavailable().build();
        let err = down
            .resolve("nope", ListingNetwork::Mainnet)
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}
