//! Inscription-to-UTXO resolution.
//!
//! Defines the [`OrdinalResolver`] trait and provides an HTTP implementation
//! ([`HttpOrdinalResolver`]) against an inscription indexer, plus a test mock
//! (`mock::MockResolver`).

mod http_adapter;
#[cfg(test)]
pub mod mock;

pub use http_adapter::HttpOrdinalResolver;

use async_trait::async_trait;

use crate::types::{ListingNetwork, OrdinalUtxo};

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("inscription not found: {0}")]
    NotFound(String),

    #[error("inscription indexer unavailable: {0}")]
    Unavailable(String),

    #[error("invalid indexer response: {0}")]
    InvalidResponse(String),
}

impl ResolverError {
    /// Transport failures and indexer outages may clear up on their own; a
    /// missing inscription or a malformed answer will not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Looks up the confirmed UTXO that currently holds an inscription.
///
/// Implementations must either return a complete answer or fail; there is
/// no partial result.
#[async_trait]
pub trait OrdinalResolver: Send + Sync {
    async fn resolve(
        &self,
        ordinal_id: &str,
        network: ListingNetwork,
    ) -> Result<OrdinalUtxo, ResolverError>;
}
