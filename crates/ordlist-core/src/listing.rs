//! The listing state machine.
//!
//! [`ListingService`] drives every listing transition for one network:
//! issuing unsigned PSBTs for new listings and relists, and committing a
//! listing as ACTIVE once the seller returns the signed PSBT. Commits for the
//! same ordinal are serialized in-process and guarded by the store's record
//! version, so two confirmations can never interleave into a merged record.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::ListingError;
use crate::locks::KeyedLocks;
use crate::psbt::{
    build_listing_psbt, internal_key_from_hex, payment_script, ListingExpectation,
    SignedPsbtVerifier,
};
use crate::resolver::OrdinalResolver;
use crate::store::{ListingStore, StoredListing};
use crate::types::{
    service_fee, Listing, ListingNetwork, ListingStatus, ListingTerms, OrdinalUtxo, SignedListing,
};

pub struct ListingService {
    resolver: Arc<dyn OrdinalResolver>,
    store: Arc<dyn ListingStore>,
    network: ListingNetwork,
    verifier: Option<Arc<dyn SignedPsbtVerifier>>,
    locks: KeyedLocks,
}

impl ListingService {
    pub fn new(
        resolver: Arc<dyn OrdinalResolver>,
        store: Arc<dyn ListingStore>,
        network: ListingNetwork,
    ) -> Self {
        Self {
            resolver,
            store,
            network,
            verifier: None,
            locks: KeyedLocks::new(),
        }
    }

    /// Require every signed PSBT to pass `verifier` before its listing can
    /// become ACTIVE. Without one, signed PSBTs are stored as submitted.
    pub fn with_verifier(mut self, verifier: Arc<dyn SignedPsbtVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn network(&self) -> ListingNetwork {
        self.network
    }

    // ========================================================================
    // Unsigned PSBT issuance (no store mutation)
    // ========================================================================

    /// Issue the unsigned listing PSBT for an ordinal that is not currently
    /// listed. Nothing is written; the listing only becomes durable through
    /// [`Self::publish_listing`].
    pub async fn create_listing(&self, terms: &ListingTerms) -> Result<String, ListingError> {
        if let Some(stored) = self.find(&terms.ordinal_id).await? {
            if stored.listing.is_active() {
                return Err(ListingError::AlreadyListed(terms.ordinal_id.clone()));
            }
        }
        self.issue_psbt(terms).await
    }

    /// Issue an unsigned PSBT with new terms for an ordinal that already has a
    /// listing record, active or not.
    pub async fn request_relist(&self, terms: &ListingTerms) -> Result<String, ListingError> {
        if self.find(&terms.ordinal_id).await?.is_none() {
            return Err(ListingError::NotFound(terms.ordinal_id.clone()));
        }
        self.issue_psbt(terms).await
    }

    async fn issue_psbt(&self, terms: &ListingTerms) -> Result<String, ListingError> {
        // Reject bad key material before spending a resolver round trip.
        payment_script(&terms.payment_address, self.network)?;
        internal_key_from_hex(&terms.public_key)?;

        let utxo = self.resolve(&terms.ordinal_id).await?;
        let psbt = build_listing_psbt(
            &utxo,
            &terms.public_key,
            &terms.payment_address,
            terms.price,
            self.network,
        )?;
        debug!(
            ordinal_id = %terms.ordinal_id,
            price = terms.price,
            utxo = %utxo.outpoint(),
            "issued unsigned listing PSBT"
        );
        Ok(psbt)
    }

    // ========================================================================
    // Commits
    // ========================================================================

    /// Commit a first-time listing as ACTIVE. An inactive record may be
    /// re-activated only by the seller on file.
    pub async fn publish_listing(&self, signed: &SignedListing) -> Result<Listing, ListingError> {
        let terms = &signed.terms;
        let _guard = self.locks.lock(&terms.ordinal_id).await;

        let expected_version = match self.find(&terms.ordinal_id).await? {
            None => None,
            Some(stored) if stored.listing.is_active() => {
                return Err(ListingError::AlreadyListed(terms.ordinal_id.clone()));
            }
            Some(stored) => {
                check_seller(&stored, terms)?;
                Some(stored.version)
            }
        };
        self.commit_active(signed, expected_version).await
    }

    /// Commit new terms for an existing listing. The payment address and
    /// public key must equal the ones on file.
    pub async fn confirm_listing(&self, signed: &SignedListing) -> Result<Listing, ListingError> {
        let terms = &signed.terms;
        let _guard = self.locks.lock(&terms.ordinal_id).await;

        let stored = self
            .find(&terms.ordinal_id)
            .await?
            .ok_or_else(|| ListingError::NotFound(terms.ordinal_id.clone()))?;
        check_seller(&stored, terms)?;

        self.commit_active(signed, Some(stored.version)).await
    }

    /// Resolve the current UTXO, optionally verify the signed PSBT against
    /// it, and write the ACTIVE record. The UTXO stored is the one seen now,
    /// which may differ from the one the unsigned PSBT was built on.
    async fn commit_active(
        &self,
        signed: &SignedListing,
        expected_version: Option<u64>,
    ) -> Result<Listing, ListingError> {
        let terms = &signed.terms;
        payment_script(&terms.payment_address, self.network)?;
        internal_key_from_hex(&terms.public_key)?;

        let utxo = self.resolve(&terms.ordinal_id).await?;

        if let Some(verifier) = &self.verifier {
            let expected =
                ListingExpectation::new(&utxo, &terms.payment_address, terms.price, self.network)?;
            verifier.verify(&signed.signed_psbt, &expected)?;
        }

        let listing = Listing {
            ordinal_id: terms.ordinal_id.clone(),
            price: terms.price,
            seller_payment_address: terms.payment_address.clone(),
            seller_ordinal_public_key: terms.public_key.clone(),
            status: ListingStatus::Active,
            ordinal_utxo_tx_id: utxo.txid.to_string(),
            ordinal_utxo_vout: utxo.vout,
            service_fee: service_fee(terms.price),
            signed_listing_psbt: signed.signed_psbt.clone(),
        };

        let stored = self
            .store
            .upsert(listing, expected_version)
            .await
            .inspect_err(|e| warn!(ordinal_id = %terms.ordinal_id, error = %e, "listing upsert failed"))?;
        info!(
            ordinal_id = %stored.listing.ordinal_id,
            price = stored.listing.price,
            service_fee = stored.listing.service_fee,
            version = stored.version,
            "listing active"
        );
        Ok(stored.listing)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub async fn get_listing(&self, ordinal_id: &str) -> Result<Listing, ListingError> {
        self.find(ordinal_id)
            .await?
            .map(|s| s.listing)
            .ok_or_else(|| ListingError::NotFound(ordinal_id.to_string()))
    }

    async fn find(&self, ordinal_id: &str) -> Result<Option<StoredListing>, ListingError> {
        Ok(self.store.find(ordinal_id).await?)
    }

    async fn resolve(&self, ordinal_id: &str) -> Result<OrdinalUtxo, ListingError> {
        let utxo = self
            .resolver
            .resolve(ordinal_id, self.network)
            .await
            .inspect_err(|e| warn!(ordinal_id, error = %e, "ordinal resolution failed"))?;
        debug!(ordinal_id, utxo = %utxo.outpoint(), value = utxo.value, "resolved ordinal");
        Ok(utxo)
    }
}

fn check_seller(stored: &StoredListing, terms: &ListingTerms) -> Result<(), ListingError> {
    if stored
        .listing
        .matches_seller(&terms.payment_address, &terms.public_key)
    {
        return Ok(());
    }
    warn!(ordinal_id = %terms.ordinal_id, "commit rejected: seller identity mismatch");
    Err(ListingError::IdentityMismatch(terms.ordinal_id.clone()))
}
