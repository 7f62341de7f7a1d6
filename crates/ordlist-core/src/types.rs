//! Domain types for ordinal listings.
//!
//! Contains the persisted `Listing` record and its `ListingStatus`, the
//! resolver's `OrdinalUtxo` answer, the network selector, and the validated
//! request inputs (`ListingTerms`, `SignedListing`) every listing operation
//! starts from.

use bitcoin::{OutPoint, Txid};
use serde::{Deserialize, Serialize};

use crate::error::ListingError;

// ==============================================================================
// Network
// ==============================================================================

/// The chain a deployment lists ordinals on. Selected once from configuration
/// and passed explicitly to the PSBT builder and the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingNetwork {
    Mainnet,
    Testnet,
}

impl ListingNetwork {
    pub fn to_bitcoin(self) -> bitcoin::Network {
        match self {
            Self::Mainnet => bitcoin::Network::Bitcoin,
            Self::Testnet => bitcoin::Network::Testnet,
        }
    }
}

impl std::fmt::Display for ListingNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mainnet => write!(f, "mainnet"),
            Self::Testnet => write!(f, "testnet"),
        }
    }
}

impl std::str::FromStr for ListingNetwork {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" | "mainnet" | "bitcoin" => Ok(Self::Mainnet),
            "test" | "testnet" => Ok(Self::Testnet),
            other => Err(format!(
                "unrecognized network `{other}`; expected `main` or `test`"
            )),
        }
    }
}

// ==============================================================================
// Listing Record
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ListingStatus {
    Inactive,
    Active,
    Sold,
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inactive => write!(f, "INACTIVE"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Sold => write!(f, "SOLD"),
        }
    }
}

/// One persisted listing, keyed by `ordinal_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub ordinal_id: String,
    pub price: u64,
    pub seller_payment_address: String,
    pub seller_ordinal_public_key: String,
    pub status: ListingStatus,
    pub ordinal_utxo_tx_id: String,
    pub ordinal_utxo_vout: u32,
    pub service_fee: u64,
    #[serde(rename = "signedListingPSBT")]
    pub signed_listing_psbt: String,
}

impl Listing {
    pub fn is_active(&self) -> bool {
        self.status == ListingStatus::Active
    }

    /// Both halves of the seller identity must match exactly; no
    /// normalisation of address case or key encoding is applied.
    pub fn matches_seller(&self, payment_address: &str, public_key: &str) -> bool {
        self.seller_payment_address == payment_address
            && self.seller_ordinal_public_key == public_key
    }
}

/// The marketplace cut on a sale: one percent of the price, truncated.
pub fn service_fee(price: u64) -> u64 {
    price / 100
}

// ==============================================================================
// Resolver Answer
// ==============================================================================

/// The confirmed UTXO currently holding an inscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrdinalUtxo {
    pub txid: Txid,
    pub vout: u32,
    /// Value of the output in satoshis.
    pub value: u64,
}

impl OrdinalUtxo {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.txid, self.vout)
    }
}

// ==============================================================================
// Request Inputs
// ==============================================================================

/// Seller-supplied terms shared by every listing operation, checked for
/// presence before any store or resolver access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingTerms {
    pub ordinal_id: String,
    pub price: u64,
    pub payment_address: String,
    pub public_key: String,
}

impl ListingTerms {
    pub fn new(
        ordinal_id: impl Into<String>,
        price: u64,
        payment_address: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Result<Self, ListingError> {
        let terms = Self {
            ordinal_id: require_inscription_id(ordinal_id.into())?,
            price,
            payment_address: require_non_empty("sellerPaymentAddress", payment_address.into())?,
            public_key: require_non_empty("sellerOrdinalPublicKey", public_key.into())?,
        };
        if terms.price == 0 {
            return Err(ListingError::validation(
                "sellerOrdinalPrice",
                "SellerOrdinalPrice is required",
            ));
        }
        Ok(terms)
    }
}

/// Listing terms plus the seller-signed PSBT submitted on a confirm step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedListing {
    pub terms: ListingTerms,
    pub signed_psbt: String,
}

impl SignedListing {
    pub fn new(terms: ListingTerms, signed_psbt: impl Into<String>) -> Result<Self, ListingError> {
        Ok(Self {
            terms,
            signed_psbt: require_non_empty("signedListingPSBT", signed_psbt.into())?,
        })
    }
}

/// Inscription ids are `<txid>i<index>`, so only ASCII alphanumerics can
/// name a real inscription.
pub fn is_inscription_id(ordinal_id: &str) -> bool {
    !ordinal_id.is_empty() && ordinal_id.chars().all(|c| c.is_ascii_alphanumeric())
}

fn require_inscription_id(value: String) -> Result<String, ListingError> {
    let ordinal_id = require_non_empty("sellerOrdinalId", value)?;
    if !is_inscription_id(&ordinal_id) {
        return Err(ListingError::validation(
            "sellerOrdinalId",
            "SellerOrdinalId must be an inscription id",
        ));
    }
    Ok(ordinal_id)
}

fn require_non_empty(field: &'static str, value: String) -> Result<String, ListingError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ListingError::validation(field, format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
