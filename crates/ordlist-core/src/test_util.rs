//! Shared test helpers for `ordlist-core` unit tests.
//!
//! Fixed seller keys and addresses, deterministic txids, and listing record
//! builders, so tests across modules share one source of dummy data.

use bitcoin::hashes::Hash;
use bitcoin::Txid;

use crate::types::{Listing, ListingStatus, OrdinalUtxo};

// ==============================================================================
// Keys and Addresses
// ==============================================================================

/// BIP-86 test vector internal key (m/86'/0'/0'/0/0), with a `02` prefix.
pub const SELLER_PUBLIC_KEY: &str =
    "02cc8a4bc64d897bddc5fbc2f670f7a8ba0b386779106cf1223c6fc5d7cd6fc115";

/// The mainnet P2TR address for [`SELLER_PUBLIC_KEY`].
pub const MAINNET_PAYMENT_ADDRESS: &str =
    "bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr";

/// BIP-173 mainnet P2WPKH example.
pub const OTHER_MAINNET_ADDRESS: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

/// BIP-173 testnet P2WPKH example.
pub const TESTNET_PAYMENT_ADDRESS: &str = "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx";

// ==============================================================================
// UTXO Helpers
// ==============================================================================

/// Create a deterministic `Txid` from a single distinguishing byte.
pub fn txid_from_byte(b: u8) -> Txid {
    let mut bytes = [0u8; 32];
    bytes[0] = b;
    Txid::from_byte_array(bytes)
}

pub fn utxo(b: u8, vout: u32, value: u64) -> OrdinalUtxo {
    OrdinalUtxo {
        txid: txid_from_byte(b),
        vout,
        value,
    }
}

/// A 546-sat inscription output, the usual postage.
pub fn sample_utxo() -> OrdinalUtxo {
    utxo(1, 0, 546)
}

// ==============================================================================
// Listing Builders
// ==============================================================================

/// A stored listing for `ordinal_id` owned by the fixture seller. Override
/// fields after construction when needed.
pub fn make_listing(ordinal_id: &str, status: ListingStatus) -> Listing {
    let utxo = sample_utxo();
    Listing {
        ordinal_id: ordinal_id.to_string(),
        price: 50_000,
        seller_payment_address: MAINNET_PAYMENT_ADDRESS.to_string(),
        seller_ordinal_public_key: SELLER_PUBLIC_KEY.to_string(),
        status,
        ordinal_utxo_tx_id: utxo.txid.to_string(),
        ordinal_utxo_vout: utxo.vout,
        service_fee: 500,
        signed_listing_psbt: "70736274ff".to_string(),
    }
}
