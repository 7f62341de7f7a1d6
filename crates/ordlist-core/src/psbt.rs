//! Listing PSBT construction and signed-PSBT checks.
//!
//! [`build_listing_psbt`] turns a resolved ordinal UTXO and the seller's terms
//! into the canonical one-input, one-output PSBT the seller signs. The
//! [`SignedPsbtVerifier`] seam lets a deployment check what the seller sends
//! back before a listing goes active.

use bitcoin::absolute::LockTime;
use bitcoin::address::NetworkUnchecked;
use bitcoin::hex::FromHex;
use bitcoin::psbt::Psbt;
use bitcoin::secp256k1::{Secp256k1, XOnlyPublicKey};
use bitcoin::transaction::Version;
use bitcoin::{Address, Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};

use crate::types::{ListingNetwork, OrdinalUtxo};

/// Length of a prefixed (compressed-style) public key as sellers submit it.
const PREFIXED_KEY_LEN: usize = 33;

#[derive(Debug, thiserror::Error)]
pub enum PsbtError {
    #[error("{0}")]
    InvalidPublicKey(String),

    #[error("{0}")]
    InvalidAddress(String),

    #[error("cannot decode PSBT: {0}")]
    Decode(String),

    #[error("{0}")]
    Mismatch(String),
}

// ==============================================================================
// Key and Address Parsing
// ==============================================================================

/// Decode a 33-byte hex public key and take bytes 1..33 as the taproot
/// internal key. The leading parity/prefix byte is ignored.
pub fn internal_key_from_hex(public_key_hex: &str) -> Result<XOnlyPublicKey, PsbtError> {
    let bytes = Vec::<u8>::from_hex(public_key_hex)
        .map_err(|e| PsbtError::InvalidPublicKey(format!("not valid hex: {e}")))?;
    if bytes.len() != PREFIXED_KEY_LEN {
        return Err(PsbtError::InvalidPublicKey(format!(
            "expected {PREFIXED_KEY_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    XOnlyPublicKey::from_slice(&bytes[1..PREFIXED_KEY_LEN]).map_err(|e| {
        PsbtError::InvalidPublicKey(format!("not a valid taproot internal key: {e}"))
    })
}

/// Key-path-only P2TR output script for `internal_key`.
pub fn taproot_script(internal_key: XOnlyPublicKey) -> ScriptBuf {
    let secp = Secp256k1::verification_only();
    ScriptBuf::new_p2tr(&secp, internal_key, None)
}

/// Parse `address` and require it to belong to `network`.
pub fn payment_script(address: &str, network: ListingNetwork) -> Result<ScriptBuf, PsbtError> {
    let unchecked = address
        .parse::<Address<NetworkUnchecked>>()
        .map_err(|e| PsbtError::InvalidAddress(format!("{address}: {e}")))?;
    let checked = unchecked
        .require_network(network.to_bitcoin())
        .map_err(|e| PsbtError::InvalidAddress(format!("{address}: {e}")))?;
    Ok(checked.script_pubkey())
}

// ==============================================================================
// Builder
// ==============================================================================

/// Build the unsigned listing PSBT and return its BIP-174 serialization as
/// lower-case hex.
///
/// The transaction is version 2 with lock time 0 and a single final-sequence
/// input spending `utxo`. That input carries the seller's P2TR witness UTXO and
/// taproot internal key so a wallet can sign it on the key path. The single
/// output pays `price` satoshis to `payment_address`. No field depends on
/// anything but the arguments, so identical inputs give identical hex.
pub fn build_listing_psbt(
    utxo: &OrdinalUtxo,
    seller_public_key: &str,
    payment_address: &str,
    price: u64,
    network: ListingNetwork,
) -> Result<String, PsbtError> {
    let payout_script = payment_script(payment_address, network)?;
    let internal_key = internal_key_from_hex(seller_public_key)?;

    let unsigned_tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: utxo.outpoint(),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: vec![TxOut {
            value: Amount::from_sat(price),
            script_pubkey: payout_script,
        }],
    };

    // An unsigned transaction with empty scriptSigs and witnesses is always
    // accepted here.
    let mut psbt = Psbt::from_unsigned_tx(unsigned_tx)
        .map_err(|e| PsbtError::Decode(format!("assemble unsigned PSBT: {e}")))?;

    let input = &mut psbt.inputs[0];
    input.witness_utxo = Some(TxOut {
        value: Amount::from_sat(utxo.value),
        script_pubkey: taproot_script(internal_key),
    });
    input.tap_internal_key = Some(internal_key);

    Ok(psbt.serialize_hex())
}

pub fn decode_psbt_hex(psbt_hex: &str) -> Result<Psbt, PsbtError> {
    let bytes = Vec::<u8>::from_hex(psbt_hex.trim())
        .map_err(|e| PsbtError::Decode(format!("not valid hex: {e}")))?;
    Psbt::deserialize(&bytes).map_err(|e| PsbtError::Decode(e.to_string()))
}

// ==============================================================================
// Signed PSBT Verification
// ==============================================================================

/// What a seller-signed listing PSBT must commit to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingExpectation {
    pub outpoint: OutPoint,
    pub payment_script: ScriptBuf,
    pub price: u64,
}

impl ListingExpectation {
    pub fn new(
        utxo: &OrdinalUtxo,
        payment_address: &str,
        price: u64,
        network: ListingNetwork,
    ) -> Result<Self, PsbtError> {
        Ok(Self {
            outpoint: utxo.outpoint(),
            payment_script: payment_script(payment_address, network)?,
            price,
        })
    }
}

/// Gate between a seller-submitted PSBT and an ACTIVE listing.
pub trait SignedPsbtVerifier: Send + Sync {
    fn verify(&self, signed_psbt_hex: &str, expected: &ListingExpectation)
        -> Result<(), PsbtError>;
}

/// Checks the shape of a signed listing PSBT: it must decode, spend exactly
/// the expected outpoint, pay exactly the expected amount to the expected
/// script, and carry a key-path signature or a finalized witness on its
/// input. Signatures are not validated cryptographically.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralVerifier;

impl SignedPsbtVerifier for StructuralVerifier {
    fn verify(
        &self,
        signed_psbt_hex: &str,
        expected: &ListingExpectation,
    ) -> Result<(), PsbtError> {
        let psbt = decode_psbt_hex(signed_psbt_hex)?;
        let tx = &psbt.unsigned_tx;

        let [input] = tx.input.as_slice() else {
            return Err(PsbtError::Mismatch(format!(
                "expected 1 input, found {}",
                tx.input.len()
            )));
        };
        if input.previous_output != expected.outpoint {
            return Err(PsbtError::Mismatch(format!(
                "input spends {}, expected {}",
                input.previous_output, expected.outpoint
            )));
        }

        let [output] = tx.output.as_slice() else {
            return Err(PsbtError::Mismatch(format!(
                "expected 1 output, found {}",
                tx.output.len()
            )));
        };
        if output.script_pubkey != expected.payment_script {
            return Err(PsbtError::Mismatch(
                "output does not pay the listed payment address".to_string(),
            ));
        }
        if output.value.to_sat() != expected.price {
            return Err(PsbtError::Mismatch(format!(
                "output pays {} sat, expected {} sat",
                output.value.to_sat(),
                expected.price
            )));
        }

        let signed = psbt
            .inputs
            .first()
            .is_some_and(|i| i.tap_key_sig.is_some() || i.final_script_witness.is_some());
        if !signed {
            return Err(PsbtError::Mismatch("input is not signed".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;
    use bitcoin::hashes::Hash;
    use bitcoin::taproot::Signature;

    fn build_sample() -> String {
        build_listing_psbt(
            &sample_utxo(),
            SELLER_PUBLIC_KEY,
            MAINNET_PAYMENT_ADDRESS,
            100_000,
            ListingNetwork::Mainnet,
        )
        .expect("sample PSBT builds")
    }

    fn sign_sample(psbt_hex: &str) -> String {
        let mut psbt = decode_psbt_hex(psbt_hex).expect("decode");
        // A structurally valid (but not verifying) Schnorr signature.
        psbt.inputs[0].tap_key_sig = Some(
            Signature::from_slice(&[7u8; 64]).expect("64-byte signature parses"),
        );
        psbt.serialize_hex()
    }

    #[test]
    fn build_is_deterministic() {
        assert_eq!(build_sample(), build_sample());
    }

    #[test]
    fn build_has_one_taproot_input_and_one_payout_output() {
        let psbt = decode_psbt_hex(&build_sample()).expect("decode built PSBT");
        let tx = &psbt.unsigned_tx;

        assert_eq!(tx.version, Version::TWO);
        assert_eq!(tx.lock_time, LockTime::ZERO);
        assert_eq!(tx.input.len(), 1);
        assert_eq!(tx.input[0].previous_output, sample_utxo().outpoint());
        assert_eq!(tx.input[0].sequence, Sequence::MAX);
        assert_eq!(tx.output.len(), 1);
        assert_eq!(tx.output[0].value, Amount::from_sat(100_000));
        assert_eq!(
            tx.output[0].script_pubkey,
            payment_script(MAINNET_PAYMENT_ADDRESS, ListingNetwork::Mainnet).unwrap()
        );

        let input = &psbt.inputs[0];
        let internal_key = internal_key_from_hex(SELLER_PUBLIC_KEY).unwrap();
        assert_eq!(input.tap_internal_key, Some(internal_key));
        let witness_utxo = input.witness_utxo.as_ref().expect("witness utxo set");
        assert_eq!(witness_utxo.value, Amount::from_sat(sample_utxo().value));
        assert!(witness_utxo.script_pubkey.is_p2tr());
        assert!(input.tap_key_sig.is_none());
        assert!(input.final_script_witness.is_none());
    }

    #[test]
    fn taproot_script_matches_bip86_vector() {
        // BIP-86 m/86'/0'/0'/0/0.
        let internal_key = internal_key_from_hex(SELLER_PUBLIC_KEY).unwrap();
        let script = taproot_script(internal_key);
        assert_eq!(
            script.as_bytes(),
            Vec::<u8>::from_hex(
                "5120a60869f0dbcf1dc659c9cecbaf8050135ea9e8cdc487053f1dc6880949dc684c"
            )
            .unwrap()
            .as_slice()
        );
    }

    #[test]
    fn prefix_byte_is_ignored() {
        let odd = format!("03{}", &SELLER_PUBLIC_KEY[2..]);
        let a = build_sample();
        let b = build_listing_psbt(
            &sample_utxo(),
            &odd,
            MAINNET_PAYMENT_ADDRESS,
            100_000,
            ListingNetwork::Mainnet,
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn wrong_key_length_is_rejected() {
        let short = &SELLER_PUBLIC_KEY[2..];
        let err = build_listing_psbt(
            &sample_utxo(),
            short,
            MAINNET_PAYMENT_ADDRESS,
            1,
            ListingNetwork::Mainnet,
        )
        .unwrap_err();
        assert!(matches!(err, PsbtError::InvalidPublicKey(_)));

        let err = internal_key_from_hex("zz").unwrap_err();
        assert!(matches!(err, PsbtError::InvalidPublicKey(_)));
    }

    #[test]
    fn off_curve_internal_key_fails_closed() {
        // x = 0 has no point on secp256k1.
        let key = format!("02{}", "00".repeat(32));
        let err = internal_key_from_hex(&key).unwrap_err();
        assert!(matches!(err, PsbtError::InvalidPublicKey(_)));
    }

    #[test]
    fn address_from_other_network_is_rejected() {
        let err = build_listing_psbt(
            &sample_utxo(),
            SELLER_PUBLIC_KEY,
            TESTNET_PAYMENT_ADDRESS,
            1,
            ListingNetwork::Mainnet,
        )
        .unwrap_err();
        assert!(matches!(err, PsbtError::InvalidAddress(_)));

        let err = payment_script("not-an-address", ListingNetwork::Testnet).unwrap_err();
        assert!(matches!(err, PsbtError::InvalidAddress(_)));
        assert!(payment_script(TESTNET_PAYMENT_ADDRESS, ListingNetwork::Testnet).is_ok());
    }

    #[test]
    fn structural_verifier_accepts_signed_listing() {
        let signed = sign_sample(&build_sample());
        let expected = ListingExpectation::new(
            &sample_utxo(),
            MAINNET_PAYMENT_ADDRESS,
            100_000,
            ListingNetwork::Mainnet,
        )
        .unwrap();
        StructuralVerifier
            .verify(&signed, &expected)
            .expect("signed listing passes");
    }

    #[test]
    fn structural_verifier_rejects_unsigned_or_mismatched() {
        let unsigned = build_sample();
        let expected = ListingExpectation::new(
            &sample_utxo(),
            MAINNET_PAYMENT_ADDRESS,
            100_000,
            ListingNetwork::Mainnet,
        )
        .unwrap();
        assert!(matches!(
            StructuralVerifier.verify(&unsigned, &expected),
            Err(PsbtError::Mismatch(_))
        ));

        let signed = sign_sample(&unsigned);
        let cheaper = ListingExpectation {
            price: 90_000,
            ..expected.clone()
        };
        assert!(matches!(
            StructuralVerifier.verify(&signed, &cheaper),
            Err(PsbtError::Mismatch(_))
        ));

        let moved = ListingExpectation {
            outpoint: OutPoint::new(bitcoin::Txid::all_zeros(), 0),
            ..expected.clone()
        };
        assert!(matches!(
            StructuralVerifier.verify(&signed, &moved),
            Err(PsbtError::Mismatch(_))
        ));

        assert!(matches!(
            StructuralVerifier.verify("deadbeef", &expected),
            Err(PsbtError::Decode(_))
        ));
    }
}
