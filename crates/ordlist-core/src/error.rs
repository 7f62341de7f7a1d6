use crate::psbt::PsbtError;
use crate::resolver::ResolverError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("this ordinal is already listed: {0}")]
    AlreadyListed(String),

    #[error("no listing exists for ordinal: {0}")]
    NotFound(String),

    #[error("request data does not match the listing on file for ordinal: {0}")]
    IdentityMismatch(String),

    #[error("could not resolve ordinal UTXO: {0}")]
    OrdinalResolution(#[from] ResolverError),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid payment address: {0}")]
    InvalidAddress(String),

    #[error("signed listing PSBT rejected: {0}")]
    InvalidSignedPsbt(String),

    #[error("listing for ordinal {0} changed concurrently; retry the request")]
    Conflict(String),

    #[error(transparent)]
    Store(StoreError),
}

impl ListingError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// `true` when the same request may succeed if simply repeated.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Conflict(_) => true,
            Self::OrdinalResolution(err) => err.is_transient(),
            Self::Store(StoreError::Io(_)) => true,
            _ => false,
        }
    }
}

impl From<StoreError> for ListingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { ordinal_id, .. } => Self::Conflict(ordinal_id),
            other => Self::Store(other),
        }
    }
}

impl From<PsbtError> for ListingError {
    fn from(err: PsbtError) -> Self {
        match err {
            PsbtError::InvalidPublicKey(msg) => Self::InvalidPublicKey(msg),
            PsbtError::InvalidAddress(msg) => Self::InvalidAddress(msg),
            PsbtError::Decode(msg) | PsbtError::Mismatch(msg) => Self::InvalidSignedPsbt(msg),
        }
    }
}
