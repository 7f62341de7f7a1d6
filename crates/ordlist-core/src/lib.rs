pub mod error;
pub mod listing;
mod locks;
pub mod psbt;
pub mod resolver;
pub mod store;
#[cfg(test)]
pub(crate) mod test_util;
pub mod types;

pub use error::ListingError;
pub use listing::ListingService;
pub use types::{Listing, ListingNetwork, ListingStatus, ListingTerms, OrdinalUtxo, SignedListing};
