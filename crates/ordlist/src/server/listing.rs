use std::future::Future;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use ordlist_core::{Listing, ListingError, ListingService, ListingTerms, SignedListing};

use super::error::AppError;
use super::SharedState;

// ==============================================================================
// DTOs
// ==============================================================================

/// Sellers' wallets send the price either as a JSON number or as a decimal
/// string.
#[derive(Deserialize)]
#[serde(untagged)]
pub(super) enum PriceField {
    Sats(u64),
    Text(String),
}

/// Body shared by every listing route. Missing fields deserialize as empty so
/// they are reported by field name rather than as a JSON shape error.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ListingRequest {
    #[serde(default)]
    seller_ordinal_id: String,
    #[serde(default)]
    seller_ordinal_price: Option<PriceField>,
    #[serde(default)]
    seller_payment_address: String,
    #[serde(default)]
    seller_ordinal_public_key: String,
    #[serde(default, rename = "signedListingPSBT")]
    signed_listing_psbt: Option<String>,
}

impl ListingRequest {
    fn terms(&self) -> Result<ListingTerms, ListingError> {
        let price = match &self.seller_ordinal_price {
            None => 0,
            Some(PriceField::Sats(sats)) => *sats,
            Some(PriceField::Text(text)) if text.trim().is_empty() => 0,
            Some(PriceField::Text(text)) => text.trim().parse().map_err(|_| {
                ListingError::Validation {
                    field: "sellerOrdinalPrice",
                    message: "sellerOrdinalPrice must be a whole number of satoshis".to_string(),
                }
            })?,
        };
        ListingTerms::new(
            self.seller_ordinal_id.as_str(),
            price,
            self.seller_payment_address.as_str(),
            self.seller_ordinal_public_key.as_str(),
        )
    }

    fn signed(&self) -> Result<SignedListing, ListingError> {
        let terms = self.terms()?;
        SignedListing::new(terms, self.signed_listing_psbt.clone().unwrap_or_default())
    }
}

#[derive(Serialize)]
pub(super) struct DataResponse<T> {
    data: T,
}

// ==============================================================================
// Handlers
// ==============================================================================

pub(super) async fn create_listing(
    State(state): State<SharedState>,
    req: Result<Json<ListingRequest>, JsonRejection>,
) -> Result<Json<DataResponse<String>>, AppError> {
    let terms = parse_body(req)?.terms()?;
    let psbt = run_bounded(&state, move |svc| async move {
        svc.create_listing(&terms).await
    })
    .await?;
    Ok(Json(DataResponse { data: psbt }))
}

pub(super) async fn publish_listing(
    State(state): State<SharedState>,
    req: Result<Json<ListingRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Listing>>, AppError> {
    let signed = parse_body(req)?.signed()?;
    let listing = run_bounded(&state, move |svc| async move {
        svc.publish_listing(&signed).await
    })
    .await?;
    Ok(Json(DataResponse { data: listing }))
}

pub(super) async fn request_relist(
    State(state): State<SharedState>,
    req: Result<Json<ListingRequest>, JsonRejection>,
) -> Result<Json<DataResponse<String>>, AppError> {
    let terms = parse_body(req)?.terms()?;
    let psbt = run_bounded(&state, move |svc| async move {
        svc.request_relist(&terms).await
    })
    .await?;
    Ok(Json(DataResponse { data: psbt }))
}

pub(super) async fn confirm_relist(
    State(state): State<SharedState>,
    req: Result<Json<ListingRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Listing>>, AppError> {
    let signed = parse_body(req)?.signed()?;
    let listing = run_bounded(&state, move |svc| async move {
        svc.confirm_listing(&signed).await
    })
    .await?;
    Ok(Json(DataResponse { data: listing }))
}

pub(super) async fn get_listing(
    State(state): State<SharedState>,
    Path(ordinal_id): Path<String>,
) -> Result<Json<DataResponse<Listing>>, AppError> {
    let listing = run_bounded(&state, move |svc| async move {
        svc.get_listing(&ordinal_id).await
    })
    .await?;
    Ok(Json(DataResponse { data: listing }))
}

fn parse_body(req: Result<Json<ListingRequest>, JsonRejection>) -> Result<ListingRequest, AppError> {
    let Json(req) = req.map_err(|e| AppError::BadRequest(e.body_text()))?;
    Ok(req)
}

/// Run one listing operation on its own task, bounded by the configured
/// request timeout. On timeout only the response is abandoned; the task still
/// runs to completion, so a commit is never cut off inside its store write.
async fn run_bounded<T, F, Fut>(state: &SharedState, operation: F) -> Result<T, AppError>
where
    F: FnOnce(Arc<ListingService>) -> Fut,
    Fut: Future<Output = Result<T, ListingError>> + Send + 'static,
    T: Send + 'static,
{
    let task = tokio::spawn(operation(Arc::clone(&state.listings)));
    match tokio::time::timeout(state.request_timeout, task).await {
        Ok(Ok(result)) => result.map_err(AppError::from),
        Ok(Err(join_err)) => Err(AppError::Internal(format!(
            "listing task failed: {join_err}"
        ))),
        Err(_) => {
            tracing::warn!(timeout = ?state.request_timeout, "listing request timed out");
            Err(AppError::GatewayTimeout(format!(
                "listing request did not complete within {:?}",
                state.request_timeout
            )))
        }
    }
}
