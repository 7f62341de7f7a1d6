use std::time::Duration;

use async_trait::async_trait;
use bitcoin::Txid;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::types::{is_inscription_id, ListingNetwork, OrdinalUtxo};

use super::{OrdinalResolver, ResolverError};

pub const DEFAULT_MAINNET_URL: &str = "https://open-api.unisat.io";
pub const DEFAULT_TESTNET_URL: &str = "https://open-api-testnet.unisat.io";

// ==============================================================================
// HttpOrdinalResolver: inscription indexer REST client
// ==============================================================================

pub struct HttpOrdinalResolver {
    client: reqwest::Client,
    mainnet_url: String,
    testnet_url: String,
    api_key: Option<String>,
}

impl HttpOrdinalResolver {
    pub fn new(api_key: Option<&str>, timeout: Duration) -> Result<Self, ResolverError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10).min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| ResolverError::Unavailable(format!("build HTTP client: {e}")))?;

        Ok(Self {
            client,
            mainnet_url: DEFAULT_MAINNET_URL.to_owned(),
            testnet_url: DEFAULT_TESTNET_URL.to_owned(),
            api_key: api_key.map(str::to_owned),
        })
    }

    /// Point one network at a different indexer deployment.
    pub fn with_base_url(mut self, network: ListingNetwork, url: &str) -> Self {
        let url = url.trim_end_matches('/').to_owned();
        match network {
            ListingNetwork::Mainnet => self.mainnet_url = url,
            ListingNetwork::Testnet => self.testnet_url = url,
        }
        self
    }

    fn info_url(&self, ordinal_id: &str, network: ListingNetwork) -> String {
        let base = match network {
            ListingNetwork::Mainnet => &self.mainnet_url,
            ListingNetwork::Testnet => &self.testnet_url,
        };
        format!("{base}/v1/indexer/inscription/info/{ordinal_id}")
    }
}

#[async_trait]
impl OrdinalResolver for HttpOrdinalResolver {
    async fn resolve(
        &self,
        ordinal_id: &str,
        network: ListingNetwork,
    ) -> Result<OrdinalUtxo, ResolverError> {
        check_inscription_id(ordinal_id)?;

        let url = self.info_url(ordinal_id, network);
        debug!(ordinal_id, %network, "resolve inscription");

        let mut builder = self.client.get(&url);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ResolverError::Unavailable(format!("HTTP error: {e}")))?;
        let status = response.status();

        let body = response
            .text()
            .await
            .map_err(|e| ResolverError::Unavailable(format!("read response body: {e}")))?;
        debug!(ordinal_id, %status, body_len = body.len(), "indexer response");
        trace!(ordinal_id, body = %body, "indexer response body");

        match status {
            StatusCode::NOT_FOUND => return Err(ResolverError::NotFound(ordinal_id.to_owned())),
            s if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => {
                return Err(ResolverError::Unavailable(format!("indexer returned {s}")));
            }
            s if !s.is_success() => {
                return Err(ResolverError::InvalidResponse(format!(
                    "indexer returned {s}"
                )));
            }
            _ => {}
        }

        parse_inscription_info(ordinal_id, &body)
    }
}

// ==============================================================================
// Response Parsing
// ==============================================================================

#[derive(Deserialize)]
struct InfoEnvelope {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<InscriptionInfo>,
}

#[derive(Deserialize)]
struct InscriptionInfo {
    utxo: Option<InscriptionUtxo>,
}

#[derive(Deserialize)]
struct InscriptionUtxo {
    txid: String,
    vout: u32,
    satoshi: u64,
}

/// Anything outside the inscription id alphabet is refused before it
/// reaches a URL path.
fn check_inscription_id(ordinal_id: &str) -> Result<(), ResolverError> {
    if !is_inscription_id(ordinal_id) {
        return Err(ResolverError::NotFound(format!(
            "malformed inscription id `{ordinal_id}`"
        )));
    }
    Ok(())
}

pub(super) fn parse_inscription_info(
    ordinal_id: &str,
    body: &str,
) -> Result<OrdinalUtxo, ResolverError> {
    let envelope: InfoEnvelope = serde_json::from_str(body)
        .map_err(|e| ResolverError::InvalidResponse(format!("decode indexer response: {e}")))?;

    if envelope.code != 0 {
        return Err(ResolverError::NotFound(format!(
            "{ordinal_id} ({})",
            envelope.msg
        )));
    }

    let utxo = envelope
        .data
        .and_then(|d| d.utxo)
        .ok_or_else(|| ResolverError::NotFound(format!("{ordinal_id} has no current UTXO")))?;

    let txid: Txid = utxo
        .txid
        .parse()
        .map_err(|e| ResolverError::InvalidResponse(format!("invalid txid: {e}")))?;

    Ok(OrdinalUtxo {
        txid,
        vout: utxo.vout,
        value: utxo.satoshi,
    })
}
