use std::path::PathBuf;

use clap::Parser;

use ordlist_core::ListingNetwork;

/// ordlist: list Bitcoin ordinals for sale with seller-signed PSBTs.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Network listings are built for (`main` or `test`).
    #[arg(long, default_value = "main", env = "ORDLIST_NETWORK")]
    pub network: ListingNetwork,

    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "127.0.0.1", env = "ORDLIST_BIND")]
    pub bind: String,

    /// Port to listen on.
    #[arg(long, default_value = "3090", env = "ORDLIST_PORT")]
    pub port: u16,

    /// Inscription indexer base URL. Defaults to the public indexer for the
    /// selected network.
    #[arg(long, env = "ORDLIST_RESOLVER_URL")]
    pub resolver_url: Option<String>,

    /// Bearer API key for the inscription indexer.
    #[arg(long, env = "ORDLIST_RESOLVER_API_KEY", hide_env_values = true)]
    pub resolver_api_key: Option<String>,

    /// Per-call timeout for inscription lookups, in seconds.
    #[arg(long, default_value = "15", env = "ORDLIST_RESOLVER_TIMEOUT_SECS")]
    pub resolver_timeout_secs: u64,

    /// Overall timeout for one listing request, in seconds.
    #[arg(long, default_value = "30", env = "ORDLIST_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: u64,

    /// JSONL file listings are persisted to. If omitted, listings are
    /// in-memory only.
    #[arg(long, env = "ORDLIST_STORE_PATH")]
    pub store_path: Option<PathBuf>,

    /// Reject signed PSBTs that do not spend the listed UTXO, pay the listed
    /// price to the listed address, and carry a signature.
    #[arg(long, env = "ORDLIST_VERIFY_SIGNED_PSBT")]
    pub verify_signed_psbt: bool,

    /// Browser origins allowed to call the API (repeatable).
    #[arg(long, env = "ORDLIST_ALLOWED_ORIGIN", value_delimiter = ',')]
    pub allowed_origin: Vec<String>,
}
