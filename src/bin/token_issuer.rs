//! Token issuer: a small HTTP service that hands browser-side chat clients a
//! signed token request, so the API key never leaves the server.

use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;

use pubsub_chat::config::{load_api_key, store_api_key, DEFAULT_BIND};
use pubsub_chat::logging::init_tracing;
use pubsub_chat::server::{self, IssuerState};
use pubsub_chat::token::{
    Capability, IssueToken, KeylessIssuer, TokenIssuer, TokenParams, DEFAULT_CLIENT_ID, DEFAULT_TTL_MS,
};

#[derive(Parser, Debug)]
#[command(name = "token-issuer", version, about = "Issue signed token requests for chat clients")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = DEFAULT_BIND)]
    bind: String,

    /// Identity stamped into every token request
    #[arg(long, default_value = DEFAULT_CLIENT_ID)]
    client_id: String,

    /// Token lifetime in milliseconds
    #[arg(long, default_value_t = DEFAULT_TTL_MS)]
    ttl_ms: u64,

    /// Capability JSON, e.g. '{"chat-demo":["publish","subscribe"]}'
    #[arg(long)]
    capability: Option<Capability>,

    /// Save `keyName:keySecret` to the OS keyring and exit
    #[arg(long, value_name = "KEY")]
    store_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("pubsub_chat=info,token_issuer=info,tower_http=info");
    let args = Args::parse();

    if let Some(raw) = &args.store_key {
        store_api_key(raw)?;
        tracing::info!("API key stored in the OS keyring");
        return Ok(());
    }

    let params = TokenParams {
        client_id: args.client_id,
        ttl_ms: args.ttl_ms,
        capability: args.capability.unwrap_or_default(),
    };

    let issuer: Arc<dyn IssueToken> = match load_api_key() {
        Ok(key) => {
            tracing::info!(key_name = key.name(), "Loaded API key");
            Arc::new(TokenIssuer::with_defaults(key, params.clone()))
        }
        Err(e) => {
            // Keep serving so clients get an explicit error body
            tracing::error!("{}; every token request will fail", e);
            Arc::new(KeylessIssuer::new(e))
        }
    };

    let listener = TcpListener::bind(&args.bind).await?;
    server::serve(listener, IssuerState::new(issuer, params)).await?;
    Ok(())
}
