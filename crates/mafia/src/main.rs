//! `mafia-server` binary.
//!
//! Environment:
//! - `MAFIA_BIND`: listen address (default `127.0.0.1:8080`)
//! - `MAFIA_SEED`: fixed seed for room codes and role deals
//! - `RUST_LOG`: tracing filter (default `info`)

use mafia::{MafiaServer, ServerError};

const DEFAULT_BIND: &str = "127.0.0.1:8080";

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let bind = std::env::var("MAFIA_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());

    let mut builder = MafiaServer::builder().bind(&bind);
    match std::env::var("MAFIA_SEED").ok().map(|raw| raw.parse::<u64>()) {
        Some(Ok(seed)) => builder = builder.seed(seed),
        Some(Err(e)) => tracing::warn!(error = %e, "ignoring unparseable MAFIA_SEED"),
        None => {}
    }

    let server = builder.build().await?;
    server.run().await
}
