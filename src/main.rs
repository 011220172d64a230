use std::net::TcpListener;

use anyhow::Context;
use yatube::{config::Config, init_tracing, run_app, AppState, Result};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();
    match start().await {
        Ok(_) => (),
        Err(error) => {
            tracing::error!("Error: {:#}", error);
            std::process::exit(1);
        }
    }
}

async fn start() -> Result<()> {
    let config = Config::from_env()?;
    let address = config.bind_address;
    let state = AppState::new(config).await?;
    let listener =
        TcpListener::bind(address).with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!("Server started on {}", address);
    run_app(listener, state).await
}
