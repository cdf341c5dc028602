//! huddle-web: REST front end over the chat engines.
//!
//! Every request carries its caller's identity token as a bearer token and
//! maps onto one [`Chat`](crate::chat::Chat) operation.

pub mod config;
pub mod handlers;
pub mod router;
pub mod state;
pub mod utils;

use std::error::Error;

use clap::Parser;

use crate::chat::Chat;
use crate::storage::db_path;

use config::{Cli, Config};

/// Entry point: parse CLI, open the store, start server.
pub async fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = Config::from_cli_and_env(cli);

    crate::logging::init();

    tracing::info!("huddle-web starting");
    tracing::info!("  data directory: {}", config.data_dir.display());

    let path = db_path(&config.data_dir);
    let chat = Chat::open(&path)?;
    tracing::info!("  database: {}", path.display());

    let app = router::build_router(state::shared(chat));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("huddle-web listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
