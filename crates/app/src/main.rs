//! Warden - Command-line entry point
//!
//! Loads configuration, restores or establishes a session, then issues an
//! authenticated GET for every path given on the command line.

mod cli;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use warden_domain::ApiRequest;
use warden_infrastructure::{AuthStack, load_config};

use crate::cli::Args;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let stack = AuthStack::build(config)?;

    info!("Starting warden v{}", env!("CARGO_PKG_VERSION"));

    match (std::env::var("WARDEN_EMAIL"), std::env::var("WARDEN_PASSWORD")) {
        (Ok(email), Ok(password)) => {
            stack.session.login(&email, &password).await?;
        }
        _ => {
            if stack.session.restore().await.is_none() {
                warn!("no stored session, protected calls will fail until login");
            }
        }
    }

    for path in &args.paths {
        let url = if path.starts_with("http://") || path.starts_with("https://") {
            path.clone()
        } else {
            stack.config.endpoint(path)
        };
        match stack.client.send(ApiRequest::get(url.as_str())).await {
            Ok(response) => println!(
                "{} {url} ({} ms)",
                response.status,
                response.duration.as_millis()
            ),
            Err(err) => eprintln!("{url}: {err}"),
        }
    }

    Ok(())
}
