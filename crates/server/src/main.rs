//! Webdesq server binary.
//!
//! `webdesq serve` (the default) mounts the bundled plugins and serves
//! them; `webdesq check` validates the site file and plugin graph, prints
//! a summary, and exits.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::http::{HeaderName, HeaderValue, Method, header};
use clap::{Parser, Subcommand};
use flatpages::FlatpagesPlugin;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use webdesq_kernel::{Config, Kernel, SiteConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Serve the HTTP API.
    Serve,
    /// Validate configuration and plugins without serving.
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;
    let site = SiteConfig::load(&config.site_config)?;

    let kernel = Kernel::builder(site)
        .plugin(FlatpagesPlugin)
        .build()
        .context("failed to assemble host")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Check => {
            check(&kernel);
            Ok(())
        }
        Command::Serve => serve(&config, &kernel).await,
    }
}

fn check(kernel: &Kernel) {
    for plugin in kernel.plugins() {
        println!(
            "{} {} ({} routes, {} features)",
            plugin.id,
            plugin.version,
            plugin.routes.len(),
            plugin.features.len()
        );
    }
    println!(
        "{} features, {} users: ok",
        kernel.features().len(),
        kernel.users().len()
    );
}

async fn serve(config: &Config, kernel: &Kernel) -> Result<()> {
    let app = kernel
        .router()
        .layer(build_cors_layer(config))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "Starting Webdesq server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(config: &Config) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    // Listed explicitly since credentials rule out a wildcard
    let headers = [
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        HeaderName::from_static("format"),
        HeaderName::from_static("init"),
    ];

    if config.cors_allowed_origins.len() == 1 && config.cors_allowed_origins[0] == "*" {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(headers)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["webdesq"]).unwrap();
        assert_eq!(cli.command, None);

        let cli = Cli::try_parse_from(["webdesq", "check"]).unwrap();
        assert_eq!(cli.command, Some(Command::Check));
        assert!(Cli::try_parse_from(["webdesq", "launch"]).is_err());
    }
}
