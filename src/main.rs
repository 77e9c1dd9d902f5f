//! Book club access gate entry point.
//!
//! Bootstraps the server:
//! 1. Load configuration from environment
//! 2. Warn about disabled or weak gates
//! 3. Build router with admin gate + round endpoints
//! 4. Apply security headers middleware
//! 5. Start Axum server
//!
//! Also supports a `round-token` subcommand for issuing round access tokens.

use bookclub::{auth::AppState, config::Config, routes};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` if set, otherwise `info` so startup warnings are always shown.
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn print_round_token_usage() {
    eprintln!("Usage: bookclub round-token <vote|suggestion> <round-id>");
    eprintln!();
    eprintln!("Print a round access token signed with the configured realm secret.");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  bookclub round-token vote 42");
    eprintln!();
    eprintln!("Send it as the cookie value, e.g.:");
    eprintln!("  Cookie: vote_access=<output>");
}

fn round_token(config: Config, realm: &str, id: &str) -> Result<String, String> {
    let (realm, id) = routes::parse_round_path(realm, id).map_err(|e| e.to_string())?;
    let state = AppState::new(config);
    Ok(state.verifier(realm).issue_token(id))
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries only `round-token` output
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();

    // Load config from environment
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load config");
            return ExitCode::FAILURE;
        }
    };
    config.log_warnings();

    // Check for round-token subcommand
    let args: Vec<String> = std::env::args().collect();
    if args.len() >= 2 && args[1] == "round-token" {
        if args.len() != 4 {
            print_round_token_usage();
            return ExitCode::FAILURE;
        }
        return match round_token(config, &args[2], &args[3]) {
            Ok(token) => {
                println!("{}", token);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error issuing token: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    tracing::info!("Starting bookclub gate on {}", config.bind_addr);
    let bind_addr = config.bind_addr;
    let app = routes::app(AppState::new(config));

    let listener = match tokio::net::TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, addr = %bind_addr, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("Listening on {}", bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
