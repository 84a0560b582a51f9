//! Omnibus application entry point.
//!
//! Composition root: loads configuration, opens the session, builds the chat
//! loop, and serves either the web page or the terminal chat. The session is
//! closed once, on shutdown.

mod cli;
mod terminal;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use omnibus_api::AppState;
use omnibus_chat::ChatLoop;
use omnibus_core::config::OmnibusConfig;
use omnibus_core::error::{OmnibusError, Result};
use omnibus_gateway::SessionGateway;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Config is read before tracing starts so its log level can apply.
    let config_path = args.resolve_config_path();
    let loaded = if config_path.exists() {
        OmnibusConfig::load(&config_path).map(Some)
    } else {
        Ok(None)
    };

    let log_level = match loaded {
        Ok(Some(ref config)) => args.resolve_log_level(&config.general.log_level),
        _ => args.resolve_log_level("info"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    tracing::info!("Starting Omnibus v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match loaded {
        Ok(Some(config)) => {
            tracing::info!(path = %config_path.display(), "Configuration loaded");
            config
        }
        Ok(None) => {
            tracing::info!(
                path = %config_path.display(),
                "No configuration file; using defaults and environment"
            );
            OmnibusConfig::default()
        }
        Err(e) => {
            tracing::error!(path = %config_path.display(), error = %e, "Invalid configuration file");
            return ExitCode::FAILURE;
        }
    };
    config.apply_env_overrides();
    config.general.port = args.resolve_port(config.general.port);

    match run(config, args.terminal).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Omnibus stopped with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: OmnibusConfig, terminal_mode: bool) -> Result<()> {
    config.validate()?;

    let gateway = SessionGateway::connect(config.connection.clone(), config.search.clone())
        .await
        .map_err(|e| {
            if e.is_auth_failure() {
                tracing::error!(
                    account = %config.connection.account,
                    user = %config.connection.user,
                    error = %e,
                    "Credentials rejected"
                );
            } else {
                tracing::error!(
                    account = %config.connection.account,
                    error = %e,
                    "Could not open a session"
                );
            }
            OmnibusError::from(e)
        })?;
    let gateway = Arc::new(gateway);

    let chat = ChatLoop::new(
        gateway.clone(),
        gateway.clone(),
        &config.llm.model,
        &config.chat,
    );
    tracing::info!(
        model = %config.llm.model,
        service = %config.search.service,
        history_turns = config.chat.history_turns,
        "Chat loop ready"
    );

    let outcome = if terminal_mode {
        run_terminal_mode(chat).await
    } else {
        let state = AppState::new(config, chat).with_gateway(gateway.clone());
        omnibus_api::start_server(state, shutdown_signal()).await
    };

    if let Err(e) = gateway.close().await {
        tracing::warn!(error = %e, "Failed to close the session cleanly");
    }
    tracing::info!("Omnibus shut down");
    outcome
}

async fn run_terminal_mode(mut chat: ChatLoop) -> Result<()> {
    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    tokio::select! {
        result = terminal::run_terminal(&mut chat, input, &mut out) => result.map_err(OmnibusError::from),
        _ = shutdown_signal() => Ok(()),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
