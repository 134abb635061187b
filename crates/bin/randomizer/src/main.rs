//! `randomizer` — run the blue/yellow effect on a Hue room or zone.
//!
//! Logs go to stderr; stdout carries only the JSON result so the output can
//! be piped into other tools.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use randomizer::cli::Cli;
use randomizer::config::Config;
use randomizer::runner::execute;
use randomizer_adapter_hue::HueBridge;
use randomizer_adapter_virtual::VirtualBridge;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref(), cli.simulate)?;
    init_tracing(&config.logging.filter);

    let command = cli.command(config.effect.default_duration());
    let timing = config.effect.timing();
    let interrupt = CancellationToken::new();
    let watcher = tokio::spawn(watch_signals(interrupt.clone()));

    let outcome = if cli.simulate {
        tracing::info!("using the simulated bridge");
        let bridge = Arc::new(VirtualBridge::demo()?);
        execute(bridge, command, timing, interrupt).await?
    } else {
        tracing::debug!(bridge = ?config.bridge, "connecting to bridge");
        let bridge = Arc::new(HueBridge::new(&config.bridge)?);
        execute(bridge, command, timing, interrupt).await?
    };
    watcher.abort();

    println!("{}", outcome.stdout);
    Ok(if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Cancel `interrupt` on Ctrl+C (and SIGTERM on unix).
async fn watch_signals(interrupt: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => {
                        if let Err(err) = result {
                            tracing::error!(%err, "failed to listen for Ctrl+C");
                            return;
                        }
                    }
                    _ = terminate.recv() => {}
                }
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                if let Err(err) = tokio::signal::ctrl_c().await {
                    tracing::error!(%err, "failed to listen for Ctrl+C");
                    return;
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for Ctrl+C");
            return;
        }
    }

    tracing::warn!("interrupt received, stopping the effect and restoring lights");
    interrupt.cancel();
}
