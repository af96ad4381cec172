//! vitsd entry point.
//!
//! Parses CLI flags, initializes tracing and dispatches to either the
//! HTTP server or one-shot synthesis mode.

use clap::Parser;
use std::path::PathBuf;

use vitsd_axum::bootstrap::{ServerConfig, run_onetime, start_server};

/// VITS speech-synthesis HTTP server and one-shot synthesizer.
#[derive(Parser, Debug)]
#[command(name = "vitsd")]
#[command(about = "Serve a single VITS model over HTTP, or synthesize once from stdin")]
struct Cli {
    /// Bind host (server mode)
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Bind port (server mode)
    #[arg(long, default_value_t = 17500)]
    port: u16,

    /// Initial weight file
    #[arg(long, default_value = "./archives/G_vits_x_x.pth")]
    model_path: PathBuf,

    /// Initial hyperparameter descriptor
    #[arg(long, default_value = "./archives/inference.json")]
    hps_path: PathBuf,

    /// Default synthesis seed
    #[arg(long, default_value_t = 1234)]
    seed: u64,

    /// Read one text from stdin, write one WAV to stdout, exit
    #[arg(long)]
    onetime: bool,

    /// Liveness window in seconds; negative disables the watchdog
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    alive_for: i64,

    /// Forbid /set-model reloads for the lifetime of the process
    #[arg(long)]
    disable_set_model: bool,

    /// Treat the weight file as plain (skip XOR de-obfuscation)
    #[arg(long)]
    noxor: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
        hps_path: cli.hps_path,
        model_path: cli.model_path,
        seed: cli.seed,
        onetime: cli.onetime,
        alive_for: cli.alive_for,
        allow_set_model: !cli.disable_set_model,
        obfuscated: !cli.noxor,
    };
    tracing::info!(?config, "starting vitsd");

    if config.onetime {
        run_onetime(&config).await
    } else {
        start_server(config).await
    }
}
