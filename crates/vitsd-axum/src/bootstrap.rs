//! Server bootstrap - the composition root.
//!
//! This is the ONLY place where infrastructure is wired together: the
//! synthesis engine backend, the model slot, liveness tracking and the
//! watchdog. The initial model load happens here, before the server
//! starts accepting requests.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use vitsd_core::{
    Liveness, ModelSlot, PhonemizerConfig, StubEngine, SynthesisEngine, Watchdog, liveness_window,
};

use crate::routes::create_router;
use crate::state::AppContext;

/// Process-level configuration, built from CLI flags.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Initial hyperparameter descriptor path.
    pub hps_path: PathBuf,
    /// Initial weight file path.
    pub model_path: PathBuf,
    /// Default synthesis seed.
    pub seed: u64,
    /// One-shot mode: stdin text in, WAV on stdout, no HTTP.
    pub onetime: bool,
    /// Liveness window in seconds; negative disables the watchdog.
    pub alive_for: i64,
    /// Whether `/set-model` reloads are permitted.
    pub allow_set_model: bool,
    /// Whether the initial weight file is obfuscated.
    pub obfuscated: bool,
}

/// Wire up the application context and perform the initial model load.
///
/// A failed initial load aborts startup — the server never comes up
/// with an empty slot by accident.
pub async fn bootstrap(config: &ServerConfig) -> Result<AppContext> {
    // Swap in a real engine here; the stub keeps the control plane
    // fully functional without proprietary weights.
    let engine: Arc<dyn SynthesisEngine> = Arc::new(StubEngine::default());
    let slot = ModelSlot::new(engine, config.allow_set_model);

    slot.load(
        config.hps_path.clone(),
        config.model_path.clone(),
        config.obfuscated,
    )
    .await?;

    Ok(AppContext {
        slot,
        liveness: Arc::new(Liveness::new()),
        phonemizer: PhonemizerConfig::default(),
        default_seed: config.seed,
    })
}

/// Start the HTTP server, serving until the process is terminated.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    let ctx = bootstrap(&config).await?;

    Watchdog::spawn(Arc::clone(&ctx.liveness), liveness_window(config.alive_for));

    let app = create_router(ctx);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("vitsd listening on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

/// One-shot mode: read one text from stdin, write one WAV to stdout,
/// exit. Bypasses the HTTP layer entirely.
pub async fn run_onetime(config: &ServerConfig) -> Result<()> {
    let ctx = bootstrap(config).await?;

    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text)?;

    let synth = ctx.slot.infer(text.trim().to_string(), config.seed).await?;
    std::io::stdout().write_all(&synth.audio)?;
    Ok(())
}
