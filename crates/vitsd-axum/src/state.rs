//! Shared application state type.

use std::sync::Arc;

use vitsd_core::{Liveness, ModelSlot, PhonemizerConfig};

/// Everything the HTTP handlers need, wired once at bootstrap and
/// injected via axum state — the slot is owned here, never a global.
pub struct AppContext {
    /// The singleton model slot serializing loads and inference.
    pub slot: ModelSlot,

    /// Liveness timestamp written by the ping route, read by the
    /// watchdog.
    pub liveness: Arc<Liveness>,

    /// External phonemizer invocation settings.
    pub phonemizer: PhonemizerConfig,

    /// Seed used when a request does not supply one.
    pub default_seed: u64,
}

/// Application state shared across all handlers.
pub type AppState = Arc<AppContext>;
