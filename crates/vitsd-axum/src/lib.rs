//! Axum HTTP control plane for the vitsd speech-synthesis server.
//!
//! Routes map directly onto [`vitsd_core::ModelSlot`] operations:
//! liveness ping, phonemized and raw synthesis, and the policy-gated
//! model reload. See [`routes::create_router`] for the surface.

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

// Re-export primary types
pub use bootstrap::{ServerConfig, bootstrap, run_onetime, start_server};
pub use error::HttpError;
pub use routes::create_router;
pub use state::{AppContext, AppState};
