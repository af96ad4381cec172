//! Model-serving control plane for a single speech-synthesis model.
//!
//! The neural network is an external collaborator behind the
//! [`SynthesisEngine`] capability; this crate owns everything around it:
//! the XOR obfuscation cipher for weights at rest, streaming
//! materialization of decrypted weight files, the mutually-exclusive
//! [`ModelSlot`] that serializes loads and inference, the external
//! phonemizer wrapper, and the liveness watchdog.

pub mod cipher;
pub mod engine;
pub mod error;
pub mod hparams;
pub mod liveness;
pub mod phonemize;
pub mod slot;
pub mod weights;

// Re-export key types for convenience
pub use engine::{EngineHandle, RawAudio, StubEngine, SynthesisEngine};
pub use error::TtsError;
pub use hparams::HyperParams;
pub use liveness::{Liveness, Watchdog, liveness_window};
pub use phonemize::{PhonemizerConfig, filter_symbols, phonemize};
pub use slot::{ModelSlot, Synthesis};
pub use weights::{MaterializedWeights, materialize};
