//! Control-plane error types.

/// Errors that can occur while loading or querying the synthesis model.
#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    /// Hyperparameter descriptor is missing fields or is not valid JSON.
    #[error("Invalid hyperparameters: {0}")]
    Config(String),

    /// IO error (weight files, temp files, stdin/stdout).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Synthesis attempted with no model loaded.
    #[error("No model loaded — load one via /set-model first")]
    ModelAbsent,

    /// The external phonemizer process failed or could not be spawned.
    #[error("Phonemizer failed: {0}")]
    Phonemizer(String),

    /// The synthesis engine failed during load or inference.
    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    /// Model reload requested while the reload policy forbids it.
    #[error("Model reload is disabled on this server")]
    ReloadDisabled,
}
