//! The model slot — the concurrency core of the server.
//!
//! Holds at most one loaded [`EngineHandle`] behind a single exclusive
//! lock that totally orders every `load` and `infer` across the whole
//! process: at most one of them executes at any instant. Concurrent
//! synthesis requests queue rather than run in parallel because the
//! engine capability is not assumed to survive concurrent invocation.
//!
//! Both operations run entirely inside `spawn_blocking` while holding
//! the guard, so a multi-second load or inference never stalls the
//! async runtime's worker threads.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::engine::{EngineHandle, SynthesisEngine};
use crate::error::TtsError;
use crate::hparams::HyperParams;
use crate::weights;

/// One completed synthesis call.
#[derive(Debug)]
pub struct Synthesis {
    /// Encoded audio bytes, ready for the HTTP response.
    pub audio: Vec<u8>,

    /// Wall-clock time spent inside the engine, in seconds.
    pub synth_duration: f64,

    /// Nominal playback duration, in seconds, derived from sample count
    /// and the model's sampling rate.
    pub wav_duration: f64,
}

#[derive(Default)]
struct SlotState {
    handle: Option<Box<dyn EngineHandle>>,
    hparams: Option<HyperParams>,
}

/// Process-wide holder of the currently loaded synthesis engine.
///
/// Constructed empty; populated by the first [`load`](Self::load) and
/// replaced wholesale by later ones. Owned by the HTTP layer via
/// dependency passing, never a global, so tests can instantiate
/// independent slots.
pub struct ModelSlot {
    engine: Arc<dyn SynthesisEngine>,
    reloadable: bool,
    state: Arc<Mutex<SlotState>>,
}

impl ModelSlot {
    /// Create an empty slot around an engine capability.
    ///
    /// `reloadable` is the process-lifetime policy for
    /// [`reload`](Self::reload); the initial [`load`](Self::load) at
    /// startup is always permitted.
    pub fn new(engine: Arc<dyn SynthesisEngine>, reloadable: bool) -> Self {
        Self {
            engine,
            reloadable,
            state: Arc::new(Mutex::new(SlotState::default())),
        }
    }

    /// Load (or replace) the model. Returns the weight path as the
    /// identifier of the now-current model.
    ///
    /// Holds the slot lock across descriptor parsing, weight
    /// materialization and engine construction, so no inference can
    /// observe a half-loaded model. All-or-nothing: on any failure the
    /// slot is left empty — a failed load invalidates rather than
    /// preserves the previous model — and the error is re-raised.
    pub async fn load(
        &self,
        hps_path: PathBuf,
        weights_path: PathBuf,
        obfuscated: bool,
    ) -> Result<PathBuf, TtsError> {
        let engine = Arc::clone(&self.engine);
        let state = Arc::clone(&self.state);

        tokio::task::spawn_blocking(move || {
            let mut slot = state
                .lock()
                .map_err(|e| TtsError::Synthesis(format!("model slot lock poisoned: {e}")))?;

            let t0 = Instant::now();
            let loaded = (|| {
                let hparams = HyperParams::from_file(&hps_path)?;
                // The decrypted temp copy lives exactly as long as this
                // closure; dropped before the lock is released.
                let usable = weights::materialize(&weights_path, obfuscated)?;
                let handle = engine.load(&hparams, usable.path())?;
                Ok::<_, TtsError>((handle, hparams))
            })();

            match loaded {
                Ok((handle, hparams)) => {
                    tracing::info!(
                        model = %weights_path.display(),
                        elapsed = ?t0.elapsed(),
                        "synthesis model loaded"
                    );
                    slot.handle = Some(handle);
                    slot.hparams = Some(hparams);
                    Ok(weights_path)
                }
                Err(e) => {
                    tracing::error!(model = %weights_path.display(), error = %e, "model load failed");
                    slot.handle = None;
                    slot.hparams = None;
                    Err(e)
                }
            }
        })
        .await
        .map_err(|e| TtsError::Synthesis(format!("load task aborted: {e}")))?
    }

    /// Policy-gated [`load`](Self::load) for the `/set-model` route.
    ///
    /// When reloads are disabled this rejects before touching the lock
    /// or the current model.
    pub async fn reload(
        &self,
        hps_path: PathBuf,
        weights_path: PathBuf,
        obfuscated: bool,
    ) -> Result<PathBuf, TtsError> {
        if !self.reloadable {
            return Err(TtsError::ReloadDisabled);
        }
        self.load(hps_path, weights_path, obfuscated).await
    }

    /// Synthesize `text` with a derandomized seed.
    ///
    /// Requires a loaded model ([`TtsError::ModelAbsent`] otherwise —
    /// a precondition violation, distinct from synthesis failure).
    pub async fn infer(&self, text: String, seed: u64) -> Result<Synthesis, TtsError> {
        let state = Arc::clone(&self.state);

        tokio::task::spawn_blocking(move || {
            let slot = state
                .lock()
                .map_err(|e| TtsError::Synthesis(format!("model slot lock poisoned: {e}")))?;
            let handle = slot.handle.as_deref().ok_or(TtsError::ModelAbsent)?;
            let hparams = slot.hparams.as_ref().ok_or(TtsError::ModelAbsent)?;

            let text = text.trim_end_matches('\n');
            tracing::info!(seed, chars = text.chars().count(), "starting synthesis");

            let t0 = Instant::now();
            let audio = handle.infer(text, seed)?;
            let synth_duration = t0.elapsed().as_secs_f64();
            let wav_duration = audio.samples as f64 / f64::from(hparams.data.sampling_rate);

            if wav_duration > 0.0 {
                tracing::info!(
                    "synthesis finished: RTF {:.4}, wav dur. {wav_duration:.4} s, synth dur. {synth_duration:.4} s",
                    synth_duration / wav_duration
                );
            }

            Ok(Synthesis { audio: audio.data, synth_duration, wav_duration })
        })
        .await
        .map_err(|e| TtsError::Synthesis(format!("synthesis task aborted: {e}")))?
    }

    /// Snapshot of the loaded model's accepted symbol set, for
    /// phonemizer post-filtering. Takes the slot lock briefly.
    pub async fn symbols(&self) -> Result<HashSet<char>, TtsError> {
        let state = Arc::clone(&self.state);
        tokio::task::spawn_blocking(move || {
            let slot = state
                .lock()
                .map_err(|e| TtsError::Synthesis(format!("model slot lock poisoned: {e}")))?;
            slot.hparams
                .as_ref()
                .map(HyperParams::symbol_set)
                .ok_or(TtsError::ModelAbsent)
        })
        .await
        .map_err(|e| TtsError::Synthesis(format!("symbols task aborted: {e}")))?
    }
}
