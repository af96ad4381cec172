//! Axum handlers for the control-plane routes.
//!
//! Handlers are thin wrappers — each maps one route onto the model
//! slot, with request/response shapes co-located here. The phonemizer
//! subprocess runs outside the slot's critical section; only the
//! symbol-set snapshot and the inference itself take the lock.

use std::path::PathBuf;

use axum::Json;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::Response;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use vitsd_core::{Synthesis, filter_symbols, phonemize};

use crate::error::HttpError;
use crate::state::AppState;

// ── Request/response shapes ────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SeedQuery {
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SynthesizeResponse {
    /// Phonemized text after filtering to the model's symbol set.
    pub ipa: String,
    /// Base64-encoded audio bytes.
    pub audio_data: String,
    pub synth_duration: f64,
    pub wav_duration: f64,
}

#[derive(Debug, Deserialize)]
pub struct SetModelQuery {
    pub hps_path: PathBuf,
    pub model_path: PathBuf,
    /// `"true"` disables de-obfuscation of the weight file.
    pub noxor: Option<String>,
}

// ── Handlers ───────────────────────────────────────────────────────

/// `GET /` — liveness ping.
pub async fn ping(State(state): State<AppState>) -> &'static str {
    state.liveness.ping();
    "pong"
}

/// `POST /synthesize` — phonemize, then synthesize, JSON in and out.
pub async fn synthesize_json(
    State(state): State<AppState>,
    Query(query): Query<SeedQuery>,
    Json(req): Json<SynthesizeRequest>,
) -> Result<Json<SynthesizeResponse>, HttpError> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err(HttpError::BadRequest("No text provided".to_string()));
    }

    let symbols = state.slot.symbols().await?;
    let ipa = phonemize(&state.phonemizer, text).await?;
    let ipa = filter_symbols(&ipa, &symbols);

    let seed = query.seed.unwrap_or(state.default_seed);
    let synth = state.slot.infer(ipa.clone(), seed).await?;

    Ok(Json(SynthesizeResponse {
        ipa,
        audio_data: BASE64.encode(&synth.audio),
        synth_duration: synth.synth_duration,
        wav_duration: synth.wav_duration,
    }))
}

/// `POST /` — synthesize the raw body text directly, no phonemization.
pub async fn synthesize_raw(
    State(state): State<AppState>,
    Query(query): Query<SeedQuery>,
    body: String,
) -> Result<Response, HttpError> {
    let seed = query.seed.unwrap_or(state.default_seed);
    let synth = state.slot.infer(body, seed).await?;
    audio_response(synth)
}

/// `GET /set-model` — policy-gated model reload.
pub async fn set_model(
    State(state): State<AppState>,
    Query(query): Query<SetModelQuery>,
) -> Result<String, HttpError> {
    let obfuscated = query.noxor.as_deref() != Some("true");
    let model_id = state
        .slot
        .reload(query.hps_path, query.model_path, obfuscated)
        .await?;
    Ok(model_id.display().to_string())
}

fn audio_response(synth: Synthesis) -> Result<Response, HttpError> {
    Response::builder()
        .header(header::CONTENT_TYPE, "audio/wav")
        .header("X-Synth-Duration", synth.synth_duration.to_string())
        .header("X-Wav-Duration", synth.wav_duration.to_string())
        .body(Body::from(synth.audio))
        .map_err(|e| HttpError::Internal(e.to_string()))
}
