//! Integration tests for the HTTP control plane.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot` —
//! no sockets, no real model. The stub synthesis backend provides
//! deterministic audio; the phonemizer is pointed at `echo` so the
//! `/synthesize` happy path runs without espeak-ng installed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use vitsd_axum::bootstrap::{ServerConfig, bootstrap};
use vitsd_axum::create_router;
use vitsd_core::{Liveness, PhonemizerConfig, cipher};

// ── Fixtures ───────────────────────────────────────────────────────

fn write_fixtures(dir: &Path) -> (PathBuf, PathBuf) {
    let hps = dir.join("inference.json");
    std::fs::write(&hps, r#"{"data": {"sampling_rate": 22050}}"#).unwrap();
    let weights = dir.join("model.pth");
    std::fs::write(&weights, b"stub weight blob").unwrap();
    (hps, weights)
}

fn config(hps: PathBuf, model: PathBuf, allow_set_model: bool) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        hps_path: hps,
        model_path: model,
        seed: 1234,
        onetime: false,
        alive_for: -1,
        allow_set_model,
        obfuscated: false,
    }
}

/// Bootstrap an app against stub fixtures, with `echo` standing in for
/// the phonemizer binary.
async fn test_app(dir: &Path, allow_set_model: bool) -> (Router, Arc<Liveness>) {
    let (hps, weights) = write_fixtures(dir);
    let mut ctx = bootstrap(&config(hps, weights, allow_set_model))
        .await
        .unwrap();
    ctx.phonemizer = PhonemizerConfig {
        binary: "echo".to_string(),
        voice: "ar".to_string(),
    };
    let liveness = Arc::clone(&ctx.liveness);
    (create_router(ctx), liveness)
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    resp.into_body().collect().await.unwrap().to_bytes().to_vec()
}

fn json_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn ping_returns_pong_and_records_liveness() {
    let dir = tempfile::tempdir().unwrap();
    let (app, liveness) = test_app(dir.path(), true).await;

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let resp = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, b"pong");
    assert!(liveness.idle().as_millis() < 50);
}

#[tokio::test]
async fn synthesize_with_empty_text_is_a_400() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = test_app(dir.path(), true).await;

    for body in [r#"{"text": ""}"#, r#"{"text": "   "}"#, r#"{}"#] {
        let resp = app
            .clone()
            .oneshot(json_post("/synthesize", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body {body}");
    }
}

#[tokio::test]
async fn synthesize_returns_ipa_and_base64_audio() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = test_app(dir.path(), true).await;

    let resp = app
        .oneshot(json_post("/synthesize?seed=42", r#"{"text": "hello"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json: serde_json::Value =
        serde_json::from_slice(&body_bytes(resp).await).unwrap();
    // `echo` parrots the phonemizer arguments back; after symbol
    // filtering the input text must still be in there.
    assert!(json["ipa"].as_str().unwrap().contains("hello"));
    assert!(!json["audio_data"].as_str().unwrap().is_empty());
    assert!(json["wav_duration"].as_f64().unwrap() > 0.0);
    assert!(json["synth_duration"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn raw_synthesis_returns_wav_bytes_with_duration_headers() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = test_app(dir.path(), true).await;

    let request = || {
        Request::builder()
            .method("POST")
            .uri("/?seed=7")
            .body(Body::from("sˈalam"))
            .unwrap()
    };

    let resp = app.clone().oneshot(request()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "audio/wav");
    let synth_dur: f64 = resp.headers()["X-Synth-Duration"].to_str().unwrap().parse().unwrap();
    let wav_dur: f64 = resp.headers()["X-Wav-Duration"].to_str().unwrap().parse().unwrap();
    assert!(synth_dur >= 0.0);
    assert!(wav_dur > 0.0);

    let first = body_bytes(resp).await;
    assert_eq!(&first[..4], b"RIFF");

    // Fixed model, text and seed: byte-identical output.
    let resp = app.oneshot(request()).await.unwrap();
    assert_eq!(body_bytes(resp).await, first);
}

#[tokio::test]
async fn set_model_rejected_when_reloads_are_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = test_app(dir.path(), false).await;

    let (hps, weights) = write_fixtures(dir.path());
    let uri = format!(
        "/set-model?hps_path={}&model_path={}&noxor=true",
        hps.display(),
        weights.display()
    );
    let resp = app
        .clone()
        .oneshot(Request::builder().uri(uri.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // The rejection must not have touched the loaded model.
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .body(Body::from("still loaded"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn set_model_reloads_an_obfuscated_weight_file() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = test_app(dir.path(), true).await;

    // Produce an obfuscated copy of a second model.
    let mut masked = b"replacement weight blob".to_vec();
    cipher::apply(&mut masked);
    let hps = dir.path().join("inference.json");
    let masked_path = dir.path().join("model2.pth.xor");
    std::fs::write(&masked_path, &masked).unwrap();

    // noxor absent: the caller-supplied obfuscation flag is honored.
    let uri = format!(
        "/set-model?hps_path={}&model_path={}",
        hps.display(),
        masked_path.display()
    );
    let resp = app
        .clone()
        .oneshot(Request::builder().uri(uri.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_bytes(resp).await,
        masked_path.display().to_string().into_bytes()
    );

    // The replacement model serves inference.
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .body(Body::from("ahlan"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn failed_reload_surfaces_as_500_and_empties_the_slot() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = test_app(dir.path(), true).await;

    let uri = format!(
        "/set-model?hps_path={}&model_path={}&noxor=true",
        dir.path().join("missing.json").display(),
        dir.path().join("model.pth").display()
    );
    let resp = app
        .clone()
        .oneshot(Request::builder().uri(uri.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // A failed load invalidates the previous model.
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .body(Body::from("gone"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value =
        serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(json["error"].as_str().unwrap().contains("No model loaded"));
}
