//! Synthesis-engine capability traits and the deterministic stub backend.
//!
//! The neural network itself is an external collaborator: the control
//! plane only needs a capability that can be loaded once from
//! hyperparameters plus a plaintext weight file, and then invoked
//! repeatedly. Engines are swapped at the composition root without
//! touching the model slot or the HTTP layer.
//!
//! Both trait methods are blocking — a load can take seconds and an
//! inference call is CPU-bound — so callers on the async runtime
//! dispatch them via `tokio::task::spawn_blocking`.

use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use crate::error::TtsError;
use crate::hparams::HyperParams;

/// Raw audio produced by one inference call.
pub struct RawAudio {
    /// Encoded audio bytes (WAV container), opaque to the control plane.
    pub data: Vec<u8>,

    /// Number of PCM samples, used to derive the playback duration.
    pub samples: u64,
}

/// A fully initialized engine bound to one set of hyperparameters and
/// one set of weights. Immutable after construction; replaced wholesale
/// on reload, never patched.
pub trait EngineHandle: Send {
    /// Synthesize `text` into audio.
    ///
    /// The seed deterministically drives the engine's internal
    /// randomness: identical seed and text produce identical output.
    fn infer(&self, text: &str, seed: u64) -> Result<RawAudio, TtsError>;
}

impl std::fmt::Debug for dyn EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EngineHandle")
    }
}

/// Factory capability for loading engine handles.
pub trait SynthesisEngine: Send + Sync + 'static {
    /// Construct a handle from a parsed descriptor and a plaintext
    /// weight file. The weight path may point at a scoped temporary
    /// copy that disappears once this call returns.
    fn load(&self, hparams: &HyperParams, weights: &Path) -> Result<Box<dyn EngineHandle>, TtsError>;
}

// ── Stub backend ───────────────────────────────────────────────────

/// Deterministic, dependency-free synthesis backend.
///
/// Renders seed-driven noise into a real WAV container at the model's
/// sampling rate. Exists to validate the control plane — load/infer
/// serialization, obfuscated weight handling, seed determinism — without
/// a proprietary engine, and doubles as the backend the default binary
/// wires up.
#[derive(Debug, Clone, Default)]
pub struct StubEngine {
    /// Artificial per-inference latency, for lock-contention tests.
    pub latency: Duration,
}

struct StubHandle {
    sample_rate: u32,
    weights_fingerprint: u64,
    latency: Duration,
}

impl SynthesisEngine for StubEngine {
    fn load(&self, hparams: &HyperParams, weights: &Path) -> Result<Box<dyn EngineHandle>, TtsError> {
        // Read the weight file in full so materializer problems surface
        // here, exactly where a real engine would hit them.
        let blob = std::fs::read(weights)?;
        Ok(Box::new(StubHandle {
            sample_rate: hparams.data.sampling_rate,
            weights_fingerprint: fnv1a(&blob),
            latency: self.latency,
        }))
    }
}

impl EngineHandle for StubHandle {
    fn infer(&self, text: &str, seed: u64) -> Result<RawAudio, TtsError> {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }

        // Output length scales with the input so duration arithmetic is
        // exercised with non-trivial values.
        let chars = text.chars().count() as u64;
        let samples = u64::from(self.sample_rate) * (chars + 16) / 64;

        let mut rng = splitmix(seed ^ fnv1a(text.as_bytes()) ^ self.weights_fingerprint);
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| TtsError::Synthesis(e.to_string()))?;
        for _ in 0..samples {
            rng = splitmix(rng);
            writer
                .write_sample((rng >> 48) as i16 / 8)
                .map_err(|e| TtsError::Synthesis(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| TtsError::Synthesis(e.to_string()))?;

        Ok(RawAudio { data: cursor.into_inner(), samples })
    }
}

/// FNV-1a over a byte slice.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// One step of the splitmix64 generator.
fn splitmix(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture() -> (tempfile::NamedTempFile, tempfile::NamedTempFile) {
        let mut hps = tempfile::NamedTempFile::new().unwrap();
        hps.write_all(br#"{"data": {"sampling_rate": 22050}}"#).unwrap();
        let mut weights = tempfile::NamedTempFile::new().unwrap();
        weights.write_all(b"stub weight blob").unwrap();
        (hps, weights)
    }

    #[test]
    fn stub_output_is_seed_deterministic() {
        let (hps, weights) = fixture();
        let hparams = HyperParams::from_file(hps.path()).unwrap();
        let handle = StubEngine::default().load(&hparams, weights.path()).unwrap();

        let a = handle.infer("sˈalam", 1234).unwrap();
        let b = handle.infer("sˈalam", 1234).unwrap();
        assert_eq!(a.data, b.data);
        assert_eq!(a.samples, b.samples);

        let c = handle.infer("sˈalam", 4321).unwrap();
        assert_ne!(a.data, c.data);
    }

    #[test]
    fn stub_emits_a_wav_container() {
        let (hps, weights) = fixture();
        let hparams = HyperParams::from_file(hps.path()).unwrap();
        let handle = StubEngine::default().load(&hparams, weights.path()).unwrap();

        let audio = handle.infer("abc", 1).unwrap();
        assert_eq!(&audio.data[..4], b"RIFF");
        assert_eq!(&audio.data[8..12], b"WAVE");

        let reader = hound::WavReader::new(Cursor::new(audio.data)).unwrap();
        assert_eq!(reader.spec().sample_rate, 22050);
        assert_eq!(u64::from(reader.len()), audio.samples);
    }

    #[test]
    fn stub_load_surfaces_missing_weights() {
        let (hps, _) = fixture();
        let hparams = HyperParams::from_file(hps.path()).unwrap();
        let err = StubEngine::default()
            .load(&hparams, Path::new("/nonexistent/weights.pth"))
            .unwrap_err();
        assert!(matches!(err, TtsError::Io(_)), "got {err:?}");
    }
}
