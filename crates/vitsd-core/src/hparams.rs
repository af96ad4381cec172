//! Hyperparameter descriptor parsing.
//!
//! The descriptor is a JSON file produced alongside the trained model
//! (`inference.json` in VITS checkpoints). The control plane only needs
//! the sampling rate and the accepted symbol inventory; the architecture
//! sizing section is kept as an opaque value and handed to the synthesis
//! engine untouched.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::TtsError;

/// Symbol inventory of the stock VITS IPA frontend, used when the
/// descriptor does not carry its own `symbols` list.
const DEFAULT_SYMBOLS: &str = concat!(
    "_",
    ";:,.!?¡¿—…\"«»“” ",
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz",
    "ɑɐɒæɓʙβɔɕçɗɖðʤəɘɚɛɜɝɞɟʄɡɠɢʛɦɧħɥʜɨɪʝɭɬɫɮʟɱɯɰŋɳɲɴøɵɸθœɶʘɹɺɾɻʀʁɽʂʃʈʧʉʊʋⱱʌɣɤʍχʎʏʑʐʒʔʡʕʢ",
    "ǀǁǂǃˈˌːˑʼʴʰʱʲʷˠˤ˞↓↑→↗↘'̩'ᵻ",
);

/// Data-section parameters of the descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct DataParams {
    /// Output sampling rate in Hz (e.g. 22050).
    pub sampling_rate: u32,

    /// Text cleaner pipeline names, passed through to the engine.
    #[serde(default)]
    pub text_cleaners: Vec<String>,

    /// Whether the frontend intersperses blank tokens between symbols.
    #[serde(default)]
    pub add_blank: bool,
}

/// Immutable model configuration, parsed once per load.
#[derive(Debug, Clone, Deserialize)]
pub struct HyperParams {
    pub data: DataParams,

    /// Architecture sizing parameters — opaque to the control plane,
    /// consumed only by the synthesis engine.
    #[serde(default)]
    pub model: serde_json::Value,

    /// Symbol inventory accepted by the model's text frontend. Optional;
    /// falls back to the stock VITS IPA set.
    #[serde(default)]
    pub symbols: Option<Vec<String>>,
}

impl HyperParams {
    /// Parse a descriptor file.
    ///
    /// Unreadable path maps to [`TtsError::Io`], malformed or incomplete
    /// JSON to [`TtsError::Config`].
    pub fn from_file(path: &Path) -> Result<Self, TtsError> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| TtsError::Config(format!("{}: {e}", path.display())))
    }

    /// The set of characters the loaded model can synthesize.
    pub fn symbol_set(&self) -> HashSet<char> {
        match &self.symbols {
            Some(list) => list.iter().flat_map(|s| s.chars()).collect(),
            None => DEFAULT_SYMBOLS.chars().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_descriptor(json: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(json.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parses_minimal_descriptor() {
        let f = write_descriptor(
            r#"{"data": {"sampling_rate": 22050, "text_cleaners": ["basic"], "add_blank": true},
                "model": {"hidden_channels": 192}}"#,
        );
        let hps = HyperParams::from_file(f.path()).unwrap();
        assert_eq!(hps.data.sampling_rate, 22050);
        assert!(hps.data.add_blank);
        assert_eq!(hps.model["hidden_channels"], 192);
    }

    #[test]
    fn missing_sampling_rate_is_a_config_error() {
        let f = write_descriptor(r#"{"data": {"text_cleaners": []}}"#);
        let err = HyperParams::from_file(f.path()).unwrap_err();
        assert!(matches!(err, TtsError::Config(_)), "got {err:?}");
    }

    #[test]
    fn nonexistent_path_is_an_io_error() {
        let err = HyperParams::from_file(Path::new("/nonexistent/inference.json")).unwrap_err();
        assert!(matches!(err, TtsError::Io(_)), "got {err:?}");
    }

    #[test]
    fn default_symbol_set_covers_ipa_and_ascii() {
        let f = write_descriptor(r#"{"data": {"sampling_rate": 22050}}"#);
        let hps = HyperParams::from_file(f.path()).unwrap();
        let set = hps.symbol_set();
        for c in ['a', 'Z', 'ʃ', 'ː', '↘', ' ', '_'] {
            assert!(set.contains(&c), "missing {c:?}");
        }
        assert!(!set.contains(&'̪'));
    }

    #[test]
    fn explicit_symbols_override_the_default() {
        let f = write_descriptor(
            r#"{"data": {"sampling_rate": 16000}, "symbols": ["ab", "c"]}"#,
        );
        let set = HyperParams::from_file(f.path()).unwrap().symbol_set();
        assert_eq!(set, ['a', 'b', 'c'].into_iter().collect());
    }
}
