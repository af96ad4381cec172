//! External phonemizer wrapper.
//!
//! Shells out to `espeak-ng` to turn raw text into an IPA string, then
//! filters the result down to the symbol inventory the loaded model
//! actually accepts. The subprocess runs outside the model slot's
//! critical section — it never touches the model.

use std::collections::HashSet;

use tokio::process::Command;

use crate::error::TtsError;

/// How to invoke the external phonemizer.
#[derive(Debug, Clone)]
pub struct PhonemizerConfig {
    /// Binary name or path.
    pub binary: String,

    /// espeak-ng voice identifier.
    pub voice: String,
}

impl Default for PhonemizerConfig {
    fn default() -> Self {
        Self {
            binary: "espeak-ng".to_string(),
            voice: "ar".to_string(),
        }
    }
}

/// Convert `text` to an IPA string via the external phonemizer.
///
/// Spawn failures and non-zero exits map to [`TtsError::Phonemizer`]
/// carrying the tool's message.
pub async fn phonemize(config: &PhonemizerConfig, text: &str) -> Result<String, TtsError> {
    let output = Command::new(&config.binary)
        .args(["-q", "--ipa", "-v"])
        .arg(&config.voice)
        .arg(text)
        .output()
        .await
        .map_err(|e| TtsError::Phonemizer(format!("failed to run {}: {e}", config.binary)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TtsError::Phonemizer(format!(
            "{} exited with {}: {}",
            config.binary,
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Restrict an IPA string to the model's symbol inventory.
///
/// The dental diacritic (U+032A) is first rewritten to `↘`, which the
/// stock VITS symbol set does carry; everything else outside the set is
/// dropped silently.
pub fn filter_symbols(ipa: &str, symbols: &HashSet<char>) -> String {
    ipa.replace('\u{032a}', "↘")
        .chars()
        .filter(|c| symbols.contains(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ascii_set() -> HashSet<char> {
        ('a'..='z').chain(['ˈ', 'ː', '↘', ' ']).collect()
    }

    #[test]
    fn drops_characters_outside_the_symbol_set() {
        let out = filter_symbols("sˈalam\nDROPPED123", &ascii_set());
        assert_eq!(out, "sˈalam");
    }

    #[test]
    fn rewrites_the_dental_diacritic() {
        let out = filter_symbols("t\u{032a}a", &ascii_set());
        assert_eq!(out, "t↘a");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(filter_symbols("", &ascii_set()), "");
    }

    #[tokio::test]
    async fn missing_binary_is_a_phonemizer_error() {
        let config = PhonemizerConfig {
            binary: "definitely-not-a-real-phonemizer".to_string(),
            voice: "ar".to_string(),
        };
        let err = phonemize(&config, "hello").await.unwrap_err();
        assert!(matches!(err, TtsError::Phonemizer(_)), "got {err:?}");
    }
}
