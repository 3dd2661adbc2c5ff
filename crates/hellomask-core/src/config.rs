use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// How the decoy hello's cosmetic fields (GREASE value, random, session id,
/// TLS 1.2 suite order) are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Randomization {
    /// Fixed GREASE placeholder and nonce derived from the decoy host name.
    Disabled,
    /// Reproducible draws from a seeded generator.
    Seeded(u64),
    /// Fresh draws from OS entropy on every construction.
    #[default]
    Entropy,
}

impl Randomization {
    /// A new generator for one construction, or `None` when disabled.
    pub fn rng(&self) -> Option<StdRng> {
        match self {
            Self::Disabled => None,
            Self::Seeded(seed) => Some(StdRng::seed_from_u64(*seed)),
            Self::Entropy => Some(StdRng::from_entropy()),
        }
    }
}

/// Parameters for assembling the outgoing ClientHello.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    /// Embed the decoy hello as a padding extension.
    pub smart_padding: bool,
    pub alpn_protocols: Vec<String>,
    pub randomization: Randomization,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            smart_padding: true,
            alpn_protocols: vec!["http/1.1".to_string()],
            randomization: Randomization::default(),
        }
    }
}

impl MaskConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MaskConfig::default();
        assert!(config.smart_padding);
        assert_eq!(config.alpn_protocols, vec!["http/1.1".to_string()]);
        assert_eq!(config.randomization, Randomization::Entropy);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = MaskConfig::from_json(r#"{"smart_padding": false}"#).unwrap();
        assert!(!config.smart_padding);
        assert_eq!(config.alpn_protocols, vec!["http/1.1".to_string()]);
    }

    #[test]
    fn test_randomization_forms() {
        let config = MaskConfig::from_json(r#"{"randomization": {"seeded": 42}}"#).unwrap();
        assert_eq!(config.randomization, Randomization::Seeded(42));
        let config = MaskConfig::from_json(r#"{"randomization": "disabled"}"#).unwrap();
        assert_eq!(config.randomization, Randomization::Disabled);
        assert!(config.randomization.rng().is_none());
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            MaskConfig::from_json(r#"{"randomization": "sometimes"}"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = MaskConfig::load(Path::new("/nonexistent/hellomask.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("hellomask-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"alpn_protocols": ["h2", "http/1.1"]}"#).unwrap();
        let config = MaskConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.alpn_protocols, vec!["h2".to_string(), "http/1.1".to_string()]);
    }
}
