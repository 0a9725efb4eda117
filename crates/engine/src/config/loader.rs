use std::path::{Path, PathBuf};

use hallucheck_common::config::SystemConfig;

use super::validation;

/// Environment variable naming the configuration directory.
pub const CONFIG_DIR_ENV: &str = "HALLUCHECK_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = "config";
const SYSTEM_FILE: &str = "system.toml";

/// Engine configuration loaded from the config directory.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Parsed system.toml.
    pub system: SystemConfig,
}

/// `$HALLUCHECK_CONFIG_DIR`, or `config` relative to the working directory.
pub fn config_dir_from_env() -> PathBuf {
    std::env::var(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_DIR))
}

/// Load and validate `system.toml` from `config_dir`.
///
/// A missing or malformed file is an error, as is any out-of-range value;
/// the server refuses to start rather than run on guessed settings.
pub fn load_config(config_dir: &Path) -> Result<EngineConfig, ConfigError> {
    tracing::info!(config_dir = %config_dir.display(), "Loading configuration");

    let system_path = config_dir.join(SYSTEM_FILE);
    let content = std::fs::read_to_string(&system_path).map_err(|e| ConfigError::FileRead {
        path: system_path.clone(),
        source: e,
    })?;

    let system = SystemConfig::from_toml_str(&content).map_err(|e| ConfigError::Parse {
        path: system_path.clone(),
        detail: e.to_string(),
    })?;

    validation::validate(&system)?;

    tracing::info!(
        embeddings = system.embeddings.is_some(),
        entailment = system.services.entailment_url.is_some(),
        "Configuration loaded successfully"
    );

    Ok(EngineConfig { system })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {detail}")]
    Parse { path: PathBuf, detail: String },

    #[error("Validation failed: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "hallucheck-config-{}-{}",
            name,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_loads_repository_config() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config");
        let config = load_config(&dir).unwrap();
        assert_eq!(config.system.risk.low_max, 30.0);
        assert_eq!(config.system.verification.max_evidence_results, 5);
    }

    #[test]
    fn test_missing_file() {
        let dir = temp_dir("missing");
        let err = load_config(&dir.join("nowhere")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }

    #[test]
    fn test_malformed_file() {
        let dir = temp_dir("malformed");
        std::fs::write(dir.join(SYSTEM_FILE), "[scoring\nunverified_weight = ").unwrap();
        let err = load_config(&dir).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = temp_dir("invalid");
        std::fs::write(
            dir.join(SYSTEM_FILE),
            "[risk]\nlow_max = 80.0\nmedium_max = 60.0\n",
        )
        .unwrap();
        let err = load_config(&dir).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
