//! Runtime configuration from `SOMNOLENS_*` environment variables.

use std::path::PathBuf;

pub const ARTIFACT_DIR_ENV: &str = "SOMNOLENS_ARTIFACT_DIR";
pub const TRANSFORMER_FILE_ENV: &str = "SOMNOLENS_TRANSFORMER_FILE";
pub const CLASSIFIER_FILE_ENV: &str = "SOMNOLENS_CLASSIFIER_FILE";
pub const REQUIRE_SIGNED_ENV: &str = "SOMNOLENS_REQUIRE_SIGNED_ARTIFACTS";
pub const PUBKEY_B64_ENV: &str = "SOMNOLENS_ARTIFACT_PUBKEY_B64";
pub const PUBKEY_B64_FILE_ENV: &str = "SOMNOLENS_ARTIFACT_PUBKEY_B64_FILE";
pub const LOG_MODE_ENV: &str = "SOMNOLENS_LOG_MODE";
pub const LOG_FILE_ENV: &str = "SOMNOLENS_LOG_FILE";

pub const DEFAULT_ARTIFACT_DIR: &str = "artifacts";
pub const DEFAULT_TRANSFORMER_FILE: &str = "preprocessor.json";
pub const DEFAULT_CLASSIFIER_FILE: &str = "sleep_disorder_random_forest_model.json";
pub const DEFAULT_LOG_FILE: &str = "somnolens.log";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}' (expected {expected})")]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("failed to read {var} file {path:?}: {source}")]
    Unreadable {
        var: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where log lines go. Stdout is reserved for responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogMode {
    #[default]
    Stderr,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub artifact_dir: PathBuf,
    pub transformer_file: String,
    pub classifier_file: String,
    /// Refuse to start unless a valid signed manifest binds both artifacts.
    pub require_signed_artifacts: bool,
    /// Base64 Ed25519 verifying key for `manifest.sig`.
    pub artifact_pubkey_b64: Option<String>,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from(DEFAULT_ARTIFACT_DIR),
            transformer_file: DEFAULT_TRANSFORMER_FILE.to_string(),
            classifier_file: DEFAULT_CLASSIFIER_FILE.to_string(),
            require_signed_artifacts: false,
            artifact_pubkey_b64: None,
            log_mode: LogMode::Stderr,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

fn parse_bool(var: &'static str, v: &str) -> Result<bool, ConfigError> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: v.trim().to_string(),
            expected: "a boolean (1/true/yes or 0/false/no)",
        }),
    }
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns error if a variable holds an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns error if a variable holds an unusable value or a referenced
    /// key file cannot be read.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let log_mode = match non_empty(LOG_MODE_ENV).as_deref().map(str::trim) {
            None | Some("stderr") => LogMode::Stderr,
            Some("file") => LogMode::File,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: LOG_MODE_ENV,
                    value: other.to_string(),
                    expected: "'stderr' or 'file'",
                })
            }
        };

        // An inline key wins over a key file.
        let artifact_pubkey_b64 = match non_empty(PUBKEY_B64_ENV) {
            Some(v) => Some(v.trim().to_string()),
            None => match non_empty(PUBKEY_B64_FILE_ENV) {
                Some(path) => {
                    let path = PathBuf::from(path.trim());
                    let content =
                        std::fs::read_to_string(&path).map_err(|source| ConfigError::Unreadable {
                            var: PUBKEY_B64_FILE_ENV,
                            path,
                            source,
                        })?;
                    Some(content.trim().to_string())
                }
                None => None,
            },
        };

        let require_signed_artifacts = match non_empty(REQUIRE_SIGNED_ENV) {
            Some(v) => parse_bool(REQUIRE_SIGNED_ENV, &v)?,
            None => false,
        };

        Ok(Self {
            artifact_dir: non_empty(ARTIFACT_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.artifact_dir),
            transformer_file: non_empty(TRANSFORMER_FILE_ENV).unwrap_or(defaults.transformer_file),
            classifier_file: non_empty(CLASSIFIER_FILE_ENV).unwrap_or(defaults.classifier_file),
            require_signed_artifacts,
            artifact_pubkey_b64,
            log_mode,
            log_file: non_empty(LOG_FILE_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config, Config::default());
        assert_eq!(config.artifact_dir, PathBuf::from("artifacts"));
        assert!(!config.require_signed_artifacts);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (ARTIFACT_DIR_ENV, "/srv/models"),
            (CLASSIFIER_FILE_ENV, "rf.json"),
            (REQUIRE_SIGNED_ENV, "yes"),
            (PUBKEY_B64_ENV, "  abc=  "),
            (LOG_MODE_ENV, "file"),
            (LOG_FILE_ENV, "/var/log/somnolens.log"),
        ]))
        .expect("config");
        assert_eq!(config.artifact_dir, PathBuf::from("/srv/models"));
        assert_eq!(config.classifier_file, "rf.json");
        assert_eq!(config.transformer_file, DEFAULT_TRANSFORMER_FILE);
        assert!(config.require_signed_artifacts);
        assert_eq!(config.artifact_pubkey_b64.as_deref(), Some("abc="));
        assert_eq!(config.log_mode, LogMode::File);
    }

    #[test]
    fn test_invalid_log_mode() {
        let err = Config::from_lookup(lookup(&[(LOG_MODE_ENV, "syslog")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: LOG_MODE_ENV, .. }));
    }

    #[test]
    fn test_require_signed_is_strict_boolean() {
        let signed = |v: &str| {
            Config::from_lookup(lookup(&[(REQUIRE_SIGNED_ENV, v)]))
                .map(|c| c.require_signed_artifacts)
        };
        assert!(signed("True").expect("config"));
        assert!(signed(" 1 ").expect("config"));
        assert!(!signed("no").expect("config"));
        assert!(!signed("FALSE").expect("config"));

        for bad in ["on", "enabled", "2"] {
            let err = signed(bad).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidValue { var: REQUIRE_SIGNED_ENV, value, .. } if value == bad),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_pubkey_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pub.b64");
        std::fs::write(&path, "c29tZWtleQ==\n").expect("write");
        let path_str = path.to_string_lossy().to_string();

        let config =
            Config::from_lookup(lookup(&[(PUBKEY_B64_FILE_ENV, &path_str)])).expect("config");
        assert_eq!(config.artifact_pubkey_b64.as_deref(), Some("c29tZWtleQ=="));

        let missing = dir.path().join("absent.b64").to_string_lossy().to_string();
        let err = Config::from_lookup(lookup(&[(PUBKEY_B64_FILE_ENV, &missing)])).unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
    }
}
