//! Run configuration read from a TOML file.
//!
//! Every field is optional; command-line flags override what the file says.
//!
//! ```toml
//! target_version = 7000006
//! log_level = "info"
//! log_dir = "/var/log/graphmig"
//! store = "sqlite"
//! delint_after_migration = true
//! ```

use crate::logging::{default_log_level, normalize_level};
use crate::store::StoreKind;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Parse(err) => write!(f, "invalid configuration: {err}"),
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidLogLevel(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Stop once this version is reached; latest when unset.
    pub target_version: Option<u32>,
    pub log_level: String,
    /// Rolling log files go here; stderr when unset.
    pub log_dir: Option<PathBuf>,
    /// Project format; inferred from the file extension when unset.
    pub store: Option<StoreKind>,
    /// Run delint again after the last step, even below the delint version.
    pub delint_after_migration: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_version: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            store: None,
            delint_after_migration: false,
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        normalize_level(&config.log_level).map_err(ConfigError::InvalidLogLevel)?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, RunConfig};
    use crate::store::StoreKind;
    use std::path::PathBuf;

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(RunConfig::from_toml_str("").unwrap(), RunConfig::default());
    }

    #[test]
    fn all_fields_parse() {
        let config = RunConfig::from_toml_str(
            r#"
target_version = 7000003
log_level = "warn"
log_dir = "/tmp/graphmig-logs"
store = "sqlite"
delint_after_migration = true
"#,
        )
        .unwrap();
        assert_eq!(config.target_version, Some(7_000_003));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/graphmig-logs")));
        assert_eq!(config.store, Some(StoreKind::Sqlite));
        assert!(config.delint_after_migration);
    }

    #[test]
    fn bad_level_and_unknown_keys_are_rejected() {
        assert!(matches!(
            RunConfig::from_toml_str("log_level = \"loud\""),
            Err(ConfigError::InvalidLogLevel(_))
        ));
        assert!(matches!(
            RunConfig::from_toml_str("colour = true"),
            Err(ConfigError::Parse(_))
        ));
    }
}
