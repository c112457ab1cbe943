//! Persistence-manager configuration with TOML loading.

use crate::error::{ErrorClass, ErrorOrigin, InternalError};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for '{key}': {message}")]
    Invalid { key: &'static str, message: String },
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Config, err.to_string())
    }
}

///
/// JdoqlConfig
///
/// Defaults every new query and fetch plan inherits from its persistence
/// manager. Missing sections and keys fall back to the JDO defaults;
/// unknown keys are rejected.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct JdoqlConfig {
    pub query: QueryConfig,
    pub fetch: FetchConfig,
}

impl JdoqlConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let depth = self.fetch.max_fetch_depth;
        if depth == 0 || depth < -1 {
            return Err(ConfigError::Invalid {
                key: "fetch.max_fetch_depth",
                message: format!("{depth} (expected -1 or a positive depth)"),
            });
        }
        if self.fetch.fetch_size < -1 {
            return Err(ConfigError::Invalid {
                key: "fetch.fetch_size",
                message: format!("{} (expected -1 or more)", self.fetch.fetch_size),
            });
        }

        Ok(())
    }
}

///
/// QueryConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    /// Initial ignore-cache flag of new queries.
    pub ignore_cache: bool,

    /// Initial subclass-inclusion flag of new queries.
    pub include_subclasses: bool,

    /// Log a compact execution summary for every query.
    pub debug: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            ignore_cache: false,
            include_subclasses: true,
            debug: false,
        }
    }
}

///
/// FetchConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Relationship depth loaded with each result; -1 for unlimited.
    pub max_fetch_depth: i32,

    /// Batch size hint; 0 lets the datastore decide, -1 fetches greedily.
    pub fetch_size: i32,

    pub groups: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_fetch_depth: 1,
            fetch_size: 0,
            groups: vec![crate::pm::FetchPlan::DEFAULT_GROUP.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = JdoqlConfig::from_toml_str("").unwrap();

        assert_eq!(config, JdoqlConfig::default());
        assert!(config.query.include_subclasses);
        assert_eq!(config.fetch.max_fetch_depth, 1);
        assert_eq!(config.fetch.groups, ["default"]);
    }

    #[test]
    fn sections_override_defaults() {
        let config = JdoqlConfig::from_toml_str(
            r#"
            [query]
            ignore_cache = true
            debug = true

            [fetch]
            max_fetch_depth = -1
            groups = ["default", "detail"]
            "#,
        )
        .unwrap();

        assert!(config.query.ignore_cache);
        assert!(config.query.debug);
        assert!(config.query.include_subclasses);
        assert_eq!(config.fetch.max_fetch_depth, -1);
        assert_eq!(config.fetch.groups.len(), 2);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = JdoqlConfig::from_toml_str("[query]\nignore_cash = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_fetch_depth_is_rejected() {
        let err = JdoqlConfig::from_toml_str("[fetch]\nmax_fetch_depth = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "fetch.max_fetch_depth",
                ..
            }
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = JdoqlConfig::from_path("/nonexistent/jdoql.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/jdoql.toml"));
    }
}
