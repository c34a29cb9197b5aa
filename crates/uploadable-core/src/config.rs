//! Configuration module
//!
//! Runtime settings are read from `UPLOADABLE_*` environment variables (a
//! `.env` file is honoured). The policy set is loaded once here and then
//! handed to the validator; nothing is kept in global state.

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::policy::PolicySet;

const ENV_PREFIX: &str = "UPLOADABLE_";

/// What `validate_all` does after a field is rejected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    /// Stop at the first rejected field. Files already moved stay in place.
    #[default]
    FailFast,
    /// Validate every field and report all outcomes
    ContinueOnError,
}

#[derive(Debug, Deserialize)]
struct EnvSettings {
    web_root: String,
    policy_file: Option<String>,
    upload_tmp_dir: Option<String>,
    #[serde(default)]
    batch_mode: BatchMode,
    #[serde(default)]
    content_sniffing: bool,
}

/// Uploader configuration
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    /// Document root that policy destination paths are resolved against
    pub web_root: PathBuf,
    /// Directory the host writes temporary uploads into
    pub upload_tmp_dir: PathBuf,
    pub batch_mode: BatchMode,
    pub content_sniffing: bool,
    pub policies: PolicySet,
}

impl UploaderConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Build the configuration from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let settings: EnvSettings = envy::prefixed(ENV_PREFIX).from_iter(vars)?;

        let policies = match settings.policy_file.as_deref().filter(|p| !p.is_empty()) {
            Some(path) => PolicySet::from_file(path)?,
            None => PolicySet::default_set(),
        };

        let upload_tmp_dir = settings
            .upload_tmp_dir
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        let config = Self {
            web_root: PathBuf::from(settings.web_root),
            upload_tmp_dir,
            batch_mode: settings.batch_mode,
            content_sniffing: settings.content_sniffing,
            policies,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.web_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "UPLOADABLE_WEB_ROOT must not be empty".to_string(),
            ));
        }

        if self.upload_tmp_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "UPLOADABLE_UPLOAD_TMP_DIR must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = UploaderConfig::from_vars(vars(&[("UPLOADABLE_WEB_ROOT", "/srv/www")])).unwrap();

        assert_eq!(config.web_root, PathBuf::from("/srv/www"));
        assert_eq!(config.upload_tmp_dir, std::env::temp_dir());
        assert_eq!(config.batch_mode, BatchMode::FailFast);
        assert!(!config.content_sniffing);
        assert_eq!(config.policies, PolicySet::default_set());
    }

    #[test]
    fn test_missing_web_root() {
        let err = UploaderConfig::from_vars(vars(&[("OTHER", "x")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env(_)));
    }

    #[test]
    fn test_empty_web_root() {
        let err = UploaderConfig::from_vars(vars(&[("UPLOADABLE_WEB_ROOT", "")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_all_settings() {
        let dir = tempfile::tempdir().unwrap();
        let policy_file = dir.path().join("policies.json");
        std::fs::write(
            &policy_file,
            r#"{ "default": { "accept": false }, "cv": { "accept": { "application/pdf": ["pdf"] }, "path": "docs" } }"#,
        )
        .unwrap();

        let config = UploaderConfig::from_vars(vars(&[
            ("UPLOADABLE_WEB_ROOT", "/srv/www"),
            ("UPLOADABLE_POLICY_FILE", policy_file.to_str().unwrap()),
            ("UPLOADABLE_UPLOAD_TMP_DIR", "/var/tmp/uploads"),
            ("UPLOADABLE_BATCH_MODE", "continue_on_error"),
            ("UPLOADABLE_CONTENT_SNIFFING", "true"),
        ]))
        .unwrap();

        assert_eq!(config.upload_tmp_dir, PathBuf::from("/var/tmp/uploads"));
        assert_eq!(config.batch_mode, BatchMode::ContinueOnError);
        assert!(config.content_sniffing);
        assert!(config.policies.policy_for("photo").is_none());
        assert_eq!(
            config.policies.policy_for("cv").map(|p| p.destination_path()),
            Some("docs")
        );
    }

    #[test]
    fn test_invalid_batch_mode() {
        let err = UploaderConfig::from_vars(vars(&[
            ("UPLOADABLE_WEB_ROOT", "/srv/www"),
            ("UPLOADABLE_BATCH_MODE", "sometimes"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Env(_)));
    }
}
