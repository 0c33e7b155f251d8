//! Configuration loading from YAML files and the environment.
//!
//! Environment values override file values. Lookups go through a caller
//! supplied function so tests never touch process state.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, ProviderError, Result};

use super::provider::ProviderConfig;

/// Management API token.
pub const ENV_CMA_TOKEN: &str = "CONTENTFUL_MANAGEMENT_TOKEN";
/// Owning organization.
pub const ENV_ORGANIZATION_ID: &str = "CONTENTFUL_ORGANIZATION_ID";
/// API endpoint override.
pub const ENV_BASE_URL: &str = "CONTENTFUL_BASE_URL";
/// Environment override.
pub const ENV_ENVIRONMENT: &str = "CONTENTFUL_ENVIRONMENT";
/// Any non-empty value enables debug logging.
pub const ENV_DEBUG: &str = "TF_LOG";

/// Loads provider configuration.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Directory `.env` is looked up in.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the directory the `.env` file is read from.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ProviderConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ProviderError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path)?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<ProviderConfig> {
        debug!("Parsing YAML configuration");

        let config: ProviderConfig = serde_yaml::from_str(content).map_err(|e| {
            ProviderError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location: source.map(|p| p.display().to_string()),
            })
        })?;

        debug!("Parsed configuration for organization: {}", config.organization_id);
        Ok(config)
    }

    /// Loads configuration from an optional file, then applies process
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_with_env(&self, path: Option<&Path>) -> Result<ProviderConfig> {
        self.load_with_lookup(path, |name| std::env::var(name).ok())
    }

    /// Like [`Self::load_with_env`], reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_with_lookup<F>(&self, path: Option<&Path>, lookup: F) -> Result<ProviderConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => self.load_file(path)?,
            None => ProviderConfig::default(),
        };
        Self::apply_env_overrides(&mut config, lookup);
        Ok(config)
    }

    /// Overrides configuration fields from environment variables.
    pub fn apply_env_overrides<F>(config: &mut ProviderConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENV_CMA_TOKEN) {
            debug!("Overriding cma_token from environment");
            config.cma_token = token;
        }

        if let Some(organization_id) = lookup(ENV_ORGANIZATION_ID) {
            debug!("Overriding organization_id from environment");
            config.organization_id = organization_id;
        }

        if let Some(base_url) = lookup(ENV_BASE_URL) {
            debug!("Overriding base_url from environment");
            config.base_url = base_url;
        }

        if let Some(environment) = lookup(ENV_ENVIRONMENT) {
            debug!("Overriding environment from environment");
            config.environment = environment;
        }

        if lookup(ENV_DEBUG).is_some_and(|level| !level.is_empty()) {
            config.debug = true;
        }
    }

    /// Loads the `.env` file into the process environment if present.
    ///
    /// Returns true if a file was loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the `.env` file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<bool> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if !env_path.exists() {
            debug!(".env file not found at: {}", env_path.display());
            return Ok(false);
        }

        info!("Loading environment from: {}", env_path.display());
        dotenvy::from_path(&env_path).map_err(|e| {
            ProviderError::Config(ConfigError::ParseError {
                message: format!("Failed to load .env file: {e}"),
                location: Some(env_path.display().to_string()),
            })
        })?;
        Ok(true)
    }

    /// Reads a `.env` file into a lookup table without touching the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn read_dotenv(path: impl AsRef<Path>) -> Result<Vec<(String, String)>> {
        let path = path.as_ref();
        let iter = dotenvy::from_path_iter(path).map_err(|e| {
            ProviderError::Config(ConfigError::ParseError {
                message: format!("Failed to read .env file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        iter.collect::<std::result::Result<Vec<_>, _>>().map_err(|e| {
            ProviderError::Config(ConfigError::ParseError {
                message: format!("Invalid .env entry: {e}"),
                location: Some(path.display().to_string()),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r"
cma_token: CFPAT-abc
organization_id: org-1
";
        let config = ConfigParser::new()
            .parse_yaml(yaml, None)
            .expect("minimal config should parse");

        assert_eq!(config.cma_token, "CFPAT-abc");
        assert_eq!(config.organization_id, "org-1");
        assert_eq!(config.environment, "master");
        assert_eq!(config.settle.max_attempts, 5);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r"
cma_token: CFPAT-abc
organization_id: org-1
base_url: https://api.eu.contentful.com
environment: staging
debug: true
settle:
  initial_delay_ms: 100
  multiplier: 3
  max_attempts: 4
";
        let config = ConfigParser::new()
            .parse_yaml(yaml, None)
            .expect("full config should parse");

        assert_eq!(config.base_url, "https://api.eu.contentful.com");
        assert_eq!(config.environment, "staging");
        assert!(config.debug);
        assert_eq!(config.settle.initial_delay_ms, 100);
        assert_eq!(config.settle.multiplier, 3);
        assert_eq!(config.settle.max_attempts, 4);
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = ConfigParser::new().parse_yaml("debug: [", None);
        assert!(matches!(
            result,
            Err(ProviderError::Config(ConfigError::ParseError { .. }))
        ));
    }

    #[test]
    fn test_unreadable_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = ConfigParser::new().load_file(dir.path());
        assert!(matches!(result, Err(ProviderError::Io(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = ConfigParser::new().load_file(dir.path().join("absent.yaml"));
        assert!(matches!(
            result,
            Err(ProviderError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "cma_token: from-file\norganization_id: org-file").expect("write");

        let lookup = lookup_from(&[
            (ENV_CMA_TOKEN, "from-env"),
            (ENV_ENVIRONMENT, "qa"),
            (ENV_DEBUG, "DEBUG"),
        ]);
        let config = ConfigParser::new()
            .load_with_lookup(Some(file.path()), lookup)
            .expect("config should load");

        assert_eq!(config.cma_token, "from-env");
        assert_eq!(config.organization_id, "org-file");
        assert_eq!(config.environment, "qa");
        assert!(config.debug);
    }

    #[test]
    fn test_empty_debug_variable_keeps_debug_off() {
        let config = ConfigParser::new()
            .load_with_lookup(None, lookup_from(&[(ENV_DEBUG, "")]))
            .expect("config should load");
        assert!(!config.debug);
        assert_eq!(config.base_url, "https://api.contentful.com");
    }

    #[test]
    fn test_read_dotenv() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".env");
        std::fs::write(&path, "CONTENTFUL_MANAGEMENT_TOKEN=CFPAT-dot\nTF_LOG=1\n").expect("write");

        let vars: HashMap<String, String> = ConfigParser::read_dotenv(&path)
            .expect("dotenv should parse")
            .into_iter()
            .collect();
        let config = ConfigParser::new()
            .load_with_lookup(None, |name| vars.get(name).cloned())
            .expect("config should load");

        assert_eq!(config.cma_token, "CFPAT-dot");
        assert!(config.debug);
    }

    #[test]
    fn test_load_dotenv_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = ConfigParser::new()
            .with_base_path(dir.path())
            .load_dotenv()
            .expect("absent .env is not an error");
        assert!(!loaded);
    }
}
