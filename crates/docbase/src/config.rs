//! Client configuration.
//!
//! Provides the [`ClientConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `config_path` argument
//! 2. `DOCBASE_CONFIG` environment variable
//! 3. XDG default: `~/.config/docbase/config.toml`
//! 4. Built-in defaults
//!
//! Values from `DOCBASE_*` environment variables override the file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use confyg::{Confygery, env};
use docbase_core::{DEFAULT_DATABASE_ID, DatabasePath, Error, Result};
use serde::{Deserialize, Serialize};

/// Production REST endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com";

/// Production mutual-TLS REST endpoint.
pub const DEFAULT_MTLS_ENDPOINT: &str = "https://firestore.mtls.googleapis.com";

/// Default number of pooled channels.
pub const DEFAULT_POOL_SIZE: usize = 4;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "DOCBASE_CONFIG";

/// Settings used to build a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Project that owns the database.
    pub project_id: String,

    /// Database ID within the project.
    pub database_id: String,

    /// REST endpoint used when `use_mtls` is off.
    pub endpoint: String,

    /// REST endpoint used when `use_mtls` is on.
    pub mtls_endpoint: String,

    /// Select the mutual-TLS endpoint.
    pub use_mtls: bool,

    /// Number of pooled channels.
    pub pool_size: usize,

    /// Pre-minted OAuth2 bearer token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Extra `name = version` tags for the client identity header.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub client_info: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            database_id: DEFAULT_DATABASE_ID.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            mtls_endpoint: DEFAULT_MTLS_ENDPOINT.to_string(),
            use_mtls: false,
            pool_size: DEFAULT_POOL_SIZE,
            access_token: None,
            client_info: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    /// Defaults for the given project.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            ..Default::default()
        }
    }

    /// Sets the database ID.
    pub fn with_database(mut self, database_id: impl Into<String>) -> Self {
        self.database_id = database_id.into();
        self
    }

    /// Sets the REST endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the pool size.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Sets the bearer token sent with every request.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Adds a `name/version` tag to the client identity header.
    pub fn with_client_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.client_info.insert(name.into(), version.into());
        self
    }

    /// Load configuration from file, environment, and defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path) {
            if path.exists() {
                builder
                    .add_file(&path.to_string_lossy())
                    .map_err(|e| Error::config(format!("config file: {e}")))?;
            }
        }

        let env_opts = env::Options::with_top_level("DOCBASE");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        Ok(config)
    }

    /// Resolve the config file path from explicit argument, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }

        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("docbase").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    ///
    /// The access token is redacted.
    pub fn to_toml_string(&self) -> Result<String> {
        let mut redacted = self.clone();
        if redacted.access_token.is_some() {
            redacted.access_token = Some("<redacted>".to_string());
        }
        toml::to_string_pretty(&redacted).map_err(|e| Error::config(e.to_string()))
    }

    /// Checks the settings a client cannot be built without.
    pub fn validate(&self) -> Result<()> {
        if self.project_id.is_empty() {
            return Err(Error::config("project_id must be set"));
        }
        if self.database_id.is_empty() {
            return Err(Error::config("database_id must be set"));
        }
        if self.pool_size == 0 {
            return Err(Error::config("pool_size must be at least 1"));
        }
        Ok(())
    }

    /// The endpoint selected by `use_mtls`.
    pub fn effective_endpoint(&self) -> &str {
        if self.use_mtls {
            &self.mtls_endpoint
        } else {
            &self.endpoint
        }
    }

    /// The database root these settings address.
    pub fn database_path(&self) -> DatabasePath {
        DatabasePath::new(&self.project_id, &self.database_id)
    }
}
