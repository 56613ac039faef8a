// Copyright (c) 2026 Shelterbyte Engineering
// SPDX-License-Identifier: AGPL-3.0

// Service Configuration Types
//
// Defines the YAML configuration schema for the pet registry service:
// - HTTP bind address and port
// - Auth secret and cookie parameters
// - Storage backend selection (in-memory or PostgreSQL)
// - Optional dedicated audit database

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::repository::{PostgresConfig, StorageBackend};

/// Top-level service configuration (`petshop-config.yaml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Credential verification settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Storage backend settings
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP API port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 secret; must be set before the service starts
    #[serde(default)]
    pub secret: String,

    /// Cookie carrying the auth credential
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Max-Age applied when a verified cookie is re-issued
    #[serde(default = "default_cookie_max_age_secs")]
    pub cookie_max_age_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// PostgreSQL connection string; omit to run on in-memory storage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    /// Dedicated audit database; falls back to `database_url` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_database_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            cookie_name: default_cookie_name(),
            cookie_max_age_secs: default_cookie_max_age_secs(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. PETSHOP_CONFIG_PATH environment variable
    /// 2. ./petshop-config.yaml (working directory)
    /// 3. /etc/petshop/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("PETSHOP_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./petshop-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/petshop/config.yaml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails hard when missing or invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    /// This allows container deployments to override config via env vars
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("PETSHOP_AUTH_SECRET") {
            tracing::info!("Environment override: PETSHOP_AUTH_SECRET");
            self.auth.secret = val;
        }

        if let Ok(val) = std::env::var("PETSHOP_DATABASE_URL") {
            tracing::info!("Environment override: PETSHOP_DATABASE_URL");
            self.storage.database_url = Some(val);
        }

        if let Ok(val) = std::env::var("PETSHOP_AUDIT_DATABASE_URL") {
            tracing::info!("Environment override: PETSHOP_AUDIT_DATABASE_URL");
            self.storage.audit_database_url = Some(val);
        }

        if let Ok(val) = std::env::var("PETSHOP_COOKIE_MAX_AGE_SECS") {
            match val.parse::<u64>() {
                Ok(secs) => {
                    tracing::info!("Environment override: PETSHOP_COOKIE_MAX_AGE_SECS={}", secs);
                    self.auth.cookie_max_age_secs = secs;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for PETSHOP_COOKIE_MAX_AGE_SECS: '{}'. Expected seconds. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.auth.secret.is_empty() {
            anyhow::bail!(
                "auth.secret cannot be empty; set it in the config file or via PETSHOP_AUTH_SECRET"
            );
        }

        if self.auth.cookie_name.is_empty() {
            anyhow::bail!("auth.cookie_name cannot be empty");
        }

        if self.auth.cookie_max_age_secs == 0 {
            anyhow::bail!("auth.cookie_max_age_secs must be greater than zero");
        }

        if self.server.port == 0 {
            anyhow::bail!("server.port must be greater than zero");
        }

        Ok(())
    }

    /// Storage backend for the primary pet store
    pub fn primary_backend(&self) -> StorageBackend {
        match &self.storage.database_url {
            Some(url) => StorageBackend::PostgreSQL(PostgresConfig {
                connection_string: url.clone(),
            }),
            None => StorageBackend::InMemory,
        }
    }

    /// Connection string for the audit trail, falling back to the primary
    pub fn audit_connection_string(&self) -> Option<&str> {
        self.storage
            .audit_database_url
            .as_deref()
            .or(self.storage.database_url.as_deref())
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8300
}

fn default_cookie_name() -> String {
    "authToken".to_string()
}

fn default_cookie_max_age_secs() -> u64 {
    3600
}
