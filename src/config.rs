//! Environment configuration.
//!
//! The library crates take [`Credentials`] as an argument; only the CLI
//! reads them from the environment, after [`load_env_file`] has merged a
//! `.env` file into it.

use std::path::{Path, PathBuf};

use pcq_auth::Credentials;

/// Platform API host, e.g. `api.prismacloud.io`.
pub const ENV_API_URL: &str = "PRISMA_API_URL";
/// Access key id.
pub const ENV_ACCESS_KEY: &str = "PRISMA_ACCESS_KEY";
/// Secret key.
pub const ENV_SECRET_KEY: &str = "PRISMA_SECRET_KEY";
/// Azure application secret used by `onboard-azure`.
pub const ENV_AZURE_APP_SECRET: &str = "AZURE_APP_SECRET";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// One or more required variables are unset or blank.
    #[error("environment variables not set: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    /// A `.env` file exists but could not be read or parsed.
    #[error("failed to load env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
}

/// Load variables from a `.env` file into the process environment.
///
/// With no explicit path, `.env` is searched for in the working directory
/// and its parents, and its absence is not an error. Variables that are
/// already set keep their values. Returns the file that was loaded.
///
/// Call this before any other thread is started.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)?;
            Ok(Some(path.to_path_buf()))
        }
        None => match dotenvy::dotenv() {
            Ok(found) => Ok(Some(found)),
            Err(e) if e.not_found() => Ok(None),
            Err(e) => Err(e.into()),
        },
    }
}

/// Settings read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials: Credentials,
}

impl AppConfig {
    /// Read `PRISMA_API_URL`, `PRISMA_ACCESS_KEY` and `PRISMA_SECRET_KEY`.
    ///
    /// Every missing variable is reported, not just the first.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let mut read = |name: &'static str| {
            let value = lookup(name).filter(|v| !v.trim().is_empty());
            if value.is_none() {
                missing.push(name);
            }
            value.unwrap_or_default()
        };

        let url = read(ENV_API_URL);
        let access_key = read(ENV_ACCESS_KEY);
        let secret_key = read(ENV_SECRET_KEY);

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        Ok(Self {
            credentials: Credentials::new(url.trim(), access_key.trim(), secret_key.trim()),
        })
    }
}

/// Read a single required secret such as [`ENV_AZURE_APP_SECRET`].
pub fn required_env(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::Missing(vec![name]))
}
