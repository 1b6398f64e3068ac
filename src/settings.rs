use crate::models::Role;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised while loading settings or starting the logger
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Toml {
        path: PathBuf,
        source: basic_toml::Error,
    },
    #[error("invalid api base url '{url}': {source}")]
    BaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("failed to initialise logger: {0}")]
    Logger(#[from] log::SetLoggerError),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorefrontSettings {
    pub api: ApiSettings,
    pub registration: RegistrationSettings,
    pub session: SessionSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub check_email_path: String,
    pub login_path: String,
    pub register_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RegistrationSettings {
    /// Role given to accounts created through an identity sign-up
    pub identity_role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SessionSettings {
    /// Where the signed-in user is kept between runs. Unset disables persistence.
    pub persist_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 15,
            check_email_path: "/api/users/check-email".to_string(),
            login_path: "/api/users/login".to_string(),
            register_path: "/api/users".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ApiSettings {
    /// Resolve an endpoint path against the configured base URL
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or the joined result is not a valid URL
    pub fn endpoint(&self, path: &str) -> Result<Url, SettingsError> {
        let to_error = |source| SettingsError::BaseUrl {
            url: self.base_url.clone(),
            source,
        };
        let base = Url::parse(&self.base_url).map_err(to_error)?;
        base.join(path).map_err(to_error)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl StorefrontSettings {
    /// Load settings from configuration files and environment variables, then
    /// start the logger at the configured level
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A settings file cannot be read or parsed
    /// - The logger was already initialised
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_env_file();

        let (mut settings, sources) = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(settings.logging.level.as_str()),
        )
        .try_init()?;

        for source in &sources {
            log::info!("Loaded settings from {}", source.display());
        }
        if sources.is_empty() {
            log::info!("No Settings.toml found, using defaults");
        }

        Ok(settings)
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `STOREFRONT_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed
    pub fn load_base_settings() -> Result<(Self, Vec<PathBuf>), SettingsError> {
        let mut settings = Self::default();
        let mut sources = Vec::new();

        let default_config_path = PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_file(&default_config_path)?;
            sources.push(default_config_path);
        }

        if let Ok(secrets_dir) = std::env::var("STOREFRONT_SECRETS_DIR") {
            let secrets_path = Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_file(&secrets_path)?;
                sources.push(secrets_path);
            }
        }

        Ok((settings, sources))
    }

    /// Parse a single settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        basic_toml::from_str(&content).map_err(|source| SettingsError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_api_env_overrides(&mut settings.api);
        Self::apply_registration_env_overrides(&mut settings.registration);
        Self::apply_session_env_overrides(&mut settings.session);
        if let Ok(level) = std::env::var("STOREFRONT_LOG_LEVEL") {
            settings.logging.level = level;
        }
    }

    fn apply_api_env_overrides(api_settings: &mut ApiSettings) {
        if let Ok(base_url) = std::env::var("STOREFRONT_API_BASE_URL") {
            api_settings.base_url = base_url;
        }
        if let Ok(timeout_str) = std::env::var("STOREFRONT_API_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout_str.parse::<u64>() {
                api_settings.timeout_secs = timeout;
            }
        }
    }

    fn apply_registration_env_overrides(registration_settings: &mut RegistrationSettings) {
        if let Ok(role_str) = std::env::var("STOREFRONT_DEFAULT_ROLE") {
            match role_str.parse::<Role>() {
                Ok(role) => registration_settings.identity_role = role,
                Err(e) => log::warn!("Ignoring STOREFRONT_DEFAULT_ROLE: {e}"),
            }
        }
    }

    fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        if let Ok(persist_file) = std::env::var("STOREFRONT_SESSION_FILE") {
            session_settings.persist_file = if persist_file.is_empty() {
                None
            } else {
                Some(persist_file)
            };
        }
    }

    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }
}
