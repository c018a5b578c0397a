use serde::Deserialize;

use crate::auth::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::error::ConfigError;

#[derive(Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub aws: AwsSettings,
    #[serde(default)]
    pub user_store: UserStoreSettings,
    #[serde(default)]
    pub cors: CorsSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8181,
        }
    }
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Whether gated routes check the `Authorization` header at all.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthCheck {
    #[default]
    Enforced,
    Disabled,
}

/// JWT and password hashing settings
#[derive(Deserialize, Clone)]
pub struct AuthSettings {
    pub secret: String,
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl: i64, // seconds
    #[serde(default = "default_refresh_token_ttl")]
    pub refresh_token_ttl: i64, // seconds
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    #[serde(default)]
    pub auth_check: AuthCheck,
}

fn default_access_token_ttl() -> i64 {
    120
}

fn default_refresh_token_ttl() -> i64 {
    24 * 60 * 60
}

fn default_bcrypt_cost() -> u32 {
    10
}

#[derive(Deserialize, Clone)]
pub struct AwsSettings {
    pub default_region: String,
    pub user_table: String,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            default_region: "us-east-1".to_string(),
            user_table: "UserDetails".to_string(),
        }
    }
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserStoreBackend {
    #[default]
    Dynamodb,
    Memory,
}

#[derive(Deserialize, Clone, Default)]
pub struct UserStoreSettings {
    #[serde(default)]
    pub backend: UserStoreBackend,
}

#[derive(Deserialize, Clone)]
pub struct CorsSettings {
    pub allowed_origin: String,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origin: "*".to_string(),
        }
    }
}

impl Settings {
    /// Reject settings the server cannot run safely with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth.validate()?;
        self.cors.validate()
    }
}

impl CorsSettings {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origin.trim() == "*"
    }

    /// `*` or a single `scheme://host[:port]` origin.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allows_any_origin() {
            return Ok(());
        }

        let origin = self.allowed_origin.trim();
        let has_scheme = origin.starts_with("http://") || origin.starts_with("https://");
        if !has_scheme || origin.ends_with('/') || origin.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue(format!(
                "cors.allowed_origin must be * or an origin like https://example.com, got {}",
                origin
            )));
        }
        Ok(())
    }
}

impl AuthSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("auth.secret".to_string()));
        }
        if self.access_token_ttl <= 0 {
            return Err(ConfigError::InvalidValue(
                "auth.access_token_ttl must be positive".to_string(),
            ));
        }
        if self.refresh_token_ttl <= 0 {
            return Err(ConfigError::InvalidValue(
                "auth.refresh_token_ttl must be positive".to_string(),
            ));
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidValue(format!(
                "auth.bcrypt_cost must be between {} and {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST
            )));
        }
        Ok(())
    }
}

/// Load settings from `configuration.*` (optional) overlaid with `APP_*` environment
/// variables, e.g. `APP_AUTH__AUTH_CHECK=disabled`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    let settings = settings
        .try_deserialize::<Settings>()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;
    settings.validate()?;
    Ok(settings)
}
