use std::env;
use std::time::Duration;

use auth::TokenOptions;
use chrono::Utc;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::session::state::SessionSettings;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub expiration_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    pub iterations: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub store_timeout_ms: u64,
    pub storage_key: String,
    pub idle_timeout_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        config.token_options()?;

        if config.session.sweep_interval_secs == 0 {
            return Err(ConfigError::Message(
                "session.sweep_interval_secs must be positive".to_string(),
            ));
        }

        Ok(config)
    }

    /// Token settings, rejecting lifetimes that are not positive or cannot be
    /// represented as a timestamp.
    pub fn token_options(&self) -> Result<TokenOptions, ConfigError> {
        if self.jwt.expiration_hours <= 0 {
            return Err(ConfigError::Message(
                "jwt.expiration_hours must be positive".to_string(),
            ));
        }

        let lifetime = chrono::Duration::try_hours(self.jwt.expiration_hours)
            .filter(|lifetime| Utc::now().checked_add_signed(*lifetime).is_some())
            .ok_or_else(|| {
                ConfigError::Message(format!(
                    "jwt.expiration_hours is out of range: {}",
                    self.jwt.expiration_hours
                ))
            })?;

        Ok(TokenOptions {
            issuer: self.jwt.issuer.clone(),
            audience: self.jwt.audience.clone(),
            lifetime,
        })
    }

    pub fn password_iterations(&self) -> u32 {
        self.password.iterations
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            storage_key: self.session.storage_key.clone(),
            store_timeout: Duration::from_millis(self.session.store_timeout_ms),
            idle_timeout: Duration::from_secs(self.session.idle_timeout_secs),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session.sweep_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            server: ServerConfig { http_port: 8080 },
            jwt: JwtConfig {
                secret: "secret".to_string(),
                issuer: "issuer".to_string(),
                audience: "audience".to_string(),
                expiration_hours: 8,
            },
            password: PasswordConfig { iterations: 20_000 },
            session: SessionConfig {
                store_timeout_ms: 1500,
                storage_key: "accessToken".to_string(),
                idle_timeout_secs: 600,
                sweep_interval_secs: 60,
            },
        }
    }

    #[test]
    fn test_token_options_from_config() {
        let config = config();
        let options = config.token_options().unwrap();
        assert_eq!(options.issuer, "issuer");
        assert_eq!(options.audience, "audience");
        assert_eq!(options.lifetime, chrono::Duration::hours(8));
        assert_eq!(config.password_iterations(), 20_000);
    }

    #[test]
    fn test_token_lifetime_must_be_positive_and_representable() {
        for hours in [0, -1, i64::MAX, 100_000_000_000] {
            let mut config = config();
            config.jwt.expiration_hours = hours;
            assert!(config.token_options().is_err(), "hours: {hours}");
        }
    }

    #[test]
    fn test_session_settings_from_config() {
        let settings = config().session_settings();
        assert_eq!(settings.storage_key, "accessToken");
        assert_eq!(settings.store_timeout, Duration::from_millis(1500));
        assert_eq!(settings.idle_timeout, Duration::from_secs(600));
        assert_eq!(config().sweep_interval(), Duration::from_secs(60));
    }
}
