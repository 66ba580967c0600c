//! Layered configuration: optional `warden.toml`, then `WARDEN__*` env vars.

use std::sync::Arc;

use anyhow::{Context, ensure};
use chrono::Duration;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use warden_auth::{DEFAULT_TOKEN_LIFETIME_MINUTES, TOTP_WINDOW, TokenSettings};
use warden_core::Clock;

use crate::credentials::BcryptTotpVerifier;

const CONFIG_FILE: &str = "warden";
const ENV_PREFIX: &str = "WARDEN";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WardenConfig {
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default)]
    pub totp: TotpConfig,
    #[serde(default)]
    pub password: PasswordConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_lifetime_minutes")]
    pub lifetime_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TotpConfig {
    /// Steps tolerated either side of now.
    #[serde(default = "default_totp_window")]
    pub window: u8,
    #[serde(default = "default_totp_step_seconds")]
    pub step_seconds: u64,
    #[serde(default = "default_totp_issuer")]
    pub issuer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_lifetime_minutes() -> i64 {
    DEFAULT_TOKEN_LIFETIME_MINUTES
}

fn default_totp_window() -> u8 {
    TOTP_WINDOW
}

fn default_totp_step_seconds() -> u64 {
    30
}

fn default_totp_issuer() -> String {
    "warden".to_string()
}

fn default_bcrypt_cost() -> u32 {
    10
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            lifetime_minutes: default_lifetime_minutes(),
        }
    }
}

impl Default for TotpConfig {
    fn default() -> Self {
        Self {
            window: default_totp_window(),
            step_seconds: default_totp_step_seconds(),
            issuer: default_totp_issuer(),
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

impl WardenConfig {
    /// Load from `warden.toml` (if present) and the environment.
    pub fn load() -> anyhow::Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("building configuration")?;
        Self::from_config(config)
    }

    /// Parse an inline TOML document; unset keys keep their defaults.
    pub fn from_toml_str(toml: &str) -> anyhow::Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .context("parsing configuration")?;
        Self::from_config(config)
    }

    fn from_config(config: Config) -> anyhow::Result<Self> {
        let parsed: Self = config
            .try_deserialize()
            .context("deserializing configuration")?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.token.lifetime_minutes > 0,
            "token.lifetime_minutes must be positive"
        );
        ensure!(
            self.totp.window == TOTP_WINDOW,
            "totp.window is fixed at {TOTP_WINDOW} step"
        );
        ensure!(self.totp.step_seconds > 0, "totp.step_seconds must be positive");
        ensure!(
            (4..=31).contains(&self.password.bcrypt_cost),
            "password.bcrypt_cost must be within 4..=31"
        );
        ensure!(
            !self.totp.issuer.contains(':'),
            "totp.issuer must not contain ':'"
        );
        Ok(())
    }

    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            lifetime: Duration::minutes(self.token.lifetime_minutes),
            totp_window: self.totp.window,
        }
    }

    pub fn credential_verifier(&self, clock: Arc<dyn Clock>) -> BcryptTotpVerifier {
        BcryptTotpVerifier::new(
            self.password.bcrypt_cost,
            self.totp.step_seconds,
            self.totp.issuer.clone(),
        )
        .with_clock(clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_token_constants() {
        let config = WardenConfig::from_toml_str("").unwrap();
        assert_eq!(config.token_settings(), TokenSettings::default());
        assert_eq!(config.totp.step_seconds, 30);
        assert_eq!(config.password.bcrypt_cost, 10);
    }

    #[test]
    fn partial_file_overrides_only_named_keys() {
        let config = WardenConfig::from_toml_str(
            r#"
            [token]
            lifetime_minutes = 5

            [password]
            bcrypt_cost = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.token.lifetime_minutes, 5);
        assert_eq!(config.password.bcrypt_cost, 4);
        assert_eq!(config.totp.window, 1);
        assert_eq!(config.totp.issuer, "warden");
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(WardenConfig::from_toml_str("[token]\nlifetime_minutes = 0").is_err());
        assert!(WardenConfig::from_toml_str("[password]\nbcrypt_cost = 2").is_err());
        assert!(WardenConfig::from_toml_str("[totp]\nissuer = \"a:b\"").is_err());
        assert!(WardenConfig::from_toml_str("[totp]\nwindow = 5").is_err());
        assert!(WardenConfig::from_toml_str("[totp]\nwindow = 0").is_err());
        assert!(WardenConfig::from_toml_str("[totp]\nwindow = 1").is_ok());
    }
}
