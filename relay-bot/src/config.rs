//! Relay configuration, loaded once at startup from a YAML file (default `config.yml`).
//!
//! ```yaml
//! token: "<discord bot token>"
//! edit-interval-secs: 5
//! log-file: logs/relay.log
//! api-channel-configs:
//!   - api-url: http://localhost:11434/api/chat
//!     api-auth-token: ""
//!     model-name: llama3
//!     system-role-messages: ["You are a helpful assistant."]
//!     chat-channel-id: "123456789012345678"
//! ```
//!
//! `DISCORD_TOKEN` from the environment overrides `token`.

use relay_core::{RelayError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config.yml";
pub const DEFAULT_LOG_FILE: &str = "logs/relay.log";
pub const DEFAULT_EDIT_INTERVAL_SECS: u64 = 5;
pub const TOKEN_ENV_VAR: &str = "DISCORD_TOKEN";

/// Binds one chat channel to a completion endpoint, model and system preamble. Read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChannelProfile {
    pub api_url: String,
    #[serde(default)]
    pub api_auth_token: Option<String>,
    pub model_name: String,
    #[serde(default)]
    pub system_role_messages: Vec<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub chat_channel_id: String,
}

impl ChannelProfile {
    /// Bearer token for the endpoint; an empty string counts as "no token".
    pub fn auth_token(&self) -> Option<&str> {
        self.api_auth_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RelayConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_edit_interval_secs")]
    pub edit_interval_secs: u64,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default)]
    pub api_channel_configs: Vec<ChannelProfile>,
}

fn default_edit_interval_secs() -> u64 {
    DEFAULT_EDIT_INTERVAL_SECS
}

fn default_log_file() -> String {
    DEFAULT_LOG_FILE.to_string()
}

/// Snowflake ids are often written unquoted in YAML; accept both forms.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Text(String),
        Number(u64),
    }

    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Text(s) => s.trim().to_string(),
        IdRepr::Number(n) => n.to_string(),
    })
}

impl RelayConfig {
    /// Reads `path`, applies the `DISCORD_TOKEN` override and validates.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RelayError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_yaml_str(&raw)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parses YAML without touching the environment or validating.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw)
            .map_err(|e| RelayError::Config(format!("malformed configuration: {}", e)))
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = env::var(TOKEN_ENV_VAR) {
            if !token.trim().is_empty() {
                self.token = token.trim().to_string();
            }
        }
    }

    /// Checks everything the bot needs before connecting.
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(RelayError::Config(format!(
                "bot token is empty (set `token` or {})",
                TOKEN_ENV_VAR
            )));
        }
        if self.edit_interval_secs == 0 {
            return Err(RelayError::Config(
                "edit-interval-secs must be at least 1".to_string(),
            ));
        }
        if self.api_channel_configs.is_empty() {
            return Err(RelayError::Config(
                "api-channel-configs has no entries".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for (i, profile) in self.api_channel_configs.iter().enumerate() {
            for (key, value) in [
                ("api-url", &profile.api_url),
                ("model-name", &profile.model_name),
                ("chat-channel-id", &profile.chat_channel_id),
            ] {
                if value.trim().is_empty() {
                    return Err(RelayError::Config(format!(
                        "api-channel-configs[{}]: {} is empty",
                        i, key
                    )));
                }
            }
            if !seen.insert(profile.chat_channel_id.as_str()) {
                return Err(RelayError::Config(format!(
                    "api-channel-configs[{}]: duplicate chat-channel-id {}",
                    i, profile.chat_channel_id
                )));
            }
        }
        Ok(())
    }

    /// Profile bound to `channel_id`; the first match wins.
    pub fn find_channel_profile(&self, channel_id: &str) -> Option<&ChannelProfile> {
        self.api_channel_configs
            .iter()
            .find(|p| p.chat_channel_id == channel_id)
    }

    pub fn edit_interval(&self) -> Duration {
        Duration::from_secs(self.edit_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const SAMPLE: &str = r#"
token: file-token
api-channel-configs:
  - api-url: http://localhost:11434/api/chat
    model-name: llama3
    system-role-messages:
      - You are a helpful assistant.
      - Answer in English.
    chat-channel-id: 111
  - api-url: https://example.com/api/chat
    api-auth-token: "  "
    model-name: m
    chat-channel-id: "222"
"#;

    #[test]
    fn test_parse_with_defaults() {
        let config = RelayConfig::from_yaml_str(SAMPLE).unwrap();

        assert_eq!(config.token, "file-token");
        assert_eq!(config.edit_interval_secs, DEFAULT_EDIT_INTERVAL_SECS);
        assert_eq!(config.edit_interval(), Duration::from_secs(5));
        assert_eq!(config.log_file, DEFAULT_LOG_FILE);
        assert_eq!(config.api_channel_configs.len(), 2);

        let first = &config.api_channel_configs[0];
        assert_eq!(first.chat_channel_id, "111");
        assert_eq!(
            first.system_role_messages,
            vec!["You are a helpful assistant.", "Answer in English."]
        );
        assert!(first.auth_token().is_none());
        assert!(config.api_channel_configs[1].auth_token().is_none());
    }

    #[test]
    fn test_find_channel_profile() {
        let config = RelayConfig::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.find_channel_profile("222").unwrap().model_name, "m");
        assert!(config.find_channel_profile("333").is_none());
    }

    #[test]
    fn test_auth_token_present() {
        let profile = ChannelProfile {
            api_url: "u".into(),
            api_auth_token: Some("secret".into()),
            model_name: "m".into(),
            system_role_messages: vec![],
            chat_channel_id: "1".into(),
        };
        assert_eq!(profile.auth_token(), Some("secret"));
    }

    #[test]
    fn test_malformed_yaml_is_config_error() {
        let err = RelayConfig::from_yaml_str("api-channel-configs: [").unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        let mut config = RelayConfig::from_yaml_str(SAMPLE).unwrap();
        assert!(config.validate().is_ok());

        config.edit_interval_secs = 0;
        assert!(config.validate().is_err());
        config.edit_interval_secs = 5;

        config.api_channel_configs[1].chat_channel_id = "111".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
        config.api_channel_configs[1].chat_channel_id = "222".into();

        config.api_channel_configs[0].model_name = " ".into();
        assert!(config.validate().unwrap_err().to_string().contains("model-name"));
        config.api_channel_configs[0].model_name = "llama3".into();

        config.token.clear();
        assert!(config.validate().is_err());

        let empty = RelayConfig::from_yaml_str("token: t").unwrap();
        assert!(empty.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_load_reads_file_and_env_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        env::remove_var(TOKEN_ENV_VAR);
        let config = RelayConfig::load(file.path()).unwrap();
        assert_eq!(config.token, "file-token");

        env::set_var(TOKEN_ENV_VAR, "env-token");
        let config = RelayConfig::load(file.path()).unwrap();
        assert_eq!(config.token, "env-token");
        env::remove_var(TOKEN_ENV_VAR);
    }

    #[test]
    #[serial]
    fn test_load_missing_file_is_config_error() {
        let err = RelayConfig::load("/nonexistent/relay/config.yml").unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }
}
