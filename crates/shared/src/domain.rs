use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Bearer credential issued by `/login` or `/register`.
///
/// `Debug` never prints the secret so the token can travel through
/// structured logs without leaking.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatMessageId(pub Uuid);

impl ChatMessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChatMessageId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Ai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiMode {
    #[default]
    Local,
    Api,
}

impl AiMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AiMode::Local => "local",
            AiMode::Api => "api",
        }
    }
}

impl fmt::Display for AiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown ai mode '{0}'; expected 'local' or 'api'")]
pub struct UnknownAiMode(pub String);

impl FromStr for AiMode {
    type Err = UnknownAiMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(AiMode::Local),
            "api" => Ok(AiMode::Api),
            other => Err(UnknownAiMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotStatus {
    pub ok: bool,
    pub message: String,
}

/// Server-side settings as returned by `GET /settings`.
///
/// Older back ends omit `ai_mode` and `api_key`, so every field tolerates
/// being absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub ai_mode: AiMode,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub telegram_bot_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_status: Option<BotStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_debug_is_redacted() {
        let token = AccessToken::new("secret-value");
        assert_eq!(format!("{token:?}"), "AccessToken(<redacted>)");
        assert_eq!(token.as_str(), "secret-value");
    }

    #[test]
    fn settings_tolerate_missing_fields() {
        let settings: Settings = serde_json::from_str(
            r#"{"telegram_bot_token":"123:abc","bot_status":{"ok":false,"message":"Invalid Token"}}"#,
        )
        .expect("settings");
        assert_eq!(settings.ai_mode, AiMode::Local);
        assert_eq!(settings.api_key, None);
        assert_eq!(settings.telegram_bot_token.as_deref(), Some("123:abc"));
        assert_eq!(
            settings.bot_status,
            Some(BotStatus {
                ok: false,
                message: "Invalid Token".into()
            })
        );
    }

    #[test]
    fn ai_mode_parses_case_insensitively() {
        assert_eq!("API".parse::<AiMode>().expect("api"), AiMode::Api);
        assert_eq!(" local ".parse::<AiMode>().expect("local"), AiMode::Local);
        assert!("cloud".parse::<AiMode>().is_err());
    }
}
