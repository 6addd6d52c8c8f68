use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AiMode, Settings};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Sent form-encoded, not as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Reply to `/login` and `/register`.
///
/// `/register` answers with a null token when the account still needs
/// confirming before a session can be issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Body of `POST /settings`. All three fields are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub ai_mode: AiMode,
    pub api_key: String,
    pub telegram_bot_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsSaved {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub settings: Settings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_update_always_carries_every_field() {
        let update = SettingsUpdate {
            ai_mode: AiMode::Local,
            api_key: String::new(),
            telegram_bot_token: "123:abc".into(),
        };
        let value = serde_json::to_value(&update).expect("json");
        let object = value.as_object().expect("object");
        assert_eq!(object.len(), 3);
        assert_eq!(object["ai_mode"], "local");
        assert_eq!(object["api_key"], "");
        assert_eq!(object["telegram_bot_token"], "123:abc");
    }

    #[test]
    fn register_reply_without_session_decodes() {
        let reply: TokenResponse = serde_json::from_str(
            r#"{"message":"User created successfully","access_token":null,"token_type":"bearer"}"#,
        )
        .expect("reply");
        assert!(reply.access_token.is_none());
    }

    #[test]
    fn settings_saved_reply_exposes_bot_status() {
        let reply: SettingsSaved = serde_json::from_str(
            r#"{"status":"success","settings":{"telegram_bot_token":"t","bot_status":{"ok":true,"message":"Online (@helper_bot)"}}}"#,
        )
        .expect("reply");
        let status = reply.settings.bot_status.expect("status");
        assert!(status.ok);
        assert_eq!(status.message, "Online (@helper_bot)");
    }
}
