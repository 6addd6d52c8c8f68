use shared::{
    domain::{AiMode, BotStatus, Settings},
    protocol::SettingsUpdate,
};

/// Local, editable copy of the server settings.
///
/// `api_key_visible` is derived from `ai_mode` on every mutation and is
/// never set directly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsForm {
    ai_mode: AiMode,
    api_key: String,
    telegram_bot_token: String,
    api_key_visible: bool,
}

impl SettingsForm {
    pub fn ai_mode(&self) -> AiMode {
        self.ai_mode
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn telegram_bot_token(&self) -> &str {
        &self.telegram_bot_token
    }

    pub fn api_key_visible(&self) -> bool {
        self.api_key_visible
    }

    pub fn set_ai_mode(&mut self, mode: AiMode) {
        self.ai_mode = mode;
        self.api_key_visible = mode == AiMode::Api;
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = api_key.into();
    }

    pub fn set_telegram_bot_token(&mut self, token: impl Into<String>) {
        self.telegram_bot_token = token.into();
    }

    pub fn apply(&mut self, settings: &Settings) {
        self.set_ai_mode(settings.ai_mode);
        self.api_key = settings.api_key.clone().unwrap_or_default();
        self.telegram_bot_token = settings.telegram_bot_token.clone().unwrap_or_default();
    }

    pub fn to_update(&self) -> SettingsUpdate {
        SettingsUpdate {
            ai_mode: self.ai_mode,
            api_key: self.api_key.clone(),
            telegram_bot_token: self.telegram_bot_token.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotIndicator {
    Online(String),
    /// Rendered together with the bot-offline alert.
    Offline(String),
}

impl BotIndicator {
    pub fn message(&self) -> &str {
        match self {
            BotIndicator::Online(message) | BotIndicator::Offline(message) => message,
        }
    }

    pub fn shows_alert(&self) -> bool {
        matches!(self, BotIndicator::Offline(_))
    }
}

impl From<&BotStatus> for BotIndicator {
    fn from(status: &BotStatus) -> Self {
        if status.ok {
            BotIndicator::Online(status.message.clone())
        } else {
            BotIndicator::Offline(status.message.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_visibility_tracks_ai_mode_under_repeated_toggles() {
        let mut form = SettingsForm::default();
        assert!(!form.api_key_visible());

        for _ in 0..3 {
            form.set_ai_mode(AiMode::Api);
            assert!(form.api_key_visible());
        }
        for _ in 0..3 {
            form.set_ai_mode(AiMode::Local);
            assert!(!form.api_key_visible());
        }
    }

    #[test]
    fn apply_hides_api_key_when_server_mode_is_local() {
        let mut form = SettingsForm::default();
        form.set_ai_mode(AiMode::Api);

        form.apply(&Settings {
            ai_mode: AiMode::Local,
            api_key: None,
            telegram_bot_token: Some("123:abc".into()),
            bot_status: None,
        });

        assert!(!form.api_key_visible());
        assert_eq!(form.api_key(), "");
        assert_eq!(form.telegram_bot_token(), "123:abc");
    }

    #[test]
    fn update_carries_unchanged_fields() {
        let mut form = SettingsForm::default();
        form.apply(&Settings {
            ai_mode: AiMode::Api,
            api_key: Some("sk-1".into()),
            telegram_bot_token: Some("old".into()),
            bot_status: None,
        });
        form.set_telegram_bot_token("new");

        let update = form.to_update();
        assert_eq!(update.ai_mode, AiMode::Api);
        assert_eq!(update.api_key, "sk-1");
        assert_eq!(update.telegram_bot_token, "new");
    }

    #[test]
    fn bot_indicator_reflects_status() {
        let online = BotIndicator::from(&BotStatus {
            ok: true,
            message: "Online (@helper_bot)".into(),
        });
        assert!(!online.shows_alert());
        assert_eq!(online.message(), "Online (@helper_bot)");

        let offline = BotIndicator::from(&BotStatus {
            ok: false,
            message: "Invalid Token".into(),
        });
        assert!(offline.shows_alert());
    }
}
