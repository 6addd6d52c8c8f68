use client_core::{
    BotIndicator, ChatMessage, SettingsForm, Toast, ToastKind, ViewRenderer, ViewState,
};
use shared::domain::ChatRole;
use tracing::debug;

/// Writes every rendered change to stdout, one line per event.
pub struct ConsoleRenderer;

impl ViewRenderer for ConsoleRenderer {
    fn show_view(&self, view: &ViewState) {
        println!("{}", view_line(view));
    }

    fn show_toast(&self, toast: &Toast) {
        println!("{}", toast_line(toast));
    }

    fn dismiss_toast(&self) {
        debug!("console: toast dismissed");
    }

    fn message_appended(&self, message: &ChatMessage) {
        println!("{}", chat_line(message));
    }

    fn message_updated(&self, message: &ChatMessage) {
        println!("{}", chat_line(message));
    }

    fn chat_cleared(&self) {
        debug!("console: chat cleared");
    }

    fn settings_changed(&self, form: &SettingsForm) {
        debug!(ai_mode = %form.ai_mode(), "console: settings form changed");
    }

    fn bot_status_changed(&self, indicator: &BotIndicator) {
        if indicator.shows_alert() {
            println!("! Telegram bot offline: {}", indicator.message());
        } else {
            debug!(status = indicator.message(), "console: bot online");
        }
    }

    fn alert(&self, message: &str) {
        println!("! {message}");
    }
}

fn view_line(view: &ViewState) -> String {
    match view {
        ViewState::Auth { form } => format!("== {} ==", form.subtitle()),
        ViewState::Main { tab } => format!("== {tab} =="),
    }
}

fn toast_line(toast: &Toast) -> String {
    let label = match toast.kind {
        ToastKind::Success => "ok",
        ToastKind::Warning => "warning",
        ToastKind::Error => "error",
    };
    format!("[{label}] {}", toast.message)
}

fn chat_line(message: &ChatMessage) -> String {
    let speaker = match message.role {
        ChatRole::User => "you",
        ChatRole::Ai => "assistant",
    };
    format!("{speaker}> {}", message.text)
}

/// Multi-line settings summary for `settings show`. The API key is masked.
pub fn settings_summary(form: &SettingsForm, bot: Option<&BotIndicator>) -> String {
    let mut lines = vec![format!("ai_mode: {}", form.ai_mode())];
    if form.api_key_visible() {
        lines.push(format!("api_key: {}", mask_secret(form.api_key())));
    }
    lines.push(format!(
        "telegram_bot_token: {}",
        mask_secret(form.telegram_bot_token())
    ));
    if let Some(bot) = bot {
        let state = match bot {
            BotIndicator::Online(_) => "online",
            BotIndicator::Offline(_) => "offline",
        };
        lines.push(format!("bot: {state} ({})", bot.message()));
    }
    lines.join("\n")
}

fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    match count {
        0 => "(not set)".to_string(),
        1..=8 => "*".repeat(count),
        _ => {
            let tail: String = secret.chars().skip(count - 4).collect();
            format!("{}{tail}", "*".repeat(count - 4))
        }
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::{AiMode, Settings};

    use super::*;

    #[test]
    fn masks_all_but_the_tail_of_long_secrets() {
        assert_eq!(mask_secret(""), "(not set)");
        assert_eq!(mask_secret("short"), "*****");
        assert_eq!(mask_secret("sk-1234567890"), "*********7890");
    }

    #[test]
    fn summary_hides_api_key_line_in_local_mode() {
        let mut form = SettingsForm::default();
        form.apply(&Settings {
            ai_mode: AiMode::Local,
            api_key: Some("sk-1234567890".into()),
            telegram_bot_token: None,
            bot_status: None,
        });

        let summary = settings_summary(&form, None);
        assert_eq!(summary, "ai_mode: local\ntelegram_bot_token: (not set)");
    }

    #[test]
    fn summary_includes_bot_state_when_known() {
        let mut form = SettingsForm::default();
        form.set_ai_mode(AiMode::Api);
        form.set_api_key("sk-1234567890");
        let bot = BotIndicator::Offline("Invalid Token".into());

        let summary = settings_summary(&form, Some(&bot));
        assert_eq!(
            summary,
            "ai_mode: api\napi_key: *********7890\ntelegram_bot_token: (not set)\nbot: offline (Invalid Token)"
        );
    }

    #[test]
    fn toast_and_view_lines_are_labelled() {
        assert_eq!(
            toast_line(&Toast::new(ToastKind::Warning, "Please fill in both username and password.")),
            "[warning] Please fill in both username and password."
        );
        assert_eq!(
            view_line(&ViewState::initial(false)),
            "== Please login to continue =="
        );
        assert_eq!(view_line(&ViewState::initial(true)), "== chat ==");
    }
}
