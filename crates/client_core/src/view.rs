//! Declarative view state and the renderer seam the controller drives.

use std::fmt;

use crate::{chat::ChatMessage, settings_form::{BotIndicator, SettingsForm}};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthForm {
    Login,
    Register,
}

impl AuthForm {
    pub fn subtitle(self) -> &'static str {
        match self {
            AuthForm::Login => "Please login to continue",
            AuthForm::Register => "Create a new account",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Chat,
    Settings,
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tab::Chat => f.write_str("chat"),
            Tab::Settings => f.write_str("settings"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Auth { form: AuthForm },
    Main { tab: Tab },
}

impl ViewState {
    pub fn initial(authenticated: bool) -> Self {
        if authenticated {
            ViewState::Main { tab: Tab::default() }
        } else {
            ViewState::Auth {
                form: AuthForm::Login,
            }
        }
    }

    pub fn is_main(&self) -> bool {
        matches!(self, ViewState::Main { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Presentation surface. Calls arrive in the order state changes happen and
/// may come from any task, including the toast dismissal timer.
pub trait ViewRenderer: Send + Sync {
    fn show_view(&self, view: &ViewState);
    fn show_toast(&self, toast: &Toast);
    fn dismiss_toast(&self);
    fn message_appended(&self, message: &ChatMessage);
    /// A previously appended message changed text in place.
    fn message_updated(&self, message: &ChatMessage);
    fn chat_cleared(&self);
    fn settings_changed(&self, form: &SettingsForm);
    fn bot_status_changed(&self, indicator: &BotIndicator);
    /// Blocking confirmation the user has to acknowledge.
    fn alert(&self, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_view_follows_authentication() {
        assert_eq!(ViewState::initial(true), ViewState::Main { tab: Tab::Chat });
        assert_eq!(
            ViewState::initial(false),
            ViewState::Auth {
                form: AuthForm::Login
            }
        );
        assert!(ViewState::initial(true).is_main());
        assert!(!ViewState::initial(false).is_main());
    }
}
