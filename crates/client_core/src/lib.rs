use std::{sync::Arc, time::Duration};

use shared::{
    domain::{AccessToken, AiMode, ChatRole, Settings},
    protocol::{LoginForm, RegisterRequest, TokenResponse, UserProfile},
};
use storage::KeyValueStore;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

mod api;
pub mod chat;
pub mod error;
pub mod session;
pub mod settings_form;
pub mod toast;
pub mod view;

pub use api::HttpApi;
pub use chat::{ChatMessage, ChatTranscript, ASSISTANT_UNREACHABLE, THINKING_PLACEHOLDER};
pub use error::ClientError;
pub use session::{Session, TOKEN_KEY};
pub use settings_form::{BotIndicator, SettingsForm};
pub use toast::{ToastScheduler, DEFAULT_TOAST_DURATION};
pub use view::{AuthForm, Tab, Toast, ToastKind, ViewRenderer, ViewState};

pub const DEFAULT_MAIN_VIEW_DELAY: Duration = Duration::from_millis(500);

const CONNECTION_ERROR: &str = "Connection error";
const LOGIN_REJECTED: &str = "Invalid username or password";
const REGISTRATION_REJECTED: &str = "Registration failed";
const LOGIN_FIELDS_REQUIRED: &str = "Please fill in both username and password.";
const REGISTER_FIELDS_REQUIRED: &str = "Please fill in both email and password.";
const LOGIN_SUCCEEDED: &str = "Login successful!";
const REGISTRATION_SUCCEEDED: &str = "Registration successful!";
const REGISTRATION_PENDING: &str = "Account created. Please log in to continue.";
const SESSION_NOT_SAVED: &str = "Could not save your session";
const SETTINGS_SAVED: &str = "Settings saved!";
const SETTINGS_SAVE_FAILED: &str = "Failed to save settings";

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub toast_duration: Duration,
    /// Pause between the sign-in success toast and the switch to the main view.
    pub main_view_delay: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            toast_duration: DEFAULT_TOAST_DURATION,
            main_view_delay: DEFAULT_MAIN_VIEW_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    SignedIn,
    /// Account exists but the server issued no session yet.
    PendingConfirmation,
}

struct ControllerState {
    /// Bumped on every sign-in and logout. Work started under an older
    /// epoch must not touch the current state.
    epoch: u64,
    view: ViewState,
    transcript: ChatTranscript,
    settings: SettingsForm,
    settings_synced: bool,
    bot_status: Option<BotIndicator>,
}

impl ControllerState {
    fn fresh(epoch: u64, authenticated: bool) -> Self {
        Self {
            epoch,
            view: ViewState::initial(authenticated),
            transcript: ChatTranscript::default(),
            settings: SettingsForm::default(),
            settings_synced: false,
            bot_status: None,
        }
    }
}

/// Drives authentication, chat and settings against the assistant API and
/// mirrors every state change into a [`ViewRenderer`].
///
/// Requests of the same kind are not serialized; the state lock is never
/// held across a network call.
pub struct SessionController {
    api: HttpApi,
    session: Session,
    renderer: Arc<dyn ViewRenderer>,
    toasts: ToastScheduler,
    options: ControllerOptions,
    state: Mutex<ControllerState>,
}

impl SessionController {
    pub async fn new(
        api: HttpApi,
        store: Arc<dyn KeyValueStore>,
        renderer: Arc<dyn ViewRenderer>,
        options: ControllerOptions,
    ) -> Result<Arc<Self>, ClientError> {
        let session = Session::init(store).await?;
        let authenticated = session.is_authenticated().await;
        Ok(Arc::new(Self {
            api,
            session,
            toasts: ToastScheduler::new(Arc::clone(&renderer), options.toast_duration),
            renderer,
            options,
            state: Mutex::new(ControllerState::fresh(0, authenticated)),
        }))
    }

    /// Renders the initial view; a restored session goes straight to the
    /// main view and loads settings.
    pub async fn start(&self) -> ViewState {
        if self.session.is_authenticated().await {
            let epoch = self.state.lock().await.epoch;
            self.enter_main_view(epoch).await;
        } else {
            let view = {
                let mut state = self.state.lock().await;
                state.view = ViewState::initial(false);
                state.view
            };
            self.renderer.show_view(&view);
        }
        self.view().await
    }

    pub async fn view(&self) -> ViewState {
        self.state.lock().await.view
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.is_authenticated().await
    }

    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.state.lock().await.transcript.messages().to_vec()
    }

    pub async fn settings_form(&self) -> SettingsForm {
        self.state.lock().await.settings.clone()
    }

    pub async fn bot_status(&self) -> Option<BotIndicator> {
        self.state.lock().await.bot_status.clone()
    }

    /// Whether the form holds values fetched from the server in this session.
    pub async fn settings_synced(&self) -> bool {
        self.state.lock().await.settings_synced
    }

    pub async fn show_login_form(&self) {
        self.switch_auth_form(AuthForm::Login).await;
    }

    pub async fn show_register_form(&self) {
        self.switch_auth_form(AuthForm::Register).await;
    }

    async fn switch_auth_form(&self, form: AuthForm) {
        let view = {
            let mut state = self.state.lock().await;
            if state.view.is_main() {
                debug!(?form, "view: auth form switch ignored in main view");
                return;
            }
            state.view = ViewState::Auth { form };
            state.view
        };
        self.renderer.show_view(&view);
        self.toasts.dismiss().await;
    }

    pub async fn select_tab(&self, tab: Tab) {
        let view = {
            let mut state = self.state.lock().await;
            if !state.view.is_main() {
                debug!(%tab, "view: tab selection ignored outside main view");
                return;
            }
            state.view = ViewState::Main { tab };
            state.view
        };
        self.renderer.show_view(&view);
    }

    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthOutcome, ClientError> {
        self.ensure_signed_out().await?;

        let full_name = full_name.trim();
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(self.reject_input(REGISTER_FIELDS_REQUIRED).await);
        }

        info!(email, "auth: registering account");
        let request = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
        };
        match self.api.register(&request).await {
            Ok(TokenResponse {
                access_token: Some(token),
                ..
            }) if !token.is_empty() => {
                self.complete_sign_in(AccessToken::new(token), REGISTRATION_SUCCEEDED)
                    .await?;
                Ok(AuthOutcome::SignedIn)
            }
            Ok(_) => {
                info!(email, "auth: account created without a session");
                self.toast(ToastKind::Warning, REGISTRATION_PENDING).await;
                let view = {
                    let mut state = self.state.lock().await;
                    state.view = ViewState::Auth {
                        form: AuthForm::Login,
                    };
                    state.view
                };
                self.renderer.show_view(&view);
                Ok(AuthOutcome::PendingConfirmation)
            }
            Err(err) if err.is_transport() => {
                warn!(error = %err, "auth: registration request failed");
                self.toast(ToastKind::Error, CONNECTION_ERROR).await;
                Err(err)
            }
            Err(err) => {
                warn!(error = %err, "auth: registration rejected");
                let message = err
                    .server_detail()
                    .unwrap_or(REGISTRATION_REJECTED)
                    .to_string();
                self.toast(ToastKind::Error, message.clone()).await;
                Err(ClientError::Auth(message))
            }
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthOutcome, ClientError> {
        self.ensure_signed_out().await?;

        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(self.reject_input(LOGIN_FIELDS_REQUIRED).await);
        }

        info!(username, "auth: logging in");
        let form = LoginForm {
            username: username.to_string(),
            password: password.to_string(),
        };
        match self.api.login(&form).await {
            Ok(TokenResponse {
                access_token: Some(token),
                ..
            }) if !token.is_empty() => {
                self.complete_sign_in(AccessToken::new(token), LOGIN_SUCCEEDED)
                    .await?;
                Ok(AuthOutcome::SignedIn)
            }
            Ok(_) => {
                warn!("auth: login reply carried no access token");
                self.toast(ToastKind::Error, CONNECTION_ERROR).await;
                Err(ClientError::InvalidResponse(
                    "login reply carried no access token".into(),
                ))
            }
            Err(err) if err.is_transport() => {
                warn!(error = %err, "auth: login request failed");
                self.toast(ToastKind::Error, CONNECTION_ERROR).await;
                Err(err)
            }
            Err(err) => {
                // Login failures never surface the server detail.
                warn!(error = %err, "auth: login rejected");
                self.toast(ToastKind::Error, LOGIN_REJECTED).await;
                Err(ClientError::Auth(LOGIN_REJECTED.to_string()))
            }
        }
    }

    /// Clears the persisted token and resets every piece of in-memory state
    /// to what a fresh start without a session looks like.
    pub async fn logout(&self) -> Result<(), ClientError> {
        if let Err(err) = self.session.teardown().await {
            error!(error = %err, "auth: failed to clear persisted session");
            return Err(err);
        }
        info!("auth: logged out");

        self.toasts.dismiss().await;
        let (view, form) = {
            let mut state = self.state.lock().await;
            let epoch = state.epoch + 1;
            *state = ControllerState::fresh(epoch, false);
            (state.view, state.settings.clone())
        };
        self.renderer.chat_cleared();
        self.renderer.settings_changed(&form);
        self.renderer.show_view(&view);
        Ok(())
    }

    /// Sends one chat message. Returns the settled assistant message, or
    /// `None` when the input was blank.
    pub async fn send_chat(&self, text: &str) -> Result<Option<ChatMessage>, ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let token = self.session.require_token().await?;

        let placeholder = {
            let mut state = self.state.lock().await;
            let user_message = state.transcript.append(ChatRole::User, text);
            self.renderer.message_appended(&user_message);
            let placeholder = state.transcript.append(ChatRole::Ai, THINKING_PLACEHOLDER);
            self.renderer.message_appended(&placeholder);
            placeholder
        };

        let reply = match self.api.chat(&token, text).await {
            Ok(reply) => reply.response,
            Err(err) if err.is_transport() => {
                warn!(error = %err, "chat: assistant unreachable");
                ASSISTANT_UNREACHABLE.to_string()
            }
            Err(err) => {
                warn!(error = %err, "chat: assistant request rejected");
                match err.server_detail() {
                    Some(detail) => format!("Error: {detail}"),
                    None => format!("Error: {err}"),
                }
            }
        };

        let updated = {
            let mut state = self.state.lock().await;
            state.transcript.replace_text(placeholder.id, reply)
        };
        match &updated {
            Some(message) => self.renderer.message_updated(message),
            None => debug!("chat: reply arrived after transcript reset; dropped"),
        }
        Ok(updated)
    }

    pub async fn set_ai_mode(&self, mode: AiMode) {
        self.edit_settings(|form| form.set_ai_mode(mode)).await;
    }

    pub async fn set_api_key(&self, api_key: &str) {
        self.edit_settings(|form| form.set_api_key(api_key)).await;
    }

    pub async fn set_telegram_bot_token(&self, token: &str) {
        self.edit_settings(|form| form.set_telegram_bot_token(token))
            .await;
    }

    async fn edit_settings(&self, edit: impl FnOnce(&mut SettingsForm)) {
        let form = {
            let mut state = self.state.lock().await;
            edit(&mut state.settings);
            state.settings.clone()
        };
        self.renderer.settings_changed(&form);
    }

    /// Fetches settings into the form. Failures are logged and otherwise
    /// ignored so the main view stays usable.
    pub async fn load_settings(&self) -> Option<Settings> {
        let Some(token) = self.session.token().await else {
            debug!("settings: load skipped without a session");
            return None;
        };

        let epoch = self.state.lock().await.epoch;

        let settings = match self.api.fetch_settings(&token).await {
            Ok(settings) => settings,
            Err(err) => {
                error!(error = %err, "settings: failed to load settings");
                return None;
            }
        };

        let indicator = settings.bot_status.as_ref().map(BotIndicator::from);
        let form = {
            let mut state = self.state.lock().await;
            if state.epoch != epoch {
                debug!(epoch, "settings: reply arrived after session change; dropped");
                return None;
            }
            state.settings.apply(&settings);
            state.settings_synced = true;
            if indicator.is_some() {
                state.bot_status = indicator.clone();
            }
            state.settings.clone()
        };
        self.renderer.settings_changed(&form);
        if let Some(indicator) = &indicator {
            self.renderer.bot_status_changed(indicator);
        }
        info!(ai_mode = %settings.ai_mode, "settings: loaded");
        Some(settings)
    }

    /// Pushes the whole settings form; there is no partial update.
    pub async fn save_settings(&self) -> Result<Settings, ClientError> {
        let (epoch, update) = {
            let state = self.state.lock().await;
            (state.epoch, state.settings.to_update())
        };

        let result = match self.session.require_token().await {
            Ok(token) => self.api.save_settings(&token, &update).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(saved) => {
                if let Some(status) = &saved.settings.bot_status {
                    let indicator = BotIndicator::from(status);
                    let current = {
                        let mut state = self.state.lock().await;
                        let current = state.epoch == epoch;
                        if current {
                            state.bot_status = Some(indicator.clone());
                        }
                        current
                    };
                    if current {
                        self.renderer.bot_status_changed(&indicator);
                    }
                }
                info!(ai_mode = %update.ai_mode, "settings: saved");
                self.renderer.alert(SETTINGS_SAVED);
                Ok(saved.settings)
            }
            Err(err) => {
                error!(error = %err, "settings: failed to save settings");
                self.renderer.alert(SETTINGS_SAVE_FAILED);
                Err(err)
            }
        }
    }

    pub async fn whoami(&self) -> Result<UserProfile, ClientError> {
        let token = self.session.require_token().await?;
        self.api.me(&token).await
    }

    async fn ensure_signed_out(&self) -> Result<(), ClientError> {
        if self.session.is_authenticated().await {
            return Err(ClientError::AlreadyAuthenticated);
        }
        Ok(())
    }

    async fn reject_input(&self, message: &str) -> ClientError {
        debug!(message, "auth: request blocked by validation");
        self.toast(ToastKind::Warning, message).await;
        ClientError::Validation(message.to_string())
    }

    async fn complete_sign_in(
        &self,
        token: AccessToken,
        success_message: &str,
    ) -> Result<(), ClientError> {
        if let Err(err) = self.session.establish(token).await {
            error!(error = %err, "auth: failed to persist session");
            self.toast(ToastKind::Error, SESSION_NOT_SAVED).await;
            return Err(err);
        }
        let epoch = {
            let mut state = self.state.lock().await;
            state.epoch += 1;
            state.epoch
        };
        self.toast(ToastKind::Success, success_message).await;
        if !self.options.main_view_delay.is_zero() {
            tokio::time::sleep(self.options.main_view_delay).await;
        }
        self.enter_main_view(epoch).await;
        Ok(())
    }

    /// Switches to the main view unless the session that `epoch` belongs to
    /// has ended in the meantime.
    async fn enter_main_view(&self, epoch: u64) {
        let view = {
            let mut state = self.state.lock().await;
            if state.epoch != epoch || !self.session.is_authenticated().await {
                debug!(epoch, "view: main view skipped; session ended");
                return;
            }
            state.view = ViewState::Main { tab: Tab::Chat };
            state.view
        };
        self.renderer.show_view(&view);
        self.load_settings().await;
    }

    async fn toast(&self, kind: ToastKind, message: impl Into<String>) {
        self.toasts.show(Toast::new(kind, message)).await;
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
