use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{sync::Mutex, task::JoinHandle};
use tracing::debug;

use crate::view::{Toast, ViewRenderer};

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(3);

/// Shows toasts and auto-dismisses them. Showing a toast cancels the
/// pending dismissal of the previous one, so the last toast wins.
pub struct ToastScheduler {
    renderer: Arc<dyn ViewRenderer>,
    duration: Duration,
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl ToastScheduler {
    pub fn new(renderer: Arc<dyn ViewRenderer>, duration: Duration) -> Self {
        Self {
            renderer,
            duration,
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    pub async fn show(&self, toast: Toast) {
        let mut pending = self.pending.lock().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        self.renderer.show_toast(&toast);

        let renderer = Arc::clone(&self.renderer);
        let current = Arc::clone(&self.generation);
        let duration = self.duration;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            // A newer toast may have been shown while this task was waking up.
            if current.load(Ordering::SeqCst) == generation {
                debug!(generation, "toast: auto-dismissed");
                renderer.dismiss_toast();
            }
        }));
    }

    pub async fn dismiss(&self) {
        let mut pending = self.pending.lock().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        self.renderer.dismiss_toast();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use crate::{
        chat::ChatMessage,
        settings_form::{BotIndicator, SettingsForm},
        view::{ToastKind, ViewState},
    };

    use super::*;

    #[derive(Default)]
    struct CountingRenderer {
        shown: StdMutex<Vec<String>>,
        dismissed: AtomicU64,
    }

    impl ViewRenderer for CountingRenderer {
        fn show_view(&self, _view: &ViewState) {}
        fn show_toast(&self, toast: &Toast) {
            self.shown.lock().expect("shown").push(toast.message.clone());
        }
        fn dismiss_toast(&self) {
            self.dismissed.fetch_add(1, Ordering::SeqCst);
        }
        fn message_appended(&self, _message: &ChatMessage) {}
        fn message_updated(&self, _message: &ChatMessage) {}
        fn chat_cleared(&self) {}
        fn settings_changed(&self, _form: &SettingsForm) {}
        fn bot_status_changed(&self, _indicator: &BotIndicator) {}
        fn alert(&self, _message: &str) {}
    }

    #[tokio::test(start_paused = true)]
    async fn toast_dismisses_after_duration() {
        let renderer = Arc::new(CountingRenderer::default());
        let toasts = ToastScheduler::new(renderer.clone(), DEFAULT_TOAST_DURATION);

        toasts.show(Toast::new(ToastKind::Success, "saved")).await;
        tokio::time::sleep(Duration::from_millis(2_900)).await;
        assert_eq!(renderer.dismissed.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(renderer.dismissed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_toast_reschedules_dismissal() {
        let renderer = Arc::new(CountingRenderer::default());
        let toasts = ToastScheduler::new(renderer.clone(), DEFAULT_TOAST_DURATION);

        toasts.show(Toast::new(ToastKind::Warning, "first")).await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        toasts.show(Toast::new(ToastKind::Error, "second")).await;

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(renderer.dismissed.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        assert_eq!(renderer.dismissed.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(renderer.dismissed.load(Ordering::SeqCst), 1);
        assert_eq!(
            *renderer.shown.lock().expect("shown"),
            vec!["first".to_string(), "second".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_dismiss_cancels_pending_timer() {
        let renderer = Arc::new(CountingRenderer::default());
        let toasts = ToastScheduler::new(renderer.clone(), DEFAULT_TOAST_DURATION);

        toasts.show(Toast::new(ToastKind::Error, "oops")).await;
        toasts.dismiss().await;
        assert_eq!(renderer.dismissed.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(renderer.dismissed.load(Ordering::SeqCst), 1);
    }
}
