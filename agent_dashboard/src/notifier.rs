//! # Notifier
//!
//! Short-lived status toasts. Every `notify` call owns its toast: it spawns a
//! lifecycle task that fades the toast in, keeps it for the display duration,
//! fades it out and finally removes it. Calls are independent of each other, so
//! a burst of notifications cannot leave stale toasts behind.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Delay before a new toast becomes fully visible.
pub const FADE_IN_DELAY: Duration = Duration::from_millis(100);

/// Time from creation until the toast starts fading out.
pub const DISPLAY_DURATION: Duration = Duration::from_millis(3000);

/// Fade-out time before the toast is removed.
pub const FADE_OUT_DURATION: Duration = Duration::from_millis(300);

/// Visual kind of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Neutral information (auto-refresh toggles).
    Info,
    /// Agents became available.
    Success,
    /// A refresh cycle failed.
    Error,
}

/// Where a toast is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    /// Just created, fading in.
    Entering,
    /// Fully shown.
    Visible,
    /// Fading out, about to be removed.
    Leaving,
}

/// A single on-screen notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Unique, increasing id.
    pub id: u64,
    /// Text shown to the user.
    pub message: String,
    /// Colour/kind of the toast.
    pub kind: NotificationKind,
    /// Current lifecycle phase.
    pub phase: ToastPhase,
}

/// Cheap-to-clone handle to the shared toast list.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    toasts: Arc<Mutex<Vec<Toast>>>,
    next_id: Arc<AtomicU64>,
}

impl Notifier {
    /// Creates an empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows `message` as a transient toast and returns its id.
    ///
    /// Must be called from within a tokio runtime for the toast to be displayed;
    /// outside one the message is only logged.
    pub fn notify(&self, message: impl Into<String>, kind: NotificationKind) -> u64 {
        let message = message.into();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;

        match kind {
            NotificationKind::Error => log::warn!("notification: {}", message),
            NotificationKind::Info | NotificationKind::Success => {
                log::info!("notification: {}", message)
            }
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                log::debug!("no runtime, toast {} not displayed", id);
                return id;
            }
        };

        self.lock().push(Toast {
            id,
            message,
            kind,
            phase: ToastPhase::Entering,
        });

        let notifier = self.clone();
        let created = Instant::now();
        handle.spawn(async move {
            sleep_until(created + FADE_IN_DELAY).await;
            notifier.set_phase(id, ToastPhase::Visible);
            sleep_until(created + DISPLAY_DURATION).await;
            notifier.set_phase(id, ToastPhase::Leaving);
            sleep_until(created + DISPLAY_DURATION + FADE_OUT_DURATION).await;
            notifier.remove(id);
        });

        id
    }

    /// Snapshot of the toasts currently on screen, oldest first.
    pub fn active(&self) -> Vec<Toast> {
        self.lock().clone()
    }

    fn set_phase(&self, id: u64, phase: ToastPhase) {
        if let Some(toast) = self.lock().iter_mut().find(|t| t.id == id) {
            toast.phase = phase;
        }
    }

    fn remove(&self, id: u64) {
        self.lock().retain(|t| t.id != id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Toast>> {
        self.toasts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
