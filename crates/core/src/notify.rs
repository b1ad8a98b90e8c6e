//! Single-slot transient feedback.
//!
//! At most one message is visible. `show` replaces whatever is there and
//! restarts its countdown; there is no queue. Expiry is evaluated lazily on
//! read, and a timer holding the id of an older message cannot clear a newer
//! one (see [`NotificationChannel::expire`]).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_DISPLAY_DURATION: Duration = Duration::from_millis(5000);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotifyOptions {
    pub severity: Severity,
    /// Falls back to the channel default when `None`.
    pub display_for: Option<Duration>,
}

impl Default for NotifyOptions {
    fn default() -> Self {
        Self { severity: Severity::Error, display_for: None }
    }
}

impl NotifyOptions {
    pub fn severity(severity: Severity) -> Self {
        Self { severity, display_for: None }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub severity: Severity,
    pub shown_at: Instant,
    pub display_for: Duration,
}

impl Notification {
    pub fn expires_at(&self) -> Instant {
        self.shown_at + self.display_for
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at()
    }
}

#[derive(Clone, Debug)]
pub struct NotificationChannel {
    slot: Arc<Mutex<Option<Notification>>>,
    default_display: Duration,
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY_DURATION)
    }
}

impl NotificationChannel {
    pub fn new(default_display: Duration) -> Self {
        Self { slot: Arc::new(Mutex::new(None)), default_display }
    }

    pub fn default_display(&self) -> Duration {
        self.default_display
    }

    pub fn show(&self, message: impl Into<String>, options: NotifyOptions) -> Notification {
        self.show_at(message, options, Instant::now())
    }

    pub fn show_at(
        &self,
        message: impl Into<String>,
        options: NotifyOptions,
        now: Instant,
    ) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            message: message.into(),
            severity: options.severity,
            shown_at: now,
            display_for: options.display_for.unwrap_or(self.default_display),
        };
        *self.lock() = Some(notification.clone());
        notification
    }

    pub fn success(&self, message: impl Into<String>) -> Notification {
        self.show(message, NotifyOptions::severity(Severity::Success))
    }

    pub fn error(&self, message: impl Into<String>) -> Notification {
        self.show(message, NotifyOptions::severity(Severity::Error))
    }

    pub fn current(&self) -> Option<Notification> {
        self.current_at(Instant::now())
    }

    pub fn current_at(&self, now: Instant) -> Option<Notification> {
        let mut slot = self.lock();
        if slot.as_ref().is_some_and(|notification| notification.is_expired_at(now)) {
            *slot = None;
        }
        slot.clone()
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    /// Clears the slot only if it still holds `id`. Returns whether it did.
    pub fn expire(&self, id: Uuid) -> bool {
        let mut slot = self.lock();
        if slot.as_ref().is_some_and(|notification| notification.id == id) {
            *slot = None;
            return true;
        }
        false
    }

    fn lock(&self) -> MutexGuard<'_, Option<Notification>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
