// Notifications - User-facing status and error reports

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use super::channels::NotificationProducer;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// Which subsystem raised the notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    Playback,
    Sound,
    Storage,
    Generic,
}

/// Notification with timestamp
#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub category: NotificationCategory,
    pub message: String,
    pub timestamp: u64, // Unix time in milliseconds
}

impl Notification {
    pub fn new(level: NotificationLevel, category: NotificationCategory, message: String) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Self {
            level,
            category,
            message,
            timestamp,
        }
    }

    pub fn info(category: NotificationCategory, message: String) -> Self {
        Self::new(NotificationLevel::Info, category, message)
    }

    pub fn warning(category: NotificationCategory, message: String) -> Self {
        Self::new(NotificationLevel::Warning, category, message)
    }

    pub fn error(category: NotificationCategory, message: String) -> Self {
        Self::new(NotificationLevel::Error, category, message)
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}/{:?}] {}", self.level, self.category, self.message)
    }
}

/// Shared, optional notification sender
///
/// Never blocks: if the producer is busy or the channel is full the
/// notification is dropped.
#[derive(Clone, Default)]
pub struct Notifier {
    tx: Option<Arc<Mutex<NotificationProducer>>>,
}

impl Notifier {
    pub fn new(tx: Arc<Mutex<NotificationProducer>>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Notifier that discards everything
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    pub fn send(&self, notification: Notification) {
        if let Some(tx) = &self.tx
            && let Ok(mut tx) = tx.try_lock()
        {
            let _ = ringbuf::traits::Producer::try_push(&mut *tx, notification);
        }
    }
}
