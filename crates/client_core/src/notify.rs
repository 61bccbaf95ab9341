use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, PoisonError,
};

use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationHandle(pub u64);

/// Transient status notifications ("toasts") shown while an operation runs.
pub trait NotificationSink: Send + Sync {
    fn show(&self, text: &str) -> NotificationHandle;
    fn dismiss(&self, handle: NotificationHandle);
}

impl<T> NotificationSink for Arc<T>
where
    T: NotificationSink + ?Sized,
{
    fn show(&self, text: &str) -> NotificationHandle {
        (**self).show(text)
    }

    fn dismiss(&self, handle: NotificationHandle) {
        (**self).dismiss(handle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    pub handle: NotificationHandle,
    pub text: String,
}

/// In-memory registry of active indicators, oldest first.
#[derive(Debug, Default)]
pub struct IndicatorRegistry {
    next_id: AtomicU64,
    active: Mutex<Vec<Indicator>>,
}

impl IndicatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Vec<Indicator> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Number of indicators ever shown.
    pub fn shown_count(&self) -> u64 {
        self.next_id.load(Ordering::SeqCst)
    }
}

impl NotificationSink for IndicatorRegistry {
    fn show(&self, text: &str) -> NotificationHandle {
        let handle = NotificationHandle(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Indicator {
                handle,
                text: text.to_string(),
            });
        handle
    }

    fn dismiss(&self, handle: NotificationHandle) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|indicator| indicator.handle != handle);
    }
}

/// Routes notifications to the log.
#[derive(Debug, Default)]
pub struct LogNotifications {
    next_id: AtomicU64,
}

impl NotificationSink for LogNotifications {
    fn show(&self, text: &str) -> NotificationHandle {
        let handle = NotificationHandle(self.next_id.fetch_add(1, Ordering::SeqCst));
        info!(notification = handle.0, "{text}");
        handle
    }

    fn dismiss(&self, handle: NotificationHandle) {
        debug!(notification = handle.0, "notification dismissed");
    }
}
