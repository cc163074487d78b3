use std::sync::Mutex;

/// ユーザー向けの通知（トースト）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
}

/// 通知の表示先
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// 通知をログに流す実装
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::Success(message) => tracing::info!(%message, "通知"),
            Notification::Error(message) => tracing::error!(%message, "エラー通知"),
        }
    }
}

/// 通知を記録するテスト用の実装
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push(notification);
        }
    }
}
