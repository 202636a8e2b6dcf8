use crate::models::NoticeLevel;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Toast sink with the three notice variants a screen can raise.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warning(&self, message: &str);

    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Success => self.success(message),
            NoticeLevel::Error => self.error(message),
            NoticeLevel::Warning => self.warning(message),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        tracing::info!(kind = NoticeLevel::Success.as_str(), notice = message, "notification raised");
    }

    fn error(&self, message: &str) {
        tracing::error!(kind = NoticeLevel::Error.as_str(), notice = message, "notification raised");
    }

    fn warning(&self, message: &str) {
        tracing::warn!(kind = NoticeLevel::Warning.as_str(), notice = message, "notification raised");
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Keeps every notice in memory, in the order raised.
#[derive(Debug, Clone, Default)]
pub struct NoticeLog {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|notices| notices.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices()
            .iter()
            .filter(|notice| notice.level == level)
            .count()
    }

    fn push(&self, level: NoticeLevel, message: &str) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(Notice {
                level,
                message: message.to_string(),
            });
        }
    }
}

impl Notifier for NoticeLog {
    fn success(&self, message: &str) {
        self.push(NoticeLevel::Success, message);
    }

    fn error(&self, message: &str) {
        self.push(NoticeLevel::Error, message);
    }

    fn warning(&self, message: &str) {
        self.push(NoticeLevel::Warning, message);
    }
}

#[cfg(test)]
mod tests {
    use super::{NoticeLog, Notifier, TracingNotifier};
    use crate::models::NoticeLevel;

    #[test]
    fn dispatches_by_level() {
        let log = NoticeLog::new();
        log.notify(NoticeLevel::Warning, "check the form");
        log.notify(NoticeLevel::Success, "saved");
        let notices = log.notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        assert_eq!(notices[1].message, "saved");
        assert_eq!(log.count(NoticeLevel::Error), 0);
    }

    #[test]
    fn tracing_sink_accepts_every_level() {
        let sink = TracingNotifier;
        sink.notify(NoticeLevel::Success, "saved");
        sink.notify(NoticeLevel::Error, "failed");
        sink.notify(NoticeLevel::Warning, "check");
    }
}
