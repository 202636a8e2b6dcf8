pub mod api_errors;
pub mod confirm;
pub mod errors;
pub mod expansion;
pub mod loader;
pub mod models;
pub mod notify;
pub mod pagination;
pub mod reindex;
pub mod resources;
pub mod screen;
pub mod settings;

pub use crate::api_errors::ErrorKind;
pub use crate::confirm::{ActionOutcome, ConfirmationHandle, ConfirmationRequest, ConfirmationWorkflow, Decision};
pub use crate::errors::{AppError, AppResult};
pub use crate::expansion::ExpansionState;
pub use crate::loader::{ListLoader, LoadOutcome, RequestToken};
pub use crate::models::{
    ApiEnvelope, AttachedFile, Chapter, ClassGroup, ConfirmationPolicy, ConsoleSettings, DerivedPage,
    FilterSet, FilterValue, Guardian, Lesson, LessonContent, LessonKind, NoticeLevel, PageState,
    RecordStatus, Student, Subject, Teacher,
};
pub use crate::notify::{Notice, NoticeLog, Notifier, TracingNotifier};
pub use crate::pagination::{derive_page, ListQuery, Navigation};
pub use crate::reindex::{AuxMap, CourseDraft, Ordered, ValidationIssue};
pub use crate::resources::{ListRow, ResourceKind};
pub use crate::screen::ListScreen;

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

/// Installs the JSON file subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_tracing(log_dir: &Path) -> AppResult<()> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "console.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| AppError::Internal(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::init_tracing;

    #[test]
    fn tracing_writes_into_log_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log_dir = dir.path().join("logs");
        init_tracing(&log_dir).expect("init tracing");
        tracing::info!(component = "test", "tracing initialised");
        assert!(log_dir.is_dir());
    }
}
