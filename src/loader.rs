use crate::api_errors::ErrorKind;
use crate::errors::{AppError, AppResult};
use crate::models::{ApiEnvelope, DEFAULT_LOADING_FLOOR_MS};
use crate::notify::Notifier;
use crate::resources::ResourceKind;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::time::{Duration, Instant};

/// Monotonic id of one list fetch. Only the latest issued token may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome<T> {
    Loaded(Vec<T>),
    /// The fetch failed; the screen shows its empty state.
    Failed(ErrorKind),
    /// A newer fetch was issued while this one was in flight.
    Stale,
}

#[derive(Clone)]
pub struct ListLoader {
    latest: Arc<AtomicU64>,
    floor: Duration,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for ListLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListLoader")
            .field("latest", &self.latest.load(Ordering::SeqCst))
            .field("floor", &self.floor)
            .finish()
    }
}

impl ListLoader {
    pub fn new(floor: Duration, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            latest: Arc::new(AtomicU64::new(0)),
            floor,
            notifier,
        }
    }

    pub fn with_default_floor(notifier: Arc<dyn Notifier>) -> Self {
        Self::new(Duration::from_millis(DEFAULT_LOADING_FLOOR_MS), notifier)
    }

    pub fn floor(&self) -> Duration {
        self.floor
    }

    pub fn begin(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }

    /// Runs `fetch`, keeps the loading state up for at least the floor
    /// duration, then converts the envelope into records or an error notice.
    pub async fn load<T, F, Fut>(&self, resource: ResourceKind, fetch: F) -> LoadOutcome<T>
    where
        F: FnOnce(RequestToken) -> Fut,
        Fut: Future<Output = AppResult<ApiEnvelope<Vec<T>>>>,
    {
        let token = self.begin();
        let started = Instant::now();
        let result = fetch(token).await;

        if let Some(remaining) = self.floor.checked_sub(started.elapsed()) {
            tokio::time::sleep(remaining).await;
        }

        if !self.is_current(token) {
            tracing::debug!(
                token = token.value(),
                resource = resource.as_str(),
                "discarding stale list response"
            );
            return LoadOutcome::Stale;
        }

        match result {
            Ok(envelope) if envelope.success => {
                LoadOutcome::Loaded(envelope.data.unwrap_or_default())
            }
            Ok(envelope) => {
                let kind = envelope.error_kind().unwrap_or(ErrorKind::Unknown);
                tracing::warn!(
                    resource = resource.as_str(),
                    kind = kind.as_code(),
                    error = envelope.error.as_deref().unwrap_or_default(),
                    "list fetch rejected"
                );
                self.notifier.error(&kind.user_message(resource));
                LoadOutcome::Failed(kind)
            }
            Err(error) => {
                let kind = match &error {
                    AppError::Io(_) => ErrorKind::Network,
                    AppError::NotFound(_) => ErrorKind::NotFound,
                    other => ErrorKind::classify(&other.to_string()),
                };
                tracing::warn!(resource = resource.as_str(), error = %error, "list fetch failed");
                self.notifier.error(&kind.user_message(resource));
                LoadOutcome::Failed(kind)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ListLoader, LoadOutcome};
    use crate::api_errors::ErrorKind;
    use crate::errors::AppError;
    use crate::models::{ApiEnvelope, NoticeLevel};
    use crate::notify::NoticeLog;
    use crate::resources::ResourceKind;
    use std::sync::Arc;
    use tokio::time::{Duration, Instant};

    fn loader() -> (ListLoader, NoticeLog) {
        let log = NoticeLog::new();
        (ListLoader::with_default_floor(Arc::new(log.clone())), log)
    }

    #[tokio::test(start_paused = true)]
    async fn fast_fetch_waits_for_floor() {
        let (loader, _) = loader();
        let started = Instant::now();
        let outcome = loader
            .load(ResourceKind::Student, |_| async { Ok(ApiEnvelope::ok(vec![1, 2, 3])) })
            .await;
        assert_eq!(outcome, LoadOutcome::Loaded(vec![1, 2, 3]));
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_adds_no_extra_delay() {
        let (loader, _) = loader();
        let started = Instant::now();
        let _ = loader
            .load(ResourceKind::Student, |_| async {
                tokio::time::sleep(Duration::from_millis(2000)).await;
                Ok(ApiEnvelope::ok(Vec::<u8>::new()))
            })
            .await;
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(2000));
        assert!(elapsed < Duration::from_millis(2100));
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_response_is_discarded() {
        let (loader, _) = loader();
        let slow = loader.load(ResourceKind::Teacher, |_| async {
            tokio::time::sleep(Duration::from_millis(3000)).await;
            Ok(ApiEnvelope::ok(vec!["old"]))
        });
        let fast = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            loader
                .load(ResourceKind::Teacher, |_| async { Ok(ApiEnvelope::ok(vec!["new"])) })
                .await
        };
        let (slow, fast) = tokio::join!(slow, fast);
        assert_eq!(slow, LoadOutcome::Stale);
        assert_eq!(fast, LoadOutcome::Loaded(vec!["new"]));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_notifies_and_yields_empty_state() {
        let (loader, log) = loader();
        let started = Instant::now();
        let outcome = loader
            .load(ResourceKind::Guardian, |_| async {
                Ok(ApiEnvelope::<Vec<u8>>::failure("401 Unauthorized"))
            })
            .await;
        assert_eq!(outcome, LoadOutcome::Failed(ErrorKind::Unauthorized));
        assert!(started.elapsed() >= Duration::from_millis(1500));

        let started = Instant::now();
        let outcome = loader
            .load(ResourceKind::Guardian, |_| async {
                Err::<ApiEnvelope<Vec<u8>>, _>(AppError::Io("connection refused".to_string()))
            })
            .await;
        assert_eq!(outcome, LoadOutcome::Failed(ErrorKind::Network));
        assert!(started.elapsed() >= Duration::from_millis(1500));
        assert_eq!(log.count(NoticeLevel::Error), 2);
    }

    #[test]
    fn tokens_increase_monotonically() {
        let (loader, _) = loader();
        let first = loader.begin();
        let second = loader.begin();
        assert!(second > first);
        assert!(!loader.is_current(first));
        assert!(loader.is_current(second));
    }
}
