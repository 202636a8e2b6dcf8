use crate::api_errors::ErrorKind;
use crate::errors::{AppError, AppResult};
use crate::models::{ApiEnvelope, ConfirmationPolicy};
use crate::notify::Notifier;
use crate::resources::ResourceKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::oneshot;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decision {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationRequest {
    pub id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    Failed(ErrorKind),
    Cancelled,
}

impl ActionOutcome {
    /// Whether the caller should refetch its list after this outcome.
    pub fn should_refresh(self) -> bool {
        matches!(self, Self::Completed | Self::Failed(ErrorKind::NotFound))
    }
}

#[derive(Debug)]
struct PendingPrompt {
    request: ConfirmationRequest,
    responder: oneshot::Sender<Decision>,
}

type PendingSlot = Mutex<Option<PendingPrompt>>;

/// Receiving end of one confirmation request. Consumed once.
///
/// Dropping the handle before a decision arrives dismisses its prompt, so an
/// abandoned request never blocks the next one.
#[derive(Debug)]
pub struct ConfirmationHandle {
    pub request: ConfirmationRequest,
    receiver: oneshot::Receiver<Decision>,
    slot: Weak<PendingSlot>,
}

impl ConfirmationHandle {
    pub fn id(&self) -> Uuid {
        self.request.id
    }

    /// Resolves to `Cancelled` when the prompt is dropped without an answer.
    pub async fn decision(mut self) -> Decision {
        (&mut self.receiver).await.unwrap_or(Decision::Cancelled)
    }
}

impl Drop for ConfirmationHandle {
    fn drop(&mut self) {
        let Some(slot) = self.slot.upgrade() else {
            return;
        };
        let Ok(mut pending) = slot.lock() else {
            return;
        };
        if pending
            .as_ref()
            .is_some_and(|prompt| prompt.request.id == self.request.id)
        {
            pending.take();
            tracing::debug!(request_id = %self.request.id, "abandoned confirmation dismissed");
        }
    }
}

/// Serializes destructive actions behind a single yes/no prompt per screen.
#[derive(Clone)]
pub struct ConfirmationWorkflow {
    pending: Arc<PendingSlot>,
    policy: ConfirmationPolicy,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for ConfirmationWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationWorkflow")
            .field("policy", &self.policy)
            .field("pending", &self.pending().ok().flatten().map(|request| request.id))
            .finish()
    }
}

impl ConfirmationWorkflow {
    pub fn new(policy: ConfirmationPolicy, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            pending: Arc::new(Mutex::new(None)),
            policy,
            notifier,
        }
    }

    pub fn policy(&self) -> ConfirmationPolicy {
        self.policy
    }

    /// The prompt currently shown, if any.
    pub fn pending(&self) -> AppResult<Option<ConfirmationRequest>> {
        let pending = self.lock()?;
        Ok(pending.as_ref().map(|prompt| prompt.request.clone()))
    }

    pub fn request(&self, message: &str) -> AppResult<ConfirmationHandle> {
        let request = ConfirmationRequest {
            id: Uuid::new_v4(),
            message: message.to_string(),
            created_at: Utc::now(),
        };
        let (responder, receiver) = oneshot::channel();
        let slot = Arc::downgrade(&self.pending);

        let displaced = {
            let mut pending = self.lock()?;
            match self.policy {
                ConfirmationPolicy::Ignore if pending.is_some() => {
                    tracing::debug!(request_id = %request.id, "confirmation ignored; another prompt is pending");
                    let _ = responder.send(Decision::Cancelled);
                    return Ok(ConfirmationHandle {
                        request,
                        receiver,
                        slot,
                    });
                }
                _ => pending.replace(PendingPrompt {
                    request: request.clone(),
                    responder,
                }),
            }
        };

        if let Some(previous) = displaced {
            tracing::debug!(
                request_id = %previous.request.id,
                replaced_by = %request.id,
                "pending confirmation replaced"
            );
            let _ = previous.responder.send(Decision::Cancelled);
        }

        Ok(ConfirmationHandle {
            request,
            receiver,
            slot,
        })
    }

    pub fn confirm(&self, id: Uuid) -> AppResult<bool> {
        self.resolve(id, Decision::Confirmed)
    }

    pub fn cancel(&self, id: Uuid) -> AppResult<bool> {
        self.resolve(id, Decision::Cancelled)
    }

    /// Dismisses the prompt, then delivers the decision. Returns false when
    /// `id` is not the pending prompt (already decided or replaced) or when
    /// nobody is waiting for the answer any more.
    pub fn resolve(&self, id: Uuid, decision: Decision) -> AppResult<bool> {
        let prompt = {
            let mut pending = self.lock()?;
            match pending.as_ref() {
                Some(prompt) if prompt.request.id == id => pending.take(),
                _ => None,
            }
        };
        let Some(prompt) = prompt else {
            return Ok(false);
        };
        if prompt.responder.send(decision).is_err() {
            tracing::debug!(request_id = %id, "confirmation decided after its waiter went away");
            return Ok(false);
        }
        Ok(true)
    }

    /// Full destructive flow: prompt, wait for the decision, run `action` on
    /// confirmation and report the result through the notifier. Refreshing
    /// the list is left to the caller.
    pub async fn run<T, F, Fut>(
        &self,
        resource: ResourceKind,
        message: &str,
        action: F,
    ) -> ActionOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<ApiEnvelope<T>>>,
    {
        let handle = match self.request(message) {
            Ok(handle) => handle,
            Err(error) => {
                tracing::warn!(error = %error, "confirmation request failed");
                self.notifier.error(&ErrorKind::Unknown.user_message(resource));
                return ActionOutcome::Failed(ErrorKind::Unknown);
            }
        };
        let request_id = handle.id();

        if handle.decision().await == Decision::Cancelled {
            tracing::debug!(request_id = %request_id, resource = resource.as_str(), "destructive action cancelled");
            return ActionOutcome::Cancelled;
        }

        match action().await {
            Ok(envelope) if envelope.success => {
                self.notifier.success(&resource.deleted_message());
                ActionOutcome::Completed
            }
            Ok(envelope) => {
                let kind = envelope.error_kind().unwrap_or(ErrorKind::Unknown);
                tracing::warn!(
                    request_id = %request_id,
                    resource = resource.as_str(),
                    kind = kind.as_code(),
                    error = envelope.error.as_deref().unwrap_or_default(),
                    "destructive action rejected"
                );
                self.notifier.error(&kind.user_message(resource));
                ActionOutcome::Failed(kind)
            }
            Err(error) => {
                let kind = classify_app_error(&error);
                tracing::warn!(
                    request_id = %request_id,
                    resource = resource.as_str(),
                    error = %error,
                    "destructive action failed"
                );
                self.notifier.error(&kind.user_message(resource));
                ActionOutcome::Failed(kind)
            }
        }
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Option<PendingPrompt>>> {
        self.pending
            .lock()
            .map_err(|_| AppError::Internal("confirmation mutex poisoned".to_string()))
    }
}

fn classify_app_error(error: &AppError) -> ErrorKind {
    match error {
        AppError::NotFound(_) => ErrorKind::NotFound,
        AppError::Io(_) => ErrorKind::Network,
        AppError::Api(message) => ErrorKind::classify(message),
        _ => ErrorKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::{ActionOutcome, ConfirmationRequest, ConfirmationWorkflow, Decision, PendingPrompt};
    use crate::api_errors::ErrorKind;
    use crate::errors::AppError;
    use crate::models::{ApiEnvelope, ConfirmationPolicy, NoticeLevel};
    use crate::notify::NoticeLog;
    use crate::resources::ResourceKind;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::oneshot;
    use uuid::Uuid;

    fn workflow(policy: ConfirmationPolicy) -> (ConfirmationWorkflow, NoticeLog) {
        let log = NoticeLog::new();
        (ConfirmationWorkflow::new(policy, Arc::new(log.clone())), log)
    }

    async fn wait_for_prompt(workflow: &ConfirmationWorkflow) -> Uuid {
        loop {
            if let Some(request) = workflow.pending().expect("pending") {
                return request.id;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn cancelled_request_never_confirms() {
        let (workflow, _) = workflow(ConfirmationPolicy::Replace);
        let handle = workflow.request("Delete?").expect("request");
        let id = handle.id();

        assert!(workflow.cancel(id).expect("cancel"));
        assert!(!workflow.confirm(id).expect("late confirm"));
        assert_eq!(handle.decision().await, Decision::Cancelled);
        assert!(workflow.pending().expect("pending").is_none());
    }

    #[tokio::test]
    async fn replace_policy_cancels_previous_prompt() {
        let (workflow, _) = workflow(ConfirmationPolicy::Replace);
        let first = workflow.request("first").expect("first");
        let second = workflow.request("second").expect("second");

        assert_eq!(first.decision().await, Decision::Cancelled);
        let pending = workflow.pending().expect("pending").expect("second prompt");
        assert_eq!(pending.message, "second");
        assert!(workflow.confirm(second.id()).expect("confirm"));
        assert_eq!(second.decision().await, Decision::Confirmed);
    }

    #[tokio::test]
    async fn ignore_policy_keeps_previous_prompt() {
        let (workflow, _) = workflow(ConfirmationPolicy::Ignore);
        let first = workflow.request("first").expect("first");
        let second = workflow.request("second").expect("second");

        assert_eq!(second.decision().await, Decision::Cancelled);
        let pending = workflow.pending().expect("pending").expect("first prompt");
        assert_eq!(pending.id, first.id());
    }

    #[tokio::test]
    async fn dropped_handle_releases_ignore_policy() {
        let (workflow, _) = workflow(ConfirmationPolicy::Ignore);
        let abandoned = workflow.request("first").expect("first");
        let abandoned_id = abandoned.id();
        drop(abandoned);

        assert!(workflow.pending().expect("pending").is_none());
        assert!(!workflow.confirm(abandoned_id).expect("stale confirm"));

        let next = workflow.request("second").expect("second");
        let pending = workflow.pending().expect("pending").expect("second prompt");
        assert_eq!(pending.id, next.id());
        assert!(workflow.confirm(next.id()).expect("confirm"));
        assert_eq!(next.decision().await, Decision::Confirmed);
    }

    #[tokio::test]
    async fn dropped_decision_future_releases_prompt() {
        let (workflow, _) = workflow(ConfirmationPolicy::Ignore);
        let handle = workflow.request("first").expect("first");
        let waiting = tokio::spawn(handle.decision());
        tokio::task::yield_now().await;
        waiting.abort();
        assert!(waiting.await.is_err());

        assert!(workflow.pending().expect("pending").is_none());
    }

    #[tokio::test]
    async fn resolve_reports_missing_waiter() {
        let (workflow, _) = workflow(ConfirmationPolicy::Replace);
        let (responder, receiver) = oneshot::channel();
        drop(receiver);
        let request = ConfirmationRequest {
            id: Uuid::new_v4(),
            message: "Delete?".to_string(),
            created_at: chrono::Utc::now(),
        };
        let id = request.id;
        *workflow.pending.lock().expect("lock") = Some(PendingPrompt { request, responder });

        assert!(!workflow.confirm(id).expect("confirm"));
        assert!(workflow.pending().expect("pending").is_none());
    }

    #[tokio::test]
    async fn prompt_is_dismissed_before_action_runs() {
        let (workflow, log) = workflow(ConfirmationPolicy::Replace);
        let runner = workflow.clone();
        let observed_dismissed = Arc::new(AtomicBool::new(false));
        let observed = observed_dismissed.clone();

        let observer = workflow.clone();
        let task = tokio::spawn(async move {
            runner
                .run(ResourceKind::Student, "Delete student?", move || async move {
                    let dismissed = observer.pending().expect("pending").is_none();
                    observed.store(dismissed, Ordering::SeqCst);
                    Ok(ApiEnvelope::ok(()))
                })
                .await
        });

        let id = wait_for_prompt(&workflow).await;
        assert!(workflow.confirm(id).expect("confirm"));
        let outcome = task.await.expect("join");

        assert_eq!(outcome, ActionOutcome::Completed);
        assert!(outcome.should_refresh());
        assert!(observed_dismissed.load(Ordering::SeqCst));
        assert_eq!(log.count(NoticeLevel::Success), 1);
        assert_eq!(log.count(NoticeLevel::Error), 0);
    }

    #[tokio::test]
    async fn cancelled_run_skips_action_and_notifications() {
        let (workflow, log) = workflow(ConfirmationPolicy::Replace);
        let runner = workflow.clone();
        let ran = Arc::new(AtomicBool::new(false));
        let ran_flag = ran.clone();

        let task = tokio::spawn(async move {
            runner
                .run(ResourceKind::Teacher, "Delete teacher?", || async move {
                    ran_flag.store(true, Ordering::SeqCst);
                    Ok(ApiEnvelope::ok(()))
                })
                .await
        });

        let id = wait_for_prompt(&workflow).await;
        workflow.cancel(id).expect("cancel");
        assert_eq!(task.await.expect("join"), ActionOutcome::Cancelled);
        assert!(!ran.load(Ordering::SeqCst));
        assert!(log.notices().is_empty());
    }

    #[tokio::test]
    async fn rejected_delete_maps_to_friendly_error() {
        let (workflow, log) = workflow(ConfirmationPolicy::Replace);
        let runner = workflow.clone();
        let task = tokio::spawn(async move {
            runner
                .run(ResourceKind::Subject, "Delete subject?", || async {
                    Ok(ApiEnvelope::<()>::failure("Cannot delete: related teachers exist"))
                })
                .await
        });

        let id = wait_for_prompt(&workflow).await;
        workflow.confirm(id).expect("confirm");
        let outcome = task.await.expect("join");

        assert_eq!(outcome, ActionOutcome::Failed(ErrorKind::HasDependents));
        assert!(!outcome.should_refresh());
        let notices = log.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert!(notices[0].message.contains("related records exist"));
        assert!(workflow.pending().expect("pending").is_none());
    }

    #[tokio::test]
    async fn failed_action_is_reported_not_swallowed() {
        let (workflow, log) = workflow(ConfirmationPolicy::Replace);
        let runner = workflow.clone();
        let task = tokio::spawn(async move {
            runner
                .run(ResourceKind::Guardian, "Delete guardian?", || async {
                    Err::<ApiEnvelope<()>, _>(AppError::Io("connection reset".to_string()))
                })
                .await
        });

        let id = wait_for_prompt(&workflow).await;
        workflow.confirm(id).expect("confirm");

        assert_eq!(task.await.expect("join"), ActionOutcome::Failed(ErrorKind::Network));
        assert_eq!(log.count(NoticeLevel::Error), 1);
    }
}
