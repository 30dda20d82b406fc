use crate::api::{ApiError, CreateResponse, MemoryApi};
use crate::messages;
use crate::model::{AppEvent, MemoryInput, Notice};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, warn};

/// What happened to a submit or retry request.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Another submission was in flight; nothing was sent.
    Dropped,
    /// Validation failed; the user was warned and nothing was sent.
    Invalid,
    /// Retry was requested but the last request did not succeed.
    NothingToRetry,
    Completed(Result<CreateResponse, ApiError>),
}

/// Owns the input form's request cycle: one create request at a time, a busy indicator for
/// its duration and replay of the last input.
///
/// Cheap to clone; clones share the in-flight flag and the last input, so a clone can be
/// moved onto a task while the session keeps rejecting overlapping submissions.
pub struct SubmissionController<A> {
    api: Arc<A>,
    event_tx: UnboundedSender<AppEvent>,
    require_date: bool,
    in_flight: Arc<AtomicBool>,
    retry_available: Arc<AtomicBool>,
    last_input: Arc<Mutex<Option<MemoryInput>>>,
}

impl<A> Clone for SubmissionController<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            event_tx: self.event_tx.clone(),
            require_date: self.require_date,
            in_flight: self.in_flight.clone(),
            retry_available: self.retry_available.clone(),
            last_input: self.last_input.clone(),
        }
    }
}

/// Holds the in-flight flag for one submission and releases it on every exit path.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
    event_tx: &'a UnboundedSender<AppEvent>,
    busy: bool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool, event_tx: &'a UnboundedSender<AppEvent>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag,
                event_tx,
                busy: false,
            })
    }

    fn show_busy(&mut self) {
        self.busy = true;
        let _ = self.event_tx.send(AppEvent::Busy(true));
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.busy {
            let _ = self.event_tx.send(AppEvent::Busy(false));
        }
        self.flag.store(false, Ordering::Release);
    }
}

impl<A: MemoryApi> SubmissionController<A> {
    pub fn new(api: Arc<A>, event_tx: UnboundedSender<AppEvent>, require_date: bool) -> Self {
        Self {
            api,
            event_tx,
            require_date,
            in_flight: Arc::new(AtomicBool::new(false)),
            retry_available: Arc::new(AtomicBool::new(false)),
            last_input: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn last_input(&self) -> Option<MemoryInput> {
        self.lock_last_input().clone()
    }

    fn lock_last_input(&self) -> MutexGuard<'_, Option<MemoryInput>> {
        self.last_input.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn warn_user(&self, message: &str) {
        let _ = self.event_tx.send(AppEvent::Notice(Notice::warning(message)));
    }

    /// Validate the form input and send it.
    pub async fn submit(&self, text: &str, date: &str) -> SubmitOutcome {
        let Some(guard) = InFlightGuard::acquire(&self.in_flight, &self.event_tx) else {
            debug!("submission already in flight, dropping");
            return SubmitOutcome::Dropped;
        };

        let text = text.trim();
        let date = date.trim();
        if text.is_empty() {
            self.warn_user(messages::TEXT_REQUIRED);
            return SubmitOutcome::Invalid;
        }
        if self.require_date && date.is_empty() {
            self.warn_user(messages::DATE_REQUIRED);
            return SubmitOutcome::Invalid;
        }

        let input = MemoryInput {
            text: text.to_string(),
            date: date.to_string(),
        };
        *self.lock_last_input() = Some(input.clone());
        self.dispatch(guard, input).await
    }

    /// Replay the last input verbatim. Only available after a successful request.
    pub async fn retry(&self) -> SubmitOutcome {
        let Some(guard) = InFlightGuard::acquire(&self.in_flight, &self.event_tx) else {
            debug!("submission already in flight, dropping retry");
            return SubmitOutcome::Dropped;
        };
        if !self.retry_available.load(Ordering::Acquire) {
            return SubmitOutcome::NothingToRetry;
        }
        let last = self.last_input();
        match last {
            Some(input) => self.dispatch(guard, input).await,
            None => SubmitOutcome::NothingToRetry,
        }
    }

    async fn dispatch(&self, mut guard: InFlightGuard<'_>, input: MemoryInput) -> SubmitOutcome {
        guard.show_busy();
        let _ = self.event_tx.send(AppEvent::SubmissionStarted);
        self.retry_available.store(false, Ordering::Release);
        let _ = self.event_tx.send(AppEvent::RetryAvailable(false));

        let result = self.api.create(&input).await;
        match &result {
            Ok(resp) => {
                let _ = self.event_tx.send(AppEvent::SubmissionSucceeded {
                    analysis: resp.analysis.clone(),
                    image_url: resp.image_url.clone(),
                });
                self.retry_available.store(true, Ordering::Release);
                let _ = self.event_tx.send(AppEvent::RetryAvailable(true));
            }
            Err(e) if e.is_transport() => {
                error!(error = %e, "create request failed");
                let _ = self.event_tx.send(AppEvent::SubmissionFailed {
                    message: messages::TRANSPORT_ERROR.to_string(),
                });
            }
            Err(e) => {
                warn!(error = %e, "create request rejected");
                let message = e.server_message().unwrap_or(messages::RESTORE_FAILED);
                let _ = self.event_tx.send(AppEvent::SubmissionFailed {
                    message: message.to_string(),
                });
            }
        }

        drop(guard);
        SubmitOutcome::Completed(result)
    }
}
