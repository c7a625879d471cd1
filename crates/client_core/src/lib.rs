use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, Weak,
    },
    time::Duration,
};

use shared::{
    domain::{ContactFields, FormField},
    protocol::{FieldErrors, ValidationResult, DELIVERY_FAILED_MESSAGE},
};
use tokio::{
    sync::watch,
    task::{JoinError, JoinHandle},
    time::{sleep_until, timeout, Instant},
};
use tracing::{debug, info, warn};

pub mod backend;

pub use backend::{ContactBackend, HttpContactBackend};

/// How long the success banner stays up before the form returns to idle.
pub const AUTO_RESET_AFTER: Duration = Duration::from_secs(5);
/// Bound on a single backend call; exceeding it shows the generic form error.
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(10);
pub const SUCCESS_MESSAGE: &str = "Message sent successfully! I'll get back to you soon.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionUiState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed(FieldErrors),
}

impl SubmissionUiState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmissionUiState::Submitting)
    }

    pub fn errors(&self) -> Option<&FieldErrors> {
        match self {
            SubmissionUiState::Failed(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Everything the presentation layer needs to draw the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormView {
    pub name_error: Option<String>,
    pub email_error: Option<String>,
    pub message_error: Option<String>,
    pub form_error: Option<String>,
    pub success_banner: bool,
    pub submit_disabled: bool,
}

impl FormView {
    pub fn field_error(&self, field: FormField) -> Option<&str> {
        match field {
            FormField::Name => self.name_error.as_deref(),
            FormField::Email => self.email_error.as_deref(),
            FormField::Message => self.message_error.as_deref(),
            FormField::Form => self.form_error.as_deref(),
        }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.submit_disabled {
            "Sending..."
        } else {
            "Send Message"
        }
    }
}

impl From<&SubmissionUiState> for FormView {
    fn from(state: &SubmissionUiState) -> Self {
        let first = |field| {
            state
                .errors()
                .and_then(|errors| errors.first(field))
                .map(str::to_string)
        };
        Self {
            name_error: first(FormField::Name),
            email_error: first(FormField::Email),
            message_error: first(FormField::Message),
            form_error: first(FormField::Form),
            success_banner: matches!(state, SubmissionUiState::Succeeded),
            submit_disabled: state.is_submitting(),
        }
    }
}

/// An in-flight submission. Dropping it does not cancel the call.
pub struct PendingSubmission {
    task: JoinHandle<SubmissionUiState>,
}

impl PendingSubmission {
    /// Waits for the backend and returns the state the form settled in.
    pub async fn finished(self) -> Result<SubmissionUiState, JoinError> {
        self.task.await
    }
}

struct Inner {
    backend: Arc<dyn ContactBackend>,
    state: watch::Sender<SubmissionUiState>,
    draft: Mutex<ContactFields>,
    reset_timer: Mutex<Option<JoinHandle<()>>>,
    torn_down: AtomicBool,
    submit_timeout: Duration,
    auto_reset_after: Duration,
}

impl Inner {
    async fn run_submission(self: Arc<Self>, fields: ContactFields) -> SubmissionUiState {
        let result = match timeout(self.submit_timeout, self.backend.validate_and_deliver(fields))
            .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                warn!(error = %err, "contact backend call failed");
                ValidationResult::Invalid(FieldErrors::form(DELIVERY_FAILED_MESSAGE))
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.submit_timeout.as_millis() as u64,
                    "contact backend call timed out"
                );
                ValidationResult::Invalid(FieldErrors::form(DELIVERY_FAILED_MESSAGE))
            }
        };
        self.finish(result)
    }

    fn finish(self: &Arc<Self>, result: ValidationResult) -> SubmissionUiState {
        let next = match result {
            ValidationResult::Valid(_) => {
                lock(&self.draft).clear();
                SubmissionUiState::Succeeded
            }
            ValidationResult::Invalid(errors) => SubmissionUiState::Failed(errors),
        };
        let succeeded = matches!(next, SubmissionUiState::Succeeded);
        info!(succeeded, "contact submission settled");
        self.state.send_replace(next.clone());
        if succeeded {
            self.arm_reset_timer();
        }
        next
    }

    fn arm_reset_timer(self: &Arc<Self>) {
        if self.torn_down.load(Ordering::SeqCst) {
            return;
        }
        let deadline = Instant::now() + self.auto_reset_after;
        let weak: Weak<Inner> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            sleep_until(deadline).await;
            if let Some(inner) = weak.upgrade() {
                inner.reset_after_success();
            }
        });
        if let Some(previous) = lock(&self.reset_timer).replace(handle) {
            previous.abort();
        }
    }

    fn reset_after_success(&self) {
        let reset = self.state.send_if_modified(|state| {
            if matches!(state, SubmissionUiState::Succeeded) {
                *state = SubmissionUiState::Idle;
                true
            } else {
                false
            }
        });
        if reset {
            debug!("success banner expired");
        }
    }

    fn cancel_reset_timer(&self) {
        if let Some(handle) = lock(&self.reset_timer).take() {
            handle.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.cancel_reset_timer();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives one contact form: `Idle -> Submitting -> Succeeded | Failed`.
///
/// Must be used from inside a tokio runtime; submissions and the auto-reset
/// timer run as spawned tasks. Dropping the controller cancels the timer.
pub struct FormStateController {
    inner: Arc<Inner>,
}

impl FormStateController {
    pub fn new(backend: Arc<dyn ContactBackend>) -> Self {
        Self::with_timings(backend, SUBMIT_TIMEOUT, AUTO_RESET_AFTER)
    }

    pub fn with_timings(
        backend: Arc<dyn ContactBackend>,
        submit_timeout: Duration,
        auto_reset_after: Duration,
    ) -> Self {
        let (state, _) = watch::channel(SubmissionUiState::Idle);
        Self {
            inner: Arc::new(Inner {
                backend,
                state,
                draft: Mutex::new(ContactFields::default()),
                reset_timer: Mutex::new(None),
                torn_down: AtomicBool::new(false),
                submit_timeout,
                auto_reset_after,
            }),
        }
    }

    pub fn state(&self) -> SubmissionUiState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionUiState> {
        self.inner.state.subscribe()
    }

    pub fn view(&self) -> FormView {
        FormView::from(&*self.inner.state.borrow())
    }

    pub fn draft(&self) -> ContactFields {
        lock(&self.inner.draft).clone()
    }

    pub fn set_field(&self, field: FormField, value: impl Into<String>) -> bool {
        lock(&self.inner.draft).set(field, value)
    }

    pub fn auto_reset_pending(&self) -> bool {
        lock(&self.inner.reset_timer)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Starts a submission unless one is already in flight, in which case
    /// nothing changes and `None` is returned. The state is `Submitting` by
    /// the time this returns.
    pub fn submit(&self, fields: ContactFields) -> Option<PendingSubmission> {
        let started = self.inner.state.send_if_modified(|state| {
            if state.is_submitting() {
                return false;
            }
            *state = SubmissionUiState::Submitting;
            true
        });
        if !started {
            debug!("submit ignored while a submission is in flight");
            return None;
        }
        self.inner.cancel_reset_timer();

        let inner = Arc::clone(&self.inner);
        Some(PendingSubmission {
            task: tokio::spawn(inner.run_submission(fields)),
        })
    }

    pub fn submit_draft(&self) -> Option<PendingSubmission> {
        self.submit(self.draft())
    }
}

impl Drop for FormStateController {
    fn drop(&mut self) {
        self.inner.torn_down.store(true, Ordering::SeqCst);
        self.inner.cancel_reset_timer();
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
