//! Debounced, per-field draft persistence.
//!
//! Each field path owns at most one pending timer. A new value for the same path cancels
//! the pending timer and starts a fresh one; once a timer fires, its save is sent and is
//! never cancelled. Save status is shared across fields and falls back to `Idle` a short
//! while after each `Saved`/`Error`.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use crate::{
    config::Config,
    errors::AppError,
    models::domain::{DraftField, DraftScope},
    repositories::DraftRepository,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AutosaveStatus {
    Idle,
    Saving,
    Saved,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AutosaveSnapshot {
    pub status: AutosaveStatus,
    pub last_saved_at: Option<DateTime<Utc>>,
}

pub type SaveCallback = Arc<dyn Fn(&str, &JsonValue) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(&AppError) + Send + Sync>;

#[derive(Clone)]
pub struct AutosaveOptions {
    pub scope: DraftScope,
    pub debounce: Duration,
    pub saved_reset: Duration,
    pub error_reset: Duration,
    pub on_save: Option<SaveCallback>,
    pub on_error: Option<ErrorCallback>,
}

impl AutosaveOptions {
    pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);
    pub const DEFAULT_SAVED_RESET: Duration = Duration::from_millis(2000);
    pub const DEFAULT_ERROR_RESET: Duration = Duration::from_millis(3000);

    pub fn new(scope: DraftScope) -> Self {
        Self {
            scope,
            debounce: Self::DEFAULT_DEBOUNCE,
            saved_reset: Self::DEFAULT_SAVED_RESET,
            error_reset: Self::DEFAULT_ERROR_RESET,
            on_save: None,
            on_error: None,
        }
    }

    pub fn from_config(scope: DraftScope, config: &Config) -> Self {
        Self {
            debounce: config.autosave_debounce(),
            saved_reset: config.autosave_saved_reset(),
            error_reset: config.autosave_error_reset(),
            ..Self::new(scope)
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_on_save(mut self, on_save: impl Fn(&str, &JsonValue) + Send + Sync + 'static) -> Self {
        self.on_save = Some(Arc::new(on_save));
        self
    }

    pub fn with_on_error(mut self, on_error: impl Fn(&AppError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(on_error));
        self
    }
}

impl fmt::Debug for AutosaveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutosaveOptions")
            .field("scope", &self.scope)
            .field("debounce", &self.debounce)
            .field("saved_reset", &self.saved_reset)
            .field("error_reset", &self.error_reset)
            .field("on_save", &self.on_save.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

struct PendingSave {
    id: u64,
    data: JsonValue,
    handle: JoinHandle<()>,
}

struct EngineInner {
    repository: Arc<dyn DraftRepository>,
    options: AutosaveOptions,
    active: AtomicBool,
    next_timer_id: AtomicU64,
    timers: Mutex<HashMap<String, PendingSave>>,
    in_flight: AtomicUsize,
    settled: Notify,
    idle_reset: Mutex<Option<JoinHandle<()>>>,
    state: watch::Sender<AutosaveSnapshot>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Held by a save from the moment it leaves the timer map until its upsert has settled.
struct InFlight(Arc<EngineInner>);

impl InFlight {
    fn begin(inner: &Arc<EngineInner>) -> Self {
        inner.in_flight.fetch_add(1, Ordering::AcqRel);
        Self(Arc::clone(inner))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.settled.notify_waiters();
        }
    }
}

impl EngineInner {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Removes the timer entry only if it still belongs to timer `id`. The save counts as in
    /// flight before the lock is released, so `flush` cannot miss it.
    fn take_fired(self: &Arc<Self>, field_path: &str, id: u64) -> Option<(JsonValue, InFlight)> {
        let mut timers = lock(&self.timers);
        if timers.get(field_path).is_some_and(|pending| pending.id == id) {
            timers
                .remove(field_path)
                .map(|pending| (pending.data, InFlight::begin(self)))
        } else {
            None
        }
    }

    /// Resolves once no save is between its timer and the end of its upsert.
    async fn settle(&self) {
        loop {
            let notified = self.settled.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.in_flight.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    async fn persist(
        self: &Arc<Self>,
        field_path: String,
        data: JsonValue,
        _in_flight: InFlight,
    ) {
        if !self.is_active() {
            return;
        }

        self.transition(AutosaveStatus::Saving, None);
        let field = DraftField::new(&self.options.scope, &field_path, data.clone());
        let outcome = self.repository.upsert_field(field).await;

        if !self.is_active() {
            log::debug!("Dropping save outcome for '{}': autosave disposed", field_path);
            return;
        }

        match outcome {
            Ok(()) => {
                log::debug!(
                    "Saved draft field '{}' for '{}'",
                    field_path,
                    self.options.scope.draft_key
                );
                self.transition(AutosaveStatus::Saved, Some(Utc::now()));
                if let Some(on_save) = &self.options.on_save {
                    on_save(&field_path, &data);
                }
                self.schedule_idle(AutosaveStatus::Saved, self.options.saved_reset);
            }
            Err(err) => {
                log::warn!("Autosave of draft field '{}' failed: {}", field_path, err);
                self.transition(AutosaveStatus::Error, None);
                self.notify_error(&err);
                self.schedule_idle(AutosaveStatus::Error, self.options.error_reset);
            }
        }
    }

    /// Any new status supersedes a pending fall-back to idle.
    fn transition(&self, status: AutosaveStatus, saved_at: Option<DateTime<Utc>>) {
        if let Some(reset) = lock(&self.idle_reset).take() {
            reset.abort();
        }

        self.state.send_modify(|snapshot| {
            snapshot.status = status;
            if saved_at.is_some() {
                snapshot.last_saved_at = saved_at;
            }
        });
    }

    fn schedule_idle(self: &Arc<Self>, from: AutosaveStatus, after: Duration) {
        let inner = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if !inner.is_active() {
                return;
            }
            inner.state.send_if_modified(|snapshot| {
                if snapshot.status == from {
                    snapshot.status = AutosaveStatus::Idle;
                    true
                } else {
                    false
                }
            });
        });

        if let Some(previous) = lock(&self.idle_reset).replace(handle) {
            previous.abort();
        }
    }

    fn notify_error(&self, err: &AppError) {
        if !self.is_active() {
            return;
        }
        if let Some(on_error) = &self.options.on_error {
            on_error(err);
        }
    }

    fn shutdown(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }

        let cancelled = {
            let mut timers = lock(&self.timers);
            let count = timers.len();
            for (_, pending) in timers.drain() {
                pending.handle.abort();
            }
            count
        };

        if let Some(reset) = lock(&self.idle_reset).take() {
            reset.abort();
        }

        log::debug!(
            "Autosave for '{}' disposed, {} pending saves cancelled",
            self.options.scope.draft_key,
            cancelled
        );
    }
}

/// Owns the debounce timers for one draft. Disposed explicitly or on drop.
///
/// Saving spawns Tokio tasks, so the engine must be used from within a Tokio runtime.
pub struct AutosaveEngine {
    inner: Arc<EngineInner>,
}

impl AutosaveEngine {
    pub fn new(repository: Arc<dyn DraftRepository>, options: AutosaveOptions) -> Self {
        let (state, _) = watch::channel(AutosaveSnapshot {
            status: AutosaveStatus::Idle,
            last_saved_at: None,
        });

        Self {
            inner: Arc::new(EngineInner {
                repository,
                options,
                active: AtomicBool::new(true),
                next_timer_id: AtomicU64::new(0),
                timers: Mutex::new(HashMap::new()),
                in_flight: AtomicUsize::new(0),
                settled: Notify::new(),
                idle_reset: Mutex::new(None),
                state,
            }),
        }
    }

    pub fn scope(&self) -> &DraftScope {
        &self.inner.options.scope
    }

    /// Schedules `data` for `field_path` after the debounce window, replacing any pending value.
    pub fn save_field(&self, field_path: impl Into<String>, data: JsonValue) {
        let field_path = field_path.into();
        if !self.inner.is_active() {
            log::debug!("Ignoring save of '{}': autosave disposed", field_path);
            return;
        }

        let id = self.inner.next_timer_id.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::clone(&self.inner);
        let path = field_path.clone();
        let debounce = self.inner.options.debounce;

        let mut timers = lock(&self.inner.timers);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if let Some((data, in_flight)) = inner.take_fired(&path, id) {
                inner.persist(path, data, in_flight).await;
            }
        });

        if let Some(previous) = timers.insert(field_path, PendingSave { id, data, handle }) {
            previous.handle.abort();
        }
    }

    /// Sends every pending value now instead of waiting for its timer, then waits for saves
    /// whose timer had already fired. Nothing written before the call lands after it returns.
    pub async fn flush(&self) {
        let mut pending: Vec<(String, JsonValue, InFlight)> = Vec::new();
        for (path, save) in lock(&self.inner.timers).drain() {
            save.handle.abort();
            pending.push((path, save.data, InFlight::begin(&self.inner)));
        }

        if !pending.is_empty() {
            pending.sort_by(|a, b| a.0.cmp(&b.0));
            log::debug!("Flushing {} pending draft fields", pending.len());

            join_all(
                pending
                    .into_iter()
                    .map(|(path, data, in_flight)| self.inner.persist(path, data, in_flight)),
            )
            .await;
        }

        self.inner.settle().await;
    }

    /// Deletes the whole draft. Failures reach `on_error` only.
    pub async fn clear_draft(&self) {
        let scope = &self.inner.options.scope;
        match self.inner.repository.clear_draft(scope).await {
            Ok(deleted) => {
                log::info!("Cleared draft '{}' ({} fields)", scope.draft_key, deleted);
            }
            Err(err) => {
                log::warn!("Failed to clear draft '{}': {}", scope.draft_key, err);
                self.inner.notify_error(&err);
            }
        }
    }

    /// Persisted fields of the draft, or nothing if the backend could not be read.
    pub async fn load_draft_fields(&self) -> Vec<DraftField> {
        let scope = &self.inner.options.scope;
        match self.inner.repository.fetch_fields(scope).await {
            Ok(fields) => fields,
            Err(err) => {
                log::warn!("Failed to load draft '{}': {}", scope.draft_key, err);
                self.inner.notify_error(&err);
                Vec::new()
            }
        }
    }

    pub fn status(&self) -> AutosaveStatus {
        self.inner.state.borrow().status
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.inner.state.borrow().last_saved_at
    }

    pub fn snapshot(&self) -> AutosaveSnapshot {
        *self.inner.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AutosaveSnapshot> {
        self.inner.state.subscribe()
    }

    pub fn pending_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = lock(&self.inner.timers).keys().cloned().collect();
        fields.sort();
        fields
    }

    pub fn is_active(&self) -> bool {
        self.inner.is_active()
    }

    /// Cancels pending timers and silences in-flight saves. Safe to call more than once.
    pub fn dispose(&self) {
        self.inner.shutdown();
    }
}

impl Drop for AutosaveEngine {
    fn drop(&mut self) {
        self.inner.shutdown();
    }
}
