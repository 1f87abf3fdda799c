//! Autosave scheduling and manual saves for one open post.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::error::Elapsed;

use crate::errors::{EditorError, SessionError, TransportError};

use super::backend::{PostStore, SaveResponse};
use super::record::PostRecord;
use super::state::{
    AutosaveOutcome, AutosaveSkip, AutosaveState, ContentHash, SaveConfig, SavePhase, SaveStatus,
};

/// A spawned autosave, identified by the ticket it was scheduled with.
#[derive(Debug)]
struct AutosaveTask {
    ticket: u64,
    handle: AbortHandle,
}

#[derive(Debug)]
struct CoordinatorState {
    record: PostRecord,
    /// The record as last written, or as loaded when it was already stored.
    saved_record: Option<PostRecord>,
    autosave: AutosaveState,
    online: bool,
    manual_in_flight: bool,
    /// Waiting for the debounce interval to pass.
    pending: Option<AutosaveTask>,
    /// Debounce passed, save call running.
    running: Option<AutosaveTask>,
    next_ticket: u64,
    shut_down: bool,
    last_error: Option<EditorError>,
    last_autosave: Option<AutosaveOutcome>,
}

impl CoordinatorState {
    fn current_hash(&self) -> ContentHash {
        ContentHash::of(&self.record.content)
    }

    fn autosave_skip(&self) -> Option<AutosaveSkip> {
        if !self.online {
            Some(AutosaveSkip::Offline)
        } else if self.manual_in_flight {
            Some(AutosaveSkip::ManualSaveInProgress)
        } else if !self.record.has_required_fields() {
            Some(AutosaveSkip::MissingRequiredFields)
        } else if !self.record.is_persisted() {
            Some(AutosaveSkip::NeverPersisted)
        } else if self.autosave.last_saved_hash == Some(self.current_hash()) {
            Some(AutosaveSkip::Unchanged)
        } else {
            None
        }
    }

    fn cancel_autosave(&mut self) {
        for task in [self.pending.take(), self.running.take()].into_iter().flatten() {
            log::debug!("cancelling autosave #{}", task.ticket);
            task.handle.abort();
        }
    }

    /// Whether the record differs from the last written one, metadata
    /// included.
    fn differs_from_saved(&self) -> bool {
        self.saved_record.as_ref() != Some(&self.record)
    }

    /// Records a successful write of `written`.
    fn saved(&mut self, mut written: PostRecord, response: &SaveResponse) {
        self.autosave.status = SaveStatus::Saved;
        self.autosave.last_saved_hash = Some(ContentHash::of(&written.content));
        self.last_error = None;
        if let Some(id) = &response.id
            && !self.record.is_persisted()
        {
            self.record.id = Some(id.clone());
            written.id = Some(id.clone());
        }
        self.saved_record = Some(written);
        self.autosave.has_unsaved_changes = self.differs_from_saved();
    }

    fn failed(&mut self, error: &EditorError) {
        self.autosave.status = SaveStatus::Error;
        self.last_error = Some(error.clone());
    }
}

struct Inner {
    store: Arc<dyn PostStore>,
    config: SaveConfig,
    state: Mutex<CoordinatorState>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn call_store(&self, record: &PostRecord) -> Result<SaveResponse, EditorError> {
        let after = self.config.save_timeout;
        settle(tokio::time::timeout(after, self.store.save(record)).await, after)
    }

    /// Replaces any pending autosave with one due after the debounce
    /// interval.
    fn schedule(self: &Arc<Self>, state: &mut CoordinatorState) {
        if let Some(previous) = state.pending.take() {
            previous.handle.abort();
        }
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        let delay = self.config.autosave_debounce;
        let inner = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.run_autosave(ticket).await;
        })
        .abort_handle();
        log::debug!("autosave #{ticket} scheduled in {delay:?}");
        state.pending = Some(AutosaveTask { ticket, handle });
    }

    async fn run_autosave(self: Arc<Self>, ticket: u64) {
        let record = {
            let mut state = self.lock();
            if state.shut_down || state.pending.as_ref().map(|t| t.ticket) != Some(ticket) {
                return;
            }
            let Some(task) = state.pending.take() else {
                return;
            };
            // One store call at a time; try again once the debounce passes.
            if let Some(running) = &state.running {
                log::debug!(
                    "autosave #{ticket} deferred, #{} still in flight",
                    running.ticket
                );
                self.schedule(&mut state);
                return;
            }
            if let Some(skip) = state.autosave_skip() {
                log::debug!("autosave #{ticket} skipped: {skip}");
                if skip == AutosaveSkip::Unchanged {
                    state.autosave.has_unsaved_changes = state.differs_from_saved();
                }
                state.last_autosave = Some(AutosaveOutcome::Skipped(skip));
                return;
            }
            state.running = Some(task);
            state.autosave.status = SaveStatus::Saving;
            state.record.clone()
        };

        let result = self.call_store(&record).await;

        let mut state = self.lock();
        if state.shut_down || state.running.as_ref().map(|t| t.ticket) != Some(ticket) {
            log::debug!("autosave #{ticket} settled after being superseded, ignoring");
            return;
        }
        state.running = None;
        match result {
            Ok(response) => {
                log::info!("autosaved post {}", record.id.as_deref().unwrap_or("?"));
                state.saved(record, &response);
                state.last_autosave = Some(AutosaveOutcome::Saved);
            }
            Err(e) => {
                log::warn!("autosave failed: {e}");
                state.failed(&e);
                state.last_autosave = Some(AutosaveOutcome::Failed(e));
            }
        }
    }
}

fn settle(
    result: Result<Result<SaveResponse, TransportError>, Elapsed>,
    after: Duration,
) -> Result<SaveResponse, EditorError> {
    match result {
        Err(_) => Err(EditorError::Timeout { after }),
        Ok(Err(TransportError(message))) => Err(EditorError::Network(message)),
        Ok(Ok(response)) => response.into_result(),
    }
}

/// Resets the manual-save flag if the save future is dropped before it
/// settles.
struct ManualSaveGuard<'a> {
    inner: &'a Inner,
    armed: bool,
}

impl Drop for ManualSaveGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.inner.lock();
            state.manual_in_flight = false;
            if state.autosave.status == SaveStatus::Saving {
                state.autosave.status = SaveStatus::Idle;
            }
        }
    }
}

/// Decides whether and when the open post is persisted.
///
/// Content changes schedule a debounced autosave; a newer change replaces
/// the pending one. A manual save cancels any pending or running autosave
/// before it starts, and only one manual save runs at a time. Both kinds of
/// save race the store call against [`SaveConfig::save_timeout`].
///
/// Autosaves run on spawned tokio tasks, so the coordinator must be used
/// from inside a runtime.
#[derive(Clone)]
pub struct SaveCoordinator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SaveCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveCoordinator")
            .field("config", &self.inner.config)
            .field("state", &*self.inner.lock())
            .finish()
    }
}

impl SaveCoordinator {
    /// Starts coordinating saves for `record`. Content of a persisted
    /// record counts as already saved.
    pub fn new(store: Arc<dyn PostStore>, config: SaveConfig, record: PostRecord) -> Self {
        let saved_record = record.is_persisted().then(|| record.clone());
        let last_saved_hash = saved_record
            .as_ref()
            .map(|saved| ContentHash::of(&saved.content));
        let state = CoordinatorState {
            record,
            saved_record,
            autosave: AutosaveState {
                status: SaveStatus::Idle,
                last_saved_hash,
                has_unsaved_changes: false,
            },
            online: true,
            manual_in_flight: false,
            pending: None,
            running: None,
            next_ticket: 0,
            shut_down: false,
            last_error: None,
            last_autosave: None,
        };
        Self {
            inner: Arc::new(Inner {
                store,
                config,
                state: Mutex::new(state),
            }),
        }
    }

    pub fn config(&self) -> SaveConfig {
        self.inner.config
    }

    pub fn record(&self) -> PostRecord {
        self.inner.lock().record.clone()
    }

    /// Edits the record's metadata. Content changes go through
    /// [`SaveCoordinator::content_changed`].
    pub fn update_record(&self, edit: impl FnOnce(&mut PostRecord)) {
        let mut state = self.inner.lock();
        let content = std::mem::take(&mut state.record.content);
        edit(&mut state.record);
        state.record.content = content;
        state.autosave.has_unsaved_changes = true;
    }

    pub fn autosave_state(&self) -> AutosaveState {
        self.inner.lock().autosave.clone()
    }

    pub fn status(&self) -> SaveStatus {
        self.inner.lock().autosave.status
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.inner.lock().autosave.has_unsaved_changes
    }

    pub fn is_saving(&self) -> bool {
        let state = self.inner.lock();
        state.manual_in_flight || state.running.is_some()
    }

    pub fn phase(&self) -> SavePhase {
        let state = self.inner.lock();
        if state.manual_in_flight || state.running.is_some() {
            SavePhase::Saving
        } else if state.pending.is_some() {
            SavePhase::PendingAutosave
        } else {
            match state.autosave.status {
                SaveStatus::Idle => SavePhase::Idle,
                SaveStatus::Saving => SavePhase::Saving,
                SaveStatus::Saved => SavePhase::Saved,
                SaveStatus::Error => SavePhase::Error,
            }
        }
    }

    pub fn last_error(&self) -> Option<EditorError> {
        self.inner.lock().last_error.clone()
    }

    pub fn last_autosave(&self) -> Option<AutosaveOutcome> {
        self.inner.lock().last_autosave.clone()
    }

    pub fn is_online(&self) -> bool {
        self.inner.lock().online
    }

    pub fn set_online(&self, online: bool) {
        let mut state = self.inner.lock();
        if state.online != online {
            log::debug!("connectivity changed: online={online}");
            state.online = online;
        }
    }

    /// Takes new serialized content and (re)schedules the autosave.
    pub fn content_changed(&self, content: impl Into<String>) {
        let mut state = self.inner.lock();
        if state.shut_down {
            return;
        }
        state.record.content = content.into();
        state.autosave.has_unsaved_changes = true;
        if matches!(state.autosave.status, SaveStatus::Saved | SaveStatus::Error) {
            state.autosave.status = SaveStatus::Idle;
        }

        self.inner.schedule(&mut state);
    }

    /// Validates and persists the record now.
    ///
    /// Any pending or running autosave is cancelled first. A second call
    /// while one is in flight fails with [`EditorError::SaveInProgress`].
    pub async fn save(&self) -> Result<SaveResponse, EditorError> {
        let record = {
            let mut state = self.inner.lock();
            if state.shut_down {
                return Err(SessionError::Destroyed.into());
            }
            if state.manual_in_flight {
                return Err(EditorError::SaveInProgress);
            }
            state.record.validate().map_err(EditorError::Validation)?;
            state.cancel_autosave();
            state.manual_in_flight = true;
            state.autosave.status = SaveStatus::Saving;
            state.record.clone()
        };
        let mut guard = ManualSaveGuard {
            inner: &self.inner,
            armed: true,
        };

        let result = self.inner.call_store(&record).await;

        guard.armed = false;
        let mut state = self.inner.lock();
        if state.shut_down {
            log::debug!("save settled after shutdown, ignoring");
            return result;
        }
        state.manual_in_flight = false;
        match &result {
            Ok(response) => {
                log::info!("saved post `{}`", record.title);
                state.saved(record, response);
            }
            Err(e) => {
                log::warn!("save failed: {e}");
                state.failed(e);
            }
        }
        result
    }

    /// Stops all timers. Calls still in flight settle without touching
    /// state.
    pub fn shutdown(&self) {
        let mut state = self.inner.lock();
        if state.shut_down {
            return;
        }
        log::debug!("save coordinator shutting down");
        state.cancel_autosave();
        state.shut_down = true;
    }
}
