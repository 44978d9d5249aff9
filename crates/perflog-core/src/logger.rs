//! Shared logger handle combining the session registry and the store

use crate::config::Config;
use crate::error::Result;
use crate::query::LogQuery;
use crate::registry::{LogOutcome, SessionRegistry};
use crate::store::{SessionStore, SnapshotWriter, StoreSnapshot};
use chrono::Utc;
use perflog_telemetry::{DeviceContext, DeviceProbe, HostProbe, ModelInfo, SessionId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
pub(crate) struct LoggerState {
    pub(crate) registry: SessionRegistry,
    pub(crate) store: SessionStore,
}

/// Handle to a performance logger
///
/// Cloning is cheap and every clone shares the same sessions. All reads and
/// writes go through one lock, so the active set and the store are always
/// observed in a consistent state. File writes happen after that lock is
/// released, so logging never waits on disk I/O.
#[derive(Clone)]
pub struct PerfLogger {
    state: Arc<Mutex<LoggerState>>,
    probe: Arc<dyn DeviceProbe>,
    writer: Arc<SnapshotWriter>,
}

impl PerfLogger {
    /// In-memory logger; `storage_path` is ignored
    pub fn new(config: &Config) -> Self {
        let probe = Arc::new(HostProbe::new(config.app_version.clone()));
        Self::with_probe(config, probe)
    }

    pub fn with_probe(config: &Config, probe: Arc<dyn DeviceProbe>) -> Self {
        let store = SessionStore::in_memory(config.max_sessions, config.max_size_bytes);
        Self::from_parts(config, store, probe)
    }

    /// Logger backed by `config.storage_path`, in-memory when unset
    pub fn open(config: &Config) -> Result<Self> {
        let probe = Arc::new(HostProbe::new(config.app_version.clone()));
        Self::open_with_probe(config, probe)
    }

    pub fn open_with_probe(config: &Config, probe: Arc<dyn DeviceProbe>) -> Result<Self> {
        let store = match &config.storage_path {
            Some(path) => SessionStore::open(path, config.max_sessions, config.max_size_bytes)?,
            None => SessionStore::in_memory(config.max_sessions, config.max_size_bytes),
        };
        Ok(Self::from_parts(config, store, probe))
    }

    fn from_parts(config: &Config, store: SessionStore, probe: Arc<dyn DeviceProbe>) -> Self {
        let state = LoggerState {
            registry: SessionRegistry::new(config.max_operation_secs),
            store,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            probe,
            writer: Arc::new(SnapshotWriter::new()),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, LoggerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write a snapshot taken under the state lock; must be called without it
    fn persist(&self, snapshot: Option<StoreSnapshot>) {
        if let Some(snapshot) = snapshot {
            self.writer.write(&snapshot);
        }
    }

    pub fn device_snapshot(&self) -> DeviceContext {
        self.probe.snapshot()
    }

    /// Open a new active session
    pub fn start_session(&self) -> SessionId {
        let device = self.probe.snapshot();
        let id = self.lock().registry.start(device);
        tracing::debug!(session = %id, "session started");
        id
    }

    /// Record a finished operation; invalid entries and unknown sessions are dropped
    pub fn log_operation(
        &self,
        name: &str,
        duration_secs: f64,
        session_id: SessionId,
        model_info: Option<ModelInfo>,
    ) {
        self.log_with_outcome(name, duration_secs, session_id, model_info);
    }

    pub(crate) fn log_with_outcome(
        &self,
        name: &str,
        duration_secs: f64,
        session_id: SessionId,
        model_info: Option<ModelInfo>,
    ) -> LogOutcome {
        let device = self.probe.snapshot();
        let outcome = self
            .lock()
            .registry
            .log(name, duration_secs, session_id, model_info, device);
        report_outcome(outcome, name, duration_secs, session_id);
        outcome
    }

    /// Record several operations under a single lock acquisition
    pub(crate) fn log_many(
        &self,
        session_id: SessionId,
        entries: Vec<(String, f64, Option<ModelInfo>)>,
    ) -> usize {
        let device = self.probe.snapshot();
        let mut state = self.lock();
        let mut logged = 0;
        for (name, duration_secs, model_info) in entries {
            let outcome = state.registry.log(
                &name,
                duration_secs,
                session_id,
                model_info,
                device.clone(),
            );
            report_outcome(outcome, &name, duration_secs, session_id);
            if outcome == LogOutcome::Logged {
                logged += 1;
            }
        }
        logged
    }

    /// Complete a session and move it into the store
    pub fn end_session(&self, session_id: SessionId) {
        let snapshot = {
            let mut state = self.lock();
            let Some(session) = state.registry.end(session_id, Utc::now()) else {
                tracing::debug!(session = %session_id, "end for unknown session ignored");
                return;
            };
            let entries = session.entries().len();
            let evicted = state.store.insert(session);
            tracing::debug!(session = %session_id, entries, evicted, "session completed");
            state.store.take_snapshot()
        };
        self.persist(snapshot);
    }

    /// Discard a session without storing it
    pub fn cancel_session(&self, session_id: SessionId) {
        if let Some(session) = self.lock().registry.cancel(session_id) {
            tracing::debug!(
                session = %session_id,
                entries = session.entries().len(),
                "session cancelled"
            );
        }
    }

    /// Move every active session into the store as completed
    pub fn complete_all_active_sessions(&self) {
        let snapshot = {
            let mut state = self.lock();
            let sessions = state.registry.drain(Utc::now());
            let count = sessions.len();
            for session in sessions {
                state.store.insert(session);
            }
            if count > 0 {
                tracing::debug!(count, "completed all active sessions");
            }
            state.store.take_snapshot()
        };
        self.persist(snapshot);
    }

    pub fn is_session_active(&self, session_id: SessionId) -> bool {
        self.lock().registry.is_active(session_id)
    }

    /// Entry count per active session
    pub fn active_session_info(&self) -> HashMap<SessionId, usize> {
        self.lock().registry.entry_counts()
    }

    /// Wipe every stored session
    pub fn clear_all(&self) {
        let snapshot = {
            let mut state = self.lock();
            state.store.clear_all();
            state.store.take_snapshot()
        };
        self.persist(snapshot);
        tracing::debug!("cleared all stored sessions");
    }

    /// Evict only sessions over the caps; returns how many were removed
    pub fn clear_old_logs_only(&self) -> usize {
        let (evicted, snapshot) = {
            let mut state = self.lock();
            let evicted = state.store.clear_old_logs_only();
            (evicted, state.store.take_snapshot())
        };
        self.persist(snapshot);
        evicted
    }

    /// Read-only view over the logger
    pub fn query(&self) -> LogQuery {
        LogQuery::new(self.clone())
    }
}

impl fmt::Debug for PerfLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerfLogger")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

fn report_outcome(outcome: LogOutcome, name: &str, duration_secs: f64, session_id: SessionId) {
    match outcome {
        LogOutcome::Logged => {}
        LogOutcome::Rejected(reason) => tracing::warn!(
            operation = name,
            duration_secs,
            ?reason,
            "dropping invalid log entry"
        ),
        LogOutcome::UnknownSession => tracing::debug!(
            operation = name,
            session = %session_id,
            "log for unknown session ignored"
        ),
    }
}
