//! Bounded store of completed sessions

use perflog_telemetry::{read_jsonl, write_jsonl, Session, SessionId};
use serde::Serialize;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Snapshot of store occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StorageInfo {
    pub session_count: usize,
    pub estimated_size_bytes: usize,
    pub max_size_bytes: usize,
    pub max_sessions: usize,
}

/// Point-in-time copy of a file-backed store, cheap to take under a lock
///
/// Sessions are shared with the store, so writing a snapshot never touches
/// the live collection.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    path: PathBuf,
    generation: u64,
    sessions: Vec<Arc<Session>>,
}

impl StoreSnapshot {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Rewrite the backing file with this snapshot's sessions
    pub fn write(&self) -> std::io::Result<()> {
        write_jsonl(&self.path, self.sessions.iter().map(Arc::as_ref))
    }
}

/// Writes snapshots in generation order, skipping any older than the last one written
#[derive(Debug, Default)]
pub struct SnapshotWriter {
    last_written: Mutex<u64>,
}

impl SnapshotWriter {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn hold(&self) -> std::sync::MutexGuard<'_, u64> {
        self.last_written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns false when the snapshot was stale or the write failed
    pub fn write(&self, snapshot: &StoreSnapshot) -> bool {
        let mut last = self
            .last_written
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if snapshot.generation <= *last {
            tracing::trace!(generation = snapshot.generation, "skipping stale snapshot");
            return false;
        }

        match snapshot.write() {
            Ok(()) => {
                *last = snapshot.generation;
                true
            }
            Err(e) => {
                tracing::warn!(
                    path = %snapshot.path.display(),
                    error = %e,
                    "failed to persist sessions"
                );
                false
            }
        }
    }
}

/// Completed sessions, oldest first, capped by count and estimated size
///
/// Mutations only mark the store dirty; callers persist by taking a
/// [`StoreSnapshot`] and writing it wherever they hold no other lock.
#[derive(Debug)]
pub struct SessionStore {
    sessions: VecDeque<Arc<Session>>,
    size_bytes: usize,
    max_sessions: usize,
    max_size_bytes: usize,
    path: Option<PathBuf>,
    generation: u64,
    dirty: bool,
}

impl SessionStore {
    pub fn in_memory(max_sessions: usize, max_size_bytes: usize) -> Self {
        Self {
            sessions: VecDeque::new(),
            size_bytes: 0,
            max_sessions,
            max_size_bytes,
            path: None,
            generation: 0,
            dirty: false,
        }
    }

    /// Load the store backed by a JSONL file
    ///
    /// Loading never evicts; records over the caps stay until the next
    /// insert or an explicit [`SessionStore::clear_old_logs_only`].
    pub fn open(path: &Path, max_sessions: usize, max_size_bytes: usize) -> std::io::Result<Self> {
        let records: Vec<Session> = read_jsonl(path)?;
        let mut store = Self::in_memory(max_sessions, max_size_bytes);
        store.path = Some(path.to_path_buf());

        for session in records {
            if !session.is_completed() {
                tracing::warn!(session = %session.id(), "discarding incomplete stored session");
                continue;
            }
            store.size_bytes += session.estimated_size_bytes();
            store.sessions.push_back(Arc::new(session));
        }

        tracing::debug!(
            path = %path.display(),
            sessions = store.sessions.len(),
            "loaded session store"
        );
        Ok(store)
    }

    /// Add a completed session, evicting the oldest ones over the caps
    ///
    /// Returns how many sessions were evicted.
    pub fn insert(&mut self, session: Session) -> usize {
        self.size_bytes += session.estimated_size_bytes();
        self.sessions.push_back(Arc::new(session));
        self.mark_dirty();
        self.evict_over_limits()
    }

    fn evict_over_limits(&mut self) -> usize {
        let mut evicted = 0;

        while self.sessions.len() > self.max_sessions {
            self.pop_oldest();
            evicted += 1;
        }

        while self.size_bytes > self.max_size_bytes && !self.sessions.is_empty() {
            self.pop_oldest();
            evicted += 1;
        }

        if evicted > 0 {
            self.mark_dirty();
            tracing::debug!(
                evicted,
                remaining = self.sessions.len(),
                size_bytes = self.size_bytes,
                "evicted old sessions"
            );
        }
        evicted
    }

    fn pop_oldest(&mut self) {
        if let Some(old) = self.sessions.pop_front() {
            self.size_bytes = self.size_bytes.saturating_sub(old.estimated_size_bytes());
        }
    }

    fn mark_dirty(&mut self) {
        self.generation += 1;
        self.dirty = true;
    }

    /// Up to `limit` sessions, most recent first
    pub fn recent(&self, limit: usize) -> Vec<Session> {
        self.sessions
            .iter()
            .rev()
            .take(limit)
            .map(|s| Session::clone(s))
            .collect()
    }

    pub fn get(&self, session_id: SessionId) -> Option<&Session> {
        self.iter().find(|s| s.id() == session_id)
    }

    pub fn contains(&self, session_id: SessionId) -> bool {
        self.get(session_id).is_some()
    }

    /// Stored sessions, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter().map(Arc::as_ref)
    }

    pub fn info(&self) -> StorageInfo {
        StorageInfo {
            session_count: self.sessions.len(),
            estimated_size_bytes: self.size_bytes,
            max_size_bytes: self.max_size_bytes,
            max_sessions: self.max_sessions,
        }
    }

    /// Change the caps without evicting anything
    pub fn set_limits(&mut self, max_sessions: usize, max_size_bytes: usize) {
        self.max_sessions = max_sessions;
        self.max_size_bytes = max_size_bytes;
    }

    /// Drop every stored session
    pub fn clear_all(&mut self) {
        self.sessions.clear();
        self.size_bytes = 0;
        self.mark_dirty();
    }

    /// Evict only what exceeds the caps; returns how many were removed
    pub fn clear_old_logs_only(&mut self) -> usize {
        self.evict_over_limits()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Snapshot of unsaved changes, if the store is file-backed and dirty
    pub fn take_snapshot(&mut self) -> Option<StoreSnapshot> {
        let path = self.path.as_ref()?;
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(StoreSnapshot {
            path: path.clone(),
            generation: self.generation,
            sessions: self.sessions.iter().cloned().collect(),
        })
    }

    /// Write unsaved changes immediately
    pub fn flush(&mut self) -> std::io::Result<()> {
        match self.take_snapshot() {
            Some(snapshot) => snapshot.write(),
            None => Ok(()),
        }
    }
}
