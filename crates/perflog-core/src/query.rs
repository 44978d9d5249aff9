//! Read-only views over the logger

use crate::formatter::format_sessions;
use crate::logger::PerfLogger;
use crate::store::StorageInfo;
use perflog_telemetry::{Session, SessionId};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Per-operation aggregate across stored sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationStats {
    pub count: usize,
    pub total_secs: f64,
    pub max_secs: f64,
}

impl OperationStats {
    pub fn mean_secs(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_secs / self.count as f64
        }
    }
}

/// Aggregate statistics over stored sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogSummary {
    pub session_count: usize,
    pub entry_count: usize,
    pub failed_entry_count: usize,
    pub total_duration_secs: f64,
    pub slowest: Option<(String, f64)>,
    pub per_operation: BTreeMap<String, OperationStats>,
}

impl LogSummary {
    fn from_sessions<'a>(sessions: impl IntoIterator<Item = &'a Session>) -> Self {
        let mut summary = LogSummary::default();

        for session in sessions {
            summary.session_count += 1;
            for entry in session.entries() {
                summary.entry_count += 1;
                summary.total_duration_secs += entry.duration_secs;
                if entry.is_failure() {
                    summary.failed_entry_count += 1;
                }

                let is_slowest = summary
                    .slowest
                    .as_ref()
                    .map_or(true, |(_, secs)| entry.duration_secs > *secs);
                if is_slowest {
                    summary.slowest = Some((entry.operation.clone(), entry.duration_secs));
                }

                let stats = summary
                    .per_operation
                    .entry(entry.operation.clone())
                    .or_default();
                stats.count += 1;
                stats.total_secs += entry.duration_secs;
                stats.max_secs = stats.max_secs.max(entry.duration_secs);
            }
        }

        summary
    }
}

/// Read-only surface for consumers such as a "copy logs" action
#[derive(Debug, Clone)]
pub struct LogQuery {
    logger: PerfLogger,
}

impl LogQuery {
    pub(crate) fn new(logger: PerfLogger) -> Self {
        Self { logger }
    }

    pub fn storage_info(&self) -> StorageInfo {
        self.logger.lock().store.info()
    }

    /// Up to `limit` stored sessions, most recent first
    pub fn recent_sessions(&self, limit: usize) -> Vec<Session> {
        self.logger.lock().store.recent(limit)
    }

    /// Text report of up to `limit` most recent sessions
    pub fn formatted_logs(&self, limit: usize) -> String {
        let sessions = self.recent_sessions(limit);
        let device = self.logger.device_snapshot();
        format_sessions(&sessions, &device)
    }

    /// Entry count per active session
    pub fn active_session_info(&self) -> HashMap<SessionId, usize> {
        self.logger.lock().registry.entry_counts()
    }

    pub fn session_has_operations(&self, session_id: SessionId) -> bool {
        let state = self.logger.lock();
        state
            .registry
            .get(session_id)
            .or_else(|| state.store.get(session_id))
            .is_some_and(|s| !s.entries().is_empty())
    }

    /// Sum of entry durations for an active or stored session
    pub fn session_duration(&self, session_id: SessionId) -> Option<f64> {
        let state = self.logger.lock();
        state
            .registry
            .get(session_id)
            .or_else(|| state.store.get(session_id))
            .map(Session::total_duration)
    }

    pub fn summary(&self) -> LogSummary {
        LogSummary::from_sessions(self.logger.lock().store.iter())
    }
}
