//! Active session tracking and entry validation

use chrono::{DateTime, TimeDelta, Utc};
use perflog_telemetry::{DeviceContext, LogEntry, ModelInfo, Session, SessionId};
use std::collections::HashMap;
use uuid::Uuid;

/// Result of a single `log` call, for diagnostics and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutcome {
    Logged,
    Rejected(RejectReason),
    UnknownSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    EmptyName,
    NegativeDuration,
    NonFiniteDuration,
    ExceedsCeiling,
}

#[derive(Debug)]
struct ActiveSession {
    seq: u64,
    session: Session,
}

/// Sessions that have been started but not yet ended or cancelled
#[derive(Debug)]
pub struct SessionRegistry {
    active: HashMap<SessionId, ActiveSession>,
    next_seq: u64,
    max_operation_secs: f64,
}

impl SessionRegistry {
    pub fn new(max_operation_secs: f64) -> Self {
        Self {
            active: HashMap::new(),
            next_seq: 0,
            max_operation_secs,
        }
    }

    /// Open a new session stamped with `device`
    pub fn start(&mut self, device: DeviceContext) -> SessionId {
        let session = Session::new(device);
        let id = session.id();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.active.insert(id, ActiveSession { seq, session });
        id
    }

    /// Append an entry to an active session after validating it
    pub fn log(
        &mut self,
        name: &str,
        duration_secs: f64,
        session_id: SessionId,
        model_info: Option<ModelInfo>,
        device: DeviceContext,
    ) -> LogOutcome {
        let name = name.trim();
        if let Err(reason) = self.validate(name, duration_secs) {
            return LogOutcome::Rejected(reason);
        }

        let Some(active) = self.active.get_mut(&session_id) else {
            return LogOutcome::UnknownSession;
        };

        let started_at = entry_start(device.captured_at, duration_secs);
        let entry = LogEntry {
            id: Uuid::new_v4(),
            operation: name.to_string(),
            started_at,
            duration_secs,
            model_info,
            device,
        };

        if active.session.push_entry(entry) {
            LogOutcome::Logged
        } else {
            LogOutcome::UnknownSession
        }
    }

    fn validate(&self, name: &str, duration_secs: f64) -> Result<(), RejectReason> {
        if name.is_empty() {
            return Err(RejectReason::EmptyName);
        }
        if !duration_secs.is_finite() {
            return Err(RejectReason::NonFiniteDuration);
        }
        if duration_secs < 0.0 {
            return Err(RejectReason::NegativeDuration);
        }
        if duration_secs > self.max_operation_secs {
            return Err(RejectReason::ExceedsCeiling);
        }
        Ok(())
    }

    /// Remove and complete a session, handing it back for storage
    pub fn end(&mut self, session_id: SessionId, at: DateTime<Utc>) -> Option<Session> {
        let mut session = self.active.remove(&session_id)?.session;
        session.complete(at);
        Some(session)
    }

    /// Remove a session without completing it
    pub fn cancel(&mut self, session_id: SessionId) -> Option<Session> {
        self.active.remove(&session_id).map(|a| a.session)
    }

    /// Complete every active session, in the order they were started
    pub fn drain(&mut self, at: DateTime<Utc>) -> Vec<Session> {
        let mut active: Vec<ActiveSession> = self.active.drain().map(|(_, a)| a).collect();
        active.sort_by_key(|a| a.seq);
        active
            .into_iter()
            .map(|a| {
                let mut session = a.session;
                session.complete(at);
                session
            })
            .collect()
    }

    pub fn get(&self, session_id: SessionId) -> Option<&Session> {
        self.active.get(&session_id).map(|a| &a.session)
    }

    pub fn is_active(&self, session_id: SessionId) -> bool {
        self.active.contains_key(&session_id)
    }

    /// Entry count per active session
    pub fn entry_counts(&self) -> HashMap<SessionId, usize> {
        self.active
            .iter()
            .map(|(id, a)| (*id, a.session.entries().len()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// `now - duration`, or `now` when that falls outside the representable range
fn entry_start(now: DateTime<Utc>, duration_secs: f64) -> DateTime<Utc> {
    let micros = (duration_secs * 1_000_000.0) as i64;
    now.checked_sub_signed(TimeDelta::microseconds(micros))
        .unwrap_or(now)
}
