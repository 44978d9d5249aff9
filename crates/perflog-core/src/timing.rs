//! Timing wrappers that measure units of work and log them into a session

use crate::error::{MeasureError, PerfError};
use crate::logger::PerfLogger;
use futures::future::BoxFuture;
use perflog_telemetry::{
    ModelInfo, SessionId, CANCELLED_MARKER, CONDITION_FAILED_MARKER, FAILED_MARKER,
};
use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

/// Handle linking a manual start mark to its later [`Timer::end_timing`]
#[derive(Debug)]
#[must_use = "a timing token records nothing until passed to end_timing"]
pub struct TimingToken {
    name: String,
    session_id: SessionId,
    model_info: Option<ModelInfo>,
    started: Instant,
}

impl TimingToken {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Attach model metadata discovered after timing started
    pub fn with_model_info(mut self, model_info: ModelInfo) -> Self {
        self.model_info = Some(model_info);
        self
    }
}

/// A precomputed measurement for [`Timer::log_batch`]
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub name: String,
    pub duration_secs: f64,
    pub model_info: Option<ModelInfo>,
    pub success: bool,
}

impl BatchEntry {
    pub fn new(name: impl Into<String>, duration_secs: f64, success: bool) -> Self {
        Self {
            name: name.into(),
            duration_secs,
            model_info: None,
            success,
        }
    }

    pub fn with_model_info(mut self, model_info: ModelInfo) -> Self {
        self.model_info = Some(model_info);
        self
    }
}

/// One named step for [`Timer::measure_sequence`]
pub type Step<'a, T, E> = (String, BoxFuture<'a, Result<T, E>>);

/// Logs a cancelled entry if dropped before being disarmed
struct MeasureGuard<'a> {
    logger: &'a PerfLogger,
    name: &'a str,
    session_id: SessionId,
    model_info: Option<ModelInfo>,
    started: Instant,
    armed: bool,
}

impl<'a> MeasureGuard<'a> {
    fn new(
        logger: &'a PerfLogger,
        name: &'a str,
        session_id: SessionId,
        model_info: Option<ModelInfo>,
    ) -> Self {
        Self {
            logger,
            name,
            session_id,
            model_info,
            started: Instant::now(),
            armed: true,
        }
    }

    fn finish(mut self, suffix: &str) -> f64 {
        self.armed = false;
        let elapsed = self.started.elapsed().as_secs_f64();
        let name = format!("{}{}", self.name, suffix);
        self.logger
            .log_operation(&name, elapsed, self.session_id, self.model_info.take());
        elapsed
    }
}

impl Drop for MeasureGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        let name = format!("{}{}", self.name, CANCELLED_MARKER);
        self.logger
            .log_operation(&name, elapsed, self.session_id, self.model_info.take());
    }
}

/// Measures units of work and records them through a [`PerfLogger`]
#[derive(Debug, Clone)]
pub struct Timer {
    logger: PerfLogger,
}

impl Timer {
    pub fn new(logger: PerfLogger) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &PerfLogger {
        &self.logger
    }

    fn ensure_active(&self, session_id: SessionId) -> Result<(), PerfError> {
        if self.logger.is_session_active(session_id) {
            Ok(())
        } else {
            Err(PerfError::SessionNotFound(session_id))
        }
    }

    /// Run `work`, logging its duration as `name` or `"name (failed)"`
    ///
    /// The work's own error is returned untouched in
    /// [`MeasureError::Operation`]. If the returned future is dropped before
    /// `work` finishes, a `"name (cancelled)"` entry is logged instead.
    pub async fn measure<T, E, F>(
        &self,
        name: &str,
        session_id: SessionId,
        model_info: Option<ModelInfo>,
        work: F,
    ) -> Result<T, MeasureError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        self.ensure_active(session_id)?;

        let guard = MeasureGuard::new(&self.logger, name, session_id, model_info);
        match work.await {
            Ok(value) => {
                guard.finish("");
                Ok(value)
            }
            Err(e) => {
                guard.finish(FAILED_MARKER);
                Err(MeasureError::Operation(e))
            }
        }
    }

    /// Like [`Timer::measure`], but fails with [`PerfError::TimedOut`] once
    /// `timeout` elapses
    pub async fn measure_with_timeout<T, E, F>(
        &self,
        name: &str,
        session_id: SessionId,
        model_info: Option<ModelInfo>,
        timeout: Duration,
        work: F,
    ) -> Result<T, MeasureError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        self.ensure_active(session_id)?;

        let guard = MeasureGuard::new(&self.logger, name, session_id, model_info);
        match tokio::time::timeout(timeout, work).await {
            Ok(Ok(value)) => {
                guard.finish("");
                Ok(value)
            }
            Ok(Err(e)) => {
                guard.finish(FAILED_MARKER);
                Err(MeasureError::Operation(e))
            }
            Err(_) => {
                let elapsed = guard.finish(FAILED_MARKER);
                tracing::warn!(operation = name, elapsed, ?timeout, "operation timed out");
                Err(PerfError::TimedOut {
                    operation: name.to_string(),
                    after: timeout,
                }
                .into())
            }
        }
    }

    /// Run `work` and log `"name (condition failed)"` when `predicate`
    /// rejects the result; the result is returned either way
    pub async fn measure_conditional<T, F, P>(
        &self,
        name: &str,
        session_id: SessionId,
        model_info: Option<ModelInfo>,
        work: F,
        predicate: P,
    ) -> Result<T, PerfError>
    where
        F: Future<Output = T>,
        P: FnOnce(&T) -> bool,
    {
        self.ensure_active(session_id)?;

        let guard = MeasureGuard::new(&self.logger, name, session_id, model_info);
        let value = work.await;
        if predicate(&value) {
            guard.finish("");
        } else {
            guard.finish(CONDITION_FAILED_MARKER);
        }
        Ok(value)
    }

    /// Run steps in order, stopping at the first failure
    ///
    /// Each step is measured under its own name. A failing step is logged as
    /// failed and its error returned; later steps are neither run nor logged.
    pub async fn measure_sequence<'a, T, E>(
        &self,
        session_id: SessionId,
        steps: Vec<Step<'a, T, E>>,
    ) -> Result<Vec<T>, MeasureError<E>> {
        self.ensure_active(session_id)?;

        let mut results = Vec::with_capacity(steps.len());
        for (name, work) in steps {
            let value = self.measure(&name, session_id, None, work).await?;
            results.push(value);
        }
        Ok(results)
    }

    /// Start a manual measurement
    pub fn start_timing(&self, name: impl Into<String>, session_id: SessionId) -> TimingToken {
        TimingToken {
            name: name.into(),
            session_id,
            model_info: None,
            started: Instant::now(),
        }
    }

    /// Finish a manual measurement; returns the elapsed seconds
    pub fn end_timing(&self, token: TimingToken, success: bool) -> f64 {
        let elapsed = token.started.elapsed().as_secs_f64();
        let name = if success {
            token.name
        } else {
            format!("{}{}", token.name, FAILED_MARKER)
        };
        self.logger
            .log_operation(&name, elapsed, token.session_id, token.model_info);
        elapsed
    }

    /// Finish a manual measurement as failed, noting the error in diagnostics
    pub fn end_timing_with_error<E: Display>(&self, token: TimingToken, error: &E) -> f64 {
        tracing::debug!(operation = %token.name, error = %error, "timed operation failed");
        self.end_timing(token, false)
    }

    /// Log precomputed measurements in one call without re-timing them
    ///
    /// Returns how many entries were accepted.
    pub fn log_batch(&self, session_id: SessionId, entries: Vec<BatchEntry>) -> usize {
        let entries = entries
            .into_iter()
            .map(|e| {
                let name = if e.success {
                    e.name
                } else {
                    format!("{}{}", e.name, FAILED_MARKER)
                };
                (name, e.duration_secs, e.model_info)
            })
            .collect();
        self.logger.log_many(session_id, entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::Utc;
    use futures::FutureExt;
    use perflog_telemetry::{FixedProbe, Session};
    use std::sync::Arc;

    fn timer() -> Timer {
        let logger =
            PerfLogger::with_probe(&Config::new(), Arc::new(FixedProbe::at(Utc::now())));
        Timer::new(logger)
    }

    fn stored(timer: &Timer, id: SessionId) -> Session {
        timer.logger().end_session(id);
        timer.logger().query().recent_sessions(1).remove(0)
    }

    fn names(session: &Session) -> Vec<String> {
        session
            .entries()
            .iter()
            .map(|e| e.operation.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_measure_success() {
        let timer = timer();
        let id = timer.logger().start_session();
        let value: Result<u32, MeasureError<String>> = timer
            .measure("Capture", id, None, async { Ok::<_, String>(7) })
            .await;
        assert_eq!(value.unwrap(), 7);
        assert_eq!(names(&stored(&timer, id)), vec!["Capture"]);
    }

    #[tokio::test]
    async fn test_measure_failure_reraises() {
        let timer = timer();
        let id = timer.logger().start_session();
        let err = timer
            .measure("OCR", id, None, async { Err::<(), _>("network down") })
            .await
            .unwrap_err();
        assert_eq!(err.into_operation(), Some("network down"));
        assert_eq!(names(&stored(&timer, id)), vec!["OCR (failed)"]);
    }

    #[tokio::test]
    async fn test_measure_unknown_session() {
        let timer = timer();
        let mut ran = false;
        let err = timer
            .measure("Capture", SessionId::new(), None, async {
                ran = true;
                Ok::<_, String>(())
            })
            .await
            .unwrap_err();
        assert!(err.is_session_not_found());
        assert!(!ran);
    }

    #[tokio::test]
    async fn test_dropped_measure_logs_cancelled() {
        let timer = timer();
        let id = timer.logger().start_session();
        {
            let fut = timer.measure("Upload", id, None, async {
                futures::future::pending::<Result<(), String>>().await
            });
            futures::pin_mut!(fut);
            assert!(fut.as_mut().now_or_never().is_none());
        }
        assert_eq!(names(&stored(&timer, id)), vec!["Upload (cancelled)"]);
    }

    #[tokio::test]
    async fn test_timeout_logs_failed() {
        let timer = timer();
        let id = timer.logger().start_session();
        let err = timer
            .measure_with_timeout("Gemini", id, None, Duration::from_millis(10), async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, String>(())
            })
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(names(&stored(&timer, id)), vec!["Gemini (failed)"]);
    }

    #[tokio::test]
    async fn test_timeout_within_window() {
        let timer = timer();
        let id = timer.logger().start_session();
        let value = timer
            .measure_with_timeout("Gemini", id, None, Duration::from_secs(5), async {
                Ok::<_, String>("text")
            })
            .await
            .unwrap();
        assert_eq!(value, "text");
        assert_eq!(names(&stored(&timer, id)), vec!["Gemini"]);
    }

    #[tokio::test]
    async fn test_conditional_returns_raw_result() {
        let timer = timer();
        let id = timer.logger().start_session();
        let text = timer
            .measure_conditional("OCR", id, None, async { String::new() }, |s| !s.is_empty())
            .await
            .unwrap();
        assert_eq!(text, "");
        let ok = timer
            .measure_conditional("OCR", id, None, async { 3 }, |n| *n > 0)
            .await
            .unwrap();
        assert_eq!(ok, 3);
        assert_eq!(
            names(&stored(&timer, id)),
            vec!["OCR (condition failed)", "OCR"]
        );
    }

    #[tokio::test]
    async fn test_sequence_stops_at_first_failure() {
        let timer = timer();
        let id = timer.logger().start_session();
        let steps: Vec<Step<'_, u32, String>> = vec![
            ("Resize".to_string(), async { Ok::<_, String>(1) }.boxed()),
            (
                "Encode".to_string(),
                async { Err::<u32, _>("bad jpeg".to_string()) }.boxed(),
            ),
            ("Upload".to_string(), async { Ok::<_, String>(3) }.boxed()),
        ];
        let err = timer.measure_sequence(id, steps).await.unwrap_err();
        assert_eq!(err.into_operation().as_deref(), Some("bad jpeg"));
        assert_eq!(names(&stored(&timer, id)), vec!["Resize", "Encode (failed)"]);
    }

    #[tokio::test]
    async fn test_sequence_collects_results() {
        let timer = timer();
        let id = timer.logger().start_session();
        let steps: Vec<Step<'_, u32, String>> = vec![
            ("Resize".to_string(), async { Ok::<_, String>(1) }.boxed()),
            ("Encode".to_string(), async { Ok::<_, String>(2) }.boxed()),
        ];
        let results = timer.measure_sequence(id, steps).await.unwrap();
        assert_eq!(results, vec![1, 2]);
    }

    #[test]
    fn test_manual_timing_failure_marker() {
        let timer = timer();
        let id = timer.logger().start_session();
        let token = timer.start_timing("X", id);
        timer.end_timing(token, false);

        let session = stored(&timer, id);
        let name = &session.entries()[0].operation;
        assert!(name.contains('X'));
        assert!(name.contains("failed"));
    }

    #[test]
    fn test_manual_timing_with_error_and_model() {
        let timer = timer();
        let id = timer.logger().start_session();
        let token = timer
            .start_timing("Extract", id)
            .with_model_info(ModelInfo::new("Gemini", "gemini-2.5-flash"));
        timer.end_timing_with_error(token, &"quota exceeded");

        let session = stored(&timer, id);
        let entry = &session.entries()[0];
        assert_eq!(entry.operation, "Extract (failed)");
        assert_eq!(entry.model_info.as_ref().unwrap().service, "Gemini");
    }

    #[test]
    fn test_batch_tags_failures() {
        let timer = timer();
        let id = timer.logger().start_session();
        let logged = timer.log_batch(
            id,
            vec![
                BatchEntry::new("Capture", 0.1, true),
                BatchEntry::new("Extract", 1.5, false)
                    .with_model_info(ModelInfo::new("Gemini", "gemini-2.5-flash")),
                BatchEntry::new("Bogus", -1.0, true),
            ],
        );
        assert_eq!(logged, 2);

        let session = stored(&timer, id);
        assert_eq!(names(&session), vec!["Capture", "Extract (failed)"]);
        assert_eq!(session.entries()[1].duration_secs, 1.5);
    }
}
