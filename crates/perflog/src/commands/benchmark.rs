use perflog_core::{Config, LogSummary, ModelInfo, PerfLogger, StorageInfo, Timer};
use std::time::{Duration, Instant};

const STEPS: [&str; 4] = ["Capture", "Preprocess", "Extract", "Export"];

struct BenchmarkResult {
    sessions: usize,
    operations: usize,
    logged: usize,
    failed: usize,
    elapsed: Duration,
    storage: StorageInfo,
}

impl BenchmarkResult {
    fn ops_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.logged as f64 / secs
        } else {
            0.0
        }
    }
}

fn format_result(r: &BenchmarkResult) -> String {
    format!(
        "Perflog Benchmark\n=================\n\
         Sessions: {}\n\
         Operations per session: {}\n\
         Entries logged: {} ({} failed)\n\
         Elapsed: {:.3}s\n\
         Throughput: {:.0} ops/s\n\n\
         Store:\n\
         {:>6} sessions (max {})\n\
         {:>6} bytes (max {})",
        r.sessions,
        r.operations,
        r.logged,
        r.failed,
        r.elapsed.as_secs_f64(),
        r.ops_per_sec(),
        r.storage.session_count,
        r.storage.max_sessions,
        r.storage.estimated_size_bytes,
        r.storage.max_size_bytes,
    )
}

async fn run_session(timer: Timer, operations: usize) {
    let sid = timer.logger().start_session();
    let model = ModelInfo::new("Gemini", "gemini-2.5-flash");

    for n in 0..operations {
        let step = STEPS[n % STEPS.len()];
        let model_info = (step == "Extract").then(|| model.clone());
        // every 10th operation fails
        let _ = timer
            .measure(step, sid, model_info, async move {
                tokio::task::yield_now().await;
                if n % 10 == 9 {
                    Err("synthetic failure")
                } else {
                    Ok(n)
                }
            })
            .await;
    }

    timer.logger().end_session(sid);
}

fn run_workload(sessions: usize, operations: usize) -> anyhow::Result<BenchmarkResult> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let config = Config {
        max_sessions: sessions.max(1),
        max_size_bytes: usize::MAX,
        ..Config::new()
    };
    let logger = PerfLogger::new(&config);
    let timer = Timer::new(logger.clone());

    let start = Instant::now();
    runtime.block_on(async {
        let handles: Vec<_> = (0..sessions)
            .map(|_| tokio::spawn(run_session(timer.clone(), operations)))
            .collect();
        for handle in handles {
            handle.await?;
        }
        Ok::<_, anyhow::Error>(())
    })?;
    let elapsed = start.elapsed();

    let query = logger.query();
    let summary: LogSummary = query.summary();
    Ok(BenchmarkResult {
        sessions,
        operations,
        logged: summary.entry_count,
        failed: summary.failed_entry_count,
        elapsed,
        storage: query.storage_info(),
    })
}

pub fn run(sessions: usize, operations: usize) -> anyhow::Result<()> {
    let result = run_workload(sessions, operations)?;
    println!("{}", format_result(&result));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workload_logs_every_operation() {
        let result = run_workload(4, 20).unwrap();
        assert_eq!(result.logged, 80);
        assert_eq!(result.failed, 8);
        assert_eq!(result.storage.session_count, 4);
    }

    #[test]
    fn test_benchmark_output_format() {
        let result = BenchmarkResult {
            sessions: 8,
            operations: 100,
            logged: 800,
            failed: 80,
            elapsed: Duration::from_millis(250),
            storage: StorageInfo {
                session_count: 8,
                estimated_size_bytes: 12000,
                max_size_bytes: 2 * 1024 * 1024,
                max_sessions: 50,
            },
        };
        let output = format_result(&result);
        assert!(output.contains("Entries logged: 800 (80 failed)"));
        assert!(output.contains("3200 ops/s"));
        assert!(output.contains("Elapsed: 0.250s"));
    }
}
