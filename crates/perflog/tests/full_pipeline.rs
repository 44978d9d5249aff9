mod common;

use perflog_core::{BatchEntry, Timer};
use perflog_telemetry::Paths;
use serial_test::serial;
use std::time::Duration;

#[tokio::test]
async fn test_capture_to_export_pipeline_survives_restart() {
    let temp = tempfile::TempDir::new().unwrap();
    let paths = Paths::with_root(temp.path());

    let sid = {
        let logger = common::open(&paths);
        let timer = Timer::new(logger.clone());
        let sid = logger.start_session();

        let image = timer
            .measure("Capture", sid, None, async { Ok::<_, String>(vec![0u8; 16]) })
            .await
            .unwrap();
        let text = timer
            .measure_with_timeout(
                "Extract",
                sid,
                Some(common::gemini_with_image()),
                Duration::from_secs(5),
                async move { Ok::<_, String>(format!("{} bytes of text", image.len())) },
            )
            .await
            .unwrap();
        let exported = timer
            .measure_conditional("Export", sid, None, async { text.len() }, |n| *n > 0)
            .await
            .unwrap();
        assert!(exported > 0);

        logger.end_session(sid);
        sid
    };

    let logger = common::open(&paths);
    let session = logger.query().recent_sessions(1).remove(0);
    assert_eq!(session.id(), sid);
    let names: Vec<_> = session
        .entries()
        .iter()
        .map(|e| e.operation.as_str())
        .collect();
    assert_eq!(names, vec!["Capture", "Extract", "Export"]);

    let report = logger.query().formatted_logs(10);
    assert!(report.contains(
        "Gemini/gemini-2.5-flash | img: 1512x1134 compressed 70% from 4032x3024, temperature=0.2"
    ));
    assert!(report.contains("Entries with image metadata: 1"));
}

#[test]
fn test_batch_import_and_failure_counts() {
    let temp = tempfile::TempDir::new().unwrap();
    let logger = common::open(&Paths::with_root(temp.path()));
    let timer = Timer::new(logger.clone());

    let sid = logger.start_session();
    timer.log_batch(
        sid,
        vec![
            BatchEntry::new("Capture", 0.12, true),
            BatchEntry::new("Extract", 2.5, false).with_model_info(common::gemini_with_image()),
            BatchEntry::new("Export", 0.3, true),
        ],
    );
    logger.end_session(sid);

    let summary = logger.query().summary();
    assert_eq!(summary.entry_count, 3);
    assert_eq!(summary.failed_entry_count, 1);
    assert_eq!(summary.slowest, Some(("Extract (failed)".to_string(), 2.5)));
}

#[test]
#[serial]
fn test_default_paths_follow_perflog_home() {
    let temp = tempfile::TempDir::new().unwrap();
    let original = std::env::var_os("PERFLOG_HOME");
    std::env::set_var("PERFLOG_HOME", temp.path());

    let paths = Paths::new().unwrap();

    match original {
        Some(value) => std::env::set_var("PERFLOG_HOME", value),
        None => std::env::remove_var("PERFLOG_HOME"),
    }

    assert_eq!(paths.sessions_file(), temp.path().join("sessions.jsonl"));
    let logger = common::open(&paths);
    let sid = logger.start_session();
    logger.log_operation("Capture", 0.1, sid, None);
    logger.end_session(sid);
    assert!(temp.path().join("sessions.jsonl").exists());
}
