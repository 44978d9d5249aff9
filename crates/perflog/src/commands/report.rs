use perflog_telemetry::Paths;

pub fn run(limit: usize) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    println!("{}", build_report(&paths, limit)?);
    Ok(())
}

fn build_report(paths: &Paths, limit: usize) -> anyhow::Result<String> {
    let logger = super::open_logger(paths)?;
    Ok(logger.query().formatted_logs(limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use perflog_core::ModelInfo;

    #[test]
    fn test_report_empty_store() {
        let temp = tempfile::TempDir::new().unwrap();
        let report = build_report(&Paths::with_root(temp.path()), 10).unwrap();
        assert!(report.contains("Performance Logs"));
        assert!(report.contains("No sessions recorded."));
    }

    #[test]
    fn test_report_reads_persisted_sessions() {
        let temp = tempfile::TempDir::new().unwrap();
        let paths = Paths::with_root(temp.path());
        {
            let logger = super::super::open_logger(&paths).unwrap();
            let sid = logger.start_session();
            logger.log_operation("Capture", 0.123, sid, None);
            logger.log_operation(
                "Extract",
                2.89,
                sid,
                Some(ModelInfo::new("Gemini", "gemini-2.5-flash")),
            );
            logger.end_session(sid);
        }

        let report = build_report(&paths, 10).unwrap();
        assert!(report.contains("Capture: 0.123s"));
        assert!(report.contains("Extract: 2.890s | Gemini/gemini-2.5-flash"));
        assert!(report.contains("Sessions: 1"));
    }

    #[test]
    fn test_report_limit() {
        let temp = tempfile::TempDir::new().unwrap();
        let paths = Paths::with_root(temp.path());
        let logger = super::super::open_logger(&paths).unwrap();
        for name in ["First", "Second", "Third"] {
            let sid = logger.start_session();
            logger.log_operation(name, 0.5, sid, None);
            logger.end_session(sid);
        }

        let report = build_report(&paths, 2).unwrap();
        assert!(report.contains("Third: 0.500s"));
        assert!(report.contains("Second: 0.500s"));
        assert!(!report.contains("First"));
    }
}
