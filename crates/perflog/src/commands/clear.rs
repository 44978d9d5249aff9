use perflog_telemetry::Paths;

pub fn run(old_only: bool) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let removed = clear(&paths, old_only)?;
    if old_only {
        println!("Evicted {} session(s) over the storage caps", removed);
    } else {
        println!("Deleted {} stored session(s)", removed);
    }
    Ok(())
}

fn clear(paths: &Paths, old_only: bool) -> anyhow::Result<usize> {
    let logger = super::open_logger(paths)?;
    if old_only {
        return Ok(logger.clear_old_logs_only());
    }
    let count = logger.query().storage_info().session_count;
    logger.clear_all();
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(paths: &Paths, count: usize) {
        let logger = super::super::open_logger(paths).unwrap();
        for _ in 0..count {
            let sid = logger.start_session();
            logger.log_operation("Capture", 0.1, sid, None);
            logger.end_session(sid);
        }
    }

    #[test]
    fn test_clear_all() {
        let temp = tempfile::TempDir::new().unwrap();
        let paths = Paths::with_root(temp.path());
        seed(&paths, 3);

        assert_eq!(clear(&paths, false).unwrap(), 3);
        let logger = super::super::open_logger(&paths).unwrap();
        assert_eq!(logger.query().storage_info().session_count, 0);
    }

    #[test]
    fn test_clear_old_only_under_caps_keeps_everything() {
        let temp = tempfile::TempDir::new().unwrap();
        let paths = Paths::with_root(temp.path());
        seed(&paths, 3);

        assert_eq!(clear(&paths, true).unwrap(), 0);
        let logger = super::super::open_logger(&paths).unwrap();
        assert_eq!(logger.query().storage_info().session_count, 3);
    }

    #[test]
    fn test_clear_old_only_after_lowering_cap() {
        let temp = tempfile::TempDir::new().unwrap();
        let paths = Paths::with_root(temp.path());
        seed(&paths, 5);
        std::fs::write(paths.config_file(), r#"{"max_sessions": 2}"#).unwrap();

        assert_eq!(clear(&paths, true).unwrap(), 3);
        let logger = super::super::open_logger(&paths).unwrap();
        assert_eq!(logger.query().storage_info().session_count, 2);
    }
}
