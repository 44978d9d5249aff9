use perflog_telemetry::Paths;

pub fn run() -> anyhow::Result<()> {
    let paths = Paths::new()?;
    println!("{}", build_status(&paths)?);
    Ok(())
}

fn build_status(paths: &Paths) -> anyhow::Result<serde_json::Value> {
    let logger = super::open_logger(paths)?;
    let query = logger.query();
    let info = query.storage_info();
    let summary = query.summary();

    let mut output = serde_json::json!({
        "storage": info,
        "path": paths.sessions_file(),
        "sessions": summary.session_count,
        "operations": summary.entry_count,
        "failed": summary.failed_entry_count,
        "total_secs": summary.total_duration_secs,
    });

    if let Some((name, secs)) = &summary.slowest {
        output["slowest"] = serde_json::json!({ "operation": name, "secs": secs });
    }

    let per_operation: serde_json::Map<String, serde_json::Value> = summary
        .per_operation
        .iter()
        .map(|(name, stats)| {
            (
                name.clone(),
                serde_json::json!({
                    "count": stats.count,
                    "mean_secs": stats.mean_secs(),
                    "max_secs": stats.max_secs,
                }),
            )
        })
        .collect();
    output["per_operation"] = serde_json::Value::Object(per_operation);

    Ok(output)
}
