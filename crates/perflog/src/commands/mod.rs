pub mod benchmark;
pub mod clear;
pub mod report;
pub mod status;
pub mod version;

use perflog_core::{Config, PerfLogger};
use perflog_telemetry::Paths;

/// Open the persistent logger described by `paths`
pub fn open_logger(paths: &Paths) -> anyhow::Result<PerfLogger> {
    let mut config = Config::load(&paths.config_file())?;
    if config.storage_path.is_none() {
        config.storage_path = Some(paths.sessions_file());
    }
    Ok(PerfLogger::open(&config)?)
}
