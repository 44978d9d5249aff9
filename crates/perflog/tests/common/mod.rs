use perflog_core::{Config, ImageMetadata, ModelInfo, PerfLogger};
use perflog_telemetry::Paths;

pub fn open(paths: &Paths) -> PerfLogger {
    let config = Config::new().with_storage_path(paths.sessions_file());
    PerfLogger::open(&config).unwrap()
}

pub fn gemini_with_image() -> ModelInfo {
    ModelInfo::new("Gemini", "gemini-2.5-flash")
        .with_config("temperature", "0.2")
        .with_image(ImageMetadata {
            original_width: 4032,
            original_height: 3024,
            processed_width: 1512,
            processed_height: 1134,
            original_bytes: 3_100_000,
            processed_bytes: 410_000,
            compression_quality: 0.7,
            format: "jpeg".to_string(),
        })
}
