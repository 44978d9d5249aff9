//! Plain-text rendering of stored sessions

use perflog_telemetry::{DeviceContext, ImageMetadata, LogEntry, ModelInfo, Session};
use std::collections::BTreeMap;
use std::fmt::Write;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Render sessions (most recent first) as a shareable text report
///
/// The generation time is taken from `device.captured_at`, so the output is
/// a pure function of its inputs.
pub fn format_sessions(sessions: &[Session], device: &DeviceContext) -> String {
    let mut sections = vec![format_header(sessions.len(), device)];

    if sessions.is_empty() {
        sections.push("No sessions recorded.".to_string());
        return sections.join("\n");
    }

    let total = sessions.len();
    for (index, session) in sessions.iter().enumerate() {
        sections.push(format_session(session, index + 1, total));
    }

    sections.push(format_image_summary(sessions));
    sections.join("\n")
}

fn format_header(count: usize, device: &DeviceContext) -> String {
    let battery = match device.battery() {
        Some(level) => format!("{:.0}%", level * 100.0),
        None => "unknown".to_string(),
    };
    format!(
        "Performance Logs\n================\n\
         Generated: {}\n\
         Device: {} | OS {} | App {}\n\
         Memory: {} | Battery: {} | Thermal: {}\n\
         Sessions: {}\n",
        device.captured_at.format(TIMESTAMP_FORMAT),
        device.device_model,
        device.os_version,
        device.app_version,
        device.memory_pressure,
        battery,
        device.thermal_state,
        count,
    )
}

fn format_session(session: &Session, position: usize, total: usize) -> String {
    let status = if session.is_completed() {
        "completed"
    } else {
        "active"
    };
    let mut out = format!(
        "Session {}/{} [{}] {} ({})\n",
        position,
        total,
        session.id().short(),
        session.started_at().format(TIMESTAMP_FORMAT),
        status,
    );

    for entry in session.entries() {
        let _ = writeln!(out, "  {}", format_entry(entry));
    }

    let _ = writeln!(
        out,
        "  Total: {:.3}s across {} operations",
        session.total_duration(),
        session.entries().len()
    );
    out
}

/// `"<name>: <secs>s"` plus model and image annotations when present
pub fn format_entry(entry: &LogEntry) -> String {
    let mut line = format!("{}: {:.3}s", entry.operation, entry.duration_secs);
    if let Some(model) = &entry.model_info {
        let _ = write!(line, " | {}/{}", model.service, model.model);
        match &model.image {
            Some(image) => {
                let _ = write!(line, " | {}", format_image(image, model));
            }
            None if !model.configuration.is_empty() => {
                let _ = write!(line, " | {}", format_config(&model.configuration));
            }
            None => {}
        }
    }
    line
}

fn format_image(image: &ImageMetadata, model: &ModelInfo) -> String {
    let mut out = format!(
        "img: {}x{} compressed {:.0}% from {}x{}",
        image.processed_width,
        image.processed_height,
        image.compression_quality * 100.0,
        image.original_width,
        image.original_height,
    );
    if !model.configuration.is_empty() {
        let _ = write!(out, ", {}", format_config(&model.configuration));
    }
    out
}

fn format_config(config: &BTreeMap<String, String>) -> String {
    config
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

fn format_image_summary(sessions: &[Session]) -> String {
    let images: Vec<&ImageMetadata> = sessions
        .iter()
        .flat_map(|s| s.entries())
        .filter_map(|e| e.model_info.as_ref()?.image.as_ref())
        .collect();

    let mut out = "Image Summary\n-------------\n".to_string();
    let _ = writeln!(out, "Entries with image metadata: {}", images.len());

    if images.is_empty() {
        out.push_str("Average compression ratio: n/a\n");
        out.push_str("Average resolution kept: n/a\n");
        return out;
    }

    let n = images.len() as f64;
    let avg_ratio = images.iter().map(|i| i.compression_ratio()).sum::<f64>() / n;
    let avg_resolution = images.iter().map(|i| i.resolution_reduction()).sum::<f64>() / n;
    let original: u64 = images.iter().map(|i| i.original_bytes).sum();
    let processed: u64 = images.iter().map(|i| i.processed_bytes).sum();

    let _ = writeln!(out, "Average compression ratio: {:.1}%", avg_ratio * 100.0);
    let _ = writeln!(out, "Average resolution kept: {:.1}%", avg_resolution * 100.0);
    let _ = writeln!(out, "Bytes: {} original -> {} processed", original, processed);
    out
}
