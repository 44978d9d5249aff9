//! Device context snapshots

use crate::types::{DeviceContext, ThermalState};
use chrono::{DateTime, Utc};

/// Source of device context snapshots attached to sessions and entries
pub trait DeviceProbe: Send + Sync {
    fn snapshot(&self) -> DeviceContext;
}

/// Probe describing the host the process runs on
///
/// Static fields are resolved once at construction so taking a snapshot
/// never touches the filesystem.
#[derive(Debug, Clone)]
pub struct HostProbe {
    device_model: String,
    os_version: String,
    app_version: String,
}

impl HostProbe {
    pub fn new(app_version: impl Into<String>) -> Self {
        Self {
            device_model: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
            os_version: detect_os_version(),
            app_version: app_version.into(),
        }
    }
}

impl DeviceProbe for HostProbe {
    fn snapshot(&self) -> DeviceContext {
        DeviceContext {
            device_model: self.device_model.clone(),
            os_version: self.os_version.clone(),
            app_version: self.app_version.clone(),
            captured_at: Utc::now(),
            memory_pressure: "unknown".to_string(),
            battery_level: -1.0,
            thermal_state: ThermalState::Unknown,
        }
    }
}

fn detect_os_version() -> String {
    std::fs::read_to_string("/proc/sys/kernel/osrelease")
        .map(|s| s.trim().to_string())
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| std::env::consts::OS.to_string())
}

/// Probe returning the same context every time, with a pinned timestamp
#[derive(Debug, Clone)]
pub struct FixedProbe {
    context: DeviceContext,
}

impl FixedProbe {
    pub fn new(context: DeviceContext) -> Self {
        Self { context }
    }

    pub fn at(captured_at: DateTime<Utc>) -> Self {
        Self::new(DeviceContext {
            device_model: "test-device".to_string(),
            os_version: "1.0".to_string(),
            app_version: "0.0.0".to_string(),
            captured_at,
            memory_pressure: "normal".to_string(),
            battery_level: 1.0,
            thermal_state: ThermalState::Normal,
        })
    }
}

impl DeviceProbe for FixedProbe {
    fn snapshot(&self) -> DeviceContext {
        self.context.clone()
    }
}
