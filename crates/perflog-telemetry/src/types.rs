//! Performance log record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Suffix appended to an operation name whose unit of work failed
pub const FAILED_MARKER: &str = " (failed)";

/// Suffix appended when a result did not satisfy its success predicate
pub const CONDITION_FAILED_MARKER: &str = " (condition failed)";

/// Suffix appended when a measured future was dropped before completing
pub const CANCELLED_MARKER: &str = " (cancelled)";

// Upper bounds on the JSON framing of each record, excluding free-form strings
const SESSION_OVERHEAD_BYTES: usize = 192;
const ENTRY_OVERHEAD_BYTES: usize = 168;
const DEVICE_OVERHEAD_BYTES: usize = 192;
const MODEL_OVERHEAD_BYTES: usize = 64;
const CONFIG_PAIR_OVERHEAD_BYTES: usize = 6;
const IMAGE_OVERHEAD_BYTES: usize = 264;

/// Unique identifier of a logging session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex characters, enough to tell sessions apart in a report
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThermalState {
    Normal,
    Fair,
    Serious,
    Critical,
    #[default]
    Unknown,
}

impl fmt::Display for ThermalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ThermalState::Normal => "normal",
            ThermalState::Fair => "fair",
            ThermalState::Serious => "serious",
            ThermalState::Critical => "critical",
            ThermalState::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Snapshot of the device the operation ran on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceContext {
    pub device_model: String,
    pub os_version: String,
    pub app_version: String,
    pub captured_at: DateTime<Utc>,
    #[serde(default = "unknown_label")]
    pub memory_pressure: String,
    /// Battery charge in `0.0..=1.0`, or `-1.0` when unknown
    #[serde(default = "unknown_battery")]
    pub battery_level: f32,
    #[serde(default)]
    pub thermal_state: ThermalState,
}

fn unknown_label() -> String {
    "unknown".to_string()
}

fn unknown_battery() -> f32 {
    -1.0
}

impl DeviceContext {
    pub fn battery(&self) -> Option<f32> {
        if self.battery_level < 0.0 {
            None
        } else {
            Some(self.battery_level)
        }
    }

    /// Stored footprint of one serialized snapshot
    pub fn estimated_size_bytes(&self) -> usize {
        DEVICE_OVERHEAD_BYTES
            + self.device_model.len()
            + self.os_version.len()
            + self.app_version.len()
            + self.memory_pressure.len()
    }
}

/// Image dimensions and sizes before and after preprocessing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub original_width: u32,
    pub original_height: u32,
    pub processed_width: u32,
    pub processed_height: u32,
    pub original_bytes: u64,
    pub processed_bytes: u64,
    /// Encoder quality in `0.0..=1.0`
    pub compression_quality: f64,
    pub format: String,
}

impl ImageMetadata {
    pub fn original_pixels(&self) -> u64 {
        u64::from(self.original_width) * u64::from(self.original_height)
    }

    pub fn processed_pixels(&self) -> u64 {
        u64::from(self.processed_width) * u64::from(self.processed_height)
    }

    /// `processed_bytes / original_bytes`, 0 when the original size is unknown
    pub fn compression_ratio(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        self.processed_bytes as f64 / self.original_bytes as f64
    }

    /// `processed_pixels / original_pixels`, 0 when the original size is unknown
    pub fn resolution_reduction(&self) -> f64 {
        let original = self.original_pixels();
        if original == 0 {
            return 0.0;
        }
        self.processed_pixels() as f64 / original as f64
    }
}

/// Backend and model that serviced an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub service: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub configuration: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageMetadata>,
}

impl ModelInfo {
    pub fn new(service: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            model: model.into(),
            configuration: BTreeMap::new(),
            image: None,
        }
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.configuration.insert(key.into(), value.into());
        self
    }

    pub fn with_image(mut self, image: ImageMetadata) -> Self {
        self.image = Some(image);
        self
    }

    fn estimated_size_bytes(&self) -> usize {
        let config: usize = self
            .configuration
            .iter()
            .map(|(k, v)| CONFIG_PAIR_OVERHEAD_BYTES + k.len() + v.len())
            .sum();
        let image = self
            .image
            .as_ref()
            .map_or(0, |i| IMAGE_OVERHEAD_BYTES + i.format.len());
        MODEL_OVERHEAD_BYTES + self.service.len() + self.model.len() + config + image
    }
}

/// One timed, named operation inside a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub operation: String,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_info: Option<ModelInfo>,
    pub device: DeviceContext,
}

impl LogEntry {
    /// Whether the operation name carries one of the failure markers
    pub fn is_failure(&self) -> bool {
        [FAILED_MARKER, CONDITION_FAILED_MARKER, CANCELLED_MARKER]
            .iter()
            .any(|marker| self.operation.ends_with(marker))
    }

    pub fn estimated_size_bytes(&self) -> usize {
        ENTRY_OVERHEAD_BYTES
            + self.operation.len()
            + self.device.estimated_size_bytes()
            + self
                .model_info
                .as_ref()
                .map_or(0, ModelInfo::estimated_size_bytes)
    }
}

/// A bounded unit of related timed operations
///
/// Entries can only be appended while the session is active; once
/// [`Session::complete`] runs the entry list is frozen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    started_at: DateTime<Utc>,
    #[serde(default)]
    ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    entries: Vec<LogEntry>,
    device: DeviceContext,
}

impl Session {
    pub fn new(device: DeviceContext) -> Self {
        Self {
            id: SessionId::new(),
            started_at: device.captured_at,
            ended_at: None,
            completed: false,
            entries: Vec::new(),
            device,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn device(&self) -> &DeviceContext {
        &self.device
    }

    /// Append an entry; returns false once the session is completed
    pub fn push_entry(&mut self, entry: LogEntry) -> bool {
        if self.completed {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Freeze the session and stamp its end time
    pub fn complete(&mut self, at: DateTime<Utc>) {
        if self.completed {
            return;
        }
        self.completed = true;
        self.ended_at = Some(at);
    }

    /// Sum of entry durations in seconds
    pub fn total_duration(&self) -> f64 {
        self.entries.iter().map(|e| e.duration_secs).sum()
    }

    /// Wall-clock span between start and end, once completed
    pub fn wall_clock_duration(&self) -> Option<f64> {
        self.ended_at
            .map(|end| (end - self.started_at).num_milliseconds() as f64 / 1000.0)
    }

    /// Deterministic estimate of the session's stored footprint
    ///
    /// Never less than the length of its JSONL line as long as names and
    /// labels need no JSON escaping.
    pub fn estimated_size_bytes(&self) -> usize {
        SESSION_OVERHEAD_BYTES
            + self.device.estimated_size_bytes()
            + self
                .entries
                .iter()
                .map(LogEntry::estimated_size_bytes)
                .sum::<usize>()
    }
}
