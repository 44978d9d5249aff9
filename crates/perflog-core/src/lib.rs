//! Concurrent, bounded recorder of timed operations grouped into sessions

mod config;
mod error;
mod formatter;
mod logger;
mod query;
mod registry;
mod store;
mod timing;

pub use config::Config;
pub use error::{MeasureError, PerfError, Result};
pub use formatter::{format_entry, format_sessions};
pub use logger::PerfLogger;
pub use query::{LogQuery, LogSummary, OperationStats};
pub use registry::{LogOutcome, RejectReason, SessionRegistry};
pub use store::{SessionStore, SnapshotWriter, StorageInfo, StoreSnapshot};
pub use timing::{BatchEntry, Step, Timer, TimingToken};

pub use perflog_telemetry::{
    DeviceContext, DeviceProbe, FixedProbe, HostProbe, ImageMetadata, LogEntry, ModelInfo,
    Session, SessionId, ThermalState,
};
