//! Record types, device snapshots and storage I/O for performance logs

mod device;
mod io;
mod paths;
mod types;

pub use device::{DeviceProbe, FixedProbe, HostProbe};
pub use io::{atomic_write, read_jsonl, write_jsonl};
pub use paths::Paths;
pub use types::{
    DeviceContext, ImageMetadata, LogEntry, ModelInfo, Session, SessionId, ThermalState,
    CANCELLED_MARKER, CONDITION_FAILED_MARKER, FAILED_MARKER,
};
