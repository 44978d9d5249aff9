//! JSONL record I/O and atomic file operations

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Read all records from a JSONL file
///
/// Lines are read as raw bytes; any line that is not a valid record,
/// including invalid UTF-8, is skipped with a warning.
pub fn read_jsonl<T: for<'de> Deserialize<'de>>(path: &Path) -> std::io::Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for (index, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match serde_json::from_slice(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    line = index + 1,
                    error = %e,
                    "discarding malformed record"
                );
            }
        }
    }

    Ok(records)
}

/// Replace a JSONL file with the given records, atomically
pub fn write_jsonl<'a, T, I>(path: &Path, records: I) -> std::io::Result<()>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut buf = String::new();
    for record in records {
        buf.push_str(&serde_json::to_string(record)?);
        buf.push('\n');
    }
    atomic_write(path, buf.as_bytes())
}

/// Write data atomically using temp file + rename
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, data)?;
    std::fs::rename(temp_path, path)?;
    Ok(())
}
