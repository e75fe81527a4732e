//! Tolerant reading and in-place rewriting of delimited feed files

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use encoding_rs::SHIFT_JIS;

use super::columns::{find_column, NAME_HEADERS};
use crate::error::AppResult;

/// UTF-8 byte-order mark written at the head of every file we produce
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A delimited table read from a feed, cells kept verbatim
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl FeedTable {
    /// A table with headers but no data rows counts as empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell text, empty for ragged rows
    pub fn cell(row: &[String], index: usize) -> &str {
        row.get(index).map(String::as_str).unwrap_or("")
    }
}

/// First candidate that exists, else the first candidate
pub fn resolve_path(candidates: &[PathBuf]) -> PathBuf {
    candidates
        .iter()
        .find(|p| p.exists())
        .or_else(|| candidates.first())
        .cloned()
        .unwrap_or_default()
}

/// Read a feed; any failure yields an empty table
pub fn read_table(path: &Path) -> FeedTable {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            if path.exists() {
                tracing::warn!("Unreadable feed {}: {}", path.display(), e);
            } else {
                tracing::debug!("Feed {} not found, treating as empty", path.display());
            }
            return FeedTable::default();
        }
    };

    parse_table(&decode(&bytes))
}

/// Decode feed bytes, trying UTF-8 (BOM stripped) then Shift_JIS (cp932).
///
/// Bytes valid in neither are decoded lossily as UTF-8.
pub fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    if let Some(s) = SHIFT_JIS.decode_without_bom_handling_and_without_replacement(bytes) {
        tracing::debug!("Feed decoded as {}", SHIFT_JIS.name());
        return s.into_owned();
    }

    tracing::warn!("Feed is neither UTF-8 nor {}; decoding lossily", SHIFT_JIS.name());
    String::from_utf8_lossy(bytes).into_owned()
}

pub fn parse_table(text: &str) -> FeedTable {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(str::to_string).collect(),
        Err(e) => {
            tracing::warn!("Unparseable feed header: {}", e);
            return FeedTable::default();
        }
    };

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        match record {
            Ok(record) => {
                if record.iter().all(|c| c.trim().is_empty()) {
                    continue;
                }
                rows.push(record.iter().map(str::to_string).collect());
            }
            Err(e) => tracing::warn!("Skipping feed row {}: {}", line + 1, e),
        }
    }

    FeedTable { headers, rows }
}

/// Rewrite `path` with `table` as UTF-8 with BOM.
///
/// The table is written to a sibling temp file first and renamed over the
/// feed.
pub fn write_table(path: &Path, table: &FeedTable) -> AppResult<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(UTF8_BOM)?;
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);
        writer.write_record(&table.headers)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Copy `path` to `<dir>/backup/<prefix>_<timestamp><ext>`.
///
/// Best effort: returns `None` when the source is missing or the copy fails.
pub fn backup_file(path: &Path, prefix: &str) -> Option<PathBuf> {
    if !path.exists() {
        return None;
    }

    let backup_dir = path.parent().unwrap_or_else(|| Path::new(".")).join("backup");
    let ts = Utc::now().format("%Y%m%d_%H%M%S");
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let dst = backup_dir.join(format!("{}_{}{}", prefix, ts, ext));

    let result = fs::create_dir_all(&backup_dir).and_then(|_| fs::copy(path, &dst));
    match result {
        Ok(_) => {
            tracing::info!("Backed up {} to {}", path.display(), dst.display());
            Some(dst)
        }
        Err(e) => {
            tracing::warn!("Backup of {} failed: {}", path.display(), e);
            None
        }
    }
}

/// Copy a backup taken by [`backup_file`] back over `path`
pub fn restore_backup(backup: &Path, path: &Path) -> AppResult<()> {
    fs::copy(backup, path)?;
    tracing::warn!("Restored {} from {}", path.display(), backup.display());
    Ok(())
}

/// Modification time in Unix seconds, 0 when unavailable
pub fn file_mtime(path: &Path) -> i64 {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Names from the roster feed: the `name` column or else the first column
pub fn load_names(path: &Path) -> Vec<String> {
    let table = read_table(path);
    if table.headers.is_empty() {
        return Vec::new();
    }
    let col = find_column(&table.headers, NAME_HEADERS).unwrap_or(0);

    table
        .rows
        .iter()
        .map(|row| FeedTable::cell(row, col).trim())
        .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case("nan"))
        .map(str::to_string)
        .collect()
}
