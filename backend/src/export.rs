//! Timestamp-named CSV artifacts written to the exports directory

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::AppResult;
use crate::feed::loader::UTF8_BOM;

/// `YYYYmmdd_HHMMSS`, used in export and backup file names
pub fn file_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// Write a header plus rows as UTF-8 with BOM into `dir/file_name`
pub fn write_artifact<R, C>(dir: &Path, file_name: &str, header: &[&str], rows: R) -> AppResult<PathBuf>
where
    R: IntoIterator<Item = Vec<C>>,
    C: AsRef<[u8]>,
{
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);

    let mut file = fs::File::create(&path)?;
    file.write_all(UTF8_BOM)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(header)?;
    let mut count = 0usize;
    for row in rows {
        writer.write_record(&row)?;
        count += 1;
    }
    writer.flush()?;

    tracing::info!("Exported {} rows to {}", count, path.display());
    Ok(path)
}

/// Most recently modified `<prefix>_*.csv` in `dir`
pub fn latest_artifact(dir: &Path, prefix: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let head = format!("{}_", prefix);

    entries
        .filter_map(Result::ok)
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with(&head) && name.ends_with(".csv")
        })
        .filter_map(|entry| {
            let modified = entry.metadata().and_then(|m| m.modified()).ok()?;
            Some((modified, entry.path()))
        })
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
        .map(|(_, path)| path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_timestamp_format() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 9, 5, 3).unwrap();
        assert_eq!(file_timestamp(now), "20250601_090503");
    }

    #[test]
    fn test_latest_artifact_missing_dir() {
        assert!(latest_artifact(Path::new("/nonexistent/zaiko/exports"), "purchase_candidates").is_none());
    }
}
