use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// `essays.json` -> `essays.json.bak`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".bak");
    path.with_file_name(name)
}

/// Reads a JSON document, treating a missing, empty or corrupt file as empty.
/// A corrupt file is moved aside to `<name>.bak` so the next write starts clean.
pub fn read_json_safe<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        return T::default();
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            move_aside(path);
            return T::default();
        }
    };
    if contents.trim().is_empty() {
        return T::default();
    }

    match serde_json::from_str(&contents) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Corrupt JSON in {}: {}", path.display(), e);
            move_aside(path);
            T::default()
        }
    }
}

fn move_aside(path: &Path) {
    let backup = backup_path(path);
    match fs::rename(path, &backup) {
        Ok(()) => tracing::warn!("Moved {} to {}", path.display(), backup.display()),
        Err(e) => tracing::warn!("Could not back up {}: {}", path.display(), e),
    }
}

/// Writes `data` as pretty JSON, creating the parent directory if needed.
pub fn write_json_safe<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let data: BTreeMap<String, u32> = read_json_safe(&dir.path().join("nope.json"));
        assert!(data.is_empty());
    }

    #[test]
    fn blank_file_reads_as_empty_and_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.json");
        fs::write(&path, "  \n").unwrap();
        let data: BTreeMap<String, u32> = read_json_safe(&path);
        assert!(data.is_empty());
        assert!(path.exists());
    }

    #[test]
    fn corrupt_file_is_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("essays.json");
        fs::write(&path, "{ not json").unwrap();
        let data: BTreeMap<String, u32> = read_json_safe(&path);
        assert!(data.is_empty());
        assert!(!path.exists());
        let backup = dir.path().join("essays.json.bak");
        assert_eq!(fs::read_to_string(backup).unwrap(), "{ not json");
    }

    #[test]
    fn write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");
        let mut data = BTreeMap::new();
        data.insert("한".to_string(), 1u32);
        write_json_safe(&path, &data).unwrap();
        let loaded: BTreeMap<String, u32> = read_json_safe(&path);
        assert_eq!(loaded, data);
        // non-ASCII stays readable in the file
        assert!(fs::read_to_string(&path).unwrap().contains('한'));
    }
}
