use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Serialize `value` as YAML and persist it atomically. Every on-disk record
/// (config, users, project manifests, notification inboxes) goes through here.
pub fn save_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    atomic_write(path, serde_yaml::to_string(value)?.as_bytes())
}

/// Parse the YAML document at `path`. Callers check existence first so they
/// can map a missing file to their own domain error.
pub fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&raw)?)
}

/// Stage `data` in a sibling tempfile and rename it over `path`, so a crash
/// mid-write never leaves a truncated record. Missing parents are created.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)?;
            parent
        }
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(data)?;
    staged.flush()?;
    staged.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: String,
        phase: u8,
    }

    #[test]
    fn yaml_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("record.yaml");
        let record = Record {
            name: "Holding Silva".into(),
            phase: 3,
        };
        save_yaml(&path, &record).unwrap();
        let loaded: Record = load_yaml(&path).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn save_creates_missing_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("projects/p1/manifest.yaml");
        save_yaml(&path, &Record { name: "p1".into(), phase: 1 }).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn atomic_write_replaces_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("inbox.yaml");
        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn load_yaml_rejects_malformed_input() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "name: [unclosed").unwrap();
        assert!(load_yaml::<Record>(&path).is_err());
    }
}
