//! JSON document persistence for schema and rules files.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::FormResult;

/// Read and decode a JSON document.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> FormResult<T> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Write a document, replacing any existing file.
///
/// The bytes go to a sibling temp file first and are renamed into place, so
/// a failure leaves the previous document (or none) behind.
pub fn write_document<T: Serialize>(path: &Path, doc: &T) -> FormResult<()> {
    let bytes = encode(doc)?;
    ensure_parent(path)?;

    let tmp = temp_path(path);
    let result = std::fs::write(&tmp, &bytes).and_then(|()| std::fs::rename(&tmp, path));
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result?;
    Ok(())
}

/// Write a document only if no file exists at `path`.
///
/// Returns `false` and leaves the file untouched when one is already there.
/// A failed write removes the file it created.
pub fn write_document_if_absent<T: Serialize>(path: &Path, doc: &T) -> FormResult<bool> {
    let bytes = encode(doc)?;
    ensure_parent(path)?;
    create_new_with(path, &bytes, |file, bytes| {
        file.write_all(bytes)?;
        file.sync_all()
    })
}

fn create_new_with<F>(path: &Path, bytes: &[u8], write: F) -> FormResult<bool>
where
    F: FnOnce(&mut File, &[u8]) -> std::io::Result<()>,
{
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    if let Err(e) = write(&mut file, bytes) {
        drop(file);
        let _ = std::fs::remove_file(path);
        return Err(e.into());
    }
    Ok(true)
}

fn encode<T: Serialize>(doc: &T) -> FormResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(doc)?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn ensure_parent(path: &Path) -> FormResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/data.json");
        let doc = json!({ "b": 1, "a": [true] });

        write_document(&path, &doc).unwrap();
        let back: Value = read_document(&path).unwrap();
        assert_eq!(back, doc);
        assert!(!dir.path().join("nested/data.json.tmp").exists());
    }

    #[test]
    fn test_write_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        write_document(&path, &json!({ "v": 1 })).unwrap();
        write_document(&path, &json!({ "v": 2 })).unwrap();
        let back: Value = read_document(&path).unwrap();
        assert_eq!(back["v"], 2);
    }

    #[test]
    fn test_if_absent_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("responses.json");

        assert!(write_document_if_absent(&path, &json!({ "Q": "fixed:mine" })).unwrap());
        assert!(!write_document_if_absent(&path, &json!({ "Q": "random_text" })).unwrap());

        let back: Value = read_document(&path).unwrap();
        assert_eq!(back["Q"], "fixed:mine");
    }

    #[test]
    fn test_failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("responses.json");

        let result = create_new_with(&path, b"{\"Q\": \"random_text\"}", |file, bytes| {
            file.write_all(&bytes[..4])?;
            Err(std::io::Error::other("disk full"))
        });
        assert!(matches!(result, Err(crate::types::FormError::Io(_))));
        assert!(!path.exists());

        // The next attempt is not blocked by a truncated leftover.
        assert!(write_document_if_absent(&path, &json!({ "Q": "random_text" })).unwrap());
        let back: Value = read_document(&path).unwrap();
        assert_eq!(back["Q"], "random_text");
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_document::<Value>(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, crate::types::FormError::Io(_)));
    }
}
