//! Filesystem utilities.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
///
/// The contents go to a temporary file in the same directory first, so a
/// reader never sees a half-written file.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;
    tmp.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write file: {}", path.display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to write file: {}", path.display()))?;
    Ok(())
}

/// Write a string to a file unless it already exists.
///
/// Returns `true` if the file was written.
pub fn write_if_absent(path: &Path, contents: &str) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    write_string(path, contents)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_string_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("dev-python/foo/foo-1.0.ebuild");

        write_string(&path, "first").unwrap();
        assert_eq!(read_to_string(&path).unwrap(), "first");

        write_string(&path, "second").unwrap();
        assert_eq!(read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_write_if_absent() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("metadata.xml");

        assert!(write_if_absent(&path, "original").unwrap());
        assert!(!write_if_absent(&path, "replacement").unwrap());
        assert_eq!(read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn test_read_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = read_to_string(&tmp.path().join("missing")).unwrap_err();
        assert!(err.to_string().contains("failed to read file"));
    }
}
