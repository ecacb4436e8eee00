use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;

use super::{Result, ZoracledError};

/// Reads a file into memory.
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| ZoracledError::Io { path: path.to_path_buf(), source })
}

/// Reads and parses a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = read_file(path)?;
    serde_json::from_slice(&raw)
        .map_err(|source| ZoracledError::Json { path: path.to_path_buf(), source })
}

/// Writes `value` as pretty JSON to `path`.
pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    fs::write(path, json).map_err(|source| ZoracledError::Io { path: path.to_path_buf(), source })
}

/// Resolves `path` against the directory containing `base`, unless it is absolute.
pub fn relative_to(base: &Path, path: &Path) -> PathBuf {
    match base.parent() {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    }
}
