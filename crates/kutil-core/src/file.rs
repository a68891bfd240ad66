//! Small filesystem helpers shared by the logging bootstrap and host code.
//!
//! Reads are UTF-8; JSON goes through `serde_json`. [`cleanup_directory`] is
//! best-effort: entries that cannot be removed are logged and skipped.

use std::fs;
use std::io::Read;
use std::path::{Path, is_separator};

use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{KutilError, Result};

/// Block size used when streaming a file through the hasher.
const CHECKSUM_BLOCK_SIZE: usize = 8192;

/// Fallback name when the process was started without `argv[0]`.
const UNKNOWN_PROGRAM: &str = "kutil";

/// Read a whole file as UTF-8 text.
///
/// Fails with [`KutilError::FileNotFound`] if the path does not exist.
pub fn read_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(KutilError::FileNotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|e| KutilError::io(path, e))
}

/// Read a file and parse it as JSON.
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = read_file(path)?;
    serde_json::from_str(&content).map_err(|source| KutilError::Json { path: path.to_path_buf(), source })
}

/// Write text to a file, replacing any previous content.
pub fn save_file(path: impl AsRef<Path>, text: &str) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, text).map_err(|e| KutilError::io(path, e))
}

/// Write raw bytes to a file, replacing any previous content.
pub fn save_bytes(path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, bytes).map_err(|e| KutilError::io(path, e))
}

/// Serialize `value` as pretty JSON (two-space indent, non-ASCII kept).
pub fn save_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    let text =
        serde_json::to_string_pretty(value).map_err(|source| KutilError::Json { path: path.to_path_buf(), source })?;
    save_file(path, &text)
}

/// Remove a file. A missing file is not an error.
pub fn delete_file(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(());
    }
    fs::remove_file(path).map_err(|e| KutilError::io(path, e))
}

/// Delete every entry inside `dir`, keeping `dir` itself.
///
/// Returns the number of entries removed. A missing directory is a no-op.
/// Failures on individual entries are logged and do not stop the sweep.
pub fn cleanup_directory(dir: impl AsRef<Path>) -> Result<usize> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(dir).map_err(|e| KutilError::io(dir, e))? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("failed to read entry of {}: {e}", dir.display());
                continue;
            }
        };

        let path = entry.path();
        // symlink_metadata so a link to a directory is unlinked, not followed
        let result = match fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(&path),
            Ok(_) => fs::remove_file(&path),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => removed += 1,
            Err(e) => warn!("failed to delete {}: {e}", path.display()),
        }
    }

    debug!("cleaned {removed} entries from {}", dir.display());
    Ok(removed)
}

/// Lowercase hex SHA-256 of the file content.
pub fn file_checksum(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let mut file = fs::File::open(path).map_err(|e| KutilError::io(path, e))?;

    let mut hasher = Sha256::new();
    let mut block = [0u8; CHECKSUM_BLOCK_SIZE];
    loop {
        let n = file.read(&mut block).map_err(|e| KutilError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&block[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Final component of a path, e.g. `/path/to/file.txt` → `file.txt`.
pub fn file_name_from_path(path: &str) -> &str {
    match path.rfind(is_separator) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Drop the extension of the final component, e.g. `/path/to/file.txt` → `/path/to/file`.
///
/// Dots in parent directories and a leading dot of hidden files are not
/// treated as extensions.
pub fn remove_extension_from_path(path: &str) -> &str {
    let name_start = path.rfind(is_separator).map_or(0, |idx| idx + 1);
    match path[name_start..].rfind('.') {
        None | Some(0) => path,
        Some(dot) => &path[..name_start + dot],
    }
}

/// Name of the running executable without directory or extension.
pub fn program_name() -> String {
    std::env::args_os()
        .next()
        .map(|arg0| arg0.to_string_lossy().into_owned())
        .map(|arg0| remove_extension_from_path(file_name_from_path(&arg0)).to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_PROGRAM.to_string())
}
