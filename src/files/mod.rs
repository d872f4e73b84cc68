//! File management inside a sandbox root
//!
//! Every operation resolves all of its paths through
//! [`sandbox::path`](crate::sandbox::path) first, so a traversal attempt
//! fails before the filesystem is touched. Delete and rename act on the entry
//! itself and never follow a symlink at the final component.

use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::sandbox::path::{resolve, resolve_link};

/// Read/write/delete/rename on sandboxed paths
#[derive(Debug, Clone, Copy, Default)]
pub struct FileManager;

impl FileManager {
    /// Create a file manager
    pub fn new() -> Self {
        FileManager
    }

    /// Read a UTF-8 file
    pub async fn read(&self, root: &Path, relative: &str) -> Result<String> {
        let path = resolve(root, relative)?;

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(Error::NotFound(format!("'{}' is not a file", relative))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("File '{}' does not exist", relative)))
            }
            Err(e) => return Err(Error::Io(e)),
        }

        let bytes = tokio::fs::read(&path).await?;
        String::from_utf8(bytes)
            .map_err(|_| Error::InvalidInput(format!("File '{}' is not valid UTF-8", relative)))
    }

    /// Create or truncate a file, creating parent directories
    pub async fn write(&self, root: &Path, relative: &str, content: &str) -> Result<()> {
        let path = resolve(root, relative)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| conflict(e, relative))?;
        }
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| conflict(e, relative))?;

        debug!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(())
    }

    /// Delete a file, a symlink, or an explicitly named empty directory
    pub async fn delete(&self, root: &Path, relative: &str) -> Result<()> {
        let path = resolve_link(root, relative)?;

        let meta = match tokio::fs::symlink_metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("File '{}' does not exist", relative)))
            }
            Err(e) => return Err(Error::Io(e)),
        };

        if meta.is_dir() {
            tokio::fs::remove_dir(&path).await.map_err(|e| {
                if e.raw_os_error() == Some(libc::ENOTEMPTY) {
                    Error::InvalidInput(format!("Directory '{}' is not empty", relative))
                } else {
                    Error::Io(e)
                }
            })?;
        } else {
            tokio::fs::remove_file(&path).await?;
        }

        debug!("Deleted {}", path.display());
        Ok(())
    }

    /// Move `old` to `new`, replacing an existing destination file
    pub async fn rename(&self, root: &Path, old: &str, new: &str) -> Result<()> {
        let from = resolve_link(root, old)?;
        let to = resolve_link(root, new)?;

        match tokio::fs::symlink_metadata(&from).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("Old file '{}' does not exist", old)))
            }
            Err(e) => return Err(Error::Io(e)),
        }

        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| conflict(e, new))?;
        }
        tokio::fs::rename(&from, &to)
            .await
            .map_err(|e| conflict(e, new))?;

        debug!("Renamed {} to {}", from.display(), to.display());
        Ok(())
    }
}

/// Map errors caused by what already sits at the caller's path to
/// `InvalidInput`; anything else stays an I/O failure
fn conflict(e: std::io::Error, relative: &str) -> Error {
    let reason = match e.raw_os_error() {
        Some(libc::EISDIR) => "is a directory",
        Some(libc::ENOTDIR) | Some(libc::EEXIST) => "goes through a file that is not a directory",
        Some(libc::ENOTEMPTY) => "is a non-empty directory",
        Some(libc::EINVAL) => "would move a directory inside itself",
        _ => return Error::Io(e),
    };
    Error::InvalidInput(format!("'{}' {}", relative, reason))
}
