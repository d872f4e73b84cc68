//! Path resolution inside a sandbox root
//!
//! Every caller-supplied path goes through [`resolve`] before any filesystem
//! access. The check is lexical first (absolute paths, `..`, empty segments
//! and null bytes are refused outright) and then physical: the deepest part
//! of the joined path that already exists is canonicalized so that a symlink
//! planted inside the sandbox cannot redirect an operation outside of it.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// What the resolved path is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A concrete entry beneath the root, followed if it is a symlink
    Entry,
    /// A concrete entry acted on itself (unlinked or moved), so a final
    /// symlink component is not followed
    Link,
    /// The root itself is acceptable (e.g. a working directory)
    AllowRoot,
}

/// Resolve `relative` against `root`, requiring a concrete entry beneath it
pub fn resolve(root: &Path, relative: &str) -> Result<PathBuf> {
    resolve_with(root, relative, Target::Entry)
}

/// Resolve `relative` for an operation on the directory entry itself
///
/// Only the parent directory must lie inside the sandbox; a symlink at the
/// final component may point anywhere, since it is never dereferenced.
pub fn resolve_link(root: &Path, relative: &str) -> Result<PathBuf> {
    resolve_with(root, relative, Target::Link)
}

/// Resolve `relative` against `root`
///
/// Returns the canonical root joined with the normalized relative path. For
/// [`Target::Entry`] an existing symlink at the final component is followed
/// and must itself stay inside the sandbox. For [`Target::Link`] only the
/// parent is checked.
pub fn resolve_with(root: &Path, relative: &str, target: Target) -> Result<PathBuf> {
    let normalized = normalize(relative)?;

    if normalized.as_os_str().is_empty() && target != Target::AllowRoot {
        return Err(Error::PathTraversal(format!(
            "'{}' does not name an entry inside the sandbox",
            relative
        )));
    }

    let real_root = root.canonicalize().map_err(|e| {
        Error::Sandbox(format!(
            "Sandbox root {} is not accessible: {}",
            root.display(),
            e
        ))
    })?;
    let joined = real_root.join(&normalized);

    let checked: &Path = match target {
        Target::Link => joined.parent().unwrap_or(real_root.as_path()),
        Target::Entry | Target::AllowRoot => &joined,
    };
    check_physical_containment(&real_root, checked, relative)?;

    Ok(joined)
}

/// Lexically normalize a relative path, refusing anything that could climb
pub fn normalize(relative: &str) -> Result<PathBuf> {
    if relative.is_empty() {
        return Err(Error::PathTraversal("empty path".to_string()));
    }
    if relative.contains('\0') {
        return Err(Error::PathTraversal("path contains a null byte".to_string()));
    }
    if relative.starts_with('/') {
        return Err(Error::PathTraversal(format!(
            "absolute path '{}' is not allowed",
            relative
        )));
    }

    let mut normalized = PathBuf::new();
    for segment in relative.split('/') {
        match segment {
            "" => {
                return Err(Error::PathTraversal(format!(
                    "'{}' contains an empty path segment",
                    relative
                )))
            }
            "." => {}
            ".." => {
                return Err(Error::PathTraversal(format!(
                    "'{}' contains a parent directory segment",
                    relative
                )))
            }
            other => normalized.push(other),
        }
    }

    // Catches separators other than '/'.
    if normalized
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(Error::PathTraversal(format!(
            "'{}' is not a plain relative path",
            relative
        )));
    }

    Ok(normalized)
}

/// Canonicalize the deepest existing ancestor of `joined` and make sure it is
/// still beneath `real_root`
fn check_physical_containment(real_root: &Path, joined: &Path, relative: &str) -> Result<()> {
    let mut existing = joined;
    loop {
        match existing.symlink_metadata() {
            Ok(_) => break,
            // ENOTDIR: an ancestor is a file; the caller reports the conflict.
            Err(e) if e.kind() == ErrorKind::NotFound || e.raw_os_error() == Some(libc::ENOTDIR) => {
                match existing.parent() {
                    Some(parent) => existing = parent,
                    None => return Ok(()),
                }
            }
            Err(e) => return Err(Error::Io(e)),
        }
    }

    let real = existing.canonicalize().map_err(|_| {
        Error::PathTraversal(format!(
            "'{}' goes through a symlink that cannot be resolved",
            relative
        ))
    })?;

    if !real.starts_with(real_root) {
        return Err(Error::PathTraversal(format!(
            "'{}' resolves outside the sandbox",
            relative
        )));
    }

    Ok(())
}
