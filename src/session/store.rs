//! Session store
//!
//! Session existence is directory existence: a session is live exactly when
//! `<base_dir>/<id>` is a directory. Nothing else is persisted and nothing is
//! kept in memory, so a restarted process rediscovers every session.

use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::id::SessionId;
use crate::error::{Error, Result};

/// Maps session ids to sandbox roots under a base directory
#[derive(Debug, Clone)]
pub struct SessionStore {
    base_dir: PathBuf,
}

impl SessionStore {
    /// Open a store, creating the base directory if needed
    pub async fn open_at(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        tokio::fs::create_dir_all(&base_dir).await.map_err(|e| {
            Error::Config(format!(
                "Cannot create session base directory {}: {}",
                base_dir.display(),
                e
            ))
        })?;
        let base_dir = tokio::fs::canonicalize(&base_dir).await?;
        debug!("Session base directory: {}", base_dir.display());
        Ok(SessionStore { base_dir })
    }

    /// Base directory holding all sessions
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Sandbox root a session id maps to (whether or not it exists)
    pub fn root_for(&self, id: &SessionId) -> PathBuf {
        self.base_dir.join(id.as_str())
    }

    /// Whether the session's directory exists
    pub async fn exists(&self, id: &SessionId) -> bool {
        tokio::fs::metadata(self.root_for(id))
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Sandbox root for `id`, creating it on first use
    ///
    /// Safe to call concurrently for the same id: directory creation treats
    /// an already existing directory as success.
    pub async fn get_or_create(&self, id: &SessionId) -> Result<PathBuf> {
        let root = self.root_for(id);
        match tokio::fs::create_dir(&root).await {
            Ok(()) => info!("Created session {}", id),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if !tokio::fs::metadata(&root).await?.is_dir() {
                    return Err(Error::Internal(format!(
                        "Session path {} exists but is not a directory",
                        root.display()
                    )));
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // Base directory removed underneath us.
                tokio::fs::create_dir_all(&root).await?;
                info!("Created session {}", id);
            }
            Err(e) => return Err(Error::Io(e)),
        }
        Ok(root)
    }

    /// Sandbox root of an existing session
    pub async fn open(&self, id: &SessionId) -> Result<PathBuf> {
        if self.exists(id).await {
            Ok(self.root_for(id))
        } else {
            Err(Error::SessionNotFound(id.to_string()))
        }
    }

    /// Duplicate a session into a new, independent session
    ///
    /// The copy is built in a hidden staging directory and renamed into place
    /// only once complete; on any failure the staging directory is removed and
    /// no new session exists.
    pub async fn fork(&self, id: &SessionId) -> Result<SessionId> {
        let source = self.open(id).await?;
        let new_id = SessionId::generate();
        let target = self.root_for(&new_id);
        // Leading dot: never a valid session id, so never visible as one.
        let staging = self.base_dir.join(format!(".fork-{}", Uuid::new_v4()));

        let staging_for_task = staging.clone();
        let outcome = tokio::task::spawn_blocking(move || -> Result<()> {
            let links = LinkRoots {
                source: &source,
                target: &target,
            };
            copy_tree(&source, &staging_for_task, &links)?;
            fs::rename(&staging_for_task, &target)?;
            Ok(())
        })
        .await?;

        if let Err(e) = outcome {
            if let Err(cleanup) = tokio::fs::remove_dir_all(&staging).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(
                        "Failed to remove fork staging directory {}: {}",
                        staging.display(),
                        cleanup
                    );
                }
            }
            return Err(Error::Internal(format!("Failed to fork session: {}", e)));
        }

        info!("Forked session {} into {}", id, new_id);
        Ok(new_id)
    }
}

/// Session roots a fork copies between
struct LinkRoots<'a> {
    source: &'a Path,
    /// Final location of the fork, not the staging directory
    target: &'a Path,
}

impl LinkRoots<'_> {
    /// Target for the fork's copy of the symlink at `link` pointing to `dest`
    ///
    /// A link that reaches the source session by an absolute path or by
    /// climbing out of it with `..` is redirected into the fork. Links that
    /// stay inside, or point elsewhere entirely, are kept verbatim.
    fn retarget(&self, link: &Path, dest: &Path) -> PathBuf {
        let Ok(link_dir) = link.parent().unwrap_or(self.source).strip_prefix(self.source) else {
            return dest.to_path_buf();
        };

        let mut depth = link_dir.components().count();
        let mut climbed_out = dest.is_absolute();
        let mut resolved = if dest.is_absolute() {
            PathBuf::new()
        } else {
            self.source.join(link_dir)
        };
        for component in dest.components() {
            match component {
                Component::RootDir | Component::Prefix(_) => resolved.push(component),
                Component::CurDir => {}
                Component::ParentDir => {
                    resolved.pop();
                    if depth == 0 {
                        climbed_out = true;
                    } else {
                        depth -= 1;
                    }
                }
                Component::Normal(name) => {
                    resolved.push(name);
                    depth += 1;
                }
            }
        }

        match resolved.strip_prefix(self.source) {
            Ok(inside) if climbed_out => self.target.join(inside),
            _ => dest.to_path_buf(),
        }
    }
}

/// Recursively copy `src` into the new directory `dst`
///
/// Symlinks are recreated, not followed, and retargeted so the fork never
/// refers back into the source session. FIFOs, sockets and device nodes are
/// skipped.
fn copy_tree(src: &Path, dst: &Path, links: &LinkRoots<'_>) -> std::io::Result<()> {
    fs::create_dir(dst)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let from = entry.path();
        let to = dst.join(entry.file_name());

        if file_type.is_dir() {
            copy_tree(&from, &to, links)?;
        } else if file_type.is_file() {
            fs::copy(&from, &to)?;
        } else if file_type.is_symlink() {
            let dest = links.retarget(&from, &fs::read_link(&from)?);
            std::os::unix::fs::symlink(dest, &to)?;
        } else {
            debug!("Skipping special file {} while forking", from.display());
        }
    }

    // Applied last so read-only directories could still be filled.
    let mode = fs::metadata(src)?.permissions().mode();
    fs::set_permissions(dst, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn id(s: &str) -> SessionId {
        SessionId::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = SessionStore::open_at(dir.path().join("sessions")).await.unwrap();

        let a = store.get_or_create(&id("alpha")).await.unwrap();
        std::fs::write(a.join("keep.txt"), "x").unwrap();
        let b = store.get_or_create(&id("alpha")).await.unwrap();

        assert_eq!(a, b);
        assert!(b.join("keep.txt").exists());
        assert_eq!(a, store.base_dir().join("alpha"));
    }

    #[tokio::test]
    async fn test_concurrent_first_use() {
        let dir = tempdir().unwrap();
        let store = SessionStore::open_at(dir.path()).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.get_or_create(&id("shared")).await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert!(store.exists(&id("shared")).await);
    }

    #[tokio::test]
    async fn test_open_missing_session() {
        let dir = tempdir().unwrap();
        let store = SessionStore::open_at(dir.path()).await.unwrap();
        assert!(matches!(
            store.open(&id("ghost")).await,
            Err(Error::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fork_copies_tree() {
        let dir = tempdir().unwrap();
        let store = SessionStore::open_at(dir.path()).await.unwrap();
        let source = store.get_or_create(&id("src")).await.unwrap();

        std::fs::create_dir_all(source.join("pkg/sub")).unwrap();
        std::fs::write(source.join("main.py"), "print('hi')").unwrap();
        std::fs::write(source.join("pkg/sub/data.bin"), [0u8, 1, 2, 255]).unwrap();
        std::os::unix::fs::symlink("main.py", source.join("link.py")).unwrap();

        let forked = store.fork(&id("src")).await.unwrap();
        let target = store.root_for(&forked);

        assert_ne!(forked.as_str(), "src");
        assert_eq!(std::fs::read(target.join("main.py")).unwrap(), b"print('hi')");
        assert_eq!(
            std::fs::read(target.join("pkg/sub/data.bin")).unwrap(),
            vec![0u8, 1, 2, 255]
        );
        assert_eq!(
            std::fs::read_link(target.join("link.py")).unwrap(),
            PathBuf::from("main.py")
        );

        // Exactly the two sessions, no staging leftovers.
        let entries: Vec<_> = std::fs::read_dir(store.base_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_fork_is_independent() {
        let dir = tempdir().unwrap();
        let store = SessionStore::open_at(dir.path()).await.unwrap();
        let source = store.get_or_create(&id("origin")).await.unwrap();
        std::fs::write(source.join("shared.txt"), "v1").unwrap();

        let forked = store.fork(&id("origin")).await.unwrap();
        let target = store.root_for(&forked);

        std::fs::write(target.join("shared.txt"), "fork").unwrap();
        std::fs::write(source.join("only-origin.txt"), "o").unwrap();

        assert_eq!(std::fs::read_to_string(source.join("shared.txt")).unwrap(), "v1");
        assert!(!target.join("only-origin.txt").exists());
    }

    #[tokio::test]
    async fn test_fork_links_into_source_follow_the_fork() {
        let outside = tempdir().unwrap();
        let dir = tempdir().unwrap();
        let store = SessionStore::open_at(dir.path()).await.unwrap();
        let source = store.get_or_create(&id("linked")).await.unwrap();

        std::fs::create_dir_all(source.join("data/nested")).unwrap();
        std::fs::write(source.join("data/state.txt"), "original").unwrap();
        // What `ln -s "$PWD/data" cur` leaves behind.
        std::os::unix::fs::symlink(source.join("data"), source.join("cur")).unwrap();
        std::os::unix::fs::symlink("../../../linked/data", source.join("data/nested/up")).unwrap();
        std::os::unix::fs::symlink(outside.path(), source.join("elsewhere")).unwrap();

        let forked = store.fork(&id("linked")).await.unwrap();
        let target = store.root_for(&forked);

        assert_eq!(std::fs::read_link(target.join("cur")).unwrap(), target.join("data"));
        assert_eq!(
            std::fs::read_link(target.join("data/nested/up")).unwrap(),
            target.join("data")
        );
        assert_eq!(
            std::fs::read_link(target.join("elsewhere")).unwrap(),
            outside.path()
        );

        std::fs::write(target.join("cur/state.txt"), "written-by-fork").unwrap();
        std::fs::write(target.join("data/nested/up/extra.txt"), "x").unwrap();
        assert_eq!(
            std::fs::read_to_string(source.join("data/state.txt")).unwrap(),
            "original"
        );
        assert!(!source.join("data/extra.txt").exists());
        assert_eq!(
            std::fs::read_to_string(target.join("data/state.txt")).unwrap(),
            "written-by-fork"
        );
    }

    #[tokio::test]
    async fn test_fork_missing_session() {
        let dir = tempdir().unwrap();
        let store = SessionStore::open_at(dir.path()).await.unwrap();

        assert!(matches!(
            store.fork(&id("nope")).await,
            Err(Error::SessionNotFound(_))
        ));
        assert_eq!(std::fs::read_dir(store.base_dir()).unwrap().count(), 0);
    }
}
