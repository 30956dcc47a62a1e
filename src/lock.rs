use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{GitError, Result};
use crate::fs_backend::FsBackend;

/// Advisory exclusive lock scoped to a target path. Protocol: create
/// `<target>.lock` with exclusive-create semantics; existence of that file
/// means someone else holds the lock. Release removes it.
pub struct LockHandle {
    lock_path: PathBuf,
}

pub struct Locker<'a> {
    fs: &'a dyn FsBackend,
}

impl<'a> Locker<'a> {
    pub fn new(fs: &'a dyn FsBackend) -> Self {
        Locker { fs }
    }

    pub fn lock(&self, target: &Path) -> Result<LockHandle> {
        let lock_path = lock_path_for(target);
        match self.fs.create_new_exclusive(&lock_path, b"") {
            Ok(()) => {
                debug!(path = %lock_path.display(), "lock acquired");
                Ok(LockHandle { lock_path })
            }
            Err(GitError::Io { source, .. }) if source.kind() == std::io::ErrorKind::AlreadyExists => {
                warn!(path = %lock_path.display(), "lock contention");
                Err(GitError::LockBusy { path: lock_path })
            }
            Err(other) => Err(other),
        }
    }

    pub fn unlock(&self, handle: LockHandle) -> Result<()> {
        self.fs.remove_file(&handle.lock_path)
    }
}

pub fn lock_path_for(target: &Path) -> PathBuf {
    let mut s = target.as_os_str().to_owned();
    s.push(".lock");
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_backend::memory::MemoryBackend;
    use crate::fs_backend::FileStat;

    #[test]
    fn second_lock_while_held_fails_busy() {
        let fs = MemoryBackend::new();
        let locker = Locker::new(&fs);
        let target = Path::new("index");

        let handle = locker.lock(target).unwrap();
        let err = locker.lock(target).unwrap_err();
        assert!(matches!(err, GitError::LockBusy { .. }));

        locker.unlock(handle).unwrap();
        assert!(locker.lock(target).is_ok());
    }

    /// Always fails `create_new_exclusive` with a non-"exists" error, so the
    /// lock protocol can be exercised against I/O failures other than
    /// contention (e.g. permission denied).
    struct PermissionDeniedBackend;

    impl FsBackend for PermissionDeniedBackend {
        fn stat(&self, path: &Path) -> Result<FileStat> {
            Err(GitError::io(path, std::io::Error::from(std::io::ErrorKind::PermissionDenied)))
        }
        fn exists(&self, _path: &Path) -> bool {
            false
        }
        fn read_all(&self, path: &Path) -> Result<Vec<u8>> {
            Err(GitError::io(path, std::io::Error::from(std::io::ErrorKind::PermissionDenied)))
        }
        fn write_all(&self, path: &Path, _bytes: &[u8]) -> Result<()> {
            Err(GitError::io(path, std::io::Error::from(std::io::ErrorKind::PermissionDenied)))
        }
        fn create_new_exclusive(&self, path: &Path, _bytes: &[u8]) -> Result<()> {
            Err(GitError::io(path, std::io::Error::from(std::io::ErrorKind::PermissionDenied)))
        }
        fn rename(&self, from: &Path, _to: &Path) -> Result<()> {
            Err(GitError::io(from, std::io::Error::from(std::io::ErrorKind::PermissionDenied)))
        }
        fn remove_file(&self, path: &Path) -> Result<()> {
            Err(GitError::io(path, std::io::Error::from(std::io::ErrorKind::PermissionDenied)))
        }
        fn mkdir_all(&self, path: &Path) -> Result<()> {
            Err(GitError::io(path, std::io::Error::from(std::io::ErrorKind::PermissionDenied)))
        }
        fn walk_dir(&self, _root: &Path) -> Result<Vec<PathBuf>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn non_exists_error_propagates_as_io_not_lock_busy() {
        let fs = PermissionDeniedBackend;
        let locker = Locker::new(&fs);

        let err = locker.lock(Path::new("index")).unwrap_err();
        assert!(matches!(err, GitError::Io { .. }));
    }
}
