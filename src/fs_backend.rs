use std::path::{Path, PathBuf};

use crate::error::{GitError, Result};

/// Metadata surface narrow enough to populate an index entry and to decide
/// the executable bit, independent of which backend produced it.
#[derive(Debug, Clone, Copy)]
pub struct FileStat {
    pub ctime_sec: u32,
    pub ctime_nsec: u32,
    pub mtime_sec: u32,
    pub mtime_nsec: u32,
    pub dev: u32,
    pub ino: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u32,
    pub executable: bool,
}

/// Injectable capability surface used by every component that touches disk.
/// Production binds this to real syscalls; tests bind it to an in-memory
/// backend so index/object-store behaviour can be pinned byte-for-byte
/// without touching the filesystem.
pub trait FsBackend: Send + Sync {
    fn stat(&self, path: &Path) -> Result<FileStat>;
    fn exists(&self, path: &Path) -> bool;
    fn read_all(&self, path: &Path) -> Result<Vec<u8>>;
    fn write_all(&self, path: &Path, bytes: &[u8]) -> Result<()>;
    /// Fails if `path` already exists.
    fn create_new_exclusive(&self, path: &Path, bytes: &[u8]) -> Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    /// Idempotent: succeeds if the directory already exists.
    fn mkdir_all(&self, path: &Path) -> Result<()>;
    /// Lexical order, relative-to-root file paths only (directories are descended, not yielded).
    fn walk_dir(&self, root: &Path) -> Result<Vec<PathBuf>>;
}

pub struct OsBackend;

impl OsBackend {
    pub fn new() -> Self {
        OsBackend
    }
}

impl Default for OsBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
fn stat_from_metadata(meta: &std::fs::Metadata) -> FileStat {
    use std::os::unix::fs::{MetadataExt, PermissionsExt};

    FileStat {
        ctime_sec: meta.ctime() as u32,
        ctime_nsec: meta.ctime_nsec() as u32,
        mtime_sec: meta.mtime() as u32,
        mtime_nsec: meta.mtime_nsec() as u32,
        dev: meta.dev() as u32,
        ino: meta.ino() as u32,
        uid: meta.uid(),
        gid: meta.gid(),
        size: meta.len() as u32,
        executable: meta.permissions().mode() & 0o111 != 0,
    }
}

#[cfg(not(unix))]
fn stat_from_metadata(meta: &std::fs::Metadata) -> FileStat {
    FileStat {
        ctime_sec: 0,
        ctime_nsec: 0,
        mtime_sec: 0,
        mtime_nsec: 0,
        dev: 0,
        ino: 0,
        uid: 0,
        gid: 0,
        size: meta.len() as u32,
        executable: false,
    }
}

impl FsBackend for OsBackend {
    fn stat(&self, path: &Path) -> Result<FileStat> {
        let meta = std::fs::metadata(path).map_err(|e| GitError::io(path, e))?;
        Ok(stat_from_metadata(&meta))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).map_err(|e| GitError::io(path, e))
    }

    fn write_all(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        std::fs::write(path, bytes).map_err(|e| GitError::io(path, e))
    }

    fn create_new_exclusive(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| GitError::io(path, e))?;
        file.write_all(bytes).map_err(|e| GitError::io(path, e))?;
        file.sync_all().map_err(|e| GitError::io(path, e))?;
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        std::fs::rename(from, to).map_err(|e| GitError::io(from, e))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GitError::io(path, e)),
        }
    }

    fn mkdir_all(&self, path: &Path) -> Result<()> {
        match std::fs::create_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(GitError::io(path, e)),
        }
    }

    fn walk_dir(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        let walker = walkdir::WalkDir::new(root).sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(|e| {
                GitError::io(root, std::io::Error::new(std::io::ErrorKind::Other, e))
            })?;
            if entry.file_type().is_file() {
                paths.push(entry.path().to_path_buf());
            }
        }
        paths.sort();
        Ok(paths)
    }
}
