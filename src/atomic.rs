use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::fs_backend::FsBackend;
use crate::lock::Locker;

/// Lock + temp-file + fsync + rename. Used uniformly for the index, `HEAD`,
/// and every `refs/heads/<branch>` file: a crash mid-write never leaves a
/// half-written target, and concurrent writers contend on the same lock.
pub struct AtomicWriter<'a> {
    fs: &'a dyn FsBackend,
}

impl<'a> AtomicWriter<'a> {
    pub fn new(fs: &'a dyn FsBackend) -> Self {
        AtomicWriter { fs }
    }

    pub fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let locker = Locker::new(self.fs);
        let lock = locker.lock(path)?;

        let tmp_path = tmp_path_for(path);
        let result = (|| -> Result<()> {
            self.fs.create_new_exclusive(&tmp_path, bytes)?;
            self.fs.rename(&tmp_path, path)?;
            debug!(path = %path.display(), bytes = bytes.len(), "atomic write committed");
            Ok(())
        })();

        if result.is_err() {
            let _ = self.fs.remove_file(&tmp_path);
        }
        locker.unlock(lock)?;
        result
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".tmp");
    PathBuf::from(s)
}
