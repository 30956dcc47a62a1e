use std::path::{Path, PathBuf};

use tracing::debug;

use crate::atomic::AtomicWriter;
use crate::error::{GitError, Result};
use crate::fs_backend::FsBackend;
use crate::hash::Oid;

const HEAD_PREFIX: &str = "ref: refs/heads/";
const DEFAULT_BRANCH: &str = "master";

/// Owns `HEAD` and everything under `refs/`. `HEAD` is written once, at
/// init, in its symbolic form and never touched again by a commit; a
/// commit instead updates the file the symbolic ref points at.
pub struct Refs<'a> {
    fs: &'a dyn FsBackend,
    git_dir: PathBuf,
}

impl<'a> Refs<'a> {
    pub fn new(fs: &'a dyn FsBackend, git_dir: &Path) -> Self {
        Refs {
            fs,
            git_dir: git_dir.to_path_buf(),
        }
    }

    fn head_path(&self) -> PathBuf {
        self.git_dir.join("HEAD")
    }

    fn branch_path(&self, branch: &str) -> PathBuf {
        self.git_dir.join("refs").join("heads").join(branch)
    }

    /// Writes the symbolic `HEAD` content pointing at `branch` (`master`
    /// unless the caller overrides it). Called once, at repository init.
    pub fn init(&self, branch: &str) -> Result<()> {
        let content = format!("{HEAD_PREFIX}{branch}");
        AtomicWriter::new(self.fs).write(&self.head_path(), content.as_bytes())
    }

    pub fn init_default(&self) -> Result<()> {
        self.init(DEFAULT_BRANCH)
    }

    /// The branch `HEAD` currently points at, e.g. `"master"`.
    pub fn current_branch(&self) -> Result<String> {
        let bytes = self.fs.read_all(&self.head_path())?;
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| GitError::Corrupt("HEAD is not valid utf-8".into()))?
            .trim();
        content
            .strip_prefix(HEAD_PREFIX)
            .map(str::to_string)
            .ok_or_else(|| GitError::Corrupt(format!("HEAD has unexpected content: {content:?}")))
    }

    /// The oid the current branch tip points at, or `None` if the branch
    /// has no commits yet (the root-commit case).
    pub fn read_head(&self) -> Result<Option<Oid>> {
        let branch = self.current_branch()?;
        let path = self.branch_path(&branch);
        if !self.fs.exists(&path) {
            return Ok(None);
        }
        let bytes = self.fs.read_all(&path)?;
        let hex = std::str::from_utf8(&bytes)
            .map_err(|_| GitError::Corrupt("ref file is not valid utf-8".into()))?
            .trim();
        Ok(Some(Oid::from_hex(hex)?))
    }

    /// Overwrites the current branch's tip file with `oid`. `HEAD` itself
    /// is not touched.
    pub fn update_head(&self, oid: Oid) -> Result<()> {
        let branch = self.current_branch()?;
        let path = self.branch_path(&branch);
        self.fs.mkdir_all(path.parent().expect("branch path has a parent"))?;
        AtomicWriter::new(self.fs).write(&path, oid.to_hex().as_bytes())?;
        debug!(branch = %branch, oid = %oid, "branch tip updated");
        Ok(())
    }
}
