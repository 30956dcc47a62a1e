use std::path::{Path, PathBuf};

use tracing::info;

use crate::clock::Clock;
use crate::config::UserIdentity;
use crate::error::{GitError, Result};
use crate::fs_backend::FsBackend;
use crate::hash::Oid;
use crate::index::{Index, Indexer};
use crate::objects::commit::{CommitFields, Stamp};
use crate::objects::store::ObjectStore;
use crate::objects::tree::{self, LeafDescriptor};
use crate::objects::Object;
use crate::refs::Refs;

const GIT_DIR_NAME: &str = ".git";

const INIT_DIRS: &[&str] = &[
    "",
    "objects",
    "objects/info",
    "objects/pack",
    "refs",
    "refs/heads",
    "refs/tags",
    "branches",
    "hooks",
    "info",
];

/// The outcome of a successful commit: enough to render the CLI's
/// `[<branch> (root-commit)? <short-oid>] <message>` line.
pub struct CommitResult {
    pub oid: Oid,
    pub branch: String,
    pub is_root: bool,
    pub message: String,
}

/// Orchestrates `init`/`add`/`commit` over the core components, rooted at
/// one working directory's `.git`. Pathspec handling is deliberately
/// narrow: `.` stages the whole tree, anything else must name an existing
/// path relative to the root.
pub struct Repository<'a> {
    fs: &'a dyn FsBackend,
    root_dir: PathBuf,
    git_dir: PathBuf,
}

impl<'a> Repository<'a> {
    pub fn new(fs: &'a dyn FsBackend, root_dir: &Path) -> Self {
        let git_dir = root_dir.join(GIT_DIR_NAME);
        Repository {
            fs,
            root_dir: root_dir.to_path_buf(),
            git_dir,
        }
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn is_initialized(&self) -> bool {
        self.fs.exists(&self.git_dir)
    }

    /// Searches `start` and its ancestors for a `.git` directory. Used by
    /// the command layer to resolve the repository root for `add`/`commit`
    /// regardless of the caller's current subdirectory.
    pub fn discover(fs: &'a dyn FsBackend, start: &Path) -> Option<Repository<'a>> {
        let mut dir = start.to_path_buf();
        loop {
            if fs.exists(&dir.join(GIT_DIR_NAME)) {
                return Some(Repository::new(fs, &dir));
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Creates the on-disk layout and the symbolic `HEAD`. Safe to call
    /// against an already-initialized repository; the caller is
    /// responsible for choosing the "Initialized" vs "Reinitialized"
    /// message based on `is_initialized()` observed beforehand.
    pub fn init(&self) -> Result<()> {
        for sub in INIT_DIRS {
            let dir = if sub.is_empty() {
                self.git_dir.clone()
            } else {
                self.git_dir.join(sub)
            };
            self.fs.mkdir_all(&dir)?;
        }
        Refs::new(self.fs, &self.git_dir).init_default()?;
        info!(path = %self.git_dir.display(), "repository initialized");
        Ok(())
    }

    fn object_store(&self) -> ObjectStore<'a> {
        ObjectStore::new(self.fs, &self.git_dir.join("objects"))
    }

    fn index_path(&self) -> PathBuf {
        self.git_dir.join("index")
    }

    /// Stages the working-tree paths matched by `pathspecs` into the
    /// index. `.` matches every tracked-able file under the repository
    /// root (the `.git` directory itself is never matched).
    pub fn add(&self, pathspecs: &[String]) -> Result<Index> {
        let paths = self.resolve_pathspecs(pathspecs)?;
        let store = self.object_store();
        let indexer = Indexer::new(self.fs, &store, &self.index_path(), &self.root_dir);
        indexer.add(&paths)
    }

    fn resolve_pathspecs(&self, pathspecs: &[String]) -> Result<Vec<String>> {
        let mut paths = Vec::new();

        for spec in pathspecs {
            if spec == "." {
                for abs in self.fs.walk_dir(&self.root_dir)? {
                    let Ok(rel) = abs.strip_prefix(&self.root_dir) else {
                        continue;
                    };
                    if rel.starts_with(GIT_DIR_NAME) {
                        continue;
                    }
                    paths.push(to_repo_relative(rel));
                }
            } else {
                let abs = self.root_dir.join(spec);
                if !self.fs.exists(&abs) {
                    return Err(GitError::PathNotMatched(spec.clone()));
                }
                paths.push(spec.trim_end_matches('/').to_string());
            }
        }

        paths.sort();
        paths.dedup();
        Ok(paths)
    }

    /// Folds the current index into a commit: an empty index is
    /// `NothingToCommit`. The resulting commit's parent is the current
    /// branch tip, if any.
    pub fn commit(
        &self,
        identity: &UserIdentity,
        clock: &dyn Clock,
        message: &str,
    ) -> Result<CommitResult> {
        let store = self.object_store();
        let indexer = Indexer::new(self.fs, &store, &self.index_path(), &self.root_dir);
        let index = indexer.load()?;
        if index.entries().next().is_none() {
            return Err(GitError::NothingToCommit);
        }

        let descriptors: Vec<LeafDescriptor> = index
            .entries()
            .map(|entry| LeafDescriptor {
                path: entry.path.clone(),
                oid: entry.oid,
                executable: entry.mode == 0o100755,
            })
            .collect();
        let tree_oid = tree::build_and_store(&store, &descriptors)?;

        let refs = Refs::new(self.fs, &self.git_dir);
        let parent = refs.read_head()?;

        let (unix_seconds, tz_offset_minutes) = clock.now();
        let stamp = Stamp {
            name: identity.name.clone(),
            email: identity.email.clone(),
            timestamp: unix_seconds,
            tz_offset_minutes,
        };
        let fields = CommitFields {
            tree: tree_oid,
            parent,
            stamp,
            message: message.to_string(),
        };
        let commit_oid = store.store(&Object::Commit(fields))?;
        refs.update_head(commit_oid)?;

        info!(oid = %commit_oid, parent = ?parent, "commit created");

        Ok(CommitResult {
            oid: commit_oid,
            branch: refs.current_branch()?,
            is_root: parent.is_none(),
            message: message.to_string(),
        })
    }
}

fn to_repo_relative(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
