use std::path::PathBuf;

use thiserror::Error;

/// The typed error surface for every core component. The command layer is the
/// only place that turns one of these into an exit code and a line of output.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt object or index: {0}")]
    Corrupt(String),

    #[error("Another git process seems to be running")]
    LockBusy { path: PathBuf },

    #[error("pathspec '{0}' did not match any files")]
    PathNotMatched(String),

    #[error("nothing to commit")]
    NothingToCommit,

    #[error("user identity not configured: {0}")]
    ConfigMissing(String),

    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl GitError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GitError::Io {
            path: path.into(),
            source,
        }
    }

    /// Exit code this error should surface as, per the CLI contract.
    pub fn exit_code(&self) -> i32 {
        match self {
            GitError::NothingToCommit => 1,
            GitError::LockBusy { .. } | GitError::PathNotMatched(_) => 128,
            GitError::Io { .. } => 128,
            GitError::Corrupt(_) => 128,
            GitError::ConfigMissing(_) => 128,
            GitError::Invariant(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, GitError>;
