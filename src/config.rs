use std::path::{Path, PathBuf};

use ini::Ini;

use crate::error::{GitError, Result};

/// The user identity consumed by the commit path: `[user] name` / `email`
/// from `$HOME/.config/git/config`. Loaded once per invocation; this
/// system never persists it.
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub name: String,
    pub email: String,
}

/// Resolves the default config path, honouring `$HOME`.
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| GitError::ConfigMissing("could not determine home directory".into()))?;
    Ok(home.join(".config").join("git").join("config"))
}

/// Loads `[user] name`/`email` from the INI file at `path`. Missing file,
/// missing section, or missing keys are all `ConfigMissing` so the command
/// layer can refuse to commit before anything is written.
pub fn load_user_identity(path: &Path) -> Result<UserIdentity> {
    if !path.exists() {
        return Err(GitError::ConfigMissing(format!(
            "no config file at {}",
            path.display()
        )));
    }

    let ini = Ini::load_from_file(path)
        .map_err(|e| GitError::ConfigMissing(format!("parsing {}: {e}", path.display())))?;

    let section = ini.section(Some("user")).ok_or_else(|| {
        GitError::ConfigMissing(format!("{} has no [user] section", path.display()))
    })?;

    let name = section
        .get("name")
        .ok_or_else(|| GitError::ConfigMissing("user.name is not set".into()))?
        .to_string();
    let email = section
        .get("email")
        .ok_or_else(|| GitError::ConfigMissing("user.email is not set".into()))?
        .to_string();

    Ok(UserIdentity { name, email })
}
