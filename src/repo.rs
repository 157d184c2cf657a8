//! Fetching the metadata repository.
//!
//! An existing checkout is reused as-is; otherwise the configured branch is
//! cloned with the system `git`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::CatalogError;

/// Name of the checkout inside the work directory.
pub const REPO_DIR: &str = "fonts";

/// Make sure `<work_dir>/fonts` holds a checkout and return its path.
pub fn ensure_repo(work_dir: &Path, url: &str, branch: &str) -> Result<PathBuf, CatalogError> {
    fs::create_dir_all(work_dir)
        .map_err(|e| CatalogError::io(format!("creating {}", work_dir.display()), e))?;

    let repo_path = work_dir.join(REPO_DIR);
    if is_checkout(&repo_path)? {
        // TODO: fetch and fast-forward an existing checkout instead of reusing it unchanged.
        log::info!("using existing checkout at {}", repo_path.display());
        return Ok(repo_path);
    }

    log::info!("cloning {} ({}) into {}", url, branch, repo_path.display());
    let status = Command::new("git")
        .arg("clone")
        .arg("-b")
        .arg(branch)
        .arg(url)
        .arg(&repo_path)
        .status()
        .map_err(|e| CatalogError::Git(format!("failed to run git: {}", e)))?;
    if !status.success() {
        return Err(CatalogError::Git(status.to_string()));
    }
    Ok(repo_path)
}

fn is_checkout(repo_path: &Path) -> Result<bool, CatalogError> {
    let git_dir = repo_path.join(".git");
    match fs::metadata(&git_dir) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CatalogError::io(format!("checking {}", git_dir.display()), e)),
    }
}
