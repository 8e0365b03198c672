//! Project auto-detection from the working directory.
//!
//! Resolution order, first match wins:
//! 1. a stored directory mapping for the exact path
//! 2. a `.timetrack` JSON file in the directory with a `project_name`
//! 3. the name of the enclosing git repository root
//! 4. the directory's own name

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Deserialize;

use crate::entry::{DetectionMethod, DirectoryMapping};

/// File name of the per-directory project declaration.
pub const CONFIG_FILE_NAME: &str = ".timetrack";

/// Outcome of project resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub project_name: String,
    pub method: DetectionMethod,
}

/// Filesystem and VCS lookups consulted after stored mappings.
pub trait ProjectSources {
    /// Project name declared by a config file in `dir`, if any.
    fn config_project(&self, dir: &Path) -> Option<String>;

    /// Root of the version-control working tree containing `dir`, if any.
    fn vcs_root(&self, dir: &Path) -> Option<PathBuf>;
}

/// Reads `.timetrack` files and asks `git` for the repository root.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSources;

impl ProjectSources for LocalSources {
    fn config_project(&self, dir: &Path) -> Option<String> {
        read_config_project(&dir.join(CONFIG_FILE_NAME))
    }

    fn vcs_root(&self, dir: &Path) -> Option<PathBuf> {
        git_root(dir)
    }
}

#[derive(Debug, Deserialize)]
struct ProjectConfigFile {
    project_name: Option<String>,
}

/// Reads the `project_name` field from a `.timetrack` file.
///
/// Missing, unreadable or malformed files yield `None`.
pub fn read_config_project(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::debug!(path = ?path, error = %err, "skipping unreadable project config");
            return None;
        }
    };
    let config: ProjectConfigFile = match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::debug!(path = ?path, error = %err, "skipping malformed project config");
            return None;
        }
    };
    config
        .project_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Returns the git top-level directory for `dir`.
pub fn git_root(dir: &Path) -> Option<PathBuf> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .current_dir(dir)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output();
    let output = match output {
        Ok(output) => output,
        Err(err) => {
            tracing::debug!(error = %err, "git unavailable");
            return None;
        }
    };
    if !output.status.success() {
        return None;
    }
    let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!root.is_empty()).then(|| PathBuf::from(root))
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map_or_else(|| "unknown".to_string(), String::from)
}

/// Resolves the project for `dir`.
///
/// `stored` looks up a directory mapping by exact path; its errors are
/// passed through unchanged.
pub fn resolve<E>(
    dir: &Path,
    stored: impl FnOnce(&Path) -> Result<Option<DirectoryMapping>, E>,
    sources: &impl ProjectSources,
) -> Result<Resolution, E> {
    if let Some(mapping) = stored(dir)? {
        return Ok(Resolution {
            project_name: mapping.project_name,
            method: DetectionMethod::StoredMapping,
        });
    }

    if let Some(project_name) = sources.config_project(dir) {
        return Ok(Resolution {
            project_name,
            method: DetectionMethod::ConfigFile,
        });
    }

    if let Some(root) = sources.vcs_root(dir) {
        return Ok(Resolution {
            project_name: base_name(&root),
            method: DetectionMethod::GitRepo,
        });
    }

    Ok(Resolution {
        project_name: base_name(dir),
        method: DetectionMethod::DirectoryName,
    })
}
