//! Workspace confinement for document loads and write-back.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Keeps every file the arbiter reads or writes inside one workspace and out
/// of toolchain, registry, and build-output directories.
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    root: PathBuf,
    forbidden: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Path is outside workspace: {path} (workspace: {workspace})")]
    OutsideWorkspace { path: PathBuf, workspace: PathBuf },

    #[error("Path is in forbidden directory: {path} (forbidden: {forbidden})")]
    ForbiddenPath { path: PathBuf, forbidden: PathBuf },

    #[error("Failed to canonicalize {path}: {source}")]
    Canonicalize {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn canonicalize(path: &Path) -> Result<PathBuf, SafetyError> {
    path.canonicalize().map_err(|source| SafetyError::Canonicalize {
        path: path.to_path_buf(),
        source,
    })
}

impl WorkspaceGuard {
    /// Guard rooted at `root` (canonicalized, so symlinked roots work).
    ///
    /// Cargo's registry and git checkouts, the rustup home, and the
    /// workspace's own `target/` are forbidden when they exist.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let root = canonicalize(root.as_ref())?;

        let mut candidates = vec![root.join("target")];
        if let Some(home) = home::home_dir() {
            candidates.push(home.join(".cargo/registry"));
            candidates.push(home.join(".cargo/git"));
            candidates.push(home.join(".rustup"));
        }

        let forbidden = candidates
            .iter()
            .filter_map(|dir| dir.canonicalize().ok())
            .collect();

        Ok(Self { root, forbidden })
    }

    /// Add another forbidden directory. Directories that do not exist are
    /// ignored, matching the defaults.
    pub fn forbid(mut self, dir: impl AsRef<Path>) -> Self {
        if let Ok(dir) = dir.as_ref().canonicalize() {
            self.forbidden.push(dir);
        }
        self
    }

    pub fn workspace_root(&self) -> &Path {
        &self.root
    }

    /// Resolve `path` against the workspace and return its canonical form if
    /// it is safe to touch.
    ///
    /// The file must exist. Call [`WorkspaceGuard::recheck`] right before
    /// writing to narrow the window between check and use.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let canonical = canonicalize(&absolute)?;
        self.check(&canonical)?;
        Ok(canonical)
    }

    /// Re-canonicalize an already resolved path and check it again.
    pub fn recheck(&self, path: &Path) -> Result<PathBuf, SafetyError> {
        let canonical = canonicalize(path)?;
        self.check(&canonical)?;
        Ok(canonical)
    }

    fn check(&self, canonical: &Path) -> Result<(), SafetyError> {
        if !canonical.starts_with(&self.root) {
            return Err(SafetyError::OutsideWorkspace {
                path: canonical.to_path_buf(),
                workspace: self.root.clone(),
            });
        }

        if let Some(forbidden) = self.forbidden.iter().find(|dir| canonical.starts_with(dir)) {
            return Err(SafetyError::ForbiddenPath {
                path: canonical.to_path_buf(),
                forbidden: forbidden.clone(),
            });
        }

        Ok(())
    }
}
