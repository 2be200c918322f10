//! Workspace: the directory tree a program may load modules from.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum WorkspaceError {
    #[error("path {} is outside the workspace root {}", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

/// A workspace root plus the directory relative paths resolve against.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
    base_path: PathBuf,
}

impl Workspace {
    /// Workspace rooted at `root`, with the root as base path.
    pub fn new(root: PathBuf) -> Self {
        let root = normalize(&root);
        Workspace {
            base_path: root.clone(),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve `path` to an absolute path inside the workspace.
    ///
    /// `@/x` and `@x` are relative to the root, other relative paths to the
    /// base path. Absolute paths are accepted only inside the root.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, WorkspaceError> {
        let joined = if let Some(rest) = path.strip_prefix('@') {
            self.root.join(rest.trim_start_matches(['/', '\\']))
        } else {
            let path = Path::new(path);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                self.base_path.join(path)
            }
        };
        let resolved = normalize(&joined);
        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            Err(WorkspaceError::OutsideRoot {
                path: resolved,
                root: self.root.clone(),
            })
        }
    }

    /// A copy of this workspace whose base path is `path`.
    pub fn cd(&self, path: &str) -> Result<Workspace, WorkspaceError> {
        let base_path = self.resolve(path)?;
        Ok(Workspace {
            root: self.root.clone(),
            base_path,
        })
    }

    /// A copy with `dir` as base path; `dir` must already be resolved.
    pub(crate) fn with_base(&self, dir: &Path) -> Workspace {
        Workspace {
            root: self.root.clone(),
            base_path: normalize(dir),
        }
    }
}

/// Lexically resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
