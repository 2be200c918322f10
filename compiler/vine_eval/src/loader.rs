//! Resolving `use "name"` to source text.

use std::io;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::workspace::{Workspace, WorkspaceError};

/// Extension tried when an import names a path without one.
pub const SOURCE_EXTENSION: &str = "vine";

/// Source of a module found by a loader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedModule {
    /// Resolved path; also the module's cache key.
    pub path: PathBuf,
    pub source: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Finds module source for the evaluator.
pub trait ModuleLoader: Send + Sync {
    /// `Ok(None)` when nothing matches `name`.
    fn load(&self, name: &str, workspace: &Workspace) -> Result<Option<LoadedModule>, LoadError>;
}

/// Candidate paths for `name`: the path itself, then with `.vine` added
/// when it has no extension.
fn candidates(name: &str, workspace: &Workspace) -> Result<Vec<PathBuf>, WorkspaceError> {
    let path = workspace.resolve(name)?;
    let mut paths = vec![path.clone()];
    if path.extension().is_none() {
        paths.push(path.with_extension(SOURCE_EXTENSION));
    }
    Ok(paths)
}

/// Loads modules from disk.
#[derive(Copy, Clone, Debug, Default)]
pub struct FsLoader;

impl ModuleLoader for FsLoader {
    fn load(&self, name: &str, workspace: &Workspace) -> Result<Option<LoadedModule>, LoadError> {
        for path in candidates(name, workspace)? {
            if !path.is_file() {
                continue;
            }
            let source =
                std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })?;
            return Ok(Some(LoadedModule { path, source }));
        }
        Ok(None)
    }
}

/// Loads modules from an in-memory file table, keyed by absolute path.
#[derive(Clone, Debug, Default)]
pub struct MemoryLoader {
    files: FxHashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(mut self, path: impl AsRef<Path>, source: impl Into<String>) -> Self {
        self.files.insert(path.as_ref().to_path_buf(), source.into());
        self
    }
}

impl ModuleLoader for MemoryLoader {
    fn load(&self, name: &str, workspace: &Workspace) -> Result<Option<LoadedModule>, LoadError> {
        Ok(candidates(name, workspace)?.into_iter().find_map(|path| {
            self.files.get(&path).map(|source| LoadedModule {
                source: source.clone(),
                path,
            })
        }))
    }
}
