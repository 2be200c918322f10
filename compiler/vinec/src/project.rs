//! Projects: `vine.project.yml`, workspace roots and scaffolding.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vine_eval::{Workspace, WorkspaceError};

/// Name of the project file at the top of a project directory.
pub const PROJECT_FILE: &str = "vine.project.yml";

/// Directories holding one of these are workspace roots.
const ROOT_MARKERS: [&str; 2] = [".git", PROJECT_FILE];

const DEFAULT_MAIN: &str = "src/main.vine";
const DEFAULT_AUTHOR: &str = "vine";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("{} does not exist", path.display())]
    NotFound { path: PathBuf },
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{} has no vine.project.yml", path.display())]
    MissingConfig { path: PathBuf },
    #[error("{} already exists", path.display())]
    AlreadyExists { path: PathBuf },
    #[error("invalid project name `{0}`")]
    InvalidName(String),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

impl ProjectError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            ProjectError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ProjectError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Contents of `vine.project.yml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Entry file, relative to the project directory.
    #[serde(default = "default_main")]
    pub main: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_owned()
}

fn default_main() -> String {
    DEFAULT_MAIN.to_owned()
}

impl ProjectConfig {
    pub fn new(name: impl Into<String>) -> Self {
        ProjectConfig {
            name: name.into(),
            version: default_version(),
            main: default_main(),
            author: Some(DEFAULT_AUTHOR.to_owned()),
        }
    }

    /// Parse the text of a project file; `path` is only used for errors.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ProjectError> {
        serde_yaml::from_str(text).map_err(|source| ProjectError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read the project file of the project directory `dir`.
    pub fn load(dir: &Path) -> Result<Self, ProjectError> {
        let path = dir.join(PROJECT_FILE);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ProjectError::MissingConfig {
                    path: dir.to_path_buf(),
                })
            }
            Err(err) => return Err(ProjectError::io(&path, err)),
        };
        Self::parse(&text, &path)
    }

    pub fn to_yaml(&self) -> Result<String, ProjectError> {
        serde_yaml::to_string(self).map_err(|source| ProjectError::Config {
            path: PathBuf::from(PROJECT_FILE),
            source,
        })
    }
}

/// Nearest ancestor of `start` (itself included) holding `.git` or a
/// project file; `start` when there is none.
pub fn find_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| ROOT_MARKERS.iter().any(|marker| dir.join(marker).exists()))
        .unwrap_or(start)
        .to_path_buf()
}

/// A script to run and the workspace it runs in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub file: PathBuf,
    pub workspace: Workspace,
}

/// Resolve a `vine run` argument.
///
/// A directory runs the `main` file of its project file. The workspace
/// root comes from [`find_root`]; the base path is the entry's directory.
pub fn resolve_entry(path: &Path) -> Result<Entry, ProjectError> {
    let path = fs::canonicalize(path).map_err(|err| ProjectError::io(path, err))?;
    let file = if path.is_dir() {
        let config = ProjectConfig::load(&path)?;
        path.join(config.main)
    } else {
        path
    };
    if !file.is_file() {
        return Err(ProjectError::NotFound { path: file });
    }

    let dir = file.parent().unwrap_or(Path::new("/")).to_path_buf();
    let workspace = Workspace::new(find_root(&dir)).cd(&dir.to_string_lossy())?;
    tracing::debug!(
        file = %file.display(),
        root = %workspace.root().display(),
        "resolved entry"
    );
    Ok(Entry { file, workspace })
}

/// Scaffold project `name` inside `parent`, returning its directory.
pub fn create_project(parent: &Path, name: &str) -> Result<PathBuf, ProjectError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(ProjectError::InvalidName(name.to_owned()));
    }

    let dir = parent.join(name);
    if dir.exists() {
        return Err(ProjectError::AlreadyExists { path: dir });
    }

    let config = ProjectConfig::new(name);
    let main = dir.join(&config.main);
    if let Some(src) = main.parent() {
        fs::create_dir_all(src).map_err(|err| ProjectError::io(src, err))?;
    }
    let project_file = dir.join(PROJECT_FILE);
    fs::write(&project_file, config.to_yaml()?)
        .map_err(|err| ProjectError::io(&project_file, err))?;
    fs::write(&main, "print(\"Hello, World!\")\n").map_err(|err| ProjectError::io(&main, err))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_full_config() {
        let text = "name: demo\nversion: 1.2.0\nmain: app.vine\nauthor: someone\n";
        let config = ProjectConfig::parse(text, Path::new(PROJECT_FILE)).unwrap();
        assert_eq!(
            config,
            ProjectConfig {
                name: "demo".into(),
                version: "1.2.0".into(),
                main: "app.vine".into(),
                author: Some("someone".into()),
            }
        );
    }

    #[test]
    fn parse_defaults() {
        let config = ProjectConfig::parse("name: demo\n", Path::new(PROJECT_FILE)).unwrap();
        assert_eq!(config.main, "src/main.vine");
        assert_eq!(config.author, None);
    }

    #[test]
    fn parse_missing_name() {
        let err = ProjectConfig::parse("main: a.vine\n", Path::new(PROJECT_FILE)).unwrap_err();
        assert!(matches!(err, ProjectError::Config { .. }));
    }

    #[test]
    fn yaml_round_trip() {
        let config = ProjectConfig::new("demo");
        let text = config.to_yaml().unwrap();
        assert!(text.contains("name: demo"));
        assert_eq!(
            ProjectConfig::parse(&text, Path::new(PROJECT_FILE)).unwrap(),
            config
        );
    }

    #[test]
    fn create_project_writes_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = create_project(tmp.path(), "hello").unwrap();

        assert!(dir.join("src/main.vine").is_file());
        let config = ProjectConfig::load(&dir).unwrap();
        assert_eq!(config.name, "hello");
        assert_eq!(config.main, "src/main.vine");
    }

    #[test]
    fn create_refuses_existing() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("taken")).unwrap();

        let err = create_project(tmp.path(), "taken").unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists { .. }));
    }

    #[test]
    fn create_rejects_bad_name() {
        let tmp = tempfile::tempdir().unwrap();
        let err = create_project(tmp.path(), "../escape").unwrap_err();
        assert!(matches!(err, ProjectError::InvalidName(_)));
    }

    #[test]
    fn find_root_by_project_file() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("proj");
        fs::create_dir_all(root.join("src/util")).unwrap();
        fs::write(root.join(PROJECT_FILE), "name: proj\n").unwrap();

        assert_eq!(find_root(&root.join("src/util")), root);
    }

    #[test]
    fn find_root_defaults_to_start() {
        let tmp = tempfile::tempdir().unwrap();
        let start = tmp.path().join("loose");
        fs::create_dir(&start).unwrap();

        // A marker above the temp dir would win, so only check the fallback
        // when the search really found nothing.
        let root = find_root(&start);
        assert!(root == start || !root.starts_with(&start));
    }

    #[test]
    fn resolve_project_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = create_project(tmp.path(), "app").unwrap();
        let dir = fs::canonicalize(dir).unwrap();

        let entry = resolve_entry(&dir).unwrap();
        assert_eq!(entry.file, dir.join("src/main.vine"));
        assert_eq!(entry.workspace.root(), dir.as_path());
        assert_eq!(entry.workspace.base_path(), dir.join("src").as_path());
    }

    #[test]
    fn resolve_directory_without_config() {
        let tmp = tempfile::tempdir().unwrap();
        let err = resolve_entry(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::MissingConfig { .. }));
    }

    #[test]
    fn resolve_missing_path() {
        let tmp = tempfile::tempdir().unwrap();
        let err = resolve_entry(&tmp.path().join("nope.vine")).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }
}
