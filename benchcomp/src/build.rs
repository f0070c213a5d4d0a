//! Builds under test.
//!
//! A build is named on the command line by a spec of the form
//! `PATH [pref=value ...]`: an existing build directory followed by
//! preference settings that are handed to every benchmark run against it.

use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Environment variable holding the absolute build directory.
pub const BUILD_DIR_ENV: &str = "BENCHCOMP_BUILD";

/// Environment variable holding the build's prefs, space separated.
pub const BUILD_PREFS_ENV: &str = "BENCHCOMP_PREFS";

/// Placeholder in benchmark arguments replaced by the build directory.
pub const BUILD_PLACEHOLDER: &str = "{build}";

/// Errors that can occur when parsing a build spec.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The spec contained no path.
    #[error("Empty build specification")]
    EmptySpec,
    /// The path does not name a directory.
    #[error("Build path is not a directory: {0}")]
    NotADirectory(PathBuf),
    /// A pref is not of the form `key=value`.
    #[error("Bad pref setting: {0}")]
    BadPref(String),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One build to benchmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Build {
    /// Display name: the normalized path as given, then the prefs.
    pub name: String,
    /// Absolute build directory.
    pub dir: PathBuf,
    /// Pref settings, each `key=value`.
    pub prefs: Vec<String>,
}

impl Build {
    /// Parse a build spec.
    ///
    /// # Errors
    ///
    /// Returns an error if the spec is empty, the path is not a directory, or
    /// a pref is malformed.
    pub fn parse(spec: &str) -> Result<Self, BuildError> {
        let mut elements = spec.split_whitespace();
        let path = elements.next().ok_or(BuildError::EmptySpec)?;

        let path = Path::new(path);
        if !path.is_dir() {
            return Err(BuildError::NotADirectory(path.to_path_buf()));
        }
        let dir = path.canonicalize()?;

        let prefs = elements
            .map(|pref| {
                if is_valid_pref(pref) {
                    Ok(pref.to_string())
                } else {
                    Err(BuildError::BadPref(pref.to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut name = normalize(path).display().to_string();
        for pref in &prefs {
            name.push(' ');
            name.push_str(pref);
        }

        Ok(Self { name, dir, prefs })
    }

    /// Environment variables describing this build to a benchmark.
    pub fn env(&self) -> Vec<(String, String)> {
        vec![
            (BUILD_DIR_ENV.to_string(), self.dir.display().to_string()),
            (BUILD_PREFS_ENV.to_string(), self.prefs.join(" ")),
        ]
    }

    /// Replace every `{build}` in `arg` with the build directory.
    pub fn expand(&self, arg: &str) -> String {
        arg.replace(BUILD_PLACEHOLDER, &self.dir.display().to_string())
    }
}

/// A pref starts with a name made of word characters and dots, then `=`.
static PREF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.]+=").expect("pref pattern is a valid regex"));

fn is_valid_pref(pref: &str) -> bool {
    PREF_PATTERN.is_match(pref)
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component where there is one.
fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            _ => parts.push(component),
        }
    }

    if parts.is_empty() {
        PathBuf::from(".")
    } else {
        parts.iter().collect()
    }
}
