//! core::filespec
//!
//! Parsing of the file-spec arguments accepted by the `content` command.
//!
//! - update: `local-path[<sep>remote-path]`
//! - copy: `[src-branch<sep>]src-path<sep>dst-path`
//! - delete: `remote-path`
//!
//! Paths are lexically cleaned so that `./a//b/../c` and `a/c` address the
//! same remote file.

use std::fmt;

use thiserror::Error;

use super::types::BranchName;

/// Default separator between the parts of a file-spec.
pub const DEFAULT_SEPARATOR: &str = ":";

/// A single problem found in a file-spec.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SpecProblem {
    #[error("invalid spec")]
    InvalidSpec,

    #[error("invalid branch spec")]
    InvalidBranch,

    #[error("empty source spec")]
    EmptySource,

    #[error("empty target spec")]
    EmptyTarget,

    #[error("source and target files are the same")]
    SourceEqualsTarget,
}

/// Errors from file-spec parsing. All problems with one spec are reported together.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("separator cannot be empty")]
    EmptySeparator,

    #[error("{kind}-spec {spec:?}: {}", join(.problems))]
    Invalid {
        kind: SpecKind,
        spec: String,
        problems: Vec<SpecProblem>,
    },
}

fn join(problems: &[SpecProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Which kind of spec failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    Update,
    Copy,
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecKind::Update => f.write_str("update"),
            SpecKind::Copy => f.write_str("copy"),
        }
    }
}

/// A local file to upload to a remote path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSpec {
    pub source: String,
    pub target: String,
}

/// A remote file to copy within the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopySpec {
    /// Source branch; `None` means the base branch.
    pub branch: Option<BranchName>,
    pub source: String,
    pub target: String,
}

fn check_separator(separator: &str) -> Result<(), SpecError> {
    if separator.is_empty() {
        return Err(SpecError::EmptySeparator);
    }
    Ok(())
}

/// Parse `local-path[<sep>remote-path]`.
///
/// ```
/// use ghup::core::filespec::parse_update_spec;
///
/// let spec = parse_update_spec("dist/app.js:public/app.js", ":").unwrap();
/// assert_eq!(spec.source, "dist/app.js");
/// assert_eq!(spec.target, "public/app.js");
/// ```
pub fn parse_update_spec(spec: &str, separator: &str) -> Result<UpdateSpec, SpecError> {
    check_separator(separator)?;

    let (source, target) = spec.split_once(separator).unwrap_or((spec, spec));

    let mut problems = Vec::new();
    if source.is_empty() {
        problems.push(SpecProblem::EmptySource);
    }
    if target.is_empty() {
        problems.push(SpecProblem::EmptyTarget);
    }
    if !problems.is_empty() {
        return Err(SpecError::Invalid {
            kind: SpecKind::Update,
            spec: spec.to_string(),
            problems,
        });
    }

    Ok(UpdateSpec {
        source: clean_path(source),
        target: clean_path(target),
    })
}

/// Parse `[src-branch<sep>]src-path<sep>dst-path`.
pub fn parse_copy_spec(spec: &str, separator: &str) -> Result<CopySpec, SpecError> {
    check_separator(separator)?;

    let parts: Vec<&str> = spec.split(separator).collect();
    let mut problems = Vec::new();

    let (branch, source, target) = match parts.as_slice() {
        [source, target] => (None, *source, *target),
        [branch, source, target] => {
            let branch = match BranchName::new(*branch) {
                Ok(b) => Some(b),
                Err(_) => {
                    problems.push(SpecProblem::InvalidBranch);
                    None
                }
            };
            (branch, *source, *target)
        }
        _ => {
            problems.push(SpecProblem::InvalidSpec);
            (None, "", "")
        }
    };

    if source.is_empty() {
        problems.push(SpecProblem::EmptySource);
    }
    if target.is_empty() {
        problems.push(SpecProblem::EmptyTarget);
    }

    let source = clean_path(source);
    let target = clean_path(target);
    if !problems.contains(&SpecProblem::InvalidSpec) && source == target {
        problems.push(SpecProblem::SourceEqualsTarget);
    }

    if !problems.is_empty() {
        return Err(SpecError::Invalid {
            kind: SpecKind::Copy,
            spec: spec.to_string(),
            problems,
        });
    }

    Ok(CopySpec {
        branch,
        source,
        target,
    })
}

/// Lexically clean a slash-separated path.
///
/// Collapses repeated separators, drops `.` elements, resolves `..`
/// against the preceding element and strips any trailing slash. An empty
/// result becomes `.`.
pub fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}
