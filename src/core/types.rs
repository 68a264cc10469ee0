//! core::types
//!
//! Strong types for the identifiers the reconcilers pass around.
//!
//! # Types
//!
//! - [`RepoSlug`] - `owner/name` coordinates of the remote repository
//! - [`BranchName`] - Validated short branch name
//! - [`RefName`] - Validated, fully-qualified reference name
//! - [`RefType`] - Namespace used to qualify short ref names
//! - [`Oid`] - Canonical (full-length) object identifier
//!
//! # Validation
//!
//! Ref and branch names follow `git check-ref-format`. Construction fails
//! with a [`TypeError`] naming the violated rule, so an invalid name never
//! reaches the transport layer.
//!
//! # Examples
//!
//! ```
//! use ghup::core::types::{RefName, RefType, is_commit_hash};
//!
//! let qualified = RefName::qualify("v1.0.0", RefType::Tags).unwrap();
//! assert_eq!(qualified.as_str(), "refs/tags/v1.0.0");
//!
//! assert!(is_commit_hash("1a2b3c4"));
//! assert!(!is_commit_hash("main"));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),

    #[error("invalid repository: {0}")]
    InvalidRepo(String),
}

/// Check a name against Git's reference-name grammar.
///
/// Returns the violated rule as a short message.
fn check_ref_format(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("cannot be empty".into());
    }
    if name == "@" {
        return Err("cannot be '@'".into());
    }
    if name.starts_with('/') {
        return Err("cannot start with '/'".into());
    }
    if name.ends_with('/') {
        return Err("cannot end with '/'".into());
    }
    if name.ends_with('.') {
        return Err("cannot end with '.'".into());
    }
    if name.contains("//") {
        return Err("cannot contain '//'".into());
    }
    if name.contains("..") {
        return Err("cannot contain '..'".into());
    }
    if name.contains("@{") {
        return Err("cannot contain '@{'".into());
    }

    const FORBIDDEN: [char; 8] = [' ', '~', '^', ':', '?', '*', '[', '\\'];
    if let Some(c) = name.chars().find(|c| FORBIDDEN.contains(c)) {
        return Err(format!("cannot contain '{c}'"));
    }
    if name.chars().any(|c| c.is_ascii_control()) {
        return Err("cannot contain control characters".into());
    }

    for component in name.split('/') {
        if component.starts_with('.') {
            return Err(format!("component '{component}' cannot start with '.'"));
        }
        if component.ends_with(".lock") {
            return Err(format!("component '{component}' cannot end with '.lock'"));
        }
    }

    Ok(())
}

/// Returns true if `s` looks like a literal commit hash (7 to 40 lowercase hex chars).
///
/// Classification decides how a commit-ish is resolved: literal hashes go
/// through a direct commit lookup, everything else through an expression query.
pub fn is_commit_hash(s: &str) -> bool {
    (7..=40).contains(&s.len()) && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Coordinates of the remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl RepoSlug {
    /// Create repository coordinates, rejecting empty parts.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self, TypeError> {
        let owner = owner.into();
        let name = name.into();
        if owner.is_empty() || name.is_empty() {
            return Err(TypeError::InvalidRepo(format!("'{owner}/{name}'")));
        }
        if owner.contains('/') || name.contains('/') {
            return Err(TypeError::InvalidRepo(format!(
                "'{owner}/{name}' must be exactly owner/name"
            )));
        }
        Ok(Self { owner, name })
    }
}

impl std::str::FromStr for RepoSlug {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (owner, name) = s
            .split_once('/')
            .ok_or_else(|| TypeError::InvalidRepo(format!("'{s}' must be owner/name")))?;
        Self::new(owner, name)
    }
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A validated short branch name (no `refs/heads/` prefix).
///
/// ```
/// use ghup::core::types::BranchName;
///
/// let name = BranchName::new("feature/login").unwrap();
/// assert_eq!(name.as_ref_name().as_str(), "refs/heads/feature/login");
///
/// assert!(BranchName::new("-flag").is_err());
/// assert!(BranchName::new("bad..name").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.starts_with('-') {
            return Err(TypeError::InvalidBranchName(format!(
                "'{name}': cannot start with '-'"
            )));
        }
        check_ref_format(&name)
            .map_err(|rule| TypeError::InvalidBranchName(format!("'{name}': {rule}")))?;
        Ok(Self(name))
    }

    /// The fully-qualified `refs/heads/<name>` form.
    pub fn as_ref_name(&self) -> RefName {
        RefName(format!("refs/heads/{}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Namespace used when qualifying a short ref name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RefType {
    /// `refs/heads/`
    #[default]
    Heads,
    /// `refs/tags/`
    Tags,
}

impl RefType {
    /// The `refs/<type>/` prefix.
    pub fn prefix(self) -> &'static str {
        match self {
            RefType::Heads => "refs/heads/",
            RefType::Tags => "refs/tags/",
        }
    }
}

impl std::fmt::Display for RefType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefType::Heads => write!(f, "heads"),
            RefType::Tags => write!(f, "tags"),
        }
    }
}

/// A validated, fully-qualified reference name (`refs/...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    /// Create a ref name that is already fully qualified.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if !name.starts_with("refs/") {
            return Err(TypeError::InvalidRefName(format!(
                "'{name}': must start with 'refs/'"
            )));
        }
        check_ref_format(&name)
            .map_err(|rule| TypeError::InvalidRefName(format!("'{name}': {rule}")))?;
        Ok(Self(name))
    }

    /// Normalize a possibly-short ref name into its fully-qualified form.
    ///
    /// - `refs/...` passes through unchanged
    /// - `heads/...` and `tags/...` gain the `refs/` prefix
    /// - anything else is placed under `default_type`
    ///
    /// ```
    /// use ghup::core::types::{RefName, RefType};
    ///
    /// let q = |n| RefName::qualify(n, RefType::Tags).unwrap().to_string();
    /// assert_eq!(q("refs/heads/main"), "refs/heads/main");
    /// assert_eq!(q("heads/main"), "refs/heads/main");
    /// assert_eq!(q("v1.0.0"), "refs/tags/v1.0.0");
    /// assert!(RefName::qualify("bad@{ref", RefType::Heads).is_err());
    /// ```
    pub fn qualify(name: &str, default_type: RefType) -> Result<Self, TypeError> {
        check_ref_format(name)
            .map_err(|rule| TypeError::InvalidRefName(format!("'{name}': {rule}")))?;

        let qualified = if name.starts_with("refs/") {
            name.to_string()
        } else if name.starts_with("heads/") || name.starts_with("tags/") {
            format!("refs/{name}")
        } else {
            format!("{}{}", default_type.prefix(), name)
        };

        Self::new(qualified)
    }

    /// Ref name for a tag (`refs/tags/<tag>`).
    pub fn for_tag(tag: &str) -> Result<Self, TypeError> {
        Self::new(format!("refs/tags/{tag}"))
    }

    /// The name without the leading `refs/`, as used by the REST ref endpoints.
    pub fn short(&self) -> &str {
        self.0.strip_prefix("refs/").unwrap_or(&self.0)
    }

    /// Strip a prefix from the ref name and return the remainder.
    pub fn strip_prefix(&self, prefix: &str) -> Option<&str> {
        self.0.strip_prefix(prefix)
    }

    pub fn is_tag(&self) -> bool {
        self.0.starts_with("refs/tags/")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A full-length Git object identifier (SHA-1 or SHA-256), lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().trim().to_ascii_lowercase();
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(format!("'{oid}' is not hexadecimal")));
        }
        Ok(Self(oid))
    }

    /// Build an id from a raw 20 or 32 byte digest.
    pub(crate) fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    /// First `len` characters (the whole id if shorter).
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// True if `prefix` abbreviates this id.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(&prefix.to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
