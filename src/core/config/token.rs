//! core::config::token
//!
//! Access token resolution.
//!
//! A configured token may be the literal value or a path to a file holding
//! it. When nothing is configured, the GitHub CLI (`gh auth token`) is
//! consulted unless disabled.
//!
//! [`Token`] implements custom Debug to redact its value.

use std::fmt;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use super::ConfigError;

/// An access token. Debug output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Token(value.into())
    }

    /// The raw token value, for header injection only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token([REDACTED])")
    }
}

/// Resolve a configured token value.
///
/// - a value naming an existing file is replaced by the file's trimmed content
/// - `None` falls back to `fallback` (the GitHub CLI in production)
/// - an empty result is [`ConfigError::NoToken`]
pub fn resolve_token(
    configured: Option<&str>,
    fallback: impl FnOnce() -> Option<String>,
) -> Result<Token, ConfigError> {
    let value = match configured.filter(|v| !v.is_empty()) {
        Some(value) => {
            let path = Path::new(value);
            if path.is_file() {
                debug!("reading token from {}", path.display());
                std::fs::read_to_string(path)
                    .map_err(|e| ConfigError::ReadError {
                        path: path.to_path_buf(),
                        source: e,
                    })?
                    .trim()
                    .to_string()
            } else {
                value.trim().to_string()
            }
        }
        None => fallback().unwrap_or_default().trim().to_string(),
    };

    if value.is_empty() {
        return Err(ConfigError::NoToken);
    }
    Ok(Token(value))
}

/// Ask the GitHub CLI for its token. Any failure yields `None`.
pub fn gh_cli_token() -> Option<String> {
    let output = Command::new("gh").args(["auth", "token"]).output().ok()?;
    if !output.status.success() {
        debug!("gh auth token exited with {}", output.status);
        return None;
    }
    let token = String::from_utf8(output.stdout).ok()?;
    debug!("using token from gh CLI");
    Some(token.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn literal_value() {
        let token = resolve_token(Some("ghp_abc"), || None).unwrap();
        assert_eq!(token.expose(), "ghp_abc");
    }

    #[test]
    fn file_value_is_trimmed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("token");
        std::fs::write(&path, "ghs_fromfile\n").unwrap();

        let token = resolve_token(Some(path.to_str().unwrap()), || None).unwrap();
        assert_eq!(token.expose(), "ghs_fromfile");
    }

    #[test]
    fn fallback_used_when_unset() {
        let token = resolve_token(None, || Some("gho_cli\n".into())).unwrap();
        assert_eq!(token.expose(), "gho_cli");
    }

    #[test]
    fn fallback_not_used_when_set() {
        let token = resolve_token(Some("ghp_abc"), || panic!("fallback called")).unwrap();
        assert_eq!(token.expose(), "ghp_abc");
    }

    #[test]
    fn empty_is_error() {
        assert!(matches!(
            resolve_token(None, || None),
            Err(ConfigError::NoToken)
        ));
        assert!(matches!(
            resolve_token(Some(""), || Some("  ".into())),
            Err(ConfigError::NoToken)
        ));
    }

    #[test]
    fn debug_redacts() {
        let token = Token::new("ghp_secret");
        let debug = format!("{:?}", token);
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
