use crate::error::{ServiceError, Result, INVALID_REFERENCE_MESSAGE};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static HOSTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"github\.com/([^/?#\s]+)/([^/?#\s]+)").expect("valid regex"));

static SHORTHAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)/?$").expect("valid regex"));

/// The owner/name pair identifying a hosted repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryReference {
    /// Account or organization owning the repository
    pub owner: String,
    /// Repository name, without any `.git` suffix
    pub name: String,
}

impl RepositoryReference {
    /// Extracts a reference from free-form input.
    ///
    /// Accepts anything containing `github.com/<owner>/<name>` (scheme, extra
    /// path segments, query and fragment are ignored) as well as the bare
    /// `<owner>/<name>` shorthand.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        let captures = HOSTED
            .captures(input)
            .or_else(|| SHORTHAND.captures(input))
            .ok_or_else(|| ServiceError::InvalidInput(INVALID_REFERENCE_MESSAGE.to_string()))?;

        let owner = captures[1].to_string();
        let name = captures[2].strip_suffix(".git").unwrap_or(&captures[2]).to_string();

        // "." and ".." would resolve to other API paths
        let dots_only = |s: &str| s.chars().all(|c| c == '.');
        if dots_only(&owner) || dots_only(&name) {
            return Err(ServiceError::InvalidInput(INVALID_REFERENCE_MESSAGE.to_string()));
        }

        Ok(Self { owner, name })
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
