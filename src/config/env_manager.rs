use serde::{Deserialize, Serialize};
use tracing::warn;

/// Credential used when no completion API key is configured. Startup
/// succeeds with it; the first completion call then fails upstream.
pub const PLACEHOLDER_API_KEY: &str = "dummy-key";

/// Stores API keys for the external services
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys {
    /// GitHub API token for authenticated requests
    pub github_token: Option<String>,
    /// Key for the OpenAI-compatible completion endpoint
    pub llm_api_key: Option<String>,
}

impl ApiKeys {
    /// Fills keys that are unset here from `other`
    pub fn merge(&mut self, other: ApiKeys) {
        if other.github_token.is_some() {
            self.github_token = other.github_token;
        }
        if other.llm_api_key.is_some() {
            self.llm_api_key = other.llm_api_key;
        }
    }

    /// Completion key, falling back to [`PLACEHOLDER_API_KEY`]
    pub fn llm_api_key_or_placeholder(&self) -> &str {
        match self.llm_api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key,
            _ => {
                warn!("GROQ_API_KEY is not set; README generation will fail until it is configured");
                PLACEHOLDER_API_KEY
            }
        }
    }
}

/// Returns a non-empty environment variable
pub fn get_env_value(key: &str) -> Option<String> {
    let value = std::env::var(key).ok()?;
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_when_missing() {
        let keys = ApiKeys::default();
        assert_eq!(keys.llm_api_key_or_placeholder(), PLACEHOLDER_API_KEY);

        let keys = ApiKeys { github_token: None, llm_api_key: Some("  ".into()) };
        assert_eq!(keys.llm_api_key_or_placeholder(), PLACEHOLDER_API_KEY);
    }

    #[test]
    fn test_merge_prefers_set_values() {
        let mut keys = ApiKeys { github_token: Some("file".into()), llm_api_key: Some("file".into()) };
        keys.merge(ApiKeys { github_token: Some("env".into()), llm_api_key: None });
        assert_eq!(keys.github_token.as_deref(), Some("env"));
        assert_eq!(keys.llm_api_key.as_deref(), Some("file"));
    }
}
