//! Environment-backed configuration for the answer backend.
//!
//! The credential is a static API key; there is no account flow. Loaded
//! from the process environment, optionally seeded from `.env.local` /
//! `.env` at the crate root via [`load_env_files`].

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";

/// Optional model override; defaults to [`DEFAULT_MODEL`].
pub const ENV_MODEL: &str = "QUIZ_MODEL";

/// Optional endpoint override; defaults to [`DEFAULT_ENDPOINT`].
pub const ENV_API_URL: &str = "QUIZ_API_URL";

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Connection settings for the chat-completions backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
}

impl ApiConfig {
    /// Read config from the environment. A missing key becomes an empty
    /// string — the client short-circuits on it per request rather than
    /// failing construction, so the pipeline can start unconfigured.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(ENV_API_KEY).unwrap_or_default(),
            model: std::env::var(ENV_MODEL).unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            endpoint: std::env::var(ENV_API_URL).unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
        }
    }

    /// True when an API key is present.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Load `.env.local` → `.env` from the crate root, first match wins.
pub fn load_env_files() {
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    for env_file in [".env.local", ".env"] {
        let path = manifest_dir.join(env_file);
        if path.exists() {
            match dotenvy::from_path(&path) {
                Ok(_) => log::info!("[STARTUP] Loaded {}", path.display()),
                Err(e) => log::warn!("[STARTUP] Failed to load {}: {}", path.display(), e),
            }
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_not_configured() {
        let config = ApiConfig {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        };
        assert!(!config.is_configured());
    }

    #[test]
    fn present_key_is_configured() {
        let config = ApiConfig {
            api_key: "sk-test".to_string(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        };
        assert!(config.is_configured());
    }
}
