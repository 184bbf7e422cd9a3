use crate::utils::error::{Result, SearchError};
use serde::{Deserialize, Serialize};

pub const CONSUMER_KEY_ENV: &str = "TWITTER_CONSUMER_KEY";
pub const CONSUMER_SECRET_ENV: &str = "TWITTER_CONSUMER_SECRET";
pub const BEARER_TOKEN_ENV: &str = "TWITTER_BEARER_TOKEN";

/// App credentials for application-only auth.
///
/// Either a ready bearer token, or the consumer key/secret pair that can be
/// exchanged for one.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub bearer_token: Option<String>,
    /// Let `TWITTER_*` environment variables win over values from the file.
    pub env_overwrite: bool,
}

fn present(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let v = v.trim().to_string();
        // An unset variable survives substitution as a literal `${NAME}`.
        if v.is_empty() || (v.starts_with("${") && v.ends_with('}')) {
            None
        } else {
            Some(v)
        }
    })
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            consumer_key: std::env::var(CONSUMER_KEY_ENV).ok(),
            consumer_secret: std::env::var(CONSUMER_SECRET_ENV).ok(),
            bearer_token: std::env::var(BEARER_TOKEN_ENV).ok(),
            env_overwrite: false,
        }
        .normalized()
    }

    pub fn normalized(self) -> Self {
        Self {
            consumer_key: present(self.consumer_key),
            consumer_secret: present(self.consumer_secret),
            bearer_token: present(self.bearer_token),
            env_overwrite: self.env_overwrite,
        }
    }

    /// Values from the environment replace file values when `env_overwrite` is set.
    pub fn apply_env_overwrite(self) -> Self {
        if !self.env_overwrite {
            return self.normalized();
        }
        let env = Self::from_env();
        Self {
            consumer_key: env.consumer_key.or(self.consumer_key),
            consumer_secret: env.consumer_secret.or(self.consumer_secret),
            bearer_token: env.bearer_token.or(self.bearer_token),
            env_overwrite: true,
        }
        .normalized()
    }

    pub fn has_bearer_token(&self) -> bool {
        self.bearer_token.is_some()
    }

    pub fn consumer_pair(&self) -> Option<(&str, &str)> {
        match (&self.consumer_key, &self.consumer_secret) {
            (Some(key), Some(secret)) => Some((key.as_str(), secret.as_str())),
            _ => None,
        }
    }

    pub fn ensure_usable(&self) -> Result<()> {
        if self.has_bearer_token() || self.consumer_pair().is_some() {
            return Ok(());
        }
        let field = match (&self.consumer_key, &self.consumer_secret) {
            (Some(_), None) => "credentials.consumer_secret",
            (None, Some(_)) => "credentials.consumer_key",
            _ => "credentials (bearer_token or consumer_key + consumer_secret)",
        };
        Err(SearchError::MissingConfigError {
            field: field.to_string(),
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("consumer_key", &mask(&self.consumer_key))
            .field("consumer_secret", &mask(&self.consumer_secret))
            .field("bearer_token", &mask(&self.bearer_token))
            .field("env_overwrite", &self.env_overwrite)
            .finish()
    }
}
