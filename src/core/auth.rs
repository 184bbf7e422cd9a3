//! OAuth2 application-only authentication.
//!
//! The consumer key and secret are exchanged for a bearer token at
//! `POST /oauth2/token`; every search request then carries that token.

use crate::config::credentials::Credentials;
use crate::core::http::{endpoint_url, HttpBackend};
use crate::domain::model::{BearerToken, TokenResponse};
use crate::utils::error::{Result, SearchError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub const TOKEN_PATH: &str = "oauth2/token";

/// `base64(urlencode(key) ":" urlencode(secret))`, the Basic credential Twitter expects.
pub fn encode_basic_credentials(consumer_key: &str, consumer_secret: &str) -> String {
    let pair = format!(
        "{}:{}",
        urlencoding::encode(consumer_key),
        urlencoding::encode(consumer_secret)
    );
    STANDARD.encode(pair)
}

pub async fn obtain_bearer_token(
    backend: &dyn HttpBackend,
    base_url: &str,
    consumer_key: &str,
    consumer_secret: &str,
) -> Result<BearerToken> {
    let url = endpoint_url(base_url, TOKEN_PATH)?;
    let authorization = format!(
        "Basic {}",
        encode_basic_credentials(consumer_key, consumer_secret)
    );

    tracing::debug!("requesting bearer token from {}", url);
    let value = backend
        .post_form(&url, &authorization, &[("grant_type", "client_credentials")])
        .await?;
    let response: TokenResponse = serde_json::from_value(value)?;

    match response.token_type.as_deref() {
        Some(kind) if kind.eq_ignore_ascii_case("bearer") => {}
        other => {
            return Err(SearchError::AuthenticationError {
                message: format!("expected a bearer token, got token_type {:?}", other),
            })
        }
    }

    match response.access_token {
        Some(token) if !token.is_empty() => {
            tracing::info!("🔑 obtained application bearer token");
            Ok(BearerToken::new(token))
        }
        _ => Err(SearchError::AuthenticationError {
            message: "token response has no access_token".to_string(),
        }),
    }
}

/// A configured bearer token wins; otherwise the consumer pair is exchanged for one.
pub async fn resolve_bearer_token(
    backend: &dyn HttpBackend,
    base_url: &str,
    credentials: &Credentials,
) -> Result<BearerToken> {
    if let Some(token) = &credentials.bearer_token {
        tracing::debug!("using configured bearer token");
        return Ok(BearerToken::new(token.clone()));
    }

    match credentials.consumer_pair() {
        Some((key, secret)) => obtain_bearer_token(backend, base_url, key, secret).await,
        None => {
            credentials.ensure_usable()?;
            Err(SearchError::MissingConfigError {
                field: "credentials".to_string(),
            })
        }
    }
}
