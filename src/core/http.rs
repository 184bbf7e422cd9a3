//! HTTP access to the Twitter API.
//!
//! Callers talk to [`HttpBackend`] so the search loops can be exercised
//! against canned responses; [`ReqwestBackend`] is the real client and owns
//! retry and status handling.

use crate::domain::options::HttpOptions;
use crate::utils::error::{Result, SearchError};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;

#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// GET `url` and decode the JSON body.
    async fn get_json(&self, url: &Url, authorization: &str) -> Result<Value>;

    /// POST an `application/x-www-form-urlencoded` body.
    async fn post_form(&self, url: &Url, authorization: &str, form: &[(&str, &str)])
        -> Result<Value>;

    /// POST a JSON body.
    async fn post_json(&self, url: &Url, authorization: &str, body: &Value) -> Result<Value>;
}

/// Joins `path` onto `base`, keeping any path prefix `base` already has.
pub fn endpoint_url(base: &str, path: &str) -> Result<Url> {
    let mut base = Url::parse(base)?;
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    Ok(base.join(path.trim_start_matches('/'))?)
}

/// Pulls the first `errors[].message` out of a Twitter error body.
pub fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/errors/0/message")
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

pub struct ReqwestBackend {
    client: reqwest::Client,
    max_retries: u32,
    retry_base_delay_ms: u64,
}

impl ReqwestBackend {
    pub fn new(options: &HttpOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .user_agent(options.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            max_retries: options.retry_attempts,
            retry_base_delay_ms: options.retry_delay_ms,
        })
    }

    fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(
            self.retry_base_delay_ms
                .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1))),
        )
    }

    /// Sends the request and reads its JSON body, retrying transient failures.
    ///
    /// The body is read inside the loop so a connection dropped mid-body is
    /// retried like one dropped before the headers.
    async fn send_with_retry<F>(&self, url: &Url, build: F) -> Result<Value>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let delay = self.backoff(attempt);
                tracing::debug!("retry {} for {} in {:?}", attempt, url, delay);
                tokio::time::sleep(delay).await;
            }

            let outcome = match build().send().await {
                Ok(response) => match check_status(url, response).await {
                    Ok(response) => read_json(response).await,
                    Err(e) => Err(e),
                },
                Err(e) => Err(SearchError::from(e)),
            };

            match outcome {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    tracing::warn!("request to {} failed, will retry: {}", url, e);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

async fn read_json(response: Response) -> Result<Value> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

async fn check_status(url: &Url, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let reset_at = response
            .headers()
            .get("x-rate-limit-reset")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse::<i64>().ok());
        return Err(SearchError::RateLimited {
            url: url.to_string(),
            reset_at,
        });
    }

    let body = response.text().await.unwrap_or_default();
    let message = api_error_message(&body);

    if status == StatusCode::UNAUTHORIZED {
        return Err(SearchError::AuthenticationError { message });
    }

    Err(SearchError::ApiRequestFailed {
        status: status.as_u16(),
        url: url.to_string(),
        message,
    })
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn get_json(&self, url: &Url, authorization: &str) -> Result<Value> {
        self.send_with_retry(url, || {
            self.client
                .get(url.clone())
                .header(AUTHORIZATION, authorization)
        })
        .await
    }

    async fn post_form(
        &self,
        url: &Url,
        authorization: &str,
        form: &[(&str, &str)],
    ) -> Result<Value> {
        self.send_with_retry(url, || {
            self.client
                .post(url.clone())
                .header(AUTHORIZATION, authorization)
                .form(form)
        })
        .await
    }

    async fn post_json(&self, url: &Url, authorization: &str, body: &Value) -> Result<Value> {
        self.send_with_retry(url, || {
            self.client
                .post(url.clone())
                .header(AUTHORIZATION, authorization)
                .header(CONTENT_TYPE, "application/json")
                .json(body)
        })
        .await
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedRequest {
        pub method: &'static str,
        pub url: Url,
        pub authorization: String,
        pub body: Option<Value>,
    }

    /// Replays queued responses in order and records every request.
    #[derive(Default)]
    pub struct FakeBackend {
        responses: Mutex<VecDeque<Result<Value>>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(self, json: Value) -> Self {
            self.responses.lock().unwrap().push_back(Ok(json));
            self
        }

        pub fn with_error(self, error: SearchError) -> Self {
            self.responses.lock().unwrap().push_back(Err(error));
            self
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }

        fn respond(&self, request: RecordedRequest) -> Result<Value> {
            let url = request.url.to_string();
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Err(SearchError::ApiRequestFailed {
                        status: 404,
                        url,
                        message: "no canned response left".to_string(),
                    })
                })
        }
    }

    #[async_trait]
    impl HttpBackend for FakeBackend {
        async fn get_json(&self, url: &Url, authorization: &str) -> Result<Value> {
            self.respond(RecordedRequest {
                method: "GET",
                url: url.clone(),
                authorization: authorization.to_string(),
                body: None,
            })
        }

        async fn post_form(
            &self,
            url: &Url,
            authorization: &str,
            form: &[(&str, &str)],
        ) -> Result<Value> {
            let body = form
                .iter()
                .map(|(k, v)| ((*k).to_string(), Value::String((*v).to_string())))
                .collect::<serde_json::Map<_, _>>();
            self.respond(RecordedRequest {
                method: "POST",
                url: url.clone(),
                authorization: authorization.to_string(),
                body: Some(Value::Object(body)),
            })
        }

        async fn post_json(&self, url: &Url, authorization: &str, body: &Value) -> Result<Value> {
            self.respond(RecordedRequest {
                method: "POST",
                url: url.clone(),
                authorization: authorization.to_string(),
                body: Some(body.clone()),
            })
        }
    }
}
