//! Premium search (30-day / full-archive).
//!
//! A rule payload is POSTed to the environment's endpoint; results come back
//! in pages linked by a `next` token that is echoed in the following request.

use crate::core::http::HttpBackend;
use crate::domain::model::{BearerToken, PremiumSearchResponse, SearchCollection, Tweet};
use crate::domain::options::PremiumOptions;
use crate::utils::error::{Result, SearchError};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{json, Value};
use url::Url;

const PREMIUM_TIME_FORMAT: &str = "%Y%m%d%H%M";

/// Normalizes a date to the premium `YYYYMMDDHHMM` form.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM`, `YYYY-MM-DDTHH:MM`, or a value
/// that is already twelve digits.
pub fn convert_utc_time(field_name: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.len() == 12 && value.chars().all(|c| c.is_ascii_digit()) {
        if NaiveDateTime::parse_from_str(value, PREMIUM_TIME_FORMAT).is_ok() {
            return Ok(value.to_string());
        }
    }

    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.format(PREMIUM_TIME_FORMAT).to_string());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.format(PREMIUM_TIME_FORMAT).to_string())
        .ok_or_else(|| SearchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Expected YYYY-MM-DD, YYYY-MM-DD HH:MM or YYYYMMDDHHMM".to_string(),
        })
}

/// `{"query", "maxResults", "fromDate"?, "toDate"?}`
pub fn gen_rule_payload(query: &str, options: &PremiumOptions) -> Result<Value> {
    let mut payload = json!({
        "query": query,
        "maxResults": options.results_per_call,
    });
    if let Some(from) = &options.from_date {
        payload["fromDate"] = Value::String(convert_utc_time("premium.from_date", from)?);
    }
    if let Some(to) = &options.to_date {
        payload["toDate"] = Value::String(convert_utc_time("premium.to_date", to)?);
    }
    Ok(payload)
}

pub struct PremiumSearch<'a> {
    backend: &'a dyn HttpBackend,
    token: &'a BearerToken,
    options: &'a PremiumOptions,
}

impl<'a> PremiumSearch<'a> {
    pub fn new(
        backend: &'a dyn HttpBackend,
        token: &'a BearerToken,
        options: &'a PremiumOptions,
    ) -> Self {
        Self {
            backend,
            token,
            options,
        }
    }

    fn endpoint(&self) -> Result<Url> {
        let endpoint =
            self.options
                .endpoint
                .as_deref()
                .ok_or_else(|| SearchError::MissingConfigError {
                    field: "premium.endpoint".to_string(),
                })?;
        Ok(Url::parse(endpoint)?)
    }

    /// Pages through results until `max_results`, `max_pages` or the last page.
    pub async fn collect_results(&self, query: &str) -> Result<SearchCollection> {
        let endpoint = self.endpoint()?;
        let authorization = self.token.authorization_header();
        let max_results = self.options.max_results;
        let mut payload = gen_rule_payload(query, self.options)?;
        let mut collection = SearchCollection::default();

        loop {
            tracing::debug!("POST {} {}", endpoint, payload);
            let value = self
                .backend
                .post_json(&endpoint, &authorization, &payload)
                .await?;
            let response: PremiumSearchResponse = serde_json::from_value(value)?;
            collection.pages += 1;

            let batch = response.results.len();
            for result in response.results {
                collection.tweets.push(Tweet::from_value(result)?);
            }
            tracing::info!(
                "page {}: {} results, {} collected",
                collection.pages,
                batch,
                collection.tweets.len()
            );

            if collection.tweets.len() >= max_results {
                break;
            }
            if self
                .options
                .max_pages
                .is_some_and(|max| collection.pages >= max)
            {
                tracing::info!("stopping at max_pages={}", collection.pages);
                break;
            }

            match response.next.filter(|next| !next.is_empty()) {
                Some(next) => payload["next"] = Value::String(next),
                None => break,
            }
        }

        collection.tweets.truncate(max_results);
        Ok(collection)
    }
}
