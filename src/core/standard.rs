//! Standard search: `GET 1.1/search/tweets.json`, covering roughly the last 7 days.

use crate::core::http::{endpoint_url, HttpBackend};
use crate::domain::model::{BearerToken, SearchCollection, StandardSearchResponse, Tweet};
use crate::domain::options::StandardOptions;
use crate::utils::error::Result;
use std::collections::HashSet;
use url::Url;

pub const SEARCH_PATH: &str = "1.1/search/tweets.json";

pub fn search_endpoint(base_url: &str) -> Result<Url> {
    endpoint_url(base_url, SEARCH_PATH)
}

pub fn build_search_url(base_url: &str, query: &str, options: &StandardOptions) -> Result<Url> {
    let mut url = search_endpoint(base_url)?;
    {
        let mut params = url.query_pairs_mut();
        params
            .append_pair("q", query)
            .append_pair("result_type", options.result_type.as_str())
            .append_pair("count", &options.count.to_string());
        if let Some(lang) = &options.lang {
            params.append_pair("lang", lang);
        }
        if let Some(until) = &options.until {
            params.append_pair("until", until);
        }
        if let Some(since_id) = &options.since_id {
            params.append_pair("since_id", since_id);
        }
        if let Some(max_id) = &options.max_id {
            params.append_pair("max_id", max_id);
        }
        if options.extended {
            params.append_pair("tweet_mode", "extended");
        }
    }
    Ok(url)
}

/// Builds the follow-up request from `search_metadata.next_results`.
///
/// The cursor does not carry `tweet_mode`, so it is re-added when extended
/// text was asked for.
pub fn next_page_url(base_url: &str, next_results: &str, extended: bool) -> Result<Url> {
    let mut url = search_endpoint(base_url)?;
    url.set_query(Some(next_results.trim_start_matches('?')));
    if extended && !url.query_pairs().any(|(k, _)| k == "tweet_mode") {
        url.query_pairs_mut().append_pair("tweet_mode", "extended");
    }
    Ok(url)
}

pub struct StandardSearch<'a> {
    backend: &'a dyn HttpBackend,
    base_url: &'a str,
    token: &'a BearerToken,
    options: &'a StandardOptions,
}

impl<'a> StandardSearch<'a> {
    pub fn new(
        backend: &'a dyn HttpBackend,
        base_url: &'a str,
        token: &'a BearerToken,
        options: &'a StandardOptions,
    ) -> Self {
        Self {
            backend,
            base_url,
            token,
            options,
        }
    }

    /// Runs the query. Without `max_results` only the first page is fetched.
    pub async fn collect(&self, query: &str) -> Result<SearchCollection> {
        let authorization = self.token.authorization_header();
        let limit = self.options.max_results;
        let mut url = build_search_url(self.base_url, query, self.options)?;
        let mut seen = HashSet::new();
        let mut collection = SearchCollection::default();

        loop {
            tracing::debug!("GET {}", url);
            let value = self.backend.get_json(&url, &authorization).await?;
            let response: StandardSearchResponse = serde_json::from_value(value)?;
            collection.pages += 1;

            let batch = response.statuses.len();
            for status in response.statuses {
                let tweet = Tweet::from_value(status)?;
                // max_id is inclusive, so page boundaries repeat a tweet.
                if seen.insert(tweet.id_str.clone()) {
                    collection.tweets.push(tweet);
                }
            }
            tracing::info!(
                "page {}: {} statuses, {} collected",
                collection.pages,
                batch,
                collection.tweets.len()
            );

            let Some(limit) = limit else { break };
            if batch == 0 || collection.tweets.len() >= limit {
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

            match response
                .search_metadata
                .and_then(|m| m.next_results)
                .filter(|next| !next.is_empty())
            {
                Some(next) => url = next_page_url(self.base_url, &next, self.options.extended)?,
                None => break,
            }
        }

        if let Some(limit) = limit {
            collection.tweets.truncate(limit);
        }
        Ok(collection)
    }
}
