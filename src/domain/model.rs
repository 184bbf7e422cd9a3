use crate::utils::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tweet as returned by the v1.1 APIs.
///
/// The commonly used fields are lifted out; `raw` keeps the full payload so
/// nothing is lost when the tweet is written back to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Tweet {
    pub id_str: String,
    pub text: String,
    pub created_at: Option<String>,
    pub user_id: Option<String>,
    pub screen_name: Option<String>,
    pub user_name: Option<String>,
    pub lang: Option<String>,
    pub retweet_count: u64,
    pub favorite_count: u64,
    pub reply_count: Option<u64>,
    pub hashtags: Vec<String>,
    pub is_retweet: bool,
    pub raw: Value,
}

impl Tweet {
    pub fn from_value(raw: Value) -> Result<Self> {
        let id_str = raw
            .get("id_str")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| raw.get("id").and_then(Value::as_u64).map(|id| id.to_string()))
            .ok_or_else(|| SearchError::InvalidResponse {
                message: "tweet without id_str or id".to_string(),
            })?;

        // Extended tweets keep the untruncated text in a nested object.
        let text = raw
            .pointer("/extended_tweet/full_text")
            .or_else(|| raw.get("full_text"))
            .or_else(|| raw.get("text"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let user = raw.get("user");
        let user_str = |key: &str| {
            user.and_then(|u| u.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let hashtags = raw
            .pointer("/entities/hashtags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(|tag| tag.get("text").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let is_retweet = raw.get("retweeted_status").is_some() || text.starts_with("RT @");

        Ok(Self {
            created_at: raw
                .get("created_at")
                .and_then(Value::as_str)
                .map(str::to_string),
            user_id: user_str("id_str"),
            screen_name: user_str("screen_name"),
            user_name: user_str("name"),
            lang: raw.get("lang").and_then(Value::as_str).map(str::to_string),
            retweet_count: raw.get("retweet_count").and_then(Value::as_u64).unwrap_or(0),
            favorite_count: raw.get("favorite_count").and_then(Value::as_u64).unwrap_or(0),
            reply_count: raw.get("reply_count").and_then(Value::as_u64),
            hashtags,
            is_retweet,
            id_str,
            text,
            raw,
        })
    }

    pub fn permalink(&self) -> String {
        let user = self.screen_name.as_deref().unwrap_or("i/web");
        format!("https://twitter.com/{}/status/{}", user, self.id_str)
    }
}

/// OAuth2 application-only token. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken {
    access_token: String,
}

impl BearerToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.access_token
    }

    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token_type: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchMetadata {
    pub next_results: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StandardSearchResponse {
    #[serde(default)]
    pub statuses: Vec<Value>,
    #[serde(default)]
    pub search_metadata: Option<SearchMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PremiumSearchResponse {
    #[serde(default)]
    pub results: Vec<Value>,
    pub next: Option<String>,
}

/// Tweets gathered from the API together with how many requests it took.
#[derive(Debug, Clone, Default)]
pub struct SearchCollection {
    pub tweets: Vec<Tweet>,
    pub pages: usize,
}

/// CSV column names, in [`TweetRow`] field order.
pub const TWEET_CSV_HEADER: [&str; 13] = [
    "id",
    "created_at",
    "user_id",
    "username",
    "name",
    "tweet",
    "language",
    "hashtags",
    "retweets_count",
    "likes_count",
    "replies_count",
    "is_retweet",
    "link",
];

/// Row layout of the CSV export.
#[derive(Debug, Clone, Serialize)]
pub struct TweetRow<'a> {
    pub id: &'a str,
    pub created_at: &'a str,
    pub user_id: &'a str,
    pub username: &'a str,
    pub name: &'a str,
    pub tweet: &'a str,
    pub language: &'a str,
    pub hashtags: String,
    pub retweets_count: u64,
    pub likes_count: u64,
    pub replies_count: String,
    pub is_retweet: bool,
    pub link: String,
}

impl<'a> From<&'a Tweet> for TweetRow<'a> {
    fn from(tweet: &'a Tweet) -> Self {
        Self {
            id: &tweet.id_str,
            created_at: tweet.created_at.as_deref().unwrap_or_default(),
            user_id: tweet.user_id.as_deref().unwrap_or_default(),
            username: tweet.screen_name.as_deref().unwrap_or_default(),
            name: tweet.user_name.as_deref().unwrap_or_default(),
            tweet: &tweet.text,
            language: tweet.lang.as_deref().unwrap_or_default(),
            hashtags: tweet
                .hashtags
                .iter()
                .map(|h| format!("#{}", h))
                .collect::<Vec<_>>()
                .join(" "),
            retweets_count: tweet.retweet_count,
            likes_count: tweet.favorite_count,
            replies_count: tweet.reply_count.map(|c| c.to_string()).unwrap_or_default(),
            is_retweet: tweet.is_retweet,
            link: tweet.permalink(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HarvestResult {
    pub tweets: Vec<Tweet>,
    pub csv_output: String,
    pub duplicates: usize,
    pub filtered_out: usize,
}
