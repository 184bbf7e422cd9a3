use crate::config::credentials::{Credentials, BEARER_TOKEN_ENV, CONSUMER_KEY_ENV, CONSUMER_SECRET_ENV};
use crate::config::toml_config::validate_provider;
use crate::core::ConfigProvider;
use crate::domain::options::{
    FilterOptions, HttpOptions, OutputFormat, OutputOptions, PremiumOptions, ResultType,
    SearchApi, StandardOptions, DEFAULT_BASE_URL,
};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;

#[derive(Clone, Parser)]
#[command(name = "twitter-search")]
#[command(about = "Collect tweets from the Twitter search APIs into a data directory")]
pub struct CliConfig {
    /// Search query, e.g. "barcelona"
    #[arg(short, long)]
    pub query: String,

    #[arg(long, value_enum, default_value_t = SearchApi::Standard)]
    pub api: SearchApi,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = CONSUMER_KEY_ENV, hide_env_values = true)]
    pub consumer_key: Option<String>,

    #[arg(long, env = CONSUMER_SECRET_ENV, hide_env_values = true)]
    pub consumer_secret: Option<String>,

    #[arg(long, env = BEARER_TOKEN_ENV, hide_env_values = true)]
    pub bearer_token: Option<String>,

    #[arg(long, value_enum, default_value_t = ResultType::Recent)]
    pub result_type: ResultType,

    /// Tweets per standard search request (1-100)
    #[arg(long, default_value = "15")]
    pub count: usize,

    /// Standard search: ask the API for tweets in this language
    #[arg(long)]
    pub lang: Option<String>,

    /// Standard search: tweets created before this date (YYYY-MM-DD)
    #[arg(long)]
    pub until: Option<String>,

    /// Stop after this many tweets (standard: follows pagination; premium default 500)
    #[arg(long)]
    pub max_results: Option<usize>,

    #[arg(long)]
    pub max_pages: Option<usize>,

    #[arg(long)]
    pub premium_endpoint: Option<String>,

    #[arg(long)]
    pub from_date: Option<String>,

    #[arg(long)]
    pub to_date: Option<String>,

    #[arg(long, default_value = "100")]
    pub results_per_call: usize,

    /// Keep only tweets whose detected language matches, for either API
    #[arg(long)]
    pub filter_lang: Option<String>,

    #[arg(long)]
    pub exclude_retweets: bool,

    #[arg(long, default_value = "./data")]
    pub output_path: String,

    #[arg(long, value_enum, value_delimiter = ',', default_value = "json")]
    pub format: Vec<OutputFormat>,

    /// Also bundle the written files into this zip archive
    #[arg(long)]
    pub archive: Option<String>,

    #[arg(long, default_value = "30")]
    pub timeout_seconds: u64,

    #[arg(long, default_value = "3")]
    pub retry_attempts: u32,

    /// Print each tweet's text after the run
    #[arg(long)]
    pub print: bool,

    /// Describe the requests without calling the API
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU/memory per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field("query", &self.query)
            .field("api", &self.api)
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials())
            .field("standard", &self.standard())
            .field("premium", &self.premium())
            .field("output", &self.output())
            .finish()
    }
}

impl ConfigProvider for CliConfig {
    fn query(&self) -> &str {
        &self.query
    }

    fn api(&self) -> SearchApi {
        self.api
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn credentials(&self) -> Credentials {
        Credentials {
            consumer_key: self.consumer_key.clone(),
            consumer_secret: self.consumer_secret.clone(),
            bearer_token: self.bearer_token.clone(),
            env_overwrite: false,
        }
        .normalized()
    }

    fn standard(&self) -> StandardOptions {
        StandardOptions {
            result_type: self.result_type,
            count: self.count,
            lang: self.lang.clone(),
            until: self.until.clone(),
            max_results: self.max_results,
            max_pages: self.max_pages,
            ..StandardOptions::default()
        }
    }

    fn premium(&self) -> PremiumOptions {
        let defaults = PremiumOptions::default();
        PremiumOptions {
            endpoint: self.premium_endpoint.clone(),
            from_date: self.from_date.clone(),
            to_date: self.to_date.clone(),
            results_per_call: self.results_per_call,
            max_results: self.max_results.unwrap_or(defaults.max_results),
            max_pages: self.max_pages,
        }
    }

    fn filters(&self) -> FilterOptions {
        FilterOptions {
            lang: self.filter_lang.clone(),
            exclude_retweets: self.exclude_retweets,
        }
    }

    fn http(&self) -> HttpOptions {
        HttpOptions {
            timeout_seconds: self.timeout_seconds,
            retry_attempts: self.retry_attempts,
            ..HttpOptions::default()
        }
    }

    fn output(&self) -> OutputOptions {
        OutputOptions {
            data_dir: self.output_path.clone(),
            formats: self.format.clone(),
            archive: self.archive.clone(),
            ..OutputOptions::default()
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_search_args() {
        let config = CliConfig::try_parse_from([
            "twitter-search",
            "--query",
            "barcelona",
            "--count",
            "5",
            "--bearer-token",
            "AAAA",
            "--format",
            "json,csv",
        ])
        .unwrap();

        assert_eq!(config.query(), "barcelona");
        assert_eq!(config.api(), SearchApi::Standard);
        assert_eq!(config.standard().count, 5);
        assert_eq!(
            config.output().formats,
            vec![OutputFormat::Json, OutputFormat::Csv]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_premium_max_results_defaults_to_500() {
        let config = CliConfig::try_parse_from([
            "twitter-search",
            "-q",
            "barcelona",
            "--api",
            "premium",
            "--premium-endpoint",
            "https://api.twitter.com/1.1/tweets/search/30day/dev.json",
            "--from-date",
            "2019-02-01",
            "--bearer-token",
            "AAAA",
        ])
        .unwrap();

        assert_eq!(config.premium().max_results, 500);
        assert_eq!(config.premium().results_per_call, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_filter_lang_is_separate_from_request_lang() {
        let config = CliConfig::try_parse_from([
            "twitter-search",
            "-q",
            "barcelona",
            "--api",
            "premium",
            "--premium-endpoint",
            "https://api.twitter.com/1.1/tweets/search/30day/dev.json",
            "--filter-lang",
            "ca",
            "--bearer-token",
            "AAAA",
        ])
        .unwrap();

        assert_eq!(config.filters().lang.as_deref(), Some("ca"));
        assert_eq!(config.standard().lang, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_repeated_format_is_rejected() {
        let config = CliConfig::try_parse_from([
            "twitter-search",
            "-q",
            "barcelona",
            "--bearer-token",
            "AAAA",
            "--format",
            "json,json",
        ])
        .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let config = CliConfig::try_parse_from([
            "twitter-search",
            "-q",
            "x",
            "--bearer-token",
            "super-secret-token",
        ])
        .unwrap();
        assert!(!format!("{:?}", config).contains("super-secret-token"));
    }
}
