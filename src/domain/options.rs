use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum SearchApi {
    /// 7-day standard search
    #[default]
    Standard,
    /// 30-day or full-archive premium search
    Premium,
}

impl SearchApi {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchApi::Standard => "standard",
            SearchApi::Premium => "premium",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Mixed,
    #[default]
    Recent,
    Popular,
}

impl ResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultType::Mixed => "mixed",
            ResultType::Recent => "recent",
            ResultType::Popular => "popular",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One `<id_str>.json` file per tweet
    Json,
    /// A single JSON array with every tweet
    Combined,
    /// A flat CSV table
    Csv,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Combined => "combined",
            OutputFormat::Csv => "csv",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardOptions {
    pub result_type: ResultType,
    pub count: usize,
    pub lang: Option<String>,
    pub until: Option<String>,
    pub since_id: Option<String>,
    pub max_id: Option<String>,
    pub extended: bool,
    /// Follow `next_results` until this many tweets are collected. Unset means one page.
    pub max_results: Option<usize>,
    pub max_pages: Option<usize>,
}

impl Default for StandardOptions {
    fn default() -> Self {
        Self {
            result_type: ResultType::Recent,
            count: 15,
            lang: None,
            until: None,
            since_id: None,
            max_id: None,
            extended: true,
            max_results: None,
            max_pages: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PremiumOptions {
    /// e.g. `https://api.twitter.com/1.1/tweets/search/30day/dev.json`
    pub endpoint: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub results_per_call: usize,
    pub max_results: usize,
    pub max_pages: Option<usize>,
}

impl Default for PremiumOptions {
    fn default() -> Self {
        Self {
            endpoint: None,
            from_date: None,
            to_date: None,
            results_per_call: 100,
            max_results: 500,
            max_pages: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    pub lang: Option<String>,
    pub exclude_retweets: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpOptions {
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub user_agent: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            retry_attempts: 3,
            retry_delay_ms: 500,
            user_agent: concat!("twitter-search/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    pub data_dir: String,
    pub formats: Vec<OutputFormat>,
    pub combined_filename: Option<String>,
    pub csv_filename: Option<String>,
    /// Zip every written file into this archive as well.
    pub archive: Option<String>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            formats: vec![OutputFormat::Json],
            combined_filename: None,
            csv_filename: None,
            archive: None,
        }
    }
}

impl OutputOptions {
    pub fn combined_filename(&self, api: SearchApi) -> String {
        self.combined_filename
            .clone()
            .unwrap_or_else(|| format!("tweets_{}.json", api.as_str()))
    }

    pub fn csv_filename(&self) -> String {
        self.csv_filename
            .clone()
            .unwrap_or_else(|| "tweets.csv".to_string())
    }
}
