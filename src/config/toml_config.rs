use crate::config::credentials::Credentials;
use crate::core::premium::convert_utc_time;
use crate::core::ConfigProvider;
use crate::domain::options::{
    FilterOptions, HttpOptions, OutputFormat, OutputOptions, PremiumOptions, SearchApi,
    StandardOptions, DEFAULT_BASE_URL,
};
use crate::utils::error::{Result, SearchError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub search: SearchSection,
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub standard: StandardOptions,
    #[serde(default)]
    pub premium: PremiumOptions,
    #[serde(default)]
    pub filters: FilterOptions,
    #[serde(default)]
    pub http: HttpOptions,
    #[serde(default)]
    pub output: OutputOptions,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSection {
    pub query: String,
    #[serde(default)]
    pub api: SearchApi,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex"))
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SearchError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        let config: Self =
            toml::from_str(&processed_content).map_err(|e| SearchError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;

        Ok(Self {
            credentials: config.credentials.clone().apply_env_overwrite(),
            ..config
        })
    }

    /// 替換環境變數 (例如 ${TWITTER_CONSUMER_KEY})，未設定者保留原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

/// Checks shared by every configuration source.
pub fn validate_provider<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validation::validate_non_empty_string("search.query", config.query())?;
    validation::validate_url("search.base_url", config.base_url())?;
    config.credentials().ensure_usable()?;

    match config.api() {
        SearchApi::Standard => validate_standard(&config.standard())?,
        SearchApi::Premium => validate_premium(&config.premium())?,
    }

    let http = config.http();
    validation::validate_range("http.timeout_seconds", http.timeout_seconds, 1, 600)?;
    validation::validate_range("http.retry_attempts", http.retry_attempts, 0, 10)?;

    let output = config.output();
    validation::validate_path("output.data_dir", &output.data_dir)?;
    if output.formats.is_empty() {
        return Err(SearchError::InvalidConfigValueError {
            field: "output.formats".to_string(),
            value: "[]".to_string(),
            reason: "At least one of json, combined, csv is required".to_string(),
        });
    }
    if let Some(name) = &output.combined_filename {
        validation::validate_file_name("output.combined_filename", name)?;
    }
    if let Some(name) = &output.csv_filename {
        validation::validate_file_name("output.csv_filename", name)?;
    }
    if let Some(name) = &output.archive {
        validation::validate_file_name("output.archive", name)?;
    }
    validate_output_names(&output, config.api())?;

    Ok(())
}

/// Each format once, and no two single-file outputs under the same name.
fn validate_output_names(output: &OutputOptions, api: SearchApi) -> Result<()> {
    let mut formats = HashSet::new();
    for format in &output.formats {
        if !formats.insert(*format) {
            return Err(SearchError::InvalidConfigValueError {
                field: "output.formats".to_string(),
                value: format.as_str().to_string(),
                reason: "Listed more than once".to_string(),
            });
        }
    }

    let mut names: Vec<(&str, String)> = Vec::new();
    if formats.contains(&OutputFormat::Combined) {
        names.push(("output.combined_filename", output.combined_filename(api)));
    }
    if formats.contains(&OutputFormat::Csv) {
        names.push(("output.csv_filename", output.csv_filename()));
    }
    if let Some(archive) = &output.archive {
        names.push(("output.archive", archive.clone()));
    }
    for (i, (field, name)) in names.iter().enumerate() {
        if let Some((other, _)) = names[..i].iter().find(|(_, earlier)| earlier == name) {
            return Err(SearchError::InvalidConfigValueError {
                field: field.to_string(),
                value: name.clone(),
                reason: format!("Same file name as {}", other),
            });
        }
    }
    Ok(())
}

fn validate_standard(options: &StandardOptions) -> Result<()> {
    validation::validate_range("standard.count", options.count, 1, 100)?;
    if let Some(max) = options.max_results {
        validation::validate_positive_number("standard.max_results", max, 1)?;
    }
    if let Some(pages) = options.max_pages {
        validation::validate_positive_number("standard.max_pages", pages, 1)?;
    }
    if let Some(until) = &options.until {
        validation::validate_date("standard.until", until)?;
    }
    Ok(())
}

fn validate_premium(options: &PremiumOptions) -> Result<()> {
    let endpoint = options
        .endpoint
        .as_deref()
        .ok_or_else(|| SearchError::MissingConfigError {
            field: "premium.endpoint".to_string(),
        })?;
    validation::validate_url("premium.endpoint", endpoint)?;
    validation::validate_range("premium.results_per_call", options.results_per_call, 10, 500)?;
    validation::validate_positive_number("premium.max_results", options.max_results, 1)?;
    if let Some(pages) = options.max_pages {
        validation::validate_positive_number("premium.max_pages", pages, 1)?;
    }

    let from = options
        .from_date
        .as_deref()
        .map(|d| convert_utc_time("premium.from_date", d))
        .transpose()?;
    let to = options
        .to_date
        .as_deref()
        .map(|d| convert_utc_time("premium.to_date", d))
        .transpose()?;
    // Same fixed-width digit format, so string order is time order.
    if let (Some(from), Some(to)) = (&from, &to) {
        if from >= to {
            return Err(SearchError::InvalidConfigValueError {
                field: "premium.to_date".to_string(),
                value: to.clone(),
                reason: format!("Must be after from_date ({})", from),
            });
        }
    }
    Ok(())
}

impl ConfigProvider for TomlConfig {
    fn query(&self) -> &str {
        &self.search.query
    }

    fn api(&self) -> SearchApi {
        self.search.api
    }

    fn base_url(&self) -> &str {
        &self.search.base_url
    }

    fn credentials(&self) -> Credentials {
        self.credentials.clone()
    }

    fn standard(&self) -> StandardOptions {
        self.standard.clone()
    }

    fn premium(&self) -> PremiumOptions {
        self.premium.clone()
    }

    fn filters(&self) -> FilterOptions {
        self.filters.clone()
    }

    fn http(&self) -> HttpOptions {
        self.http.clone()
    }

    fn output(&self) -> OutputOptions {
        self.output.clone()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}
