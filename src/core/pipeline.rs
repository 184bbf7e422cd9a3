use crate::core::auth::resolve_bearer_token;
use crate::core::export;
use crate::core::http::{HttpBackend, ReqwestBackend};
use crate::core::premium::{gen_rule_payload, PremiumSearch};
use crate::core::standard::{build_search_url, StandardSearch};
use crate::core::{ConfigProvider, HarvestResult, Pipeline, Storage, Tweet};
use crate::domain::options::{OutputFormat, SearchApi};
use crate::utils::error::Result;
use std::collections::HashSet;
use std::sync::Arc;

pub struct SearchPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    backend: Arc<dyn HttpBackend>,
}

impl<S: Storage, C: ConfigProvider> SearchPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let backend = ReqwestBackend::new(&config.http())?;
        Ok(Self::with_backend(storage, config, Arc::new(backend)))
    }

    pub fn with_backend(storage: S, config: C, backend: Arc<dyn HttpBackend>) -> Self {
        Self {
            storage,
            config,
            backend,
        }
    }

    /// Describes the request the run would make, without touching the network.
    pub fn preview(&self) -> Result<String> {
        let query = self.config.query();
        match self.config.api() {
            SearchApi::Standard => {
                let url = build_search_url(self.config.base_url(), query, &self.config.standard())?;
                Ok(format!("GET {}", url))
            }
            SearchApi::Premium => {
                let premium = self.config.premium();
                let payload = gen_rule_payload(query, &premium)?;
                Ok(format!(
                    "POST {}\n{}",
                    premium.endpoint.as_deref().unwrap_or("<premium.endpoint unset>"),
                    serde_json::to_string_pretty(&payload)?
                ))
            }
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for SearchPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<Tweet>> {
        let base_url = self.config.base_url();
        let query = self.config.query();
        let token =
            resolve_bearer_token(self.backend.as_ref(), base_url, &self.config.credentials())
                .await?;

        let collection = match self.config.api() {
            SearchApi::Standard => {
                let options = self.config.standard();
                StandardSearch::new(self.backend.as_ref(), base_url, &token, &options)
                    .collect(query)
                    .await?
            }
            SearchApi::Premium => {
                let options = self.config.premium();
                PremiumSearch::new(self.backend.as_ref(), &token, &options)
                    .collect_results(query)
                    .await?
            }
        };

        tracing::info!(
            "🐦 {} search for {:?}: {} tweets in {} request(s)",
            self.config.api().as_str(),
            query,
            collection.tweets.len(),
            collection.pages
        );
        if collection.tweets.is_empty() {
            tracing::warn!("No tweets matched {:?}", query);
        }
        Ok(collection.tweets)
    }

    async fn transform(&self, tweets: Vec<Tweet>) -> Result<HarvestResult> {
        let filters = self.config.filters();
        let mut seen = HashSet::new();
        let mut duplicates = 0;
        let mut filtered_out = 0;
        let mut kept = Vec::with_capacity(tweets.len());

        for tweet in tweets {
            if !seen.insert(tweet.id_str.clone()) {
                duplicates += 1;
                continue;
            }
            let wrong_lang = filters
                .lang
                .as_deref()
                .is_some_and(|lang| tweet.lang.as_deref() != Some(lang));
            if wrong_lang || (filters.exclude_retweets && tweet.is_retweet) {
                filtered_out += 1;
                continue;
            }
            tracing::debug!("{}: {}", tweet.id_str, tweet.text);
            kept.push(tweet);
        }

        let csv_output = export::tweets_to_csv(&kept)?;
        Ok(HarvestResult {
            tweets: kept,
            csv_output,
            duplicates,
            filtered_out,
        })
    }

    async fn load(&self, result: HarvestResult) -> Result<String> {
        let output = self.config.output();
        let mut written: Vec<(String, Vec<u8>)> = Vec::new();

        // 依設定的格式產生輸出檔案，重複的格式只處理一次
        let mut seen_formats = HashSet::new();
        for format in output.formats.iter().filter(|f| seen_formats.insert(**f)) {
            match format {
                OutputFormat::Json => {
                    for tweet in &result.tweets {
                        stage(
                            &mut written,
                            export::tweet_file_name(tweet)?,
                            export::tweet_json(tweet)?,
                        );
                    }
                }
                OutputFormat::Combined => stage(
                    &mut written,
                    output.combined_filename(self.config.api()),
                    export::combined_json(&result.tweets)?,
                ),
                OutputFormat::Csv => stage(
                    &mut written,
                    output.csv_filename(),
                    result.csv_output.clone().into_bytes(),
                ),
            }
        }

        for (name, data) in &written {
            self.storage.write_file(name, data).await?;
        }
        tracing::debug!("wrote {} file(s) to {}", written.len(), output.data_dir);

        match &output.archive {
            Some(archive) => {
                let zip_data = export::zip_files(&written)?;
                tracing::debug!("writing archive {} ({} bytes)", archive, zip_data.len());
                self.storage.write_file(archive, &zip_data).await?;
                Ok(format!("{}/{}", output.data_dir.trim_end_matches('/'), archive))
            }
            None => Ok(output.data_dir),
        }
    }
}

/// Queues a file for writing; a later file with the same name replaces the
/// earlier one, as it would on disk.
fn stage(files: &mut Vec<(String, Vec<u8>)>, name: String, data: Vec<u8>) {
    match files.iter_mut().find(|(existing, _)| *existing == name) {
        Some(entry) => entry.1 = data,
        None => files.push((name, data)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::credentials::Credentials;
    use crate::core::http::testing::FakeBackend;
    use crate::domain::options::{
        FilterOptions, HttpOptions, OutputOptions, PremiumOptions, StandardOptions,
    };
    use crate::utils::error::SearchError;
    use serde_json::json;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }

        async fn file_names(&self) -> Vec<String> {
            let mut names: Vec<String> = self.files.lock().await.keys().cloned().collect();
            names.sort();
            names
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        api: SearchApi,
        credentials: Credentials,
        standard: StandardOptions,
        premium: PremiumOptions,
        filters: FilterOptions,
        output: OutputOptions,
    }

    impl MockConfig {
        fn new(api: SearchApi) -> Self {
            Self {
                api,
                credentials: Credentials {
                    consumer_key: Some("key".to_string()),
                    consumer_secret: Some("secret".to_string()),
                    ..Credentials::default()
                },
                standard: StandardOptions::default(),
                premium: PremiumOptions {
                    endpoint: Some(
                        "https://api.twitter.com/1.1/tweets/search/30day/dev.json".to_string(),
                    ),
                    from_date: Some("2019-02-01".to_string()),
                    ..PremiumOptions::default()
                },
                filters: FilterOptions::default(),
                output: OutputOptions {
                    data_dir: "data".to_string(),
                    ..OutputOptions::default()
                },
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn query(&self) -> &str {
            "barcelona"
        }

        fn api(&self) -> SearchApi {
            self.api
        }

        fn base_url(&self) -> &str {
            "https://api.twitter.com"
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
            HttpOptions::default()
        }

        fn output(&self) -> OutputOptions {
            self.output.clone()
        }
    }

    fn token_response() -> serde_json::Value {
        json!({"token_type": "bearer", "access_token": "AAAA"})
    }

    fn tweet(id: &str, lang: &str, text: &str) -> Tweet {
        Tweet::from_value(json!({"id_str": id, "lang": lang, "full_text": text})).unwrap()
    }

    #[tokio::test]
    async fn test_extract_standard_authenticates_then_searches() {
        let backend = Arc::new(FakeBackend::new().with_response(token_response()).with_response(
            json!({"statuses": [{"id_str": "1", "full_text": "Visca Barça"}]}),
        ));
        let pipeline = SearchPipeline::with_backend(
            MockStorage::default(),
            MockConfig::new(SearchApi::Standard),
            backend.clone(),
        );

        let tweets = pipeline.extract().await.unwrap();

        assert_eq!(tweets.len(), 1);
        assert_eq!(tweets[0].text, "Visca Barça");
        let requests = backend.requests();
        assert_eq!(requests[0].url.path(), "/oauth2/token");
        assert_eq!(requests[1].url.path(), "/1.1/search/tweets.json");
        assert_eq!(requests[1].authorization, "Bearer AAAA");
    }

    #[tokio::test]
    async fn test_extract_premium_posts_rule() {
        let backend = Arc::new(
            FakeBackend::new()
                .with_response(token_response())
                .with_response(json!({"results": [{"id_str": "9", "text": "hola"}]})),
        );
        let pipeline = SearchPipeline::with_backend(
            MockStorage::default(),
            MockConfig::new(SearchApi::Premium),
            backend.clone(),
        );

        let tweets = pipeline.extract().await.unwrap();

        assert_eq!(tweets.len(), 1);
        let requests = backend.requests();
        assert_eq!(requests[1].method, "POST");
        assert_eq!(
            requests[1].body.as_ref().unwrap()["fromDate"],
            json!("201902010000")
        );
    }

    #[tokio::test]
    async fn test_extract_propagates_auth_failure() {
        let backend = Arc::new(FakeBackend::new().with_error(SearchError::AuthenticationError {
            message: "Unable to verify your credentials".to_string(),
        }));
        let pipeline = SearchPipeline::with_backend(
            MockStorage::default(),
            MockConfig::new(SearchApi::Standard),
            backend,
        );

        assert!(matches!(
            pipeline.extract().await,
            Err(SearchError::AuthenticationError { .. })
        ));
    }

    #[tokio::test]
    async fn test_transform_dedupes_and_filters() {
        let mut config = MockConfig::new(SearchApi::Standard);
        config.filters = FilterOptions {
            lang: Some("es".to_string()),
            exclude_retweets: true,
        };
        let pipeline = SearchPipeline::with_backend(
            MockStorage::default(),
            config,
            Arc::new(FakeBackend::new()),
        );

        let result = pipeline
            .transform(vec![
                tweet("1", "es", "hola"),
                tweet("1", "es", "hola"),
                tweet("2", "en", "hello"),
                tweet("3", "es", "RT @fcb: gol"),
                tweet("4", "es", "adéu"),
            ])
            .await
            .unwrap();

        let ids: Vec<&str> = result.tweets.iter().map(|t| t.id_str.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);
        assert_eq!(result.duplicates, 1);
        assert_eq!(result.filtered_out, 2);
        assert_eq!(result.csv_output.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_load_writes_every_format_and_archive() {
        let storage = MockStorage::default();
        let mut config = MockConfig::new(SearchApi::Premium);
        config.output.formats = vec![OutputFormat::Json, OutputFormat::Combined, OutputFormat::Csv];
        config.output.archive = Some("tweets.zip".to_string());
        let pipeline =
            SearchPipeline::with_backend(storage.clone(), config, Arc::new(FakeBackend::new()));

        let result = pipeline
            .transform(vec![tweet("10", "es", "hola"), tweet("11", "ca", "bon dia")])
            .await
            .unwrap();
        let output_path = pipeline.load(result).await.unwrap();

        assert_eq!(output_path, "data/tweets.zip");
        assert_eq!(
            storage.file_names().await,
            vec![
                "10.json",
                "11.json",
                "tweets.csv",
                "tweets.zip",
                "tweets_premium.json"
            ]
        );

        let combined: serde_json::Value =
            serde_json::from_slice(&storage.get_file("tweets_premium.json").await.unwrap())
                .unwrap();
        assert_eq!(combined.as_array().unwrap().len(), 2);

        let zip_data = storage.get_file("tweets.zip").await.unwrap();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
        assert_eq!(archive.len(), 4);
    }

    #[tokio::test]
    async fn test_load_archives_each_file_once() {
        let storage = MockStorage::default();
        let mut config = MockConfig::new(SearchApi::Standard);
        config.output.formats = vec![OutputFormat::Csv, OutputFormat::Csv];
        config.output.archive = Some("a.zip".to_string());
        let pipeline =
            SearchPipeline::with_backend(storage.clone(), config, Arc::new(FakeBackend::new()));

        let result = pipeline
            .transform(vec![tweet("10", "es", "hola")])
            .await
            .unwrap();
        let output_path = pipeline.load(result).await.unwrap();

        assert_eq!(output_path, "data/a.zip");
        assert_eq!(storage.file_names().await, vec!["a.zip", "tweets.csv"]);
        let zip_data = storage.get_file("a.zip").await.unwrap();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
        assert_eq!(archive.len(), 1);
    }

    #[tokio::test]
    async fn test_load_same_name_for_combined_and_csv_keeps_last() {
        let storage = MockStorage::default();
        let mut config = MockConfig::new(SearchApi::Standard);
        config.output.formats = vec![OutputFormat::Combined, OutputFormat::Csv];
        config.output.combined_filename = Some("out.txt".to_string());
        config.output.csv_filename = Some("out.txt".to_string());
        config.output.archive = Some("out.zip".to_string());
        let pipeline =
            SearchPipeline::with_backend(storage.clone(), config, Arc::new(FakeBackend::new()));

        let result = pipeline.transform(vec![]).await.unwrap();
        pipeline.load(result).await.unwrap();

        let written = storage.get_file("out.txt").await.unwrap();
        assert!(written.starts_with(b"id,created_at"));
        let zip_data = storage.get_file("out.zip").await.unwrap();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
        assert_eq!(archive.len(), 1);
    }

    #[tokio::test]
    async fn test_load_without_tweets_writes_no_per_tweet_files() {
        let storage = MockStorage::default();
        let mut config = MockConfig::new(SearchApi::Standard);
        config.output.formats = vec![OutputFormat::Json, OutputFormat::Combined];
        let pipeline =
            SearchPipeline::with_backend(storage.clone(), config, Arc::new(FakeBackend::new()));

        let result = pipeline.transform(vec![]).await.unwrap();
        let output_path = pipeline.load(result).await.unwrap();

        assert_eq!(output_path, "data");
        assert_eq!(storage.file_names().await, vec!["tweets_standard.json"]);
        assert_eq!(
            storage.get_file("tweets_standard.json").await.unwrap(),
            b"[]"
        );
    }

    #[test]
    fn test_preview_premium_payload() {
        let pipeline = SearchPipeline::with_backend(
            MockStorage::default(),
            MockConfig::new(SearchApi::Premium),
            Arc::new(FakeBackend::new()),
        );
        let preview = pipeline.preview().unwrap();
        assert!(preview.starts_with("POST https://api.twitter.com/1.1/tweets/search/30day/dev.json"));
        assert!(preview.contains("\"fromDate\": \"201902010000\""));
    }
}
