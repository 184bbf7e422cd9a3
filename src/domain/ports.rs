use crate::config::credentials::Credentials;
use crate::domain::model::{HarvestResult, Tweet};
use crate::domain::options::{
    FilterOptions, HttpOptions, OutputOptions, PremiumOptions, SearchApi, StandardOptions,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn query(&self) -> &str;
    fn api(&self) -> SearchApi;
    fn base_url(&self) -> &str;
    fn credentials(&self) -> Credentials;
    fn standard(&self) -> StandardOptions;
    fn premium(&self) -> PremiumOptions;
    fn filters(&self) -> FilterOptions;
    fn http(&self) -> HttpOptions;
    fn output(&self) -> OutputOptions;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Tweet>>;
    async fn transform(&self, tweets: Vec<Tweet>) -> Result<HarvestResult>;
    async fn load(&self, result: HarvestResult) -> Result<String>;
}
