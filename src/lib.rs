pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::LocalStorage;
#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{credentials::Credentials, toml_config::TomlConfig};

pub use core::{
    engine::{HarvestEngine, HarvestReport},
    pipeline::SearchPipeline,
};
pub use domain::options::{OutputFormat, SearchApi};
pub use utils::error::{Result, SearchError};
