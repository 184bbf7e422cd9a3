pub mod auth;
pub mod engine;
pub mod export;
pub mod http;
pub mod pipeline;
pub mod premium;
pub mod standard;

pub use crate::domain::model::{HarvestResult, Tweet};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
