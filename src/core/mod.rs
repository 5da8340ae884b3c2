pub mod agent;
pub mod command;
pub mod fallback;
pub mod forecast;
pub mod lifespan;
pub mod loader;
pub mod metrics;
pub mod prompt;
pub mod session;

pub use crate::domain::model::{DataKind, FleetData, Record};
pub use crate::domain::ports::{
    CompletionClient, CompletionRequest, ConfigProvider, PromptLimits, Storage,
};
pub use crate::utils::error::Result;
