pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::OpenAiClient;
pub use config::{cli::LocalStorage, AgentConfig, CliConfig};
pub use core::agent::{Reply, SparePartsAgent};
pub use core::loader::DataLoader;
pub use core::session::Session;
pub use utils::error::{AgentError, Result};
