pub mod cli;
pub mod toml_config;

use crate::core::{ConfigProvider, PromptLimits};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use toml_config::TomlConfig;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "spareparts-agent")]
#[command(about = "AI maintenance analyst for rail equipment and spare parts")]
pub struct CliConfig {
    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory holding the six JSON data files [default: data]
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Completion API key; leave unset to use rule-based answers
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_API_BASE")]
    pub api_base: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// Run the fixed demo sequence instead of the interactive prompt
    #[arg(long)]
    pub script: bool,

    /// Continue when contracts, movements or job-order files are missing
    #[arg(long)]
    pub allow_partial: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// 讀取 --config 指定的 TOML（若有），再以 CLI 參數覆蓋
    pub fn into_agent_config(self) -> Result<AgentConfig> {
        let file = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        Ok(AgentConfig::resolve(&self, &file))
    }
}

/// CLI > TOML > 預設值 合併後的最終設定
#[derive(Clone)]
pub struct AgentConfig {
    pub data_dir: String,
    pub allow_partial: bool,
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    pub prompt_limits: PromptLimits,
    pub script: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            data_dir: DEFAULT_DATA_DIR.to_string(),
            allow_partial: false,
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            prompt_limits: PromptLimits::default(),
            script: false,
        }
    }
}

// API key 不進日誌
impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("data_dir", &self.data_dir)
            .field("allow_partial", &self.allow_partial)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("prompt_limits", &self.prompt_limits)
            .field("script", &self.script)
            .finish()
    }
}

impl AgentConfig {
    pub fn resolve(cli: &CliConfig, file: &TomlConfig) -> Self {
        let defaults = Self::default();
        let base_limits = defaults.prompt_limits;
        let prompt = &file.prompt;

        Self {
            data_dir: cli
                .data_dir
                .clone()
                .or_else(|| file.data.dir.clone())
                .unwrap_or(defaults.data_dir),
            allow_partial: cli.allow_partial || file.data.allow_partial.unwrap_or(false),
            // 空白 key 等同未設定
            api_key: cli
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            api_base: cli
                .api_base
                .clone()
                .or_else(|| file.model.api_base.clone())
                .unwrap_or(defaults.api_base)
                .trim_end_matches('/')
                .to_string(),
            model: cli
                .model
                .clone()
                .or_else(|| file.model.model.clone())
                .unwrap_or(defaults.model),
            temperature: file.model.temperature.unwrap_or(defaults.temperature),
            max_tokens: file.model.max_tokens.unwrap_or(defaults.max_tokens),
            timeout_seconds: cli
                .timeout_seconds
                .or(file.model.timeout_seconds)
                .unwrap_or(defaults.timeout_seconds),
            prompt_limits: PromptLimits {
                sample_equipment: prompt
                    .sample_equipment
                    .unwrap_or(base_limits.sample_equipment),
                sample_parts: prompt.sample_parts.unwrap_or(base_limits.sample_parts),
                sample_activities: prompt
                    .sample_activities
                    .unwrap_or(base_limits.sample_activities),
                alert_window: prompt.alert_window.unwrap_or(base_limits.alert_window),
                cost_window: prompt.cost_window.unwrap_or(base_limits.cost_window),
                schedule_window: prompt
                    .schedule_window
                    .unwrap_or(base_limits.schedule_window),
            },
            script: cli.script,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

impl ConfigProvider for AgentConfig {
    fn data_dir(&self) -> &str {
        &self.data_dir
    }

    fn allow_partial(&self) -> bool {
        self.allow_partial
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn api_base(&self) -> &str {
        &self.api_base
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn temperature(&self) -> f32 {
        self.temperature
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    fn prompt_limits(&self) -> PromptLimits {
        self.prompt_limits
    }
}

impl Validate for AgentConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("data.dir", &self.data_dir)?;
        validation::validate_url("model.api_base", &self.api_base)?;
        validation::validate_non_empty_string("model.model", &self.model)?;
        validation::validate_range("model.temperature", self.temperature, 0.0, 2.0)?;
        validation::validate_positive_number("model.max_tokens", self.max_tokens as usize, 1)?;
        validation::validate_positive_number(
            "model.timeout_seconds",
            self.timeout_seconds as usize,
            1,
        )?;

        let limits = &self.prompt_limits;
        for (field, value) in [
            ("prompt.sample_equipment", limits.sample_equipment),
            ("prompt.sample_parts", limits.sample_parts),
            ("prompt.sample_activities", limits.sample_activities),
            ("prompt.alert_window", limits.alert_window),
            ("prompt.cost_window", limits.cost_window),
            ("prompt.schedule_window", limits.schedule_window),
        ] {
            validation::validate_positive_number(field, value, 1)?;
        }

        Ok(())
    }
}
