use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;

    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;

    /// 給錯誤訊息用的完整路徑
    fn display_path(&self, path: &str) -> String;
}

/// 取樣筆數上限，避免 prompt 過長
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptLimits {
    pub sample_equipment: usize,
    pub sample_parts: usize,
    pub sample_activities: usize,
    pub alert_window: usize,
    pub cost_window: usize,
    pub schedule_window: usize,
}

impl Default for PromptLimits {
    fn default() -> Self {
        Self {
            sample_equipment: 10,
            sample_parts: 20,
            sample_activities: 15,
            alert_window: 50,
            cost_window: 30,
            schedule_window: 50,
        }
    }
}

pub trait ConfigProvider: Send + Sync {
    fn data_dir(&self) -> &str;
    fn allow_partial(&self) -> bool;
    fn api_key(&self) -> Option<&str>;
    fn api_base(&self) -> &str;
    fn model(&self) -> &str;
    fn temperature(&self) -> f32;
    fn max_tokens(&self) -> u32;
    fn timeout_seconds(&self) -> u64;
    fn prompt_limits(&self) -> PromptLimits;

    /// 空白金鑰視同未設定
    fn has_credential(&self) -> bool {
        self.api_key().is_some_and(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
