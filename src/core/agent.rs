use crate::core::fallback::{select_topic, topic_fallback, Topic};
use crate::core::forecast::Forecaster;
use crate::core::lifespan::{self, LifespanEstimate, LifespanSource, PartProfile};
use crate::core::metrics::{self, METRICS_QUERY, METRICS_RESPONSE_FORMAT, STRUCTURED_SYSTEM_PROMPT};
use crate::core::prompt::{PromptBuilder, ANALYST_SYSTEM_PROMPT};
use crate::core::{CompletionClient, CompletionRequest, FleetData, PromptLimits};
use crate::config::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::{json, Value};

/// 單一指令的結果；每種都能轉成非空字串
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Model(String),
    Fallback(String),
    Degraded { error: String, fallback: String },
    NotFound(String),
    Report(Value),
}

impl Reply {
    pub fn render(&self) -> String {
        match self {
            Reply::Model(text) | Reply::Fallback(text) | Reply::NotFound(text) => text.clone(),
            Reply::Degraded { error, fallback } => {
                format!("❌ AI analysis failed: {}\n\n{}", error, fallback)
            }
            Reply::Report(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

pub struct SparePartsAgent<C: CompletionClient> {
    data: FleetData,
    limits: PromptLimits,
    client: Option<C>,
    temperature: f32,
    max_tokens: u32,
    today: NaiveDate,
}

impl<C: CompletionClient> SparePartsAgent<C> {
    /// client 為 None 時所有指令都走規則式回覆，不發任何請求
    pub fn new(data: FleetData, limits: PromptLimits, client: Option<C>) -> Self {
        if client.is_none() {
            tracing::warn!("⚠️ No API key configured, answers will use rule-based fallback text");
        }

        Self {
            data,
            limits,
            client,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            today: Local::now().date_naive(),
        }
    }

    pub fn with_generation(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// 預測與到期檢查使用的參考日
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn data(&self) -> &FleetData {
        &self.data
    }

    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    fn prompts(&self) -> PromptBuilder<'_> {
        PromptBuilder::new(&self.data, self.limits)
    }

    async fn analyze(&self, topic: Topic, query: &str, context: &str) -> Reply {
        let Some(client) = &self.client else {
            return Reply::Fallback(topic_fallback(topic, query, &self.data));
        };

        let request = CompletionRequest {
            system: ANALYST_SYSTEM_PROMPT.to_string(),
            user: self.prompts().analysis_prompt(query, context),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        match client.complete(&request).await {
            Ok(text) => Reply::Model(text),
            Err(e) => {
                tracing::error!(
                    "❌ AI analysis failed: {} (Category: {:?}, Severity: {:?})",
                    e,
                    e.category(),
                    e.severity()
                );
                Reply::Degraded {
                    error: e.user_friendly_message(),
                    fallback: topic_fallback(topic, query, &self.data),
                }
            }
        }
    }

    /// 結構化模式：模型只能回 JSON 物件，失敗時回固定格式的錯誤物件
    async fn analyze_structured(&self, query: &str, response_format: &str) -> Value {
        let Some(client) = &self.client else {
            return metrics::structured_fallback(query, "OpenAI API not available");
        };

        let request = CompletionRequest {
            system: STRUCTURED_SYSTEM_PROMPT.to_string(),
            user: self.prompts().structured_prompt(query, response_format),
            temperature: 0.0,
            max_tokens: self.max_tokens,
        };

        match client.complete(&request).await {
            Ok(text) => match metrics::parse_structured(&text) {
                Ok(value) => value,
                Err(e) => {
                    tracing::error!("❌ Invalid JSON response: {} ({})", text, e);
                    metrics::structured_fallback(query, "Invalid JSON response from AI service")
                }
            },
            Err(e) => {
                tracing::error!(
                    "❌ Structured analysis failed: {} (Category: {:?}, Severity: {:?})",
                    e,
                    e.category(),
                    e.severity()
                );
                metrics::structured_fallback(query, &e.user_friendly_message())
            }
        }
    }

    /// 固定的資料指標加上模型的 JSON 分析
    pub async fn dashboard_metrics(&self) -> Reply {
        let computed = metrics::dashboard_metrics(&self.data);
        tracing::info!(
            "📊 Dashboard metrics over {} parts, total cost {:.2}",
            computed.total_parts,
            computed.total_cost
        );
        let ai_analysis = self
            .analyze_structured(METRICS_QUERY, METRICS_RESPONSE_FORMAT)
            .await;

        Reply::Report(json!({
            "metrics": computed,
            "ai_analysis": ai_analysis,
        }))
    }

    pub async fn system_insights(&self) -> Reply {
        let query = "Provide comprehensive system insights including overall health assessment, \
                     cost analysis, maintenance efficiency, risk areas, and strategic \
                     recommendations for improvement.";
        self.analyze(Topic::Insights, query, &self.prompts().insights_context())
            .await
    }

    pub async fn maintenance_alerts(&self) -> Reply {
        let query = "Generate maintenance alerts based on the data. Identify urgent issues, \
                     equipment that needs attention, parts that need replacement, and any other \
                     critical maintenance needs. Prioritize by severity and provide specific \
                     recommendations.";
        self.analyze(Topic::Alerts, query, &self.prompts().alerts_context())
            .await
    }

    pub async fn equipment_health(&self, equipment_id: i64) -> Reply {
        let Some(equipment) = self.data.equipment_by_id(equipment_id) else {
            return Reply::NotFound(format!("Equipment {} not found in the data.", equipment_id));
        };

        let parts = self.data.parts_for_equipment(equipment_id);
        let activities = self.data.activities_for_equipment(equipment_id);
        let context = self
            .prompts()
            .equipment_context(equipment_id, equipment, &parts, &activities);

        let query = format!(
            "Analyze the health and maintenance status of equipment {}. Provide a detailed \
             assessment including health score, risk level, maintenance recommendations, and any \
             urgent issues that need attention.",
            equipment_id
        );
        self.analyze(Topic::Equipment, &query, &context).await
    }

    pub async fn part_replacement(&self, equipment_id: i64, part_id: i64) -> Reply {
        let history = self.data.part_history(equipment_id, part_id);
        if history.is_empty() {
            return Reply::NotFound(format!(
                "No data found for part {} on equipment {}.",
                part_id, equipment_id
            ));
        }

        let context = self.prompts().part_context(equipment_id, part_id, &history);
        let query = format!(
            "Predict when part {} on equipment {} needs replacement. Analyze the replacement \
             history, calculate lifecycle patterns, and provide a prediction with confidence \
             level and risk assessment.",
            part_id, equipment_id
        );
        self.analyze(Topic::Parts, &query, &context).await
    }

    pub async fn chat(&self, message: &str) -> Reply {
        self.analyze(select_topic(message), message, "").await
    }

    pub async fn cost_analysis(&self) -> Reply {
        let query = "Analyze the maintenance costs, identify cost trends, expensive parts, cost \
                     optimization opportunities, and provide recommendations for cost management.";
        self.analyze(Topic::Costs, query, &self.prompts().costs_context())
            .await
    }

    pub async fn maintenance_schedule(&self, equipment_id: Option<i64>) -> Reply {
        let query = match equipment_id {
            Some(id) => format!(
                "Predict the optimal maintenance schedule for equipment {}. Analyze activity \
                 patterns, recommend maintenance intervals, and identify the best timing for \
                 preventive maintenance.",
                id
            ),
            None => "Analyze the overall maintenance scheduling patterns, identify optimal \
                     maintenance intervals for different equipment types, and provide a \
                     comprehensive maintenance scheduling strategy."
                .to_string(),
        };
        self.analyze(
            Topic::Schedule,
            &query,
            &self.prompts().schedule_context(equipment_id),
        )
        .await
    }

    /// 詢問模型零件壽命（月）；無法取得時改用關鍵字估算
    pub async fn part_lifespan(&self, part_id: i64) -> Reply {
        let Some(part) = self.data.first_part(part_id) else {
            return Reply::NotFound(format!("Part {} not found in the data.", part_id));
        };

        let profile = PartProfile {
            part_id,
            part_name: part
                .text("NOTE")
                .map(str::to_string)
                .unwrap_or_else(|| format!("Part {}", part_id)),
            machine_name: part
                .equipment_ref()
                .and_then(|id| self.data.equipment_name(id))
                .unwrap_or_else(|| "Unknown equipment".to_string()),
            manufacturer: part.text("MANUFACTURER").map(str::to_string),
        };

        let estimate = self.lookup_lifespan(&profile).await;

        Reply::Report(json!({
            "part_id": profile.part_id,
            "part_name": profile.part_name,
            "machine_name": profile.machine_name,
            "category": lifespan::categorize(&profile.part_name),
            "lifespan_months": estimate.months,
            "source": estimate.source,
        }))
    }

    async fn lookup_lifespan(&self, profile: &PartProfile) -> LifespanEstimate {
        let fallback = lifespan::keyword_estimate(&profile.part_name);
        let Some(client) = &self.client else {
            return fallback;
        };

        match client.complete(&lifespan::lifespan_request(profile)).await {
            Ok(text) => match lifespan::parse_months(&text) {
                Some(months) => {
                    tracing::info!("✅ Lifespan for '{}': {} months", profile.part_name, months);
                    LifespanEstimate {
                        months,
                        source: LifespanSource::Model,
                    }
                }
                None => {
                    tracing::warn!(
                        "⚠️ Could not parse lifespan '{}' for '{}', using keyword estimate",
                        text,
                        profile.part_name
                    );
                    fallback
                }
            },
            Err(e) => {
                tracing::warn!(
                    "⚠️ Lifespan lookup failed for '{}': {}, using keyword estimate",
                    profile.part_name,
                    e
                );
                fallback
            }
        }
    }

    pub fn replacement_predictions(&self) -> Reply {
        let predictions = Forecaster::new(&self.data, self.today).replacement_predictions();
        tracing::info!("📈 Generated {} replacement predictions", predictions.len());
        self.report("predictions", predictions)
    }

    pub fn due_part_checks(&self) -> Reply {
        let checks = Forecaster::new(&self.data, self.today).due_part_checks();
        tracing::info!("🔔 {} parts are due for a check", checks.len());
        self.report("due_parts", checks)
    }

    fn report<T: Serialize>(&self, key: &str, items: Vec<T>) -> Reply {
        let mut body = serde_json::Map::new();
        body.insert(
            "reference_date".to_string(),
            Value::String(self.today.format("%Y-%m-%d").to_string()),
        );
        body.insert("count".to_string(), Value::from(items.len()));
        body.insert(
            key.to_string(),
            serde_json::to_value(items).unwrap_or_default(),
        );
        Reply::Report(Value::Object(body))
    }
}
