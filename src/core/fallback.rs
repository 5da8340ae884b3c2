use crate::core::prompt::format_currency;
use crate::core::FleetData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Alerts,
    Costs,
    Schedule,
    Parts,
    Equipment,
    Insights,
    General,
}

// 依序比對，先命中者優先
const TOPIC_KEYWORDS: &[(Topic, &[&str])] = &[
    (Topic::Alerts, &["alert", "urgent", "attention", "critical"]),
    (Topic::Costs, &["cost", "expensive", "price", "budget"]),
    (
        Topic::Schedule,
        &["schedule", "interval", "when", "next maintenance"],
    ),
    (Topic::Parts, &["part", "replace", "replacement"]),
    (Topic::Equipment, &["equipment", "health", "status"]),
    (Topic::Insights, &["insight", "overview", "system"]),
];

pub fn select_topic(query: &str) -> Topic {
    let lowered = query.to_lowercase();
    TOPIC_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lowered.contains(w)))
        .map(|(topic, _)| *topic)
        .unwrap_or(Topic::General)
}

/// 無法使用模型時的固定回覆；主題由查詢文字的關鍵字決定
pub fn fallback_response(query: &str, data: &FleetData) -> String {
    topic_fallback(select_topic(query), query, data)
}

/// 指定主題的固定回覆；只依賴查詢文字與資料，不含時間
pub fn topic_fallback(topic: Topic, query: &str, data: &FleetData) -> String {
    let mut text = format!("I understand you're asking about: {}\n\n", query);
    text.push_str(headline(topic));
    text.push_str("\n\n");

    let summary = basic_summary(topic, data);
    if !summary.is_empty() {
        text.push_str("Basic data summary:\n");
        for line in summary {
            text.push_str("  - ");
            text.push_str(&line);
            text.push('\n');
        }
        text.push('\n');
    }

    text.push_str(
        "Detailed AI analysis is not available right now. Set the OPENAI_API_KEY \
         environment variable to enable full AI capabilities.",
    );
    text
}

fn headline(topic: Topic) -> &'static str {
    match topic {
        Topic::Alerts => "🚨 Maintenance alerts need AI analysis of recent activities and part usage.",
        Topic::Costs => "💰 Cost analysis is limited to totals without AI access.",
        Topic::Schedule => "📅 Maintenance scheduling predictions require AI analysis of activity patterns.",
        Topic::Parts => "🔧 Part replacement predictions require AI analysis of the replacement history.",
        Topic::Equipment => "🔍 Equipment health assessment requires AI analysis of parts and activities.",
        Topic::Insights => "📊 System insights are limited to basic counts without AI access.",
        Topic::General => "💬 I can still help with basic data analysis.",
    }
}

fn basic_summary(topic: Topic, data: &FleetData) -> Vec<String> {
    match topic {
        Topic::Alerts => {
            let equipment = data.equipment_summary();
            let activities = data.activities_summary();
            vec![
                format!(
                    "{} of {} equipment records are inactive",
                    equipment.total - equipment.active,
                    equipment.total
                ),
                format!(
                    "{} of {} activities are technical interventions",
                    activities.technical, activities.total
                ),
            ]
        }
        Topic::Costs => {
            let parts = data.parts_summary();
            let mut lines = vec![
                format!("Total maintenance cost: {}", format_currency(parts.total_cost)),
                format!("Average cost per part line: {}", format_currency(parts.avg_cost)),
            ];
            if let Some(top) = data
                .spare_parts
                .iter()
                .max_by(|a, b| a.line_cost().total_cmp(&b.line_cost()))
            {
                lines.push(format!(
                    "Most expensive part line: {} ({})",
                    top.text("NOTE")
                        .map(str::to_string)
                        .or_else(|| top.int("SPAREPARTID").map(|id| format!("part {}", id)))
                        .unwrap_or_else(|| "unnamed part".to_string()),
                    format_currency(top.line_cost())
                ));
            }
            lines
        }
        Topic::Schedule => {
            let activities = data.activities_summary();
            vec![
                format!("{} recorded maintenance activities", activities.total),
                format!("Average activity duration: {:.1}", activities.avg_duration),
            ]
        }
        Topic::Parts => {
            let parts = data.parts_summary();
            vec![
                format!("{} spare part records", parts.total),
                "Run 'predict' or 'due' for rule-based replacement forecasts".to_string(),
            ]
        }
        Topic::Equipment | Topic::Insights => {
            let equipment = data.equipment_summary();
            let parts = data.parts_summary();
            let activities = data.activities_summary();
            vec![
                format!(
                    "{} equipment records ({} active, {} types)",
                    equipment.total, equipment.active, equipment.types
                ),
                format!(
                    "{} spare part records costing {} in total",
                    parts.total,
                    format_currency(parts.total_cost)
                ),
                format!("{} maintenance activities", activities.total),
            ]
        }
        Topic::General => Vec::new(),
    }
}
