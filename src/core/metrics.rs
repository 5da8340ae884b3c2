use crate::core::{DataKind, FleetData, Record};
use crate::utils::error::Result;
use serde::Serialize;
use serde_json::{json, Map, Value};

pub const STRUCTURED_SYSTEM_PROMPT: &str =
    "You are an expert maintenance AI analyst. Always respond with valid JSON only.";

pub const METRICS_QUERY: &str = "Analyze the comprehensive maintenance data and provide \
dashboard metrics including equipment counts, costs, health scores, maintenance schedules, \
and key performance indicators. Consider all data types: equipment, parts, activities, \
contracts, movements, and job orders.";

pub const METRICS_RESPONSE_FORMAT: &str = r#"{
  "total_equipment": number,
  "total_parts": number,
  "total_activities": number,
  "total_contracts": number,
  "total_movements": number,
  "total_job_orders": number,
  "total_cost": number,
  "active_equipment": number,
  "parts_needing_replacement": number,
  "urgent_alerts": number,
  "upcoming_maintenance": number,
  "cost_trend": "increasing|decreasing|stable",
  "health_score": number (0-100),
  "top_expensive_parts": [
    {"id": number, "name": string, "cost": number, "quantity": number}
  ],
  "recent_activities": number,
  "predicted_failures": number
}"#;

const TOP_PARTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpensivePart {
    pub id: Option<i64>,
    pub name: String,
    pub cost: f64,
    pub quantity: f64,
}

/// 不經模型、直接由資料算出的儀表板數字
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub total_equipment: usize,
    pub active_equipment: usize,
    pub total_parts: usize,
    pub total_activities: usize,
    pub technical_activities: usize,
    pub total_contracts: usize,
    pub total_movements: usize,
    pub total_job_orders: usize,
    pub total_cost: f64,
    pub average_part_cost: f64,
    pub top_expensive_parts: Vec<ExpensivePart>,
}

fn expensive_part(record: &Record) -> ExpensivePart {
    let id = record.int("SPAREPARTID");
    ExpensivePart {
        id,
        name: record
            .text("NOTE")
            .map(str::to_string)
            .unwrap_or_else(|| match id {
                Some(id) => format!("Part {}", id),
                None => "Unknown part".to_string(),
            }),
        cost: record.line_cost(),
        quantity: record.number("QUANTITY").unwrap_or(1.0),
    }
}

pub fn dashboard_metrics(data: &FleetData) -> DashboardMetrics {
    let mut parts: Vec<ExpensivePart> = data.spare_parts.iter().map(expensive_part).collect();
    // 穩定排序：同價時保留檔案順序
    parts.sort_by(|a, b| b.cost.total_cmp(&a.cost));
    parts.truncate(TOP_PARTS);

    DashboardMetrics {
        total_equipment: data.collection(DataKind::Equipment).len(),
        active_equipment: data.equipment_summary().active,
        total_parts: data.collection(DataKind::SpareParts).len(),
        total_activities: data.collection(DataKind::Activities).len(),
        technical_activities: data.activities_summary().technical,
        total_contracts: data.collection(DataKind::Contracts).len(),
        total_movements: data.collection(DataKind::Movements).len(),
        total_job_orders: data.collection(DataKind::JobOrders).len(),
        total_cost: data.total_parts_cost(),
        average_part_cost: data.average_part_cost(),
        top_expensive_parts: parts,
    }
}

/// 模型回覆必須是 JSON 物件；允許外層包一層 ``` 區塊
pub fn parse_structured(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    let body = match trimmed.strip_prefix("```") {
        Some(fenced) => fenced
            .trim_start_matches("json")
            .trim_end()
            .trim_end_matches("```"),
        None => trimmed,
    };

    let object: Map<String, Value> = serde_json::from_str(body.trim())?;
    Ok(Value::Object(object))
}

pub fn structured_fallback(query: &str, error: &str) -> Value {
    json!({
        "error": error,
        "message": format!("Query: {}", query),
        "data": {},
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::AgentError;

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    fn data() -> FleetData {
        let mut data = FleetData {
            equipment: vec![
                record(json!({"ID": 1, "ACTIVE": 1})),
                record(json!({"ID": 2, "ACTIVE": 0})),
            ],
            activities: vec![record(json!({"TECHNICAL": 1})), record(json!({"TECHNICAL": 0}))],
            contracts: vec![record(json!({"ID": 1}))],
            ..FleetData::default()
        };
        data.spare_parts = (1..=7)
            .map(|i| {
                record(json!({
                    "SPAREPARTID": i, "NOTE": format!("Item {}", i),
                    "UNITPRICE": (i * 10) as f64, "QUANTITY": 1
                }))
            })
            .collect();
        data.spare_parts
            .push(record(json!({"SPAREPARTID": 8, "UNITPRICE": 40.0, "QUANTITY": 2})));
        data
    }

    #[test]
    fn test_dashboard_metrics_counts_and_costs() {
        let metrics = dashboard_metrics(&data());

        assert_eq!(metrics.total_equipment, 2);
        assert_eq!(metrics.active_equipment, 1);
        assert_eq!(metrics.total_parts, 8);
        assert_eq!(metrics.total_activities, 2);
        assert_eq!(metrics.technical_activities, 1);
        assert_eq!(metrics.total_contracts, 1);
        assert_eq!(metrics.total_movements, 0);
        assert_eq!(metrics.total_job_orders, 0);
        assert_eq!(metrics.total_cost, 360.0);
    }

    #[test]
    fn test_top_expensive_parts() {
        let top = dashboard_metrics(&data()).top_expensive_parts;

        let ids: Vec<Option<i64>> = top.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![Some(8), Some(7), Some(6), Some(5), Some(4)]);
        assert_eq!(top[0].name, "Part 8");
        assert_eq!(top[0].cost, 80.0);
        assert_eq!(top[0].quantity, 2.0);
        assert_eq!(top[1].name, "Item 7");
    }

    #[test]
    fn test_parse_structured() {
        let value = parse_structured(" {\"health_score\": 80} ").unwrap();
        assert_eq!(value["health_score"], 80);

        let fenced = parse_structured("```json\n{\"total_parts\": 9}\n```").unwrap();
        assert_eq!(fenced["total_parts"], 9);

        assert!(matches!(
            parse_structured("Here are your metrics"),
            Err(AgentError::SerializationError(_))
        ));
        assert!(parse_structured("[1, 2]").is_err());
    }

    #[test]
    fn test_structured_fallback_shape() {
        let value = structured_fallback("metrics please", "OpenAI API not available");
        assert_eq!(value["error"], "OpenAI API not available");
        assert_eq!(value["message"], "Query: metrics please");
        assert_eq!(value["data"], json!({}));
    }
}
