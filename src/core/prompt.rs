use crate::core::{FleetData, PromptLimits, Record};
use serde::Serialize;

pub const ANALYST_SYSTEM_PROMPT: &str = "You are an expert maintenance AI analyst with deep knowledge of \
spare parts management, equipment health monitoring, and predictive maintenance. Provide detailed, \
actionable insights based on the data provided.";

// 結構化模式只附少量樣本
const STRUCTURED_SAMPLE_EQUIPMENT: usize = 2;
const STRUCTURED_SAMPLE_PARTS: usize = 3;
const STRUCTURED_SAMPLE_ACTIVITIES: usize = 3;

/// 組出送給模型的 user message 與各指令的 context 區塊
pub struct PromptBuilder<'a> {
    data: &'a FleetData,
    limits: PromptLimits,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(data: &'a FleetData, limits: PromptLimits) -> Self {
        Self { data, limits }
    }

    pub fn analysis_prompt(&self, query: &str, context: &str) -> String {
        let data = self.data;
        let equipment = head(&data.equipment, self.limits.sample_equipment);
        let parts = head(&data.spare_parts, self.limits.sample_parts);
        let activities = head(&data.activities, self.limits.sample_activities);

        let mut prompt = String::new();
        prompt.push_str(
            "You are an expert AI maintenance analyst specializing in spare parts management and equipment health.\n\n",
        );
        prompt.push_str("CONTEXT:\n");
        prompt.push_str(&format!("- Total Equipment: {}\n", data.equipment.len()));
        prompt.push_str(&format!("- Total Spare Parts Used: {}\n", data.spare_parts.len()));
        prompt.push_str(&format!(
            "- Total Maintenance Activities: {}\n",
            data.activities.len()
        ));
        prompt.push_str(&format!(
            "- Total Maintenance Cost: {}\n\n",
            format_currency(data.total_parts_cost())
        ));

        prompt.push_str("SAMPLE DATA:\n");
        prompt.push_str(&format!(
            "Equipment (first {}):\n{}\n\n",
            self.limits.sample_equipment,
            pretty_json(&equipment)
        ));
        prompt.push_str(&format!(
            "Spare Parts (first {}):\n{}\n\n",
            self.limits.sample_parts,
            pretty_json(&parts)
        ));
        prompt.push_str(&format!(
            "Maintenance Activities (first {}):\n{}\n\n",
            self.limits.sample_activities,
            pretty_json(&activities)
        ));

        prompt.push_str(&format!("USER QUERY: {}\n\n", query));
        if !context.trim().is_empty() {
            prompt.push_str(context.trim());
            prompt.push_str("\n\n");
        }

        prompt.push_str(
            "Please provide a comprehensive, intelligent analysis based on this data. Include:\n\
             1. Specific insights relevant to the query\n\
             2. Data-driven recommendations\n\
             3. Risk assessments if applicable\n\
             4. Actionable next steps\n\
             5. Confidence level in your analysis\n\n\
             Respond in a clear, professional manner suitable for a maintenance manager.\n",
        );
        prompt
    }

    /// 要求模型只以指定格式的 JSON 回答
    pub fn structured_prompt(&self, query: &str, response_format: &str) -> String {
        let data = self.data;
        let mut prompt = String::new();
        prompt.push_str(
            "You are an expert AI maintenance analyst. Analyze the following comprehensive \
             maintenance data and provide a structured response.\n\n",
        );
        prompt.push_str("COMPREHENSIVE DATA SUMMARY:\n");
        prompt.push_str(&format!(
            "- Equipment/Rolling Stock: {} (detailed equipment specifications)\n",
            data.equipment.len()
        ));
        prompt.push_str(&format!(
            "- Spare Parts: {} (maintenance parts with costs and quantities)\n",
            data.spare_parts.len()
        ));
        prompt.push_str(&format!(
            "- Activities: {} (service records and work orders)\n",
            data.activities.len()
        ));
        prompt.push_str(&format!(
            "- Contracts: {} (service agreements)\n",
            data.contracts.len()
        ));
        prompt.push_str(&format!(
            "- Movements: {} (equipment location tracking)\n",
            data.movements.len()
        ));
        prompt.push_str(&format!(
            "- Job Orders: {} (work order management)\n",
            data.job_orders.len()
        ));
        prompt.push_str(&format!(
            "- Total Cost: {}\n\n",
            format_currency(data.total_parts_cost())
        ));

        prompt.push_str("SAMPLE DATA:\n");
        prompt.push_str(&format!(
            "Equipment: {}\n",
            pretty_json(head(&data.equipment, STRUCTURED_SAMPLE_EQUIPMENT))
        ));
        prompt.push_str(&format!(
            "Parts: {}\n",
            pretty_json(head(&data.spare_parts, STRUCTURED_SAMPLE_PARTS))
        ));
        prompt.push_str(&format!(
            "Activities: {}\n\n",
            pretty_json(head(&data.activities, STRUCTURED_SAMPLE_ACTIVITIES))
        ));

        prompt.push_str(&format!("QUERY: {}\n\n", query));
        prompt.push_str(&format!("RESPONSE FORMAT: {}\n\n", response_format));
        prompt.push_str(
            "IMPORTANT: Respond ONLY with valid JSON in the exact format specified. \
             Do not include any text before or after the JSON.\n",
        );
        prompt
    }

    pub fn insights_context(&self) -> String {
        format!(
            "SYSTEM OVERVIEW:\nEquipment Summary: {}\nParts Summary: {}\nActivities Summary: {}",
            pretty_json(&self.data.equipment_summary()),
            pretty_json(&self.data.parts_summary()),
            pretty_json(&self.data.activities_summary())
        )
    }

    pub fn alerts_context(&self) -> String {
        let window = self.limits.alert_window;
        format!(
            "ALERT GENERATION DATA:\nRecent Activities: {}\nRecent Parts: {}",
            pretty_json(&head(&self.data.activities, window)),
            pretty_json(&head(&self.data.spare_parts, window))
        )
    }

    pub fn equipment_context(
        &self,
        equipment_id: i64,
        equipment: &Record,
        parts: &[&Record],
        activities: &[&Record],
    ) -> String {
        format!(
            "SPECIFIC EQUIPMENT ANALYSIS:\nEquipment ID: {}\nEquipment Details: {}\nRelated Parts: {}\nRelated Activities: {}",
            equipment_id,
            pretty_json(equipment),
            pretty_json(&parts),
            pretty_json(&activities)
        )
    }

    pub fn part_context(&self, equipment_id: i64, part_id: i64, history: &[&Record]) -> String {
        format!(
            "PART REPLACEMENT ANALYSIS:\nEquipment ID: {}\nPart ID: {}\nPart History: {}",
            equipment_id,
            part_id,
            pretty_json(&history)
        )
    }

    pub fn costs_context(&self) -> String {
        format!(
            "COST ANALYSIS DATA:\nAll Parts (first {}): {}",
            self.limits.cost_window,
            pretty_json(&head(&self.data.spare_parts, self.limits.cost_window))
        )
    }

    pub fn schedule_context(&self, equipment_id: Option<i64>) -> String {
        match equipment_id {
            Some(id) => format!(
                "MAINTENANCE SCHEDULING FOR EQUIPMENT {}:\nActivities: {}",
                id,
                pretty_json(&self.data.activities_for_equipment(id))
            ),
            None => format!(
                "SYSTEM MAINTENANCE SCHEDULING:\nAll Activities (first {}): {}",
                self.limits.schedule_window,
                pretty_json(&head(&self.data.activities, self.limits.schedule_window))
            ),
        }
    }
}

fn head(records: &[Record], limit: usize) -> &[Record] {
    &records[..records.len().min(limit)]
}

pub fn pretty_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

/// 以千分位與兩位小數格式化金額，例如 `$12,345.60`
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    fn fleet(equipment: usize) -> FleetData {
        FleetData {
            equipment: (1..=equipment as i64)
                .map(|id| record(json!({"ID": id})))
                .collect(),
            spare_parts: vec![record(
                json!({"SPAREPARTID": 4079, "UNITPRICE": 1234.5, "QUANTITY": 2}),
            )],
            activities: vec![record(json!({"ROLLINGSTOCKID": 1, "DURATION": 3}))],
            ..FleetData::default()
        }
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(999.999), "$1,000.00");
        assert_eq!(format_currency(2469.0), "$2,469.00");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(-12.5), "-$12.50");
    }

    #[test]
    fn test_analysis_prompt_contains_totals_and_query() {
        let data = fleet(3);
        let builder = PromptBuilder::new(&data, PromptLimits::default());

        let prompt = builder.analysis_prompt("Which bogie needs work?", "EXTRA CONTEXT");

        assert!(prompt.contains("- Total Equipment: 3"));
        assert!(prompt.contains("- Total Spare Parts Used: 1"));
        assert!(prompt.contains("- Total Maintenance Cost: $2,469.00"));
        assert!(prompt.contains("USER QUERY: Which bogie needs work?"));
        assert!(prompt.contains("EXTRA CONTEXT"));
        assert!(prompt.contains("Confidence level"));
    }

    #[test]
    fn test_structured_prompt_asks_for_json_only() {
        let data = fleet(5);
        let prompt = PromptBuilder::new(&data, PromptLimits::default())
            .structured_prompt("Give metrics", "{\"total_parts\": number}");

        assert!(prompt.contains("- Equipment/Rolling Stock: 5"));
        assert!(prompt.contains("- Job Orders: 0"));
        assert!(prompt.contains("- Total Cost: $2,469.00"));
        assert!(prompt.contains("QUERY: Give metrics"));
        assert!(prompt.contains("RESPONSE FORMAT: {\"total_parts\": number}"));
        assert!(prompt.contains("Respond ONLY with valid JSON"));
        // 只取前 2 台設備
        assert!(prompt.contains("\"ID\": 2"));
        assert!(!prompt.contains("\"ID\": 3"));
    }

    #[test]
    fn test_samples_are_truncated_to_limits() {
        let data = fleet(12);
        let limits = PromptLimits {
            sample_equipment: 2,
            ..PromptLimits::default()
        };
        let prompt = PromptBuilder::new(&data, limits).analysis_prompt("q", "");

        assert!(prompt.contains("Equipment (first 2):"));
        assert!(prompt.contains("\"ID\": 2"));
        assert!(!prompt.contains("\"ID\": 3"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let data = fleet(4);
        let builder = PromptBuilder::new(&data, PromptLimits::default());
        assert_eq!(
            builder.analysis_prompt("costs", &builder.costs_context()),
            builder.analysis_prompt("costs", &builder.costs_context())
        );
    }

    #[test]
    fn test_schedule_context_variants() {
        let data = fleet(1);
        let builder = PromptBuilder::new(&data, PromptLimits::default());

        assert!(builder
            .schedule_context(Some(1))
            .starts_with("MAINTENANCE SCHEDULING FOR EQUIPMENT 1:"));
        assert!(builder
            .schedule_context(None)
            .starts_with("SYSTEM MAINTENANCE SCHEDULING:"));
    }
}
