//! Part lifespan estimation: keyword rules, a fixed per-id table, and the
//! prompt used when the completion API is asked for a number of months.

use crate::core::CompletionRequest;
use serde::Serialize;

pub const LIFESPAN_SYSTEM_PROMPT: &str = "You are a professional maintenance engineer with 20+ years of \
experience providing maintenance intervals for industrial parts. You MUST answer with a specific number \
of months and nothing else: no explanations, no units, never \"UNKNOWN\". If unsure, give the most \
reasonable estimate based on similar parts.";

const DEFAULT_MONTHS: u32 = 12;

const DEFAULT_LIFESPANS_BY_ID: &[(i64, u32)] = &[
    (3, 12),
    (4, 24),
    (5, 18),
    (6, 12),
    (7, 24),
    (8, 18),
    (9, 6),
    (10, 12),
    (11, 6),
    (12, 24),
    (13, 18),
    (14, 12),
    (15, 24),
    (16, 18),
    (17, 12),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PartCategory {
    Filter,
    Bearing,
    Belt,
    Sensor,
    Motor,
    Seal,
    Electrical,
    Hydraulic,
    General,
}

const CATEGORY_KEYWORDS: &[(PartCategory, &[&str])] = &[
    (PartCategory::Filter, &["filter", "filtro", "element"]),
    (
        PartCategory::Bearing,
        &["bearing", "cuscinetto", "pillow block"],
    ),
    (
        PartCategory::Belt,
        &["belt", "cintura", "serpentine"],
    ),
    (PartCategory::Sensor, &["sensor", "sensore"]),
    (PartCategory::Motor, &["motor", "motore", "pump", "pompa"]),
    (
        PartCategory::Seal,
        &["seal", "gasket", "guarnizione", "o-ring"],
    ),
    (
        PartCategory::Electrical,
        &["switch", "relay", "contactor", "fuse", "circuit breaker", "transformer", "capacitor"],
    ),
    (
        PartCategory::Hydraulic,
        &["hydraulic", "cylinder", "valve", "hose", "fitting", "accumulator"],
    ),
];

// 規則式估算（月），關鍵字與分類表不完全相同
const FALLBACK_RULES: &[(&[&str], u32)] = &[
    (&["filter", "filtro", "element"], 6),
    (&["bearing", "cuscinetto", "roller"], 36),
    (&["belt", "cintura", "serpentine", "timing"], 18),
    (&["sensor", "sensore", "temperature", "pressure"], 30),
    (&["motor", "motore", "pump", "pompa"], 60),
    (&["seal", "gasket", "guarnizione", "o-ring"], 24),
    (&["switch", "relay", "contactor", "electrical"], 36),
    (&["hydraulic", "cylinder", "valve", "hose"], 30),
];

const GENERAL_FALLBACK_MONTHS: u32 = 18;

impl PartCategory {
    pub fn name(&self) -> &'static str {
        match self {
            PartCategory::Filter => "filter",
            PartCategory::Bearing => "bearing",
            PartCategory::Belt => "belt",
            PartCategory::Sensor => "sensor",
            PartCategory::Motor => "motor",
            PartCategory::Seal => "seal",
            PartCategory::Electrical => "electrical",
            PartCategory::Hydraulic => "hydraulic",
            PartCategory::General => "general",
        }
    }

    fn industry_examples(&self) -> &'static str {
        match self {
            PartCategory::Filter => {
                "- Air filters: 3-12 months\n- Oil filters: 3-6 months\n- Fuel filters: 6-12 months\n- Hydraulic filters: 6-18 months"
            }
            PartCategory::Bearing => {
                "- Ball bearings: 24-60 months\n- Roller bearings: 36-72 months\n- Thrust bearings: 24-48 months\n- High-speed bearings: 12-24 months"
            }
            PartCategory::Belt => {
                "- V-belts: 12-24 months\n- Serpentine belts: 18-36 months\n- Timing belts: 24-48 months"
            }
            PartCategory::Sensor => {
                "- Temperature sensors: 24-48 months\n- Pressure sensors: 24-36 months\n- Proximity sensors: 36-60 months"
            }
            PartCategory::Motor => {
                "- Electric motors: 60-120 months\n- Hydraulic pumps: 36-72 months\n- Gear pumps: 24-48 months"
            }
            PartCategory::Seal => {
                "- O-rings: 12-24 months\n- Oil seals: 18-36 months\n- Gaskets: 12-36 months"
            }
            PartCategory::Electrical => {
                "- Switches: 24-48 months\n- Relays: 24-60 months\n- Contactors: 36-72 months\n- Circuit breakers: 60-120 months"
            }
            PartCategory::Hydraulic => {
                "- Hydraulic cylinders: 36-72 months\n- Hydraulic valves: 24-48 months\n- Hydraulic hoses: 12-24 months"
            }
            PartCategory::General => {
                "- Mechanical components: 12-36 months\n- Wear parts: 6-18 months\n- Consumables: 3-12 months\n- Safety components: 12-24 months"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifespanSource {
    Model,
    Keyword,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LifespanEstimate {
    pub months: u32,
    pub source: LifespanSource,
}

/// 查詢模型時需要的零件資訊
#[derive(Debug, Clone, PartialEq)]
pub struct PartProfile {
    pub part_id: i64,
    pub part_name: String,
    pub machine_name: String,
    pub manufacturer: Option<String>,
}

pub fn categorize(part_name: &str) -> PartCategory {
    let lowered = part_name.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lowered.contains(w)))
        .map(|(category, _)| *category)
        .unwrap_or(PartCategory::General)
}

pub fn fallback_months(part_name: &str) -> u32 {
    let lowered = part_name.to_lowercase();
    FALLBACK_RULES
        .iter()
        .find(|(words, _)| words.iter().any(|w| lowered.contains(w)))
        .map(|(_, months)| *months)
        .unwrap_or(GENERAL_FALLBACK_MONTHS)
}

pub fn default_months_for_id(part_id: i64) -> u32 {
    DEFAULT_LIFESPANS_BY_ID
        .iter()
        .find(|(id, _)| *id == part_id)
        .map(|(_, months)| *months)
        .unwrap_or(DEFAULT_MONTHS)
}

pub fn keyword_estimate(part_name: &str) -> LifespanEstimate {
    LifespanEstimate {
        months: fallback_months(part_name),
        source: LifespanSource::Keyword,
    }
}

pub fn default_estimate(part_id: i64) -> LifespanEstimate {
    LifespanEstimate {
        months: default_months_for_id(part_id),
        source: LifespanSource::Default,
    }
}

/// 取模型回覆中的第一段數字；0 視為無效
pub fn parse_months(response: &str) -> Option<u32> {
    let cleaned = response.trim();
    let digits: String = cleaned
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    digits.parse::<u32>().ok().filter(|months| *months > 0)
}

pub fn lifespan_request(profile: &PartProfile) -> CompletionRequest {
    let category = categorize(&profile.part_name);

    let user = format!(
        "MAINTENANCE INTERVAL REQUEST:\n\n\
         Part Details:\n\
         - Part Name: {}\n\
         - Machine/Equipment: {}\n\
         - Manufacturer: {}\n\
         - Part ID: {}\n\n\
         Part Category: {}\n\n\
         Industry Standards for {}:\n{}\n\n\
         TASK: Determine the recommended maintenance/replacement interval for this specific part, \
         considering manufacturer specifications, equipment type and usage, industrial operating \
         conditions and safety requirements.\n\n\
         Provide the interval in MONTHS only (for example \"6\", \"12\" or \"24\").\n\n\
         Your response (number only):",
        profile.part_name,
        profile.machine_name,
        profile.manufacturer.as_deref().unwrap_or("Industrial standard"),
        profile.part_id,
        category.name(),
        category.name(),
        category.industry_examples()
    );

    CompletionRequest {
        system: LIFESPAN_SYSTEM_PROMPT.to_string(),
        user,
        temperature: 0.0,
        max_tokens: 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize() {
        assert_eq!(categorize("Engine Air Filter - Mann C30195"), PartCategory::Filter);
        assert_eq!(categorize("Wheel Bearing Kit - SKF"), PartCategory::Bearing);
        assert_eq!(categorize("Serpentine Belt"), PartCategory::Belt);
        assert_eq!(categorize("Coolant Temperature Sensor"), PartCategory::Sensor);
        assert_eq!(categorize("Hydraulic Pump Motor"), PartCategory::Motor);
        assert_eq!(categorize("Shaft O-ring"), PartCategory::Seal);
        assert_eq!(categorize("Door relay"), PartCategory::Electrical);
        assert_eq!(categorize("Brake valve"), PartCategory::Hydraulic);
        assert_eq!(categorize("Pantograph shoe"), PartCategory::General);
    }

    #[test]
    fn test_fallback_months() {
        assert_eq!(fallback_months("Generic Air Filter"), 6);
        assert_eq!(fallback_months("Oil filter"), 6);
        assert_eq!(fallback_months("Wheel Bearing"), 36);
        assert_eq!(fallback_months("Drive Belt"), 18);
        assert_eq!(fallback_months("Temperature Sensor"), 30);
        assert_eq!(fallback_months("Hydraulic Pump Motor"), 60);
        assert_eq!(fallback_months("Door gasket"), 24);
        assert_eq!(fallback_months("Traction relay"), 36);
        assert_eq!(fallback_months("Brake hose"), 30);
        assert_eq!(fallback_months("Pantograph shoe"), 18);
    }

    #[test]
    fn test_default_months_for_id() {
        assert_eq!(default_months_for_id(9), 6);
        assert_eq!(default_months_for_id(4), 24);
        assert_eq!(default_months_for_id(999), 12);
    }

    #[test]
    fn test_parse_months() {
        assert_eq!(parse_months("24"), Some(24));
        assert_eq!(parse_months(" 12 months"), Some(12));
        assert_eq!(parse_months("About 18-24 months"), Some(18));
        assert_eq!(parse_months("UNKNOWN"), None);
        assert_eq!(parse_months("0"), None);
    }

    #[test]
    fn test_lifespan_request_shape() {
        let profile = PartProfile {
            part_id: 3,
            part_name: "Oil Filter - Mahle OC 195".to_string(),
            machine_name: "Shunter 7".to_string(),
            manufacturer: None,
        };

        let request = lifespan_request(&profile);

        assert_eq!(request.max_tokens, 10);
        assert_eq!(request.temperature, 0.0);
        assert!(request.user.contains("Part Category: filter"));
        assert!(request.user.contains("Oil filters: 3-6 months"));
        assert!(request.user.contains("Manufacturer: Industrial standard"));
        assert!(request.system.contains("number of months"));
    }
}
