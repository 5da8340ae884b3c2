use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// 一筆原樣保存的 JSON 物件，欄位順序固定以便 prompt 可重現
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    /// 整數欄位，接受 JSON 數字或數字字串
    pub fn int(&self, field: &str) -> Option<i64> {
        match self.data.get(field)? {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| f as i64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        match self.data.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// 文字欄位；空字串與 "NULL" 視為不存在
    pub fn text(&self, field: &str) -> Option<&str> {
        match self.data.get(field)? {
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("NULL") {
                    None
                } else {
                    Some(trimmed)
                }
            }
            _ => None,
        }
    }

    /// 零件所屬設備：ROLLINGSTOCKID，缺值時退回 JOBORDERTASKID
    pub fn equipment_ref(&self) -> Option<i64> {
        self.int("ROLLINGSTOCKID")
            .or_else(|| self.int("JOBORDERTASKID"))
    }

    /// `UNITPRICE * QUANTITY`，缺值時單價為 0、數量為 1
    pub fn line_cost(&self) -> f64 {
        self.number("UNITPRICE").unwrap_or(0.0) * self.number("QUANTITY").unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Equipment,
    SpareParts,
    Activities,
    Contracts,
    Movements,
    JobOrders,
}

impl DataKind {
    pub const ALL: [DataKind; 6] = [
        DataKind::Equipment,
        DataKind::SpareParts,
        DataKind::Activities,
        DataKind::Contracts,
        DataKind::Movements,
        DataKind::JobOrders,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            DataKind::Equipment => "rollingstock.json",
            DataKind::SpareParts => "spareparts.json",
            DataKind::Activities => "activities.json",
            DataKind::Contracts => "contracts.json",
            DataKind::Movements => "movements.json",
            DataKind::JobOrders => "jobordertask.json",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DataKind::Equipment => "equipment",
            DataKind::SpareParts => "spare parts",
            DataKind::Activities => "activities",
            DataKind::Contracts => "contracts",
            DataKind::Movements => "movements",
            DataKind::JobOrders => "job orders",
        }
    }

    /// 核心三檔在 partial 模式下仍為必要
    pub fn is_core(&self) -> bool {
        matches!(
            self,
            DataKind::Equipment | DataKind::SpareParts | DataKind::Activities
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct FleetData {
    pub equipment: Vec<Record>,
    pub spare_parts: Vec<Record>,
    pub activities: Vec<Record>,
    pub contracts: Vec<Record>,
    pub movements: Vec<Record>,
    pub job_orders: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentSummary {
    pub total: usize,
    pub active: usize,
    pub types: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartsSummary {
    pub total: usize,
    pub total_cost: f64,
    pub avg_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitiesSummary {
    pub total: usize,
    pub technical: usize,
    pub avg_duration: f64,
}

impl FleetData {
    pub fn collection(&self, kind: DataKind) -> &[Record] {
        match kind {
            DataKind::Equipment => &self.equipment,
            DataKind::SpareParts => &self.spare_parts,
            DataKind::Activities => &self.activities,
            DataKind::Contracts => &self.contracts,
            DataKind::Movements => &self.movements,
            DataKind::JobOrders => &self.job_orders,
        }
    }

    pub fn set_collection(&mut self, kind: DataKind, records: Vec<Record>) {
        let slot = match kind {
            DataKind::Equipment => &mut self.equipment,
            DataKind::SpareParts => &mut self.spare_parts,
            DataKind::Activities => &mut self.activities,
            DataKind::Contracts => &mut self.contracts,
            DataKind::Movements => &mut self.movements,
            DataKind::JobOrders => &mut self.job_orders,
        };
        *slot = records;
    }

    pub fn total_parts_cost(&self) -> f64 {
        self.spare_parts.iter().map(Record::line_cost).sum()
    }

    pub fn average_part_cost(&self) -> f64 {
        if self.spare_parts.is_empty() {
            0.0
        } else {
            self.total_parts_cost() / self.spare_parts.len() as f64
        }
    }

    pub fn equipment_summary(&self) -> EquipmentSummary {
        let active = self
            .equipment
            .iter()
            .filter(|e| e.int("ACTIVE").unwrap_or(1) == 1)
            .count();
        let types: HashSet<i64> = self
            .equipment
            .iter()
            .map(|e| e.int("MACHINETYPE").unwrap_or(0))
            .collect();

        EquipmentSummary {
            total: self.equipment.len(),
            active,
            types: types.len(),
        }
    }

    pub fn parts_summary(&self) -> PartsSummary {
        PartsSummary {
            total: self.spare_parts.len(),
            total_cost: self.total_parts_cost(),
            avg_cost: self.average_part_cost(),
        }
    }

    pub fn activities_summary(&self) -> ActivitiesSummary {
        let technical = self
            .activities
            .iter()
            .filter(|a| a.int("TECHNICAL").unwrap_or(0) == 1)
            .count();
        let avg_duration = if self.activities.is_empty() {
            0.0
        } else {
            self.activities
                .iter()
                .map(|a| a.number("DURATION").unwrap_or(0.0))
                .sum::<f64>()
                / self.activities.len() as f64
        };

        ActivitiesSummary {
            total: self.activities.len(),
            technical,
            avg_duration,
        }
    }

    pub fn equipment_by_id(&self, id: i64) -> Option<&Record> {
        self.equipment.iter().find(|e| e.int("ID") == Some(id))
    }

    pub fn parts_for_equipment(&self, id: i64) -> Vec<&Record> {
        self.spare_parts
            .iter()
            .filter(|p| p.equipment_ref() == Some(id))
            .collect()
    }

    pub fn part_history(&self, equipment_id: i64, part_id: i64) -> Vec<&Record> {
        self.parts_for_equipment(equipment_id)
            .into_iter()
            .filter(|p| p.int("SPAREPARTID") == Some(part_id))
            .collect()
    }

    pub fn first_part(&self, part_id: i64) -> Option<&Record> {
        self.spare_parts
            .iter()
            .find(|p| p.int("SPAREPARTID") == Some(part_id))
    }

    pub fn activities_for_equipment(&self, id: i64) -> Vec<&Record> {
        self.activities
            .iter()
            .filter(|a| a.int("ROLLINGSTOCKID") == Some(id))
            .collect()
    }

    /// 設備顯示名稱：NAME > DESCRIPTION > "Equipment {id}"
    pub fn equipment_name(&self, id: i64) -> Option<String> {
        let record = self.equipment_by_id(id)?;
        Some(
            record
                .text("NAME")
                .or_else(|| record.text("DESCRIPTION"))
                .map(str::to_string)
                .unwrap_or_else(|| format!("Equipment {}", id)),
        )
    }
}
