use crate::core::lifespan::{self, LifespanEstimate, LifespanSource};
use crate::core::{FleetData, Record};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use serde::Serialize;
use std::collections::BTreeMap;

const DEFAULT_INTERVAL_DAYS: f64 = 365.0;
const DAYS_PER_MONTH: i64 = 30;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMethod {
    EquipmentSpecificHistory,
    PartTypeAverage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartInfo {
    pub part_name: Option<String>,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplacementPrediction {
    pub equipment_id: i64,
    pub equipment_name: Option<String>,
    pub part_id: i64,
    pub last_replacement: String,
    pub predicted_next_replacement: String,
    pub average_interval_days: f64,
    pub prediction_method: PredictionMethod,
    pub due: bool,
    pub lifespan_months: u32,
    pub part: PartInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DueCheck {
    pub equipment_id: i64,
    pub part_id: i64,
    pub last_replacement: String,
    pub expected_next_check: String,
    pub lifespan_months: u32,
    pub lifespan_source: LifespanSource,
}

/// 解析 REPLACEDATE；時區資訊捨棄，以當地時間比較
pub fn parse_replace_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("NULL") {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn replace_date(record: &Record) -> Option<NaiveDateTime> {
    let value = record.text("REPLACEDATE")?;
    let parsed = parse_replace_date(value);
    if parsed.is_none() {
        tracing::debug!("Failed to parse replace date '{}'", value);
    }
    parsed
}

fn mean_interval_days(sorted: &[NaiveDateTime]) -> Option<f64> {
    if sorted.len() < 2 {
        return None;
    }
    let intervals: Vec<i64> = sorted
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_days())
        .collect();
    Some(intervals.iter().sum::<i64>() as f64 / intervals.len() as f64)
}

fn format_day(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d").to_string()
}

/// 超出日期範圍時回傳 None
fn advance_days(from: NaiveDateTime, days: f64) -> Option<NaiveDateTime> {
    let seconds = (days * 86_400.0).round();
    if !seconds.is_finite() {
        return None;
    }
    TimeDelta::try_seconds(seconds as i64).and_then(|delta| from.checked_add_signed(delta))
}

/// 以固定參考日做的確定性更換預測
pub struct Forecaster<'a> {
    data: &'a FleetData,
    today: NaiveDate,
}

impl<'a> Forecaster<'a> {
    pub fn new(data: &'a FleetData, today: NaiveDate) -> Self {
        Self { data, today }
    }

    /// (設備, 零件) → 排序後的更換時間
    fn replacement_history(&self) -> BTreeMap<(i64, i64), Vec<NaiveDateTime>> {
        let mut history: BTreeMap<(i64, i64), Vec<NaiveDateTime>> = BTreeMap::new();

        for part in &self.data.spare_parts {
            let (Some(part_id), Some(equipment_id)) =
                (part.int("SPAREPARTID"), part.int("ROLLINGSTOCKID"))
            else {
                continue;
            };
            if let Some(dt) = replace_date(part) {
                history.entry((equipment_id, part_id)).or_default().push(dt);
            }
        }

        for dates in history.values_mut() {
            dates.sort();
        }
        history
    }

    /// 每種零件跨設備的平均更換間隔（天），只計入更換兩次以上的設備
    pub fn part_type_lifespans(&self) -> BTreeMap<i64, f64> {
        let mut intervals_by_part: BTreeMap<i64, Vec<i64>> = BTreeMap::new();

        for ((_, part_id), dates) in self.replacement_history() {
            let intervals = intervals_by_part.entry(part_id).or_default();
            intervals.extend(dates.windows(2).map(|pair| (pair[1] - pair[0]).num_days()));
        }

        intervals_by_part
            .into_iter()
            .filter(|(_, intervals)| !intervals.is_empty())
            .map(|(part_id, intervals)| {
                let average = intervals.iter().sum::<i64>() as f64 / intervals.len() as f64;
                tracing::debug!(
                    "Part {}: average lifespan = {:.1} days ({:.1} years)",
                    part_id,
                    average,
                    average / 365.0
                );
                (part_id, average)
            })
            .collect()
    }

    /// 有品名時以關鍵字估算，沒有品名或不在資料中時查固定表
    pub fn lifespan_estimate(&self, part_id: i64) -> LifespanEstimate {
        match self.data.first_part(part_id).and_then(|part| part.text("NOTE")) {
            Some(name) if !name.trim().is_empty() => lifespan::keyword_estimate(name),
            _ => lifespan::default_estimate(part_id),
        }
    }

    pub fn replacement_predictions(&self) -> Vec<ReplacementPrediction> {
        let type_lifespans = self.part_type_lifespans();
        let history = self.replacement_history();

        tracing::debug!(
            "Replacement history: {} pairs, {} with 2+ replacements",
            history.len(),
            history.values().filter(|d| d.len() >= 2).count()
        );

        history
            .into_iter()
            .filter_map(|((equipment_id, part_id), dates)| {
                let last = *dates.last()?;
                let (interval, method) = match mean_interval_days(&dates) {
                    Some(avg) => (avg, PredictionMethod::EquipmentSpecificHistory),
                    None => (
                        type_lifespans
                            .get(&part_id)
                            .copied()
                            .unwrap_or(DEFAULT_INTERVAL_DAYS),
                        PredictionMethod::PartTypeAverage,
                    ),
                };

                let Some(predicted) = advance_days(last, interval) else {
                    tracing::warn!(
                        "⚠️ Prediction for part {} on equipment {} is out of date range, skipped",
                        part_id,
                        equipment_id
                    );
                    return None;
                };
                let part = self.data.first_part(part_id);

                Some(ReplacementPrediction {
                    equipment_id,
                    equipment_name: self.data.equipment_name(equipment_id),
                    part_id,
                    last_replacement: format_day(&last),
                    predicted_next_replacement: format_day(&predicted),
                    average_interval_days: interval,
                    prediction_method: method,
                    due: self.today >= predicted.date(),
                    lifespan_months: self.lifespan_estimate(part_id).months,
                    part: PartInfo {
                        part_name: part.and_then(|p| p.text("NOTE")).map(str::to_string),
                        description: part.and_then(|p| p.text("DESCRIPTION")).map(str::to_string),
                        manufacturer: part
                            .and_then(|p| p.text("MANUFACTURER"))
                            .map(str::to_string),
                    },
                })
            })
            .collect()
    }

    pub fn due_part_checks(&self) -> Vec<DueCheck> {
        let mut checks = Vec::new();

        for part in &self.data.spare_parts {
            let (Some(part_id), Some(equipment_id)) =
                (part.int("SPAREPARTID"), part.int("ROLLINGSTOCKID"))
            else {
                continue;
            };
            let Some(replaced) = replace_date(part) else {
                continue;
            };

            let estimate = self.lifespan_estimate(part_id);
            let next_check = TimeDelta::try_days(i64::from(estimate.months) * DAYS_PER_MONTH)
                .and_then(|delta| replaced.checked_add_signed(delta));
            let Some(next_check) = next_check else {
                tracing::warn!(
                    "⚠️ Next check for part {} on equipment {} is out of date range, skipped",
                    part_id,
                    equipment_id
                );
                continue;
            };

            if self.today >= next_check.date() {
                checks.push(DueCheck {
                    equipment_id,
                    part_id,
                    last_replacement: part.text("REPLACEDATE").unwrap_or_default().to_string(),
                    expected_next_check: format_day(&next_check),
                    lifespan_months: estimate.months,
                    lifespan_source: estimate.source,
                });
            }
        }

        checks
    }
}
