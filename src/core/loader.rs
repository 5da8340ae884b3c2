use crate::core::{DataKind, FleetData, Record, Storage};
use crate::utils::error::{AgentError, Result};
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub data: FleetData,
    /// partial 模式下被略過的檔案說明，由呼叫端印出
    pub warnings: Vec<String>,
}

pub struct DataLoader<S: Storage> {
    storage: S,
    allow_partial: bool,
}

impl<S: Storage> DataLoader<S> {
    pub fn new(storage: S, allow_partial: bool) -> Self {
        Self {
            storage,
            allow_partial,
        }
    }

    pub async fn load(&self) -> Result<LoadReport> {
        let mut report = LoadReport::default();

        for kind in DataKind::ALL {
            match self.load_kind(kind).await {
                Ok(records) => {
                    tracing::debug!("Loaded {} {} records", records.len(), kind.label());
                    report.data.set_collection(kind, records);
                }
                Err(e) if self.allow_partial && !kind.is_core() => {
                    tracing::warn!("⚠️ Skipping {}: {}", kind.file_name(), e);
                    report.warnings.push(format!(
                        "{}; continuing without {}",
                        e.user_friendly_message(),
                        kind.label()
                    ));
                }
                Err(e) => {
                    tracing::error!("❌ Error loading {}: {}", kind.file_name(), e);
                    return Err(e);
                }
            }
        }

        tracing::info!(
            "✅ Loaded data: {} equipment, {} parts, {} activities",
            report.data.equipment.len(),
            report.data.spare_parts.len(),
            report.data.activities.len()
        );

        Ok(report)
    }

    async fn load_kind(&self, kind: DataKind) -> Result<Vec<Record>> {
        let file = kind.file_name();

        if !self.storage.exists(file).await {
            return Err(AgentError::MissingDataFileError {
                file: file.to_string(),
                path: self.storage.display_path(file),
            });
        }

        let bytes = self.storage.read_file(file).await.map_err(|e| {
            AgentError::MalformedDataFileError {
                file: file.to_string(),
                reason: e.to_string(),
            }
        })?;
        parse_records(kind, &bytes)
    }
}

/// 檔案內容必須是 JSON 陣列；非物件元素略過
pub fn parse_records(kind: DataKind, bytes: &[u8]) -> Result<Vec<Record>> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| AgentError::MalformedDataFileError {
            file: kind.file_name().to_string(),
            reason: e.to_string(),
        })?;

    let Value::Array(items) = value else {
        return Err(AgentError::MalformedDataFileError {
            file: kind.file_name().to_string(),
            reason: "top-level value is not an array".to_string(),
        });
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(obj) => records.push(Record::new(obj)),
            other => tracing::debug!(
                "Skipping non-object element #{} in {}: {}",
                index,
                kind.file_name(),
                other
            ),
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn put(&self, path: &str, data: &str) {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.as_bytes().to_vec());
        }

        async fn with_all_files() -> Self {
            let storage = Self::default();
            storage
                .put("rollingstock.json", r#"[{"ID": 1}, {"ID": 2}]"#)
                .await;
            storage
                .put("spareparts.json", r#"[{"SPAREPARTID": 7, "UNITPRICE": 10}]"#)
                .await;
            storage
                .put("activities.json", r#"[{"ROLLINGSTOCKID": 1}]"#)
                .await;
            storage.put("contracts.json", "[]").await;
            storage.put("movements.json", r#"[{"ID": 3}]"#).await;
            storage.put("jobordertask.json", "[]").await;
            storage
        }

        async fn remove(&self, path: &str) {
            self.files.lock().await.remove(path);
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                AgentError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn exists(&self, path: &str) -> bool {
            self.files.lock().await.contains_key(path)
        }

        fn display_path(&self, path: &str) -> String {
            format!("mock://{}", path)
        }
    }

    #[tokio::test]
    async fn test_load_all_six_files() {
        let storage = MockStorage::with_all_files().await;
        let report = DataLoader::new(storage, false).load().await.unwrap();

        assert_eq!(report.data.equipment.len(), 2);
        assert_eq!(report.data.spare_parts.len(), 1);
        assert_eq!(report.data.activities.len(), 1);
        assert_eq!(report.data.movements.len(), 1);
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_every_missing_file_is_an_error_in_strict_mode() {
        for kind in DataKind::ALL {
            let storage = MockStorage::with_all_files().await;
            storage.remove(kind.file_name()).await;

            let err = DataLoader::new(storage, false).load().await.unwrap_err();
            match err {
                AgentError::MissingDataFileError { file, path } => {
                    assert_eq!(file, kind.file_name());
                    assert_eq!(path, format!("mock://{}", kind.file_name()));
                }
                other => panic!("unexpected error for {:?}: {}", kind, other),
            }
        }
    }

    #[tokio::test]
    async fn test_partial_mode_skips_optional_files_with_warning() {
        let storage = MockStorage::with_all_files().await;
        storage.remove("contracts.json").await;
        storage.put("jobordertask.json", "{not json").await;

        let report = DataLoader::new(storage, true).load().await.unwrap();

        assert!(report.data.contracts.is_empty());
        assert!(report.data.job_orders.is_empty());
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].contains("contracts.json"));
        assert!(report.warnings[1].contains("jobordertask.json"));
    }

    #[tokio::test]
    async fn test_partial_mode_still_requires_core_files() {
        let storage = MockStorage::with_all_files().await;
        storage.remove("spareparts.json").await;

        let result = DataLoader::new(storage, true).load().await;
        assert!(matches!(
            result,
            Err(AgentError::MissingDataFileError { .. })
        ));
    }

    #[test]
    fn test_parse_records_rejects_non_array() {
        let err = parse_records(DataKind::Activities, br#"{"ID": 1}"#).unwrap_err();
        assert!(matches!(err, AgentError::MalformedDataFileError { .. }));
    }

    #[test]
    fn test_parse_records_skips_non_objects() {
        let records = parse_records(DataKind::Movements, br#"[{"ID": 1}, 2, "x", {"ID": 3}]"#)
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].int("ID"), Some(3));
    }
}
