use anyhow::Result;
use spareparts_agent::core::DataKind;
use spareparts_agent::{AgentError, DataLoader, LocalStorage};
use std::path::Path;
use tempfile::TempDir;

fn write_all_files(dir: &Path) -> Result<()> {
    std::fs::write(
        dir.join("rollingstock.json"),
        r#"[{"ID": 1, "NAME": "Loco 1", "ACTIVE": 1, "MACHINETYPE": 2}]"#,
    )?;
    std::fs::write(
        dir.join("spareparts.json"),
        r#"[{"SPAREPARTID": 9, "ROLLINGSTOCKID": 1, "UNITPRICE": 10.0, "QUANTITY": 3}]"#,
    )?;
    std::fs::write(
        dir.join("activities.json"),
        r#"[{"ROLLINGSTOCKID": 1, "TECHNICAL": 1, "DURATION": 2}, "not an object"]"#,
    )?;
    std::fs::write(dir.join("contracts.json"), "[]")?;
    std::fs::write(dir.join("movements.json"), r#"[{"ID": 1}]"#)?;
    std::fs::write(dir.join("jobordertask.json"), r#"[{"ID": 1}, {"ID": 2}]"#)?;
    Ok(())
}

fn storage(dir: &TempDir) -> LocalStorage {
    LocalStorage::new(dir.path().to_string_lossy().to_string())
}

#[tokio::test]
async fn test_loads_all_six_files() -> Result<()> {
    let dir = TempDir::new()?;
    write_all_files(dir.path())?;

    let report = DataLoader::new(storage(&dir), false).load().await?;

    assert!(report.warnings.is_empty());
    assert_eq!(report.data.equipment.len(), 1);
    assert_eq!(report.data.total_parts_cost(), 30.0);
    // 非物件元素被略過
    assert_eq!(report.data.activities.len(), 1);
    assert_eq!(report.data.collection(DataKind::JobOrders).len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_strict_mode_fails_when_any_file_is_missing() -> Result<()> {
    for kind in DataKind::ALL {
        let dir = TempDir::new()?;
        write_all_files(dir.path())?;
        std::fs::remove_file(dir.path().join(kind.file_name()))?;

        let err = DataLoader::new(storage(&dir), false)
            .load()
            .await
            .unwrap_err();

        match err {
            AgentError::MissingDataFileError { file, .. } => assert_eq!(file, kind.file_name()),
            other => panic!("unexpected error for {}: {}", kind.file_name(), other),
        }
    }

    Ok(())
}

#[tokio::test]
async fn test_malformed_file_is_reported_by_name() -> Result<()> {
    let dir = TempDir::new()?;
    write_all_files(dir.path())?;
    std::fs::write(dir.path().join("spareparts.json"), r#"{"SPAREPARTID": 1}"#)?;

    let err = DataLoader::new(storage(&dir), true)
        .load()
        .await
        .unwrap_err();

    assert!(err.to_string().contains("spareparts.json"));
    assert!(matches!(err, AgentError::MalformedDataFileError { .. }));

    Ok(())
}

#[tokio::test]
async fn test_unreadable_file_is_reported_by_name() -> Result<()> {
    let dir = TempDir::new()?;
    write_all_files(dir.path())?;
    // 同名目錄：存在但無法當檔案讀取
    std::fs::remove_file(dir.path().join("activities.json"))?;
    std::fs::create_dir(dir.path().join("activities.json"))?;

    let err = DataLoader::new(storage(&dir), false)
        .load()
        .await
        .unwrap_err();

    match &err {
        AgentError::MalformedDataFileError { file, .. } => assert_eq!(file, "activities.json"),
        other => panic!("unexpected error: {}", other),
    }
    assert!(err.user_friendly_message().contains("activities.json"));

    Ok(())
}

#[tokio::test]
async fn test_partial_mode_skips_optional_files_with_warning() -> Result<()> {
    let dir = TempDir::new()?;
    write_all_files(dir.path())?;
    std::fs::remove_file(dir.path().join("movements.json"))?;
    std::fs::write(dir.path().join("contracts.json"), "not json")?;

    let report = DataLoader::new(storage(&dir), true).load().await?;

    assert_eq!(report.warnings.len(), 2);
    assert!(report.warnings.iter().any(|w| w.contains("contracts.json")));
    assert!(report.warnings.iter().any(|w| w.contains("movements.json")));
    assert!(report.data.movements.is_empty());
    assert_eq!(report.data.job_orders.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_partial_mode_still_requires_core_files() -> Result<()> {
    let dir = TempDir::new()?;
    write_all_files(dir.path())?;
    std::fs::remove_file(dir.path().join("activities.json"))?;

    let result = DataLoader::new(storage(&dir), true).load().await;

    assert!(matches!(
        result,
        Err(AgentError::MissingDataFileError { .. })
    ));

    Ok(())
}
