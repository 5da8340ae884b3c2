use anyhow::Result;
use httpmock::prelude::*;
use spareparts_agent::core::command::HELP_TEXT;
use spareparts_agent::core::session::{Step, GOODBYE};
use spareparts_agent::core::{FleetData, PromptLimits};
use spareparts_agent::{DataLoader, LocalStorage, OpenAiClient, Session, SparePartsAgent};

/// 說明文字中列出的每個指令
const HELP_COMMANDS: &[&str] = &[
    "help",
    "h",
    "metrics",
    "m",
    "insights",
    "i",
    "alerts",
    "a",
    "equipment 1",
    "e 2",
    "parts 1 9",
    "chat Which equipment needs maintenance?",
    "costs",
    "c",
    "schedule",
    "schedule 4",
    "lifespan 13",
    "predict",
    "due",
];

async fn sample_data() -> Result<FleetData> {
    let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/data");
    let report = DataLoader::new(LocalStorage::new(dir.to_string()), false)
        .load()
        .await?;
    Ok(report.data)
}

async fn session_with(client: Option<OpenAiClient>) -> Result<Session<OpenAiClient>> {
    let agent = SparePartsAgent::new(sample_data().await?, PromptLimits::default(), client);
    Ok(Session::new(agent))
}

async fn run_lines(session: &Session<OpenAiClient>, input: &str) -> Result<String> {
    let mut out = Vec::new();
    session.run_interactive(input.as_bytes(), &mut out).await?;
    Ok(String::from_utf8(out)?)
}

async fn answering_mock(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "18"}}]
            }));
        })
        .await
}

async fn output_of(session: &Session<OpenAiClient>, line: &str) -> String {
    match session.handle_line(line).await {
        Step::Output(text) => text,
        other => panic!("unexpected step for '{}': {:?}", line, other),
    }
}

#[tokio::test]
async fn test_every_help_command_has_output_without_credential() -> Result<()> {
    let session = session_with(None).await?;

    for line in HELP_COMMANDS {
        assert!(HELP_TEXT.contains(line.split_whitespace().next().unwrap_or_default()));
        let output = output_of(&session, line).await;
        assert!(!output.trim().is_empty(), "no output for '{}'", line);
    }

    Ok(())
}

#[tokio::test]
async fn test_every_help_command_has_output_with_credential() -> Result<()> {
    let server = MockServer::start_async().await;
    let completion_mock = answering_mock(&server).await;

    let client = OpenAiClient::new(&server.url("/v1"), "sk-test", "gpt-test", 5)?;
    let session = session_with(Some(client)).await?;

    for line in HELP_COMMANDS {
        let output = output_of(&session, line).await;
        assert!(!output.trim().is_empty(), "no output for '{}'", line);
    }

    // help、predict、due 不呼叫 API
    assert_eq!(completion_mock.hits_async().await, 15);

    Ok(())
}

#[tokio::test]
async fn test_no_credential_means_no_request_and_deterministic_text() -> Result<()> {
    let server = MockServer::start_async().await;
    let completion_mock = answering_mock(&server).await;

    let input = "insights\ncosts\nchat how are the brakes?\n";
    let first = run_lines(&session_with(None).await?, input).await?;
    let second = run_lines(&session_with(None).await?, input).await?;

    assert_eq!(first, second);
    assert!(first.contains("I understand you're asking about: how are the brakes?"));
    assert!(first.contains("OPENAI_API_KEY"));
    assert_eq!(completion_mock.hits_async().await, 0);

    Ok(())
}

#[tokio::test]
async fn test_quit_stops_before_any_request() -> Result<()> {
    let server = MockServer::start_async().await;
    let completion_mock = answering_mock(&server).await;

    for quit in ["quit", "exit", "q"] {
        let client = OpenAiClient::new(&server.url("/v1"), "sk-test", "gpt-test", 5)?;
        let session = session_with(Some(client)).await?;

        let output = run_lines(&session, &format!("{}\ninsights\nalerts\n", quit)).await?;

        assert!(output.trim_end().ends_with(GOODBYE));
    }
    assert_eq!(completion_mock.hits_async().await, 0);

    Ok(())
}

#[tokio::test]
async fn test_metrics_report_from_sample_data() -> Result<()> {
    let server = MockServer::start_async().await;
    let completion_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains("Always respond with valid JSON only");
            then.status(200).json_body(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"health_score\": 64}"}}]
            }));
        })
        .await;

    let client = OpenAiClient::new(&server.url("/v1"), "sk-test", "gpt-test", 5)?;
    let session = session_with(Some(client)).await?;

    let output = output_of(&session, "metrics").await;
    let (title, body) = output.split_once('\n').unwrap_or_default();
    let report: serde_json::Value = serde_json::from_str(body)?;

    assert_eq!(title, "📊 Getting dashboard metrics...");
    assert_eq!(report["metrics"]["total_parts"], 9);
    assert_eq!(report["metrics"]["total_contracts"], sample_data().await?.contracts.len());
    assert_eq!(report["metrics"]["top_expensive_parts"][0]["name"], "Axle Bearing");
    assert_eq!(report["ai_analysis"]["health_score"], 64);
    completion_mock.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn test_api_failure_prints_error_and_fallback() -> Result<()> {
    let server = MockServer::start_async().await;
    let completion_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(500).json_body(serde_json::json!({
                "error": {"message": "server exploded", "type": "server_error"}
            }));
        })
        .await;

    let client = OpenAiClient::new(&server.url("/v1"), "sk-test", "gpt-test", 5)?;
    let session = session_with(Some(client)).await?;

    let output = run_lines(&session, "costs\n").await?;

    assert!(output.contains(
        "❌ AI analysis failed: The AI service rejected the request (500): server exploded"
    ));
    assert!(output.contains("I understand you're asking about: Analyze the maintenance costs"));
    assert!(output.contains("Total maintenance cost: $1,329.80"));
    assert_eq!(completion_mock.hits_async().await, 1);

    Ok(())
}
