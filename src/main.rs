use clap::Parser;
use spareparts_agent::core::session::SessionEnd;
use spareparts_agent::core::{ConfigProvider, DataKind};
use spareparts_agent::utils::error::ErrorSeverity;
use spareparts_agent::utils::{logger, validation::Validate};
use spareparts_agent::{
    AgentError, CliConfig, DataLoader, LocalStorage, OpenAiClient, Session, SparePartsAgent,
};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting spareparts-agent CLI");

    if let Err(e) = run(cli).await {
        tracing::error!(
            "❌ spareparts-agent failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(cli: CliConfig) -> Result<(), AgentError> {
    let config = cli.into_agent_config()?;
    tracing::debug!("Resolved config: {:?}", config);

    // 驗證配置
    config.validate()?;

    println!("🤖 Initializing Spare Parts AI Agent...");

    let storage = LocalStorage::new(config.data_dir().to_string());
    let report = DataLoader::new(storage, config.allow_partial()).load().await?;

    for warning in &report.warnings {
        println!("⚠️ {}", warning);
    }
    for kind in DataKind::ALL {
        println!(
            "📁 Loaded {} {}",
            report.data.collection(kind).len(),
            kind.label()
        );
    }

    if config.has_credential() {
        tracing::info!("🔑 Using model {} at {}", config.model(), config.api_base());
    }
    let client = OpenAiClient::from_config(&config)?;

    let agent = SparePartsAgent::new(report.data, config.prompt_limits(), client)
        .with_generation(config.temperature(), config.max_tokens());
    println!("✅ Spare Parts AI Agent ready!");

    let session = Session::new(agent);
    let mut stdout = std::io::stdout();

    if config.script {
        session.run_script(&mut stdout).await
    } else {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        if session.run_interactive(stdin, &mut stdout).await? == SessionEnd::Interrupted {
            // 阻塞中的 stdin 讀取不會隨 runtime 結束
            std::process::exit(0);
        }
        Ok(())
    }
}
