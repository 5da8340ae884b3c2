use crate::core::agent::SparePartsAgent;
use crate::core::command::{Command, HELP_TEXT};
use crate::core::CompletionClient;
use crate::utils::error::Result;
use std::future::Future;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const PROMPT: &str = "🤖 AI> ";
pub const GOODBYE: &str = "👋 Goodbye!";
const RULE_WIDTH: usize = 50;

pub const SCRIPT_QUESTIONS: [&str; 4] = [
    "How is the overall system health?",
    "Which equipment needs immediate attention?",
    "What are the most expensive maintenance items?",
    "When should I schedule the next maintenance?",
];

/// 單行輸入的處理結果
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Output(String),
    Skip,
    Quit,
}

/// 互動模式結束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Quit,
    EndOfInput,
    Interrupted,
}

pub struct Session<C: CompletionClient> {
    agent: SparePartsAgent<C>,
}

impl<C: CompletionClient> Session<C> {
    pub fn new(agent: SparePartsAgent<C>) -> Self {
        Self { agent }
    }

    pub async fn handle_line(&self, line: &str) -> Step {
        match Command::parse(line) {
            Ok(None) => Step::Skip,
            Ok(Some(Command::Quit)) => Step::Quit,
            Ok(Some(command)) => Step::Output(self.execute(command).await),
            Err(e) => {
                tracing::debug!("Rejected input '{}': {}", line.trim(), e);
                Step::Output(format!("❌ Error: {}", e))
            }
        }
    }

    pub async fn execute(&self, command: Command) -> String {
        let agent = &self.agent;
        let (title, reply) = match command {
            Command::Help => return HELP_TEXT.to_string(),
            Command::Quit => return GOODBYE.to_string(),
            Command::Unknown(cmd) => {
                return format!(
                    "❌ Unknown command: {}\nType 'help' for available commands",
                    cmd
                )
            }
            Command::Metrics => (
                "📊 Getting dashboard metrics...".to_string(),
                agent.dashboard_metrics().await,
            ),
            Command::Insights => (
                "📊 Generating AI insights...".to_string(),
                agent.system_insights().await,
            ),
            Command::Alerts => (
                "🚨 Generating AI alerts...".to_string(),
                agent.maintenance_alerts().await,
            ),
            Command::Equipment(id) => (
                format!("🔍 AI Analysis of Equipment {}...", id),
                agent.equipment_health(id).await,
            ),
            Command::Parts {
                equipment_id,
                part_id,
            } => (
                format!(
                    "🔧 AI Prediction for Part {} on Equipment {}...",
                    part_id, equipment_id
                ),
                agent.part_replacement(equipment_id, part_id).await,
            ),
            Command::Chat(message) => ("💬 AI Response:".to_string(), agent.chat(&message).await),
            Command::Costs => (
                "💰 AI Cost Analysis...".to_string(),
                agent.cost_analysis().await,
            ),
            Command::Schedule(Some(id)) => (
                format!("📅 AI Maintenance Schedule for Equipment {}...", id),
                agent.maintenance_schedule(Some(id)).await,
            ),
            Command::Schedule(None) => (
                "📅 AI System-wide Maintenance Schedule...".to_string(),
                agent.maintenance_schedule(None).await,
            ),
            Command::Lifespan(part_id) => (
                format!("⏳ Lifespan estimate for Part {}...", part_id),
                agent.part_lifespan(part_id).await,
            ),
            Command::ReplacementPredictions => (
                "📈 Replacement predictions...".to_string(),
                agent.replacement_predictions(),
            ),
            Command::DueChecks => (
                "🔔 Parts due for a check...".to_string(),
                agent.due_part_checks(),
            ),
        };

        format!("{}\n{}", title, reply.render())
    }

    /// 互動模式：quit/exit/q、輸入結束或 Ctrl-C 時離開
    pub async fn run_interactive<R, W>(&self, reader: R, out: &mut W) -> Result<SessionEnd>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("⚠️ Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        };
        self.run_interactive_until(reader, out, ctrl_c).await
    }

    /// shutdown 完成時立即結束，不等待下一行輸入
    pub async fn run_interactive_until<R, W, S>(
        &self,
        reader: R,
        out: &mut W,
        shutdown: S,
    ) -> Result<SessionEnd>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
        S: Future<Output = ()>,
    {
        writeln!(out, "\n🤖 Spare Parts AI Agent CLI")?;
        writeln!(out, "Type 'help' for available commands")?;
        writeln!(out, "Type 'quit' to exit")?;
        if !self.agent.has_client() {
            writeln!(
                out,
                "💡 Set OPENAI_API_KEY environment variable for full AI capabilities"
            )?;
        }

        tokio::pin!(shutdown);
        let mut lines = reader.lines();
        loop {
            write!(out, "\n{}", PROMPT)?;
            out.flush()?;

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = &mut shutdown => {
                    tracing::debug!("Interrupted");
                    writeln!(out, "\n{}", GOODBYE)?;
                    out.flush()?;
                    return Ok(SessionEnd::Interrupted);
                }
            };

            let Some(line) = line else {
                writeln!(out, "\n{}", GOODBYE)?;
                return Ok(SessionEnd::EndOfInput);
            };

            match self.handle_line(&line).await {
                Step::Skip => continue,
                Step::Quit => {
                    writeln!(out, "{}", GOODBYE)?;
                    return Ok(SessionEnd::Quit);
                }
                Step::Output(text) => writeln!(out, "\n{}", text)?,
            }
        }
    }

    /// 固定展示流程
    pub async fn run_script<W: Write>(&self, out: &mut W) -> Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        let agent = &self.agent;

        writeln!(out, "🤖 Running Spare Parts AI Agent script...")?;
        writeln!(out, "{}", rule)?;

        writeln!(out, "\n📊 System Insights...")?;
        writeln!(out, "{}", agent.system_insights().await.render())?;
        writeln!(out, "\n{}", rule)?;

        writeln!(out, "\n🚨 Maintenance Alerts...")?;
        writeln!(out, "{}", agent.maintenance_alerts().await.render())?;
        writeln!(out, "\n{}", rule)?;

        writeln!(out, "\n🔍 Equipment Analysis...")?;
        match agent.data().equipment.first().and_then(|e| e.int("ID")) {
            Some(id) => writeln!(out, "{}", agent.equipment_health(id).await.render())?,
            None => writeln!(out, "No equipment records to analyze.")?,
        }
        writeln!(out, "\n{}", rule)?;

        writeln!(out, "\n💬 AI Chat...")?;
        for question in SCRIPT_QUESTIONS {
            writeln!(out, "\nQ: {}", question)?;
            writeln!(out, "A: {}", agent.chat(question).await.render())?;
        }

        writeln!(out, "\n✅ Spare Parts AI Agent script completed!")?;
        out.flush()?;
        Ok(())
    }
}
