use crate::utils::error::{AgentError, Result};

pub const HELP_TEXT: &str = "\
🤖 Spare Parts AI Agent - Command Line Interface

Available Commands:
  help, h                         - Show this help message
  metrics, m                      - Dashboard metrics as JSON
  insights, i                     - AI-generated system insights
  alerts, a                       - AI-generated maintenance alerts
  equipment <id>, e <id>          - AI analysis of specific equipment
  parts <equipment_id> <part_id>  - AI prediction for part replacement
  chat <message>                  - Ask anything about the maintenance data
  costs, c                        - AI analysis of maintenance costs
  schedule [equipment_id]         - AI maintenance scheduling
  lifespan <part_id>              - Estimated part lifespan in months
  predict                         - Replacement predictions from history
  due                             - Parts due for a check
  quit, q, exit                   - Exit the application

Examples:
  equipment 1                     - Analysis of equipment 1
  chat Which equipment needs maintenance?
  parts 1 4079                    - Prediction for part 4079 on equipment 1
  schedule                        - System-wide maintenance scheduling";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Metrics,
    Insights,
    Alerts,
    Equipment(i64),
    Parts { equipment_id: i64, part_id: i64 },
    Chat(String),
    Costs,
    Schedule(Option<i64>),
    Lifespan(i64),
    ReplacementPredictions,
    DueChecks,
    Quit,
    Unknown(String),
}

impl Command {
    /// 空白行回傳 `Ok(None)`；參數錯誤回傳 `AgentError::UsageError`
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let mut tokens = line.split_whitespace();
        let Some(first) = tokens.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = tokens.collect();

        let command = match first.to_lowercase().as_str() {
            "help" | "h" => Command::Help,
            "metrics" | "m" => Command::Metrics,
            "insights" | "i" => Command::Insights,
            "alerts" | "a" => Command::Alerts,
            "equipment" | "e" => {
                let raw = args
                    .first()
                    .ok_or_else(|| AgentError::usage("Please provide equipment ID"))?;
                Command::Equipment(parse_id(raw, "Please provide a valid equipment ID")?)
            }
            "parts" => {
                if args.len() < 2 {
                    return Err(AgentError::usage("Please provide equipment ID and part ID"));
                }
                let invalid = "Please provide valid equipment ID and part ID";
                Command::Parts {
                    equipment_id: parse_id(args[0], invalid)?,
                    part_id: parse_id(args[1], invalid)?,
                }
            }
            "chat" => {
                if args.is_empty() {
                    return Err(AgentError::usage("Please provide a message"));
                }
                Command::Chat(args.join(" "))
            }
            "costs" | "c" => Command::Costs,
            "schedule" => match args.first() {
                Some(raw) => Command::Schedule(Some(parse_id(
                    raw,
                    "Please provide a valid equipment ID",
                )?)),
                None => Command::Schedule(None),
            },
            "lifespan" => {
                let raw = args
                    .first()
                    .ok_or_else(|| AgentError::usage("Please provide part ID"))?;
                Command::Lifespan(parse_id(raw, "Please provide a valid part ID")?)
            }
            "predict" | "reppred" => Command::ReplacementPredictions,
            "due" | "duechecks" => Command::DueChecks,
            "quit" | "q" | "exit" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        };

        Ok(Some(command))
    }
}

fn parse_id(raw: &str, message: &str) -> Result<i64> {
    raw.parse::<i64>().map_err(|_| AgentError::usage(message))
}
