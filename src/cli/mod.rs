use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(alias = "google")]
    Gemini,
}

#[derive(Parser, Debug)]
#[command(name = "vibe_sitegen", version, about = "Chat with Gemini to generate self-contained HTML websites")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// TOML config file; flags override its values.
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[arg(long, global = true)]
    pub out_dir: Option<String>,

    #[arg(long, value_enum, global = true)]
    pub provider: Option<ProviderKind>,

    #[arg(long, global = true)]
    pub model: Option<String>,

    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Stored before the session starts. Falls back to GEMINI_API_KEY.
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Keep the API key in memory only.
    #[arg(long, global = true, default_value_t = false)]
    pub no_persist: bool,

    #[arg(long, global = true, default_value_t = false)]
    pub save_request: bool,

    #[arg(long, global = true, default_value_t = false)]
    pub save_response: bool,

    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive chat (default).
    Chat,
    /// Generate one website and write it to the output directory.
    Generate {
        instruction: String,
    },
    /// Manage the stored API key.
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Set { key: String },
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_is_implied_when_no_subcommand_is_given() {
        let args = Args::parse_from(["vibe_sitegen", "--debug"]);
        assert!(args.command.is_none());
        assert!(args.debug);
    }

    #[test]
    fn global_flags_work_after_the_subcommand() {
        let args = Args::parse_from(["vibe_sitegen", "generate", "a bakery site", "--out-dir", "out"]);
        assert_eq!(
            args.command,
            Some(Command::Generate { instruction: "a bakery site".into() })
        );
        assert_eq!(args.out_dir.as_deref(), Some("out"));
    }

    #[test]
    fn key_set_parses() {
        let args = Args::parse_from(["vibe_sitegen", "key", "set", "AIzaSyEXAMPLEKEY"]);
        assert_eq!(
            args.command,
            Some(Command::Key { action: KeyAction::Set { key: "AIzaSyEXAMPLEKEY".into() } })
        );
    }
}
