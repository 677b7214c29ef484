use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use docai_client::{modes, ClientCommand, ContextPatch, TriggerOptions, WaitOptions};
use docai_logging::{LogDestination, DEFAULT_LOG_FILE};
use log::LevelFilter;

use crate::config::DEFAULT_CONFIG_FILE;

/// Drive the docai add-on backend from the terminal.
#[derive(Parser, Debug)]
#[command(name = "docai", version, about = "Submit and follow docai processing tasks")]
pub struct Cli {
    /// RON configuration file; missing files fall back to defaults
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Backend base URL, overriding the config file
    #[arg(long, global = true, env = "DOCAI_BASE_URL")]
    pub base_url: Option<String>,

    /// Route prefix joined between base URL and endpoint paths
    #[arg(long, global = true)]
    pub api_prefix: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, global = true, env = "DOCAI_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    #[arg(long, global = true, value_enum, default_value_t = LogTarget::Terminal)]
    pub log: LogTarget,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Active document token, bypassing the host lookup
    #[arg(long, global = true)]
    pub doc_token: Option<String>,

    #[arg(long, global = true)]
    pub wiki_node_token: Option<String>,

    #[arg(long, global = true)]
    pub wiki_space_id: Option<String>,

    /// Login code to exchange for the user identity
    #[arg(long, global = true)]
    pub login_code: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Write a default config file
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Check the backend is reachable
    Ping,
    /// Submit a processing request with an explicit user id and print the task id
    Trigger {
        #[arg(long)]
        user_id: String,
        /// Unified document or wiki node token
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        mode: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        trigger_source: Option<String>,
    },
    /// Print one snapshot of a task
    Status { task_id: String },
    /// Poll a task until it finishes
    Wait {
        task_id: String,
        #[arg(long)]
        interval_ms: Option<u64>,
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Process the active document in the given mode
    Process {
        #[arg(long)]
        mode: String,
        #[arg(long)]
        content: Option<String>,
    },
    IdeaExpand {
        #[arg(long)]
        content: Option<String>,
    },
    Research {
        #[arg(long)]
        content: Option<String>,
    },
    /// Save content as a note next to the active document
    Save {
        #[arg(long)]
        content: String,
        #[arg(long)]
        title: Option<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

impl Cli {
    pub fn log_destination(&self) -> LogDestination {
        match self.log {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File(PathBuf::from(DEFAULT_LOG_FILE)),
            LogTarget::Both => LogDestination::Both(PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    /// Context overrides given on the command line. Unset flags leave the
    /// lazily resolved values alone.
    pub fn context_patch(&self) -> ContextPatch {
        ContextPatch {
            document_token: self.doc_token.clone(),
            wiki_node_token: self.wiki_node_token.clone(),
            wiki_space_id: self.wiki_space_id.clone(),
        }
    }
}

/// Map a subcommand onto the client command that serves it. `Init` is
/// handled locally and has none.
pub fn client_command(cli: &Cli, wait: WaitOptions) -> Option<ClientCommand> {
    let command = match cli.command.clone() {
        Command::Init { .. } => return None,
        Command::Ping => ClientCommand::Ping,
        Command::Trigger {
            user_id,
            token,
            mode,
            content,
            trigger_source,
        } => {
            let mut trigger = TriggerOptions::new(user_id);
            trigger.token = token;
            trigger.doc_token = cli.doc_token.clone();
            trigger.mode = mode;
            trigger.content = content;
            trigger.trigger_source = trigger_source;
            trigger.wiki_node_token = cli.wiki_node_token.clone();
            trigger.wiki_space_id = cli.wiki_space_id.clone();
            ClientCommand::Trigger(trigger)
        }
        Command::Status { task_id } => ClientCommand::GetTask { task_id },
        Command::Wait {
            task_id,
            interval_ms,
            timeout_ms,
        } => ClientCommand::WaitTask {
            task_id,
            wait: WaitOptions::new(
                interval_ms.map(Duration::from_millis).unwrap_or(wait.poll_interval),
                timeout_ms.map(Duration::from_millis).unwrap_or(wait.timeout),
            ),
        },
        Command::Process { mode, content } => ClientCommand::Process { mode, content },
        Command::IdeaExpand { content } => ClientCommand::Process {
            mode: modes::IDEA_EXPAND.to_string(),
            content,
        },
        Command::Research { content } => ClientCommand::Process {
            mode: modes::RESEARCH.to_string(),
            content,
        },
        Command::Save { content, title } => ClientCommand::Save { content, title },
    };
    Some(command)
}
