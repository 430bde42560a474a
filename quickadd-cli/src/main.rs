use anyhow::Result;
use clap::{Parser, Subcommand};
use quickadd_core::{Folder, RawMessage};
use quickadd_ingest::{Normalized, normalize};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod file_store;
mod gateway;
mod messages_cmd;
mod state;
mod watch_cmd;

#[derive(Parser, Debug)]
#[command(
    name = "quickadd",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("QUICKADD_BUILD_SHA"), ")"),
    about = "Detect expenses in incoming SMS and open a prefilled quick-add"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the amount/keyword signals for one message body
    Classify {
        #[arg(long)]
        body: String,

        /// Print signals as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run one detection pass over the message store
    Scan {
        /// Message store (.jsonl or .csv); defaults to ~/.quickadd/messages.jsonl
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Watch the message store and prompt for each new expense
    Watch {
        #[arg(long)]
        store: Option<PathBuf>,

        /// How often to check the store for changes
        #[arg(long, default_value_t = 2)]
        interval_secs: u64,
    },

    /// Replay a JSONL log of notifications through one detector
    Replay {
        #[arg(long)]
        events: PathBuf,

        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// List recent messages from one folder
    Recent {
        #[arg(long)]
        store: Option<PathBuf>,

        #[arg(long, default_value_t = 50)]
        limit: usize,

        #[arg(long, default_value_t = 7)]
        days_back: i64,

        /// inbox, sent, draft or all
        #[arg(long, default_value = "inbox")]
        folder: Folder,
    },

    /// Print every message in inbox, sent and draft with folder totals
    Dump {
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Manage ~/.quickadd/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config.toml
    Init,

    /// Print the effective configuration
    Check,
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;
    init_tracing(&cfg.display.log_level);

    match cli.command {
        Command::Classify { body, json } => classify(&body, json)?,

        Command::Scan { store } => watch_cmd::scan(&cfg, store)?,

        Command::Watch {
            store,
            interval_secs,
        } => watch_cmd::watch(&cfg, store, interval_secs).await?,

        Command::Replay { events, store } => watch_cmd::replay(&cfg, &events, store)?,

        Command::Recent {
            store,
            limit,
            days_back,
            folder,
        } => messages_cmd::recent(&cfg, store, folder, limit, days_back)?,

        Command::Dump { store } => messages_cmd::dump(&cfg, store)?,

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Check => config::config_check()?,
        },
    }

    Ok(())
}

fn classify(body: &str, json: bool) -> Result<()> {
    let signals = quickadd_dispatch::classify_and_extract(body);

    if json {
        println!("{}", serde_json::to_string_pretty(&signals)?);
        return Ok(());
    }

    match signals.amount {
        Some(a) => println!(
            "amount: ₹{a} (rule: {})",
            signals.rule.map(|r| r.name()).unwrap_or("-")
        ),
        None => println!("amount: none"),
    }
    println!(
        "expense-like: {} (keyword: {})",
        signals.is_expense_like,
        signals.keyword.unwrap_or("-")
    );

    let decision = match normalize(&RawMessage::inbox("", body, 0)) {
        Normalized::Accepted(_) => "accept".to_string(),
        Normalized::Rejected(r) => format!("reject ({})", r.describe()),
    };
    println!("decision: {decision}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_long_version_carries_build_id() {
        let build_id = env!("QUICKADD_BUILD_SHA");
        assert!(!build_id.is_empty());
        let long = Cli::command().render_long_version();
        assert!(long.contains(build_id), "{long}");
        assert!(long.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_recent_accepts_large_days_back() {
        let cli = Cli::try_parse_from(["quickadd", "recent", "--days-back", "1000000000", "--folder", "sms"])
            .unwrap();
        match cli.command {
            Command::Recent { days_back, folder, .. } => {
                assert_eq!(days_back, 1_000_000_000);
                assert_eq!(folder, Folder::All);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
