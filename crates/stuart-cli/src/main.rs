//! stuart CLI: Command-line interface for the stuart conversational client

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stuart_engine::config::{default_path, CONFIG_DIR};
use stuart_engine::{
    create_session, fetch_snapshot, heartbeat, Backend, Config, Entry, HttpBackend,
    SessionAddress,
};
use stuart_tui::TuiOptions;

/// Terminal client for a polling question-and-answer session
#[derive(Parser)]
#[command(name = "stuart")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: .stuart/config.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the TUI (default when no command specified)
    Tui {
        /// Session address to join instead of creating a new session
        #[arg(long)]
        url: Option<String>,
    },

    /// Create a session and print its address
    New {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the state and transcript of a session
    State {
        /// Session address, including the uuid parameter
        #[arg(long)]
        url: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the backend heartbeat once
    Heartbeat {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a default .stuart/config.json
    Init,
}

const LOG_FILE: &str = "stuart.log";

type CmdResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => fail(&format!("cannot read current directory: {e}")),
    };

    let command = cli.command.unwrap_or(Commands::Tui { url: None });

    if matches!(command, Commands::Init) {
        if let Err(e) = cmd_init(cli.config.as_deref(), &cwd) {
            fail(&e.to_string());
        }
        return;
    }

    let config = match Config::discover(cli.config.as_deref(), &cwd) {
        Ok(config) => config,
        Err(e) => fail(&e.to_string()),
    };

    let to_file = matches!(command, Commands::Tui { .. });
    if let Err(e) = init_logging(&cwd, to_file) {
        eprintln!("Warning: logging disabled: {e}");
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => fail(&format!("cannot start tokio runtime: {e}")),
    };

    let result = rt.block_on(async {
        match command {
            Commands::Tui { url } => {
                stuart_tui::run_tui(TuiOptions {
                    address: url,
                    config,
                })
                .await
            }
            Commands::New { json } => cmd_new(&config, json).await,
            Commands::State { url, json } => cmd_state(&config, &url, json).await,
            Commands::Heartbeat { json } => cmd_heartbeat(&config, json).await,
            Commands::Init => Ok(()),
        }
    });

    if let Err(e) = result {
        fail(&e.to_string());
    }
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {message}");
    std::process::exit(1);
}

/// Log to `.stuart/stuart.log` while the TUI owns the terminal, else to
/// stderr. `RUST_LOG` overrides the default filter.
fn init_logging(cwd: &Path, to_file: bool) -> Result<(), std::io::Error> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stuart=info".into());

    if to_file {
        let dir = cwd.join(CONFIG_DIR);
        std::fs::create_dir_all(&dir)?;
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(LOG_FILE))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(log_file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn backend_at(
    config: &Config,
    address: Option<&SessionAddress>,
) -> Result<Arc<dyn Backend>, Box<dyn std::error::Error>> {
    let root = match address {
        Some(address) => address.root(),
        None => config.base_url()?,
    };
    Ok(Arc::new(HttpBackend::new(root, config.connect_timeout())?))
}

async fn cmd_new(config: &Config, json: bool) -> CmdResult {
    let backend = backend_at(config, None)?;
    let address = create_session(backend.as_ref()).await?;

    if json {
        let value = serde_json::json!({
            "address": address.to_string(),
            "uuid": address.token().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{address}");
    }
    Ok(())
}

async fn cmd_state(config: &Config, url: &str, json: bool) -> CmdResult {
    let address = SessionAddress::resolve(url)?;
    let backend = backend_at(config, Some(&address))?;
    let snapshot = fetch_snapshot(backend.as_ref(), address.token()).await?;

    if json {
        let entries: Vec<serde_json::Value> = snapshot
            .conversation
            .entries()
            .iter()
            .map(|entry| match entry {
                Entry::Question(text) => serde_json::json!({ "question": text }),
                Entry::Answer { text, source } => {
                    serde_json::json!({ "answer": text, "source": source })
                }
            })
            .collect();
        let value = serde_json::json!({
            "uuid": address.token().to_string(),
            "state": snapshot.raw_state,
            "recognized": snapshot.state.is_some(),
            "conversation": entries,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let state = snapshot.raw_state.as_deref().unwrap_or("(none)");
    match snapshot.state {
        Some(_) => println!("Session {}: {state}\n", address.token()),
        None => println!("Session {}: {state} (unrecognized)\n", address.token()),
    }

    if snapshot.conversation.is_empty() {
        println!("No questions yet.");
        return Ok(());
    }
    for entry in snapshot.conversation.entries() {
        match entry {
            Entry::Question(text) => println!("Q: {text}"),
            Entry::Answer { text, source } => {
                println!("A: {text}");
                if !source.is_empty() {
                    println!("   src: {source}");
                }
                println!();
            }
        }
    }
    if let Some(question) = snapshot.conversation.pending_question() {
        println!("(awaiting an answer to: {question})");
    }
    Ok(())
}

async fn cmd_heartbeat(config: &Config, json: bool) -> CmdResult {
    let backend = backend_at(config, None)?;
    let down_after = config.timings().heartbeat_down_after;
    let reading = heartbeat::check(backend.as_ref(), down_after).await;

    if json {
        let value = serde_json::json!({
            "liveness": reading.liveness.label(),
            "age_secs": reading.age_secs,
            "checked_at": reading.checked_at.to_rfc3339(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match reading.age_secs {
        Some(age) => println!("Backend {} (last beat {age:.1}s ago)", reading.liveness),
        None => println!("Backend {}", reading.liveness),
    }
    Ok(())
}

fn cmd_init(path: Option<&Path>, cwd: &Path) -> CmdResult {
    let config_path = path.map_or_else(|| default_path(cwd), Path::to_path_buf);

    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return Ok(());
    }

    Config::default().save(&config_path)?;
    println!("Created {}", config_path.display());
    println!("Edit base_url to point at your backend.");
    Ok(())
}
