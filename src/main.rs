//! Falcon Chat — entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Init logger once (CLI `-v` flags > `RUST_LOG` > config)
//!   4. Build LLM provider and router (fatal on failure)
//!   5. Load long-term memory into a fresh session
//!   6. Spawn Ctrl-C → shutdown signal watcher
//!   7. Run the console channel until EOF, `/quit`, or shutdown

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use falcon_chat::config;
use falcon_chat::error::AppError;
use falcon_chat::llm::providers;
use falcon_chat::logger;
use falcon_chat::memory::{LongTermMemory, ShortTermHistory};
use falcon_chat::router::Router;
use falcon_chat::session::Session;

#[cfg(feature = "channel-pty")]
use falcon_chat::comms::{Channel, pty::PtyChannel};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present; the file is optional.
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let config = config::load(args.config_path.as_deref())?;

    let filter_source = logger::init(args.log_level, &config.log_level)?;

    info!(
        ?filter_source,
        bot_name = %config.bot_name,
        work_dir = %config.work_dir.display(),
        provider = %config.llm.provider,
        web_search = config.router.capabilities.web_search,
        "config loaded"
    );

    let llm = providers::build(&config.llm, config.llm_api_key.clone())
        .map_err(|e| AppError::Provider(e.to_string()))?;
    let router = Arc::new(Router::from_config(&config.router, llm)?);

    let session = Session::new(
        ShortTermHistory::new(config.memory.history_cap),
        LongTermMemory::load(config.memory.long_term_file.clone())?,
    );

    // Ctrl-C handler: cancels the token so the console loop exits and saves.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received — initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    #[cfg(feature = "channel-pty")]
    {
        let channel: Box<dyn Channel> =
            Box::new(PtyChannel::new("pty0", config.bot_name.clone(), router, session));
        info!(channel_id = channel.id(), "starting channel");
        channel.run(shutdown).await?;
    }

    #[cfg(not(feature = "channel-pty"))]
    {
        let _ = (router, session, shutdown);
        info!("no comms channels compiled in — exiting");
    }

    Ok(())
}

struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut config_path = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: falcon-chat [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "-f" | "--config" => {
                if let Some(path) = iter.next() {
                    config_path = Some(path);
                } else {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    //   -v      → warn
    //   -vv     → info
    //   -vvv    → debug  (routing decisions)
    //   -vvvv+  → trace  (full LLM payloads)
    let log_level = match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    };

    CliArgs { log_level, config_path }
}
