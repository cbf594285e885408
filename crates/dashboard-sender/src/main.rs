//! Dashboard sender: entry point.
//!
//! A headless sender that drives one dashboard session from the terminal.
//! It connects to an in-process loopback device, launches the dashboard page
//! on it, and then shows every typed line on the dashboard.
//!
//! # Usage
//!
//! ```text
//! dashboard-sender [OPTIONS]
//!
//! Options:
//!   --config <PATH>        Config file [default: platform config dir]
//!   --user <NAME>          Display name (overrides [identity] user)
//!   --device-name <NAME>   Name of the loopback device [default: Loopback TV]
//!   --log-level <LEVEL>    Log level when RUST_LOG is unset
//!   --refuse-connect       Make the loopback device refuse connections
//!   --fail-launch          Make the loopback device refuse the launch
//! ```
//!
//! # Commands
//!
//! | Input       | Effect                                      |
//! |-------------|---------------------------------------------|
//! | `/select`   | (Re-)select the device                      |
//! | `/leave`    | Drop the device selection                   |
//! | `/stop`     | Stop the dashboard application              |
//! | `/drop`     | Simulate the page disconnecting on its own  |
//! | `/quit`     | Leave and exit                              |
//! | other text  | Show it on the dashboard                    |

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use dashboard_core::Device;
use dashboard_sender::application::identity::LocalIdentity;
use dashboard_sender::application::session_manager::{
    SessionManager, SessionSettings, SessionUpdate,
};
use dashboard_sender::application::transport::{session_queue, SessionTransport};
use dashboard_sender::infrastructure::session_actor::{SessionActor, SessionTimeouts};
use dashboard_sender::infrastructure::storage::config::{
    config_file_path, load_config_from, save_config_to, AppConfig,
};
use dashboard_sender::infrastructure::transport::loopback::{LoopbackOptions, LoopbackTransport};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Dashboard sender.
#[derive(Debug, Parser)]
#[command(
    name = "dashboard-sender",
    about = "Shows user-attributed text on a companion dashboard display",
    version
)]
struct Cli {
    /// Path of the TOML config file.
    #[arg(long, env = "DASHBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Display name.  Takes precedence over `[identity] user`.
    #[arg(long, env = "DASHBOARD_USER")]
    user: Option<String>,

    /// Name of the loopback device to connect to.
    #[arg(long, default_value = "Loopback TV")]
    device_name: String,

    /// Log level used when `RUST_LOG` is unset.  Defaults to `[sender] log_level`.
    #[arg(long, env = "DASHBOARD_LOG_LEVEL")]
    log_level: Option<String>,

    /// Make the loopback device refuse every connection.
    #[arg(long)]
    refuse_connect: bool,

    /// Make the loopback device refuse to launch the dashboard.
    #[arg(long)]
    fail_launch: bool,
}

/// One line of terminal input.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Select,
    Leave,
    Stop,
    Drop,
    Quit,
    Say(String),
    Empty,
}

impl Command {
    fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Command::Empty,
            "/select" => Command::Select,
            "/leave" => Command::Leave,
            "/stop" => Command::Stop,
            "/drop" => Command::Drop,
            "/quit" => Command::Quit,
            text => Command::Say(text.to_string()),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => config_file_path().context("locating the config file")?,
    };
    let mut config = load_config_from(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    // ── Logging setup ─────────────────────────────────────────────────────────
    //
    // `RUST_LOG` wins; otherwise --log-level, otherwise the config file.
    let fallback_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.sender.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_level)),
        )
        .init();

    info!("dashboard sender starting (config: {})", config_path.display());

    // ── Identity ──────────────────────────────────────────────────────────────
    let mut identity = LocalIdentity::new(cli.user.clone().or_else(|| config.identity.user.clone()));
    let user = identity.current_user().to_string();
    if identity.was_generated() {
        persist_generated_user(&mut config, &config_path, &user);
    }
    info!("participating as {user}");

    // ── Session wiring ────────────────────────────────────────────────────────
    let (events_tx, events_rx) = session_queue();
    let loopback = Arc::new(LoopbackTransport::new(
        events_tx.clone(),
        LoopbackOptions {
            refuse_connect: cli.refuse_connect,
            fail_launch: cli.fail_launch,
            application_id: config.session.application_id.clone(),
        },
    ));
    let transport: Arc<dyn SessionTransport> = loopback.clone();
    let (manager, mut updates) =
        SessionManager::new(transport, SessionSettings::from(&config), identity);
    let (actor, handle) =
        SessionActor::new(manager, events_tx, events_rx, SessionTimeouts::from(&config));
    let actor_task = tokio::spawn(actor.run());

    tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            report(update);
        }
    });

    let device = Device::new(Uuid::new_v4(), cli.device_name.clone());
    handle.select_device(Some(device.clone())).await?;

    // ── Input loop ────────────────────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("reading stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("received Ctrl+C");
                None
            }
        };
        let Some(line) = line else { break };

        match Command::parse(&line) {
            Command::Empty => {}
            Command::Select => handle.select_device(Some(device.clone())).await?,
            Command::Leave => handle.select_device(None).await?,
            Command::Stop => handle.stop_application().await?,
            Command::Drop => loopback.simulate_remote_disconnect(0),
            Command::Quit => break,
            Command::Say(text) => handle.send_info(text).await?,
        }
    }

    handle.shutdown().await?;
    let manager = actor_task.await.context("session actor panicked")?;
    info!(
        "dashboard sender stopped ({} feed lines, final state {})",
        manager.feed().len(),
        manager.current_state()
    );
    Ok(())
}

/// Saves a freshly generated guest name so the next run reuses it.
fn persist_generated_user(config: &mut AppConfig, path: &std::path::Path, user: &str) {
    config.identity.user = Some(user.to_string());
    if let Err(e) = save_config_to(config, path) {
        warn!("could not save generated user name: {e}");
    }
}

/// Prints one session update for the terminal user.
fn report(update: SessionUpdate) {
    match update {
        SessionUpdate::StateChanged(state) => info!("session {state}"),
        SessionUpdate::Failed(e) => error!("{e}"),
        SessionUpdate::RouteReset => info!("no device selected; type /select to retry"),
        SessionUpdate::FeedLine(line) => println!("{line}"),
        SessionUpdate::NotReady => warn!("not connected"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
