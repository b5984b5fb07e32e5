use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};

use belanja_core::session::SessionStore;
use belanja_sheets::{BelanjaStore, JsonlStore, MemStore};

mod broadcast;
mod config;
mod input_bot;
mod report_bot;
mod server;
mod telegram;

use config::Config;
use input_bot::InputBot;
use report_bot::ReportBot;
use server::AppState;
use telegram::TelegramClient;

#[derive(Parser, Debug)]
#[command(name = "belanja", version, about = "Telegram expense tracking bots")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the webhook server and the report scheduler
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Write a default ~/.belanja/config.toml
    InitConfig,

    /// Register both bots' webhooks with Telegram
    SetWebhook,

    /// Print a report for one user to stdout
    Report {
        #[arg(long)]
        user_id: i64,

        /// daily, weekly, monthly or analysis
        #[arg(long, default_value = "daily")]
        kind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port } => serve(port).await?,
        Command::InitConfig => config::init_config()?,
        Command::SetWebhook => set_webhooks().await?,
        Command::Report { user_id, kind } => print_report(user_id, &kind).await?,
    }

    Ok(())
}

async fn open_store(cfg: &Config) -> Result<Arc<dyn BelanjaStore>> {
    match cfg.storage.backend.as_str() {
        "memory" => Ok(Arc::new(MemStore::new())),
        "jsonl" => {
            let dir = match &cfg.storage.data_dir {
                Some(dir) => dir.clone(),
                None => config::ensure_belanja_home()?.join("data"),
            };
            Ok(Arc::new(JsonlStore::open(dir)?))
        }
        #[cfg(feature = "gsheets")]
        "sheets" => {
            let sheet_id = cfg
                .storage
                .sheet_id
                .as_deref()
                .context("storage.sheet_id is required for the sheets backend")?;
            let key_path = cfg
                .storage
                .service_account_key
                .as_deref()
                .context("storage.service_account_key is required for the sheets backend")?;
            Ok(Arc::new(
                belanja_sheets::SheetsStore::connect(sheet_id, key_path).await?,
            ))
        }
        #[cfg(not(feature = "gsheets"))]
        "sheets" => bail!("this build has no Google Sheets support (enable the gsheets feature)"),
        other => bail!("unknown storage backend: {other}"),
    }
}

fn require_tokens(cfg: &Config) -> Result<()> {
    if cfg.telegram.input_bot_token.is_empty() || cfg.telegram.report_bot_token.is_empty() {
        bail!(
            "bot tokens are not configured; edit {} or set BELANJA_INPUT_TOKEN / BELANJA_REPORT_TOKEN",
            config::config_path()?.display()
        );
    }
    Ok(())
}

async fn serve(port: Option<u16>) -> Result<()> {
    let cfg = config::load_config()?;
    require_tokens(&cfg)?;
    let tz = belanja_core::time::parse_tz(&cfg.report.timezone)?;
    let store = open_store(&cfg).await?;

    let input_client = TelegramClient::new(cfg.telegram.input_bot_token.clone());
    let report_client = TelegramClient::new(cfg.telegram.report_bot_token.clone());

    if let Some(domain) = &cfg.telegram.webhook_domain {
        register_webhooks(&input_client, &report_client, domain).await?;
    }

    let sessions = Arc::new(SessionStore::new());
    let state = AppState {
        input_bot: Arc::new(InputBot::new(store.clone(), sessions, tz)),
        report_bot: Arc::new(ReportBot::new(store.clone(), tz)),
        input_client,
        report_client: report_client.clone(),
        store: store.clone(),
        tz,
    };

    tokio::spawn(broadcast::run_scheduler(report_client, store, tz));

    server::serve(state, port.unwrap_or(cfg.server.port)).await
}

async fn register_webhooks(
    input_client: &TelegramClient,
    report_client: &TelegramClient,
    domain: &str,
) -> Result<()> {
    let domain = domain.trim_end_matches('/');
    input_client
        .set_webhook(&format!("{domain}/webhook/bot1"))
        .await
        .context("registering bot1 webhook")?;
    report_client
        .set_webhook(&format!("{domain}/webhook/bot2"))
        .await
        .context("registering bot2 webhook")?;
    tracing::info!(domain, "webhooks registered");
    Ok(())
}

async fn set_webhooks() -> Result<()> {
    let cfg = config::load_config()?;
    require_tokens(&cfg)?;
    let domain = cfg
        .telegram
        .webhook_domain
        .as_deref()
        .context("telegram.webhook_domain is not configured")?;
    let input_client = TelegramClient::new(cfg.telegram.input_bot_token.clone());
    let report_client = TelegramClient::new(cfg.telegram.report_bot_token.clone());
    register_webhooks(&input_client, &report_client, domain).await
}

async fn print_report(user_id: i64, kind: &str) -> Result<()> {
    let cfg = config::load_config()?;
    let tz = belanja_core::time::parse_tz(&cfg.report.timezone)?;
    let store = open_store(&cfg).await?;
    let reports = ReportBot::new(store, tz);

    let now = Utc::now();
    let text = match kind {
        "daily" => reports.daily(user_id, now).await?,
        "weekly" => reports.weekly(user_id, now).await?,
        "monthly" => reports.monthly(user_id, now).await?,
        "analysis" => reports.analysis(user_id, now).await?,
        other => bail!("unknown report kind: {other} (expected daily, weekly, monthly or analysis)"),
    };
    println!("{text}");
    Ok(())
}
