//! HTTP surface: the two Telegram webhooks, cron trigger endpoints for
//! platforms without a resident scheduler, and status/health probes.
//!
//! Webhook handlers always answer 200. Telegram retries deliveries
//! that fail, and a poison update that keeps erroring would wedge the
//! whole queue.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use chrono::Utc;
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::{Value, json};

use belanja_core::machine::Inbound;
use belanja_core::record::UserInfo;
use belanja_sheets::BelanjaStore;

use crate::broadcast::{ReportKind, send_broadcast};
use crate::input_bot::InputBot;
use crate::report_bot::ReportBot;
use crate::telegram::{Message, TelegramClient, TgUser, Update};

#[derive(Clone)]
pub struct AppState {
    pub input_bot: Arc<InputBot>,
    pub report_bot: Arc<ReportBot>,
    pub input_client: TelegramClient,
    pub report_client: TelegramClient,
    pub store: Arc<dyn BelanjaStore>,
    pub tz: Tz,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/webhook/bot1", post(webhook_bot1))
        .route("/webhook/bot2", post(webhook_bot2))
        .route("/api/cron/daily", get(cron_daily))
        .route("/api/cron/weekly", get(cron_weekly))
        .route("/api/cron/monthly", get(cron_monthly))
        .with_state(state)
}

pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let router = build_router(state);
    tracing::info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "Bot Tracking Belanja is running!",
        "timestamp": Utc::now().with_timezone(&state.tz).format("%d/%m/%Y %H:%M:%S").to_string(),
        "bots": {
            "bot1": "LaporBelanjaBot - Input Bot",
            "bot2": "LaporanBelanjaBot - Report Bot"
        }
    }))
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    // Probing the store is the part that can actually break.
    match state.store.all_users().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "timestamp": Utc::now().with_timezone(&state.tz).format("%d/%m/%Y %H:%M:%S").to_string(),
                "storage": "connected",
                "bots": "active"
            })),
        ),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "unhealthy",
                "error": err.to_string()
            })),
        ),
    }
}

fn user_info(from: &TgUser) -> UserInfo {
    UserInfo {
        id: from.id,
        username: from.username.clone(),
        first_name: from.first_name.clone(),
        last_name: from.last_name.clone(),
    }
}

fn parse_update(raw: Value) -> Option<(Message, UserInfo)> {
    let update: Update = match serde_json::from_value(raw) {
        Ok(u) => u,
        Err(err) => {
            tracing::warn!(error = %err, "unparseable webhook update");
            return None;
        }
    };
    let message = update.message?;
    let user = user_info(message.from.as_ref()?);
    Some((message, user))
}

/// Turn a non-command message into a conversation event.
async fn inbound_event(client: &TelegramClient, msg: &Message) -> Option<Inbound> {
    if let Some(loc) = &msg.location {
        return Some(Inbound::Location {
            latitude: loc.latitude,
            longitude: loc.longitude,
        });
    }
    if let Some(photo) = msg.best_photo() {
        match client.file_url(&photo.file_id).await {
            Ok(file_url) => return Some(Inbound::Photo { file_url }),
            Err(err) => {
                tracing::error!(error = %err, "photo file lookup failed");
                return None;
            }
        }
    }
    msg.text.clone().map(Inbound::Text)
}

async fn webhook_bot1(State(state): State<AppState>, Json(raw): Json<Value>) -> StatusCode {
    let Some((msg, user)) = parse_update(raw) else {
        return StatusCode::OK;
    };
    let chat_id = msg.chat.id;
    let now = Utc::now();

    let replies = match msg.text.as_deref().filter(|t| t.starts_with('/')) {
        Some(command) => match state.input_bot.handle_command(&user, chat_id, command, now).await {
            Ok(replies) => replies,
            Err(err) => {
                tracing::error!(chat_id, command, error = %err, "command failed");
                Vec::new()
            }
        },
        None => match inbound_event(&state.input_client, &msg).await {
            Some(event) => state.input_bot.handle_event(&user, chat_id, event, now).await,
            None => Vec::new(),
        },
    };

    for reply in replies {
        if let Err(err) = state.input_client.send_message(chat_id, &reply).await {
            tracing::error!(chat_id, error = %err, "reply send failed");
        }
    }
    StatusCode::OK
}

async fn webhook_bot2(State(state): State<AppState>, Json(raw): Json<Value>) -> StatusCode {
    let Some((msg, user)) = parse_update(raw) else {
        return StatusCode::OK;
    };
    let chat_id = msg.chat.id;

    let replies = match msg.text.as_deref().filter(|t| t.starts_with('/')) {
        Some(command) => match state.report_bot.handle_command(&user, command, Utc::now()).await {
            Ok(replies) => replies,
            Err(err) => {
                tracing::error!(chat_id, command, error = %err, "report command failed");
                Vec::new()
            }
        },
        // The report bot only speaks commands.
        None => Vec::new(),
    };

    for reply in replies {
        if let Err(err) = state.report_client.send_message(chat_id, &reply).await {
            tracing::error!(chat_id, error = %err, "reply send failed");
        }
    }
    StatusCode::OK
}

#[derive(Debug, Serialize)]
struct CronResponse {
    success: bool,
    message: String,
}

async fn run_cron(state: &AppState, kind: ReportKind, label: &str) -> Json<CronResponse> {
    match send_broadcast(
        &state.report_client,
        state.store.as_ref(),
        state.tz,
        kind,
        Utc::now(),
    )
    .await
    {
        Ok(sent) => {
            tracing::info!(?kind, sent, "cron broadcast done");
            Json(CronResponse {
                success: true,
                message: format!("{label} reports sent"),
            })
        }
        Err(err) => {
            tracing::error!(?kind, error = %err, "cron broadcast failed");
            Json(CronResponse {
                success: false,
                message: err.to_string(),
            })
        }
    }
}

async fn cron_daily(State(state): State<AppState>) -> Json<CronResponse> {
    run_cron(&state, ReportKind::Daily, "Daily").await
}

async fn cron_weekly(State(state): State<AppState>) -> Json<CronResponse> {
    run_cron(&state, ReportKind::Weekly, "Weekly").await
}

async fn cron_monthly(State(state): State<AppState>) -> Json<CronResponse> {
    run_cron(&state, ReportKind::Monthly, "Monthly").await
}
