//! Scheduled report broadcasts.
//!
//! Every day at 20:00 local time each registered user gets a daily
//! report; Sundays add a weekly report and the 1st of the month adds a
//! monthly one. A user who blocked the bot just gets skipped.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

use belanja_core::record::ExpenseRecord;
use belanja_core::report::{DailyReport, MonthlyReport, WeeklyReport};
use belanja_core::time::today_in;
use belanja_sheets::BelanjaStore;

use crate::telegram::TelegramClient;

const RUN_HOUR: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Daily,
    Weekly,
    Monthly,
}

impl ReportKind {
    fn header(self) -> &'static str {
        match self {
            ReportKind::Daily => "🌅 *Laporan Harian Automatik*",
            ReportKind::Weekly => "📅 *Laporan Mingguan Automatik*",
            ReportKind::Monthly => "📊 *Laporan Bulanan Automatik*",
        }
    }

    fn render(self, records: &[ExpenseRecord], today: NaiveDate) -> String {
        match self {
            ReportKind::Daily => DailyReport::build(records, today).render(),
            ReportKind::Weekly => WeeklyReport::build(records, today).render(),
            ReportKind::Monthly => MonthlyReport::build(records, today).render(),
        }
    }
}

/// Build one `(user_id, message)` per registered user.
pub async fn broadcast_messages(
    store: &dyn BelanjaStore,
    tz: Tz,
    kind: ReportKind,
    now: DateTime<Utc>,
) -> Result<Vec<(i64, String)>> {
    let today = today_in(tz, now);
    let mut messages = Vec::new();
    for user in store.all_users().await? {
        let records = store.expenses_for_user(user.user_id).await?;
        let body = kind.render(&records, today);
        messages.push((user.user_id, format!("{}\n\n{}", kind.header(), body)));
    }
    Ok(messages)
}

/// Send a broadcast round. Per-user send failures are logged and
/// skipped; returns how many messages went out.
pub async fn send_broadcast(
    client: &TelegramClient,
    store: &dyn BelanjaStore,
    tz: Tz,
    kind: ReportKind,
    now: DateTime<Utc>,
) -> Result<usize> {
    let mut sent = 0;
    for (user_id, message) in broadcast_messages(store, tz, kind, now).await? {
        match client.send_message(user_id, &message).await {
            Ok(()) => sent += 1,
            Err(err) => {
                tracing::warn!(user_id, error = %err, "broadcast send failed, user may have blocked the bot");
            }
        }
    }
    Ok(sent)
}

/// Next 20:00 wall-clock occurrence in `tz`, as a UTC instant.
fn next_run(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local = now.with_timezone(&tz);
    let trigger = NaiveTime::from_hms_opt(RUN_HOUR, 0, 0).unwrap_or_default();
    let mut day = local.date_naive();
    if local.time() >= trigger {
        day = day.succ_opt().unwrap_or(day);
    }
    tz.from_local_datetime(&day.and_time(trigger))
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| now + chrono::Duration::hours(1))
}

/// Sleep-until-20:00 loop. Never returns; run it on its own task.
pub async fn run_scheduler(client: TelegramClient, store: Arc<dyn BelanjaStore>, tz: Tz) {
    loop {
        let now = Utc::now();
        let next = next_run(now, tz);
        let wait = (next - now).to_std().unwrap_or_default();
        tracing::info!(at = %next, "next scheduled broadcast");
        tokio::time::sleep(wait).await;

        let fired = Utc::now();
        let today = today_in(tz, fired);
        run_round(&client, store.as_ref(), tz, ReportKind::Daily, fired).await;
        if today.weekday() == Weekday::Sun {
            run_round(&client, store.as_ref(), tz, ReportKind::Weekly, fired).await;
        }
        if today.day() == 1 {
            run_round(&client, store.as_ref(), tz, ReportKind::Monthly, fired).await;
        }
    }
}

async fn run_round(
    client: &TelegramClient,
    store: &dyn BelanjaStore,
    tz: Tz,
    kind: ReportKind,
    now: DateTime<Utc>,
) {
    match send_broadcast(client, store, tz, kind, now).await {
        Ok(sent) => tracing::info!(?kind, sent, "broadcast round done"),
        Err(err) => tracing::error!(?kind, error = %err, "broadcast round failed"),
    }
}
