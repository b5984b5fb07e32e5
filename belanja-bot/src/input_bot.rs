//! The input bot (bot1): commands plus the expense entry conversation.
//!
//! Handlers return the reply texts instead of sending them, so the
//! webhook layer owns all Telegram IO and tests can run against an
//! in-memory store.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use belanja_core::machine::{Inbound, step};
use belanja_core::record::UserInfo;
use belanja_core::report::Summary;
use belanja_core::session::{Session, SessionStore};
use belanja_core::time::today_in;
use belanja_sheets::{BelanjaStore, recompute_user_total};

pub const MSG_CANCELLED: &str =
    "❌ Operasi dibatalkan. Sila mulakan semula dengan menaip belanja anda.";
pub const MSG_SAVE_FAILED: &str =
    "❌ Maaf, berlaku masalah semasa menyimpan belanja anda. Sila cuba lagi.";

pub struct InputBot {
    store: Arc<dyn BelanjaStore>,
    sessions: Arc<SessionStore>,
    tz: Tz,
    started_at: Instant,
}

impl InputBot {
    pub fn new(store: Arc<dyn BelanjaStore>, sessions: Arc<SessionStore>, tz: Tz) -> Self {
        Self {
            store,
            sessions,
            tz,
            started_at: Instant::now(),
        }
    }

    /// Handle a `/command` message. Unknown commands are ignored, like
    /// the conversation handler ignores them.
    pub async fn handle_command(
        &self,
        user: &UserInfo,
        chat_id: i64,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>> {
        let command = text.split_whitespace().next().unwrap_or("");
        match command {
            "/start" => {
                self.store.register_user(user, now).await?;
                Ok(vec![welcome_text(&user.first_name)])
            }
            "/help" => Ok(vec![HELP_TEXT.to_string()]),
            "/status" => Ok(vec![self.status_text(user, now).await?]),
            "/laporan" => {
                let records = self.store.expenses_for_user(user.id).await?;
                let summary = Summary::build(&records, today_in(self.tz, now));
                Ok(vec![summary.render()])
            }
            "/cancel" | "/reset" => {
                self.sessions.cancel(chat_id).await;
                Ok(vec![MSG_CANCELLED.to_string()])
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Handle a non-command message: run the conversation machine and
    /// persist any finished session. Persistence failure turns into an
    /// error reply; the session is gone either way.
    pub async fn handle_event(
        &self,
        user: &UserInfo,
        chat_id: i64,
        event: Inbound,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let slot = self.sessions.slot(chat_id);
        let mut guard = slot.lock().await;
        let out = step(guard.take(), event, now);
        *guard = out.session;
        drop(guard);

        let mut replies = out.replies;
        if let Some(commit) = out.commit {
            match self.persist(user, commit.session, now).await {
                Ok(count) => {
                    tracing::info!(chat_id, user_id = user.id, count, "expenses saved");
                    replies.push(commit.reply);
                }
                Err(err) => {
                    tracing::error!(chat_id, user_id = user.id, error = %err, "expense save failed");
                    replies.push(MSG_SAVE_FAILED.to_string());
                }
            }
        }
        replies
    }

    async fn persist(
        &self,
        user: &UserInfo,
        session: Session,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let records = session.into_records(user, self.tz);
        let count = records.len();
        self.store.append_expenses(&records).await?;
        self.store.register_user(user, now).await?;
        recompute_user_total(self.store.as_ref(), user.id).await?;
        Ok(count)
    }

    async fn status_text(&self, user: &UserInfo, now: DateTime<Utc>) -> Result<String> {
        let uptime = self.started_at.elapsed().as_secs();
        let hours = uptime / 3600;
        let minutes = (uptime % 3600) / 60;

        let today = today_in(self.tz, now);
        let records = self.store.expenses_for_user(user.id).await?;
        let todays = belanja_core::report::in_range(&records, today, today);

        Ok(format!(
            "🟢 *Status Bot - AKTIF*\n\n⏰ Bot telah berjalan: {}j {}m\n💾 Storan: Tersambung ✅\n🔄 Sistem: Berfungsi Normal\n🕐 Masa Semasa: {}\n\n*Statistik Harian:*\n📝 Rekod hari ini: {}\n💰 Jumlah belanja: RM{:.2}\n\nBot siap membantu anda! 🚀",
            hours,
            minutes,
            now.with_timezone(&self.tz).format("%d/%m/%Y %H:%M:%S"),
            todays.len(),
            belanja_core::report::total(&todays),
        ))
    }
}

fn welcome_text(first_name: &str) -> String {
    format!(
        "🎉 *Selamat datang ke LaporBelanjaBot!* 🎉\n\nHelo {first_name}! 👋\n\nSaya adalah bot pintar untuk membantu anda jejak belanja harian. Dengan saya, anda boleh:\n\n💰 Rekod semua belanja dengan mudah\n📊 Dapat laporan harian, mingguan & bulanan\n📸 Upload resit untuk rekod yang lebih teliti\n📍 Simpan lokasi pembelian\n\n*Cara guna:*\n• Taip belanja seperti: \"Nasi ayam RM10.50\"\n• Atau gunakan format: \"Makan tengahari RM15 di Restoran ABC\"\n• Upload gambar resit (optional)\n\n*Arahan tersedia:*\n/help - Panduan lengkap\n/status - Semak status bot\n/laporan - Lihat summary belanja\n/cancel - Batal operasi semasa\n\nMari mulakan jejak belanja anda! Taip apa yang anda beli hari ini 😊"
    )
}

const HELP_TEXT: &str = "📚 *Panduan Penggunaan LaporBelanjaBot*\n\n*Format Input Belanja:*\n• \"Nasi ayam RM10.50\"\n• \"Makan tengahari RM15 di Restoran ABC\"\n• \"Groceries RM45.80 Tesco\"\n• \"Petrol RM60\"\n\n*Arahan Tersedia:*\n/start - Mula semula\n/help - Panduan ini\n/status - Semak status bot\n/laporan - Lihat ringkasan belanja\n/cancel - Batal operasi semasa\n/reset - Reset data sesi\n\n*Tips Berguna:*\n• Bot akan tanya lokasi jika tidak dinyatakan\n• Upload gambar resit untuk rekod yang lebih baik\n• Gunakan /cancel untuk membatalkan input\n• Bot akan beri cadangan kategori automatik\n\n*Laporan Automatik:*\n📅 Harian - 8:00 PM setiap hari\n📅 Mingguan - 8:00 PM setiap Ahad\n📅 Bulanan - 8:00 PM setiap 1hb\n\nSelamat menjejak belanja! 💪";
