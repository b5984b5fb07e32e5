//! The report bot (bot2): on-demand report commands.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use belanja_core::record::UserInfo;
use belanja_core::report::{DailyReport, DeepAnalysis, MonthlyReport, WeeklyReport};
use belanja_core::time::today_in;
use belanja_sheets::BelanjaStore;

pub struct ReportBot {
    store: Arc<dyn BelanjaStore>,
    tz: Tz,
}

impl ReportBot {
    pub fn new(store: Arc<dyn BelanjaStore>, tz: Tz) -> Self {
        Self { store, tz }
    }

    pub async fn handle_command(
        &self,
        user: &UserInfo,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>> {
        let command = text.split_whitespace().next().unwrap_or("");
        match command {
            "/start" => Ok(vec![welcome_text(&user.first_name)]),
            "/laporan_hari" => Ok(vec![self.daily(user.id, now).await?]),
            "/laporan_minggu" => Ok(vec![self.weekly(user.id, now).await?]),
            "/laporan_bulan" => Ok(vec![self.monthly(user.id, now).await?]),
            "/analisa" => Ok(vec![self.analysis(user.id, now).await?]),
            _ => Ok(Vec::new()),
        }
    }

    pub async fn daily(&self, user_id: i64, now: DateTime<Utc>) -> Result<String> {
        let records = self.store.expenses_for_user(user_id).await?;
        Ok(DailyReport::build(&records, today_in(self.tz, now)).render())
    }

    pub async fn weekly(&self, user_id: i64, now: DateTime<Utc>) -> Result<String> {
        let records = self.store.expenses_for_user(user_id).await?;
        Ok(WeeklyReport::build(&records, today_in(self.tz, now)).render())
    }

    pub async fn monthly(&self, user_id: i64, now: DateTime<Utc>) -> Result<String> {
        let records = self.store.expenses_for_user(user_id).await?;
        Ok(MonthlyReport::build(&records, today_in(self.tz, now)).render())
    }

    pub async fn analysis(&self, user_id: i64, now: DateTime<Utc>) -> Result<String> {
        let records = self.store.expenses_for_user(user_id).await?;
        Ok(DeepAnalysis::build(&records, today_in(self.tz, now)).render())
    }
}

fn welcome_text(first_name: &str) -> String {
    format!(
        "📊 *Selamat datang ke LaporanBelanjaBot!* 📊\n\nHelo {first_name}! 👋\n\nSaya adalah bot laporan pintar yang akan memberikan anda analisa mendalam tentang belanja anda.\n\n*Apa yang saya boleh lakukan:*\n📈 Laporan harian, mingguan & bulanan\n💹 Analisa trend belanja\n🏆 Kategori belanja terbanyak\n📊 Graf dan statistik\n⚡ Laporan real-time\n\n*Arahan tersedia:*\n/laporan_hari - Laporan hari ini\n/laporan_minggu - Laporan minggu ini\n/laporan_bulan - Laporan bulan ini\n/analisa - Analisa mendalam\n\nSila pilih jenis laporan yang anda mahu! 📊"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use belanja_core::category::Category;
    use belanja_core::record::ExpenseRecord;
    use belanja_sheets::MemStore;
    use chrono::{NaiveDate, NaiveTime, TimeZone};
    use chrono_tz::Asia::Kuala_Lumpur;

    fn rec(date: NaiveDate, item: &str, amount: f64) -> ExpenseRecord {
        ExpenseRecord {
            date,
            time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            user_id: 7,
            username: "ali".to_string(),
            item: item.to_string(),
            amount,
            location: "Gerai".to_string(),
            category: Category::MakanMinum,
            photo_url: String::new(),
            notes: String::new(),
        }
    }

    fn user() -> UserInfo {
        UserInfo {
            id: 7,
            username: Some("ali".to_string()),
            first_name: "Ali".to_string(),
            last_name: None,
        }
    }

    fn now() -> DateTime<Utc> {
        // 12:00 KL time on 2026-08-30.
        Utc.with_ymd_and_hms(2026, 8, 30, 4, 0, 0).unwrap()
    }

    async fn seeded_bot() -> ReportBot {
        let store = Arc::new(MemStore::new());
        store
            .append_expenses(&[
                rec(NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(), "Nasi", 10.0),
                rec(NaiveDate::from_ymd_opt(2026, 8, 15).unwrap(), "Kopi", 5.0),
            ])
            .await
            .unwrap();
        ReportBot::new(store, Kuala_Lumpur)
    }

    #[tokio::test]
    async fn test_daily_report_covers_only_today() {
        let bot = seeded_bot().await;
        let replies = bot.handle_command(&user(), "/laporan_hari", now()).await.unwrap();
        assert!(replies[0].contains("Laporan Harian - 30/08/2026"));
        assert!(replies[0].contains("RM10.00"));
    }

    #[tokio::test]
    async fn test_monthly_report_covers_whole_month() {
        let bot = seeded_bot().await;
        let replies = bot.handle_command(&user(), "/laporan_bulan", now()).await.unwrap();
        assert!(replies[0].contains("Laporan Bulanan - August 2026"));
        assert!(replies[0].contains("RM15.00"));
    }

    #[tokio::test]
    async fn test_analysis_names_biggest_purchase() {
        let bot = seeded_bot().await;
        let replies = bot.handle_command(&user(), "/analisa", now()).await.unwrap();
        assert!(replies[0].contains("Pembelian terbesar: Nasi - RM10.00"));
    }

    #[tokio::test]
    async fn test_start_greets_without_touching_store() {
        let bot = ReportBot::new(Arc::new(MemStore::new()), Kuala_Lumpur);
        let replies = bot.handle_command(&user(), "/start", now()).await.unwrap();
        assert!(replies[0].contains("LaporanBelanjaBot"));
    }

    #[tokio::test]
    async fn test_unknown_command_is_ignored() {
        let bot = ReportBot::new(Arc::new(MemStore::new()), Kuala_Lumpur);
        let replies = bot.handle_command(&user(), "/trending", now()).await.unwrap();
        assert!(replies.is_empty());
    }
}
