//! Report aggregation over expense records, plus the Malay report
//! texts the report bot sends.
//!
//! Aggregates are pure functions and total over empty input: sums are
//! 0, counts are 0, averages are 0 instead of dividing by zero.
//! Breakdown maps are insertion-ordered vectors so top-pick ties break
//! on first encounter, deterministically.

use chrono::{Datelike, NaiveDate};

use crate::category::Category;
use crate::record::ExpenseRecord;
use crate::time::{
    days_in_month, last_30_days_start, month_range, week_of_month, week_range,
};

pub fn total(records: &[ExpenseRecord]) -> f64 {
    records.iter().map(|r| r.amount).sum()
}

pub fn count(records: &[ExpenseRecord]) -> usize {
    records.len()
}

/// Mean amount per record; 0 over empty input.
pub fn average(records: &[ExpenseRecord]) -> f64 {
    if records.is_empty() {
        0.0
    } else {
        total(records) / records.len() as f64
    }
}

/// Amount summed per category, in first-encounter order.
pub fn by_category(records: &[ExpenseRecord]) -> Vec<(Category, f64)> {
    let mut sums: Vec<(Category, f64)> = Vec::new();
    for r in records {
        match sums.iter_mut().find(|(c, _)| *c == r.category) {
            Some((_, sum)) => *sum += r.amount,
            None => sums.push((r.category, r.amount)),
        }
    }
    sums
}

/// Category with the largest summed amount; first encountered wins ties.
pub fn top_category(records: &[ExpenseRecord]) -> Option<(Category, f64)> {
    let mut best: Option<(Category, f64)> = None;
    for (cat, sum) in by_category(records) {
        match best {
            Some((_, b)) if sum <= b => {}
            _ => best = Some((cat, sum)),
        }
    }
    best
}

/// Visit count per non-empty location, in first-encounter order.
pub fn by_location(records: &[ExpenseRecord]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for r in records {
        if r.location.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(l, _)| *l == r.location) {
            Some((_, n)) => *n += 1,
            None => counts.push((r.location.clone(), 1)),
        }
    }
    counts
}

pub fn top_location(records: &[ExpenseRecord]) -> Option<(String, usize)> {
    let mut best: Option<(String, usize)> = None;
    for (loc, n) in by_location(records) {
        match &best {
            Some((_, b)) if n <= *b => {}
            _ => best = Some((loc, n)),
        }
    }
    best
}

/// Category visit counts (not amounts), for the deep analysis.
pub fn category_frequency(records: &[ExpenseRecord]) -> Vec<(Category, usize)> {
    let mut counts: Vec<(Category, usize)> = Vec::new();
    for r in records {
        match counts.iter_mut().find(|(c, _)| *c == r.category) {
            Some((_, n)) => *n += 1,
            None => counts.push((r.category, 1)),
        }
    }
    counts
}

/// Amount summed per 7-day bucket of the month (`ceil(day/7)`).
pub fn by_week_of_month(records: &[ExpenseRecord]) -> Vec<(u32, f64)> {
    let mut sums: Vec<(u32, f64)> = Vec::new();
    for r in records {
        let week = week_of_month(r.date);
        match sums.iter_mut().find(|(w, _)| *w == week) {
            Some((_, sum)) => *sum += r.amount,
            None => sums.push((week, r.amount)),
        }
    }
    sums
}

/// Single largest record by amount.
pub fn max_expense(records: &[ExpenseRecord]) -> Option<&ExpenseRecord> {
    records
        .iter()
        .reduce(|best, r| if r.amount > best.amount { r } else { best })
}

/// Records with `start <= date <= end`.
pub fn in_range(records: &[ExpenseRecord], start: NaiveDate, end: NaiveDate) -> Vec<ExpenseRecord> {
    records
        .iter()
        .filter(|r| r.date >= start && r.date <= end)
        .cloned()
        .collect()
}

fn fmt_date(d: NaiveDate) -> String {
    d.format("%d/%m/%Y").to_string()
}

fn fmt_month(d: NaiveDate) -> String {
    d.format("%B %Y").to_string()
}

/// One day's figures.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub total: f64,
    pub count: usize,
}

impl DailyReport {
    pub fn build(records: &[ExpenseRecord], date: NaiveDate) -> Self {
        let day = in_range(records, date, date);
        Self {
            date,
            total: total(&day),
            count: count(&day),
        }
    }

    pub fn render(&self) -> String {
        let avg = if self.count > 0 {
            self.total / self.count as f64
        } else {
            0.0
        };
        let mood = if self.count == 0 {
            "✨ Tiada belanja hari ini! Jimat sekali!"
        } else {
            "💪 Teruskan jejak belanja anda!"
        };
        format!(
            "📊 *Laporan Harian - {}*\n\n💰 *Jumlah Belanja:* RM{:.2}\n📝 *Bilangan Transaksi:* {}\n💳 *Purata setiap transaksi:* RM{:.2}\n\n{}\n\n---\n🤖 *Laporan automatik dari LaporanBelanjaBot*",
            fmt_date(self.date),
            self.total,
            self.count,
            avg,
            mood
        )
    }
}

/// Sunday-start week figures.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total: f64,
    pub count: usize,
    pub by_category: Vec<(Category, f64)>,
    pub top_category: Option<(Category, f64)>,
}

impl WeeklyReport {
    pub fn build(records: &[ExpenseRecord], today: NaiveDate) -> Self {
        let (start, end) = week_range(today);
        let week = in_range(records, start, end);
        Self {
            start,
            end,
            total: total(&week),
            count: count(&week),
            by_category: by_category(&week),
            top_category: top_category(&week),
        }
    }

    pub fn render(&self) -> String {
        let top = match &self.top_category {
            Some((cat, amount)) => format!("{} (RM{:.2})", cat, amount),
            None => "Tidak tersedia".to_string(),
        };
        let mut breakdown = String::new();
        for (cat, amount) in &self.by_category {
            breakdown.push_str(&format!("• {}: RM{:.2}\n", cat, amount));
        }
        let mood = if self.count == 0 {
            "✨ Minggu yang jimat!"
        } else if self.count > 50 {
            "⚠️ Belanja agak tinggi minggu ini"
        } else {
            "👍 Belanja dalam kawalan yang baik"
        };
        format!(
            "📊 *Laporan Mingguan*\n📅 {} - {}\n\n💰 *Jumlah Belanja:* RM{:.2}\n📝 *Bilangan Transaksi:* {}\n💳 *Purata harian:* RM{:.2}\n🏆 *Kategori tertinggi:* {}\n\n*Pecahan mengikut kategori:*\n{}\n{}\n\n---\n🤖 *Laporan automatik dari LaporanBelanjaBot*",
            self.start.format("%d/%m"),
            fmt_date(self.end),
            self.total,
            self.count,
            self.total / 7.0,
            top,
            breakdown,
            mood
        )
    }
}

/// Calendar-month figures with elapsed-day averages and a full-month
/// projection.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyReport {
    pub today: NaiveDate,
    pub total: f64,
    pub count: usize,
    pub days_in_month: u32,
    /// Top 5 categories by amount, descending.
    pub top_categories: Vec<(Category, f64)>,
    pub by_week: Vec<(u32, f64)>,
}

impl MonthlyReport {
    pub fn build(records: &[ExpenseRecord], today: NaiveDate) -> Self {
        let (start, end) = month_range(today);
        let month = in_range(records, start, end);

        let mut cats = by_category(&month);
        cats.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        cats.truncate(5);

        Self {
            today,
            total: total(&month),
            count: count(&month),
            days_in_month: days_in_month(today),
            top_categories: cats,
            by_week: by_week_of_month(&month),
        }
    }

    /// Daily average over the elapsed part of the month.
    pub fn daily_average(&self) -> f64 {
        self.total / self.today.day() as f64
    }

    /// Projected full-month spend at the current daily rate.
    pub fn projection(&self) -> f64 {
        self.daily_average() * self.days_in_month as f64
    }

    pub fn render(&self) -> String {
        let mut cat_breakdown = String::new();
        for (cat, amount) in &self.top_categories {
            cat_breakdown.push_str(&format!("• {}: RM{:.2}\n", cat, amount));
        }
        let mut week_breakdown = String::new();
        for (week, amount) in &self.by_week {
            week_breakdown.push_str(&format!("• Minggu {}: RM{:.2}\n", week, amount));
        }

        let progress = (self.today.day() as f64 / self.days_in_month as f64) * 100.0;
        let mood = if self.total > 1000.0 {
            "⚠️ Belanja tinggi bulan ini"
        } else if self.total > 500.0 {
            "👍 Belanja sederhana"
        } else {
            "✨ Belanja jimat!"
        };
        let mut advice = String::new();
        if self.projection() > self.total * 1.5 {
            advice.push_str("\n💡 Cadangan: Kurangkan belanja untuk minggu seterusnya");
        }

        format!(
            "📊 *Laporan Bulanan - {}*\n\n💰 *Jumlah Belanja:* RM{:.2}\n📝 *Bilangan Transaksi:* {}\n💳 *Purata harian:* RM{:.2}\n📈 *Unjuran bulan penuh:* RM{:.2}\n📊 *Progress:* {:.1}% bulan berlalu\n\n*Top 5 Kategori:*\n{}\n*Pecahan mingguan:*\n{}\n*Analisa:*\n{}{}\n\n---\n🤖 *Laporan automatik dari LaporanBelanjaBot*",
            fmt_month(self.today),
            self.total,
            self.count,
            self.daily_average(),
            self.projection(),
            progress,
            cat_breakdown,
            week_breakdown,
            mood,
            advice
        )
    }
}

/// Lifetime + rolling-30-day figures for the `/analisa` command.
#[derive(Debug, Clone, PartialEq)]
pub struct DeepAnalysis {
    pub total: f64,
    pub count: usize,
    pub recent_total: f64,
    pub biggest: Option<(String, f64, NaiveDate)>,
    pub top_category: Option<(Category, usize)>,
    pub top_location: Option<(String, usize)>,
}

impl DeepAnalysis {
    pub fn build(records: &[ExpenseRecord], today: NaiveDate) -> Self {
        let recent = in_range(records, last_30_days_start(today), today);

        let mut top_cat: Option<(Category, usize)> = None;
        for (cat, n) in category_frequency(records) {
            match top_cat {
                Some((_, b)) if n <= b => {}
                _ => top_cat = Some((cat, n)),
            }
        }

        Self {
            total: total(records),
            count: count(records),
            recent_total: total(&recent),
            biggest: max_expense(records).map(|r| (r.item.clone(), r.amount, r.date)),
            top_category: top_cat,
            top_location: top_location(records),
        }
    }

    pub fn render(&self) -> String {
        let avg = if self.count > 0 {
            self.total / self.count as f64
        } else {
            0.0
        };
        let trend = if self.recent_total > self.total * 0.5 {
            "Trend meningkat"
        } else {
            "Trend menurun"
        };
        let biggest = match &self.biggest {
            Some((item, amount, date)) => format!(
                "🏆 Pembelian terbesar: {} - RM{:.2}\n📅 Tarikh: {}",
                item,
                amount,
                fmt_date(*date)
            ),
            None => "🏆 Tiada rekod lagi".to_string(),
        };
        let fav_cat = match &self.top_category {
            Some((cat, n)) => format!("{} ({} kali)", cat, n),
            None => "Tidak tersedia".to_string(),
        };
        let fav_loc = match &self.top_location {
            Some((loc, n)) => format!("{} ({} kali)", loc, n),
            None => "Tidak tersedia".to_string(),
        };

        let mut advice = String::new();
        if self.recent_total > 800.0 {
            advice.push_str("💡 Cuba kurangkan belanja harian sebanyak 20%\n");
        }
        if let Some((Category::MakanMinum, n)) = self.top_category {
            if n > 20 {
                advice.push_str("🍽️ Pertimbangkan masak di rumah lebih kerap\n");
            }
        }
        if let Some((_, amount, _)) = &self.biggest {
            if *amount > 100.0 {
                advice.push_str("🛒 Buat senarai sebelum membeli untuk elak pembelian impulsif\n");
            }
        }

        format!(
            "🔍 *Analisa Mendalam Belanja Anda*\n\n*Statistik Keseluruhan:*\n💰 Jumlah belanja keseluruhan: RM{:.2}\n📝 Total transaksi: {}\n💳 Purata setiap transaksi: RM{:.2}\n\n*30 Hari Terkini:*\n💰 Jumlah: RM{:.2}\n📊 Purata harian: RM{:.2}\n📈 {}\n\n*Rekod Tertinggi:*\n{}\n\n*Pattern Belanja:*\n🥇 Kategori kegemaran: {}\n📍 Lokasi kerap: {}\n\n*Cadangan:*\n{}\n---\n🤖 *Analisa automatik dari LaporanBelanjaBot*",
            self.total,
            self.count,
            avg,
            self.recent_total,
            self.recent_total / 30.0,
            trend,
            biggest,
            fav_cat,
            fav_loc,
            advice
        )
    }
}

/// The input bot's `/laporan` summary: today / this week / this month.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub today: NaiveDate,
    pub today_total: f64,
    pub week_total: f64,
    pub month_total: f64,
}

impl Summary {
    pub fn build(records: &[ExpenseRecord], today: NaiveDate) -> Self {
        let (week_start, week_end) = week_range(today);
        let (month_start, month_end) = month_range(today);
        Self {
            today,
            today_total: total(&in_range(records, today, today)),
            week_total: total(&in_range(records, week_start, week_end)),
            month_total: total(&in_range(records, month_start, month_end)),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "📊 *Ringkasan Belanja Anda*\n\n*Hari Ini ({}):*\n💰 RM{:.2}\n\n*Minggu Ini:*\n💰 RM{:.2}\n\n*Bulan Ini ({}):*\n💰 RM{:.2}\n\n📈 Purata harian bulan ini: RM{:.2}\n\nTeruskan jejak belanja anda! 💪",
            fmt_date(self.today),
            self.today_total,
            self.week_total,
            fmt_month(self.today),
            self.month_total,
            self.month_total / self.today.day() as f64
        )
    }
}
