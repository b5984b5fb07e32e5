//! Google Sheets backend (feature `gsheets`).
//!
//! Talks to the same spreadsheet layout the original deployment used:
//! an `Expenses` worksheet and a `Users` worksheet, headers in row 1,
//! dates as DD/MM/YYYY and times as HH:MM:SS.
//!
//! Auth is a service account key (the bot runs headless); the key file
//! path comes from the config. Rows that fail to parse are skipped
//! rather than failing the whole read.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Value, json};

use google_sheets4::Sheets;
use google_sheets4::api::ValueRange;
use google_sheets4::hyper::client::HttpConnector;
use google_sheets4::hyper_rustls::HttpsConnector;
use google_sheets4::{hyper, hyper_rustls, oauth2};

use belanja_core::category::Category;
use belanja_core::record::{ExpenseRecord, UserInfo, UserProfile};

use crate::BelanjaStore;

const EXPENSE_HEADERS: [&str; 10] = [
    "Date", "Time", "User_ID", "Username", "Item", "Amount", "Location", "Category", "Photo_URL",
    "Notes",
];
const USER_HEADERS: [&str; 7] = [
    "User_ID",
    "Username",
    "First_Name",
    "Last_Name",
    "Join_Date",
    "Last_Active",
    "Total_Expenses",
];

const DATE_FMT: &str = "%d/%m/%Y";
const TIME_FMT: &str = "%H:%M:%S";
const DATETIME_FMT: &str = "%d/%m/%Y %H:%M:%S";

pub struct SheetsStore {
    hub: Sheets<HttpsConnector<HttpConnector>>,
    spreadsheet_id: String,
}

impl SheetsStore {
    /// Connect with a service-account key file and make sure both
    /// worksheets have their header rows.
    pub async fn connect(spreadsheet_id: &str, key_path: &Path) -> Result<Self> {
        let key = oauth2::read_service_account_key(key_path)
            .await
            .with_context(|| format!("read service account key {}", key_path.display()))?;
        let auth = oauth2::ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .context("building sheets authenticator")?;

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .https_or_http()
            .enable_http1()
            .build();
        let hub = Sheets::new(hyper::Client::builder().build(connector), auth);

        let store = Self {
            hub,
            spreadsheet_id: spreadsheet_id.to_string(),
        };
        store.ensure_headers().await?;
        Ok(store)
    }

    async fn ensure_headers(&self) -> Result<()> {
        if self.read_rows("Expenses!A1:J1").await?.is_empty() {
            self.write_row("Expenses!A1", EXPENSE_HEADERS.map(String::from).to_vec())
                .await?;
        }
        if self.read_rows("Users!A1:G1").await?.is_empty() {
            self.write_row("Users!A1", USER_HEADERS.map(String::from).to_vec())
                .await?;
        }
        Ok(())
    }

    async fn read_rows(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let (_, values) = self
            .hub
            .spreadsheets()
            .values_get(&self.spreadsheet_id, range)
            .doit()
            .await
            .with_context(|| format!("reading {range}"))?;

        Ok(values
            .values
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    async fn write_row(&self, range: &str, row: Vec<String>) -> Result<()> {
        let body = ValueRange {
            values: Some(vec![row.into_iter().map(Value::String).collect()]),
            ..Default::default()
        };
        self.hub
            .spreadsheets()
            .values_update(body, &self.spreadsheet_id, range)
            .value_input_option("USER_ENTERED")
            .doit()
            .await
            .with_context(|| format!("writing {range}"))?;
        Ok(())
    }

    async fn append_rows(&self, range: &str, rows: Vec<Vec<Value>>) -> Result<()> {
        let body = ValueRange {
            values: Some(rows),
            ..Default::default()
        };
        self.hub
            .spreadsheets()
            .values_append(body, &self.spreadsheet_id, range)
            .value_input_option("USER_ENTERED")
            .insert_data_option("INSERT_ROWS")
            .doit()
            .await
            .with_context(|| format!("appending to {range}"))?;
        Ok(())
    }

    /// Find the 1-based sheet row holding a user, if any.
    async fn user_row(&self, user_id: i64) -> Result<Option<(usize, UserProfile)>> {
        let rows = self.read_rows("Users!A2:G").await?;
        for (idx, row) in rows.iter().enumerate() {
            if let Some(profile) = parse_user_row(row) {
                if profile.user_id == user_id {
                    return Ok(Some((idx + 2, profile)));
                }
            }
        }
        Ok(None)
    }
}

fn cell_to_string(v: Value) -> String {
    match v {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn expense_to_row(r: &ExpenseRecord) -> Vec<Value> {
    vec![
        json!(r.date.format(DATE_FMT).to_string()),
        json!(r.time.format(TIME_FMT).to_string()),
        json!(r.user_id.to_string()),
        json!(r.username),
        json!(r.item),
        json!(format!("{:.2}", r.amount)),
        json!(r.location),
        json!(r.category.label()),
        json!(r.photo_url),
        json!(r.notes),
    ]
}

fn parse_expense_row(row: &[String]) -> Option<ExpenseRecord> {
    let get = |i: usize| row.get(i).map(String::as_str).unwrap_or("");

    let date = NaiveDate::parse_from_str(get(0), DATE_FMT).ok()?;
    let time = NaiveTime::parse_from_str(get(1), TIME_FMT).unwrap_or_default();
    let user_id: i64 = get(2).trim().parse().ok()?;
    let amount: f64 = get(5).trim().parse().unwrap_or(0.0);

    Some(ExpenseRecord {
        date,
        time,
        user_id,
        username: get(3).to_string(),
        item: get(4).to_string(),
        amount,
        location: get(6).to_string(),
        category: Category::from_label(get(7)),
        photo_url: get(8).to_string(),
        notes: get(9).to_string(),
    })
}

fn user_to_row(u: &UserProfile) -> Vec<String> {
    vec![
        u.user_id.to_string(),
        u.username.clone(),
        u.first_name.clone(),
        u.last_name.clone(),
        u.join_date.format(DATE_FMT).to_string(),
        u.last_active.format(DATETIME_FMT).to_string(),
        format!("{:.2}", u.total_expenses),
    ]
}

fn parse_user_row(row: &[String]) -> Option<UserProfile> {
    let get = |i: usize| row.get(i).map(String::as_str).unwrap_or("");

    let user_id: i64 = get(0).trim().parse().ok()?;
    let join_date = NaiveDate::parse_from_str(get(4), DATE_FMT).unwrap_or_default();
    let last_active = NaiveDateTime::parse_from_str(get(5), DATETIME_FMT)
        .map(|ndt| ndt.and_utc())
        .unwrap_or_default();

    Some(UserProfile {
        user_id,
        username: get(1).to_string(),
        first_name: get(2).to_string(),
        last_name: get(3).to_string(),
        join_date,
        last_active,
        total_expenses: get(6).trim().parse().unwrap_or(0.0),
    })
}

#[async_trait]
impl BelanjaStore for SheetsStore {
    async fn append_expenses(&self, records: &[ExpenseRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let rows = records.iter().map(expense_to_row).collect();
        self.append_rows("Expenses!A:J", rows).await
    }

    async fn expenses_for_user(&self, user_id: i64) -> Result<Vec<ExpenseRecord>> {
        let rows = self.read_rows("Expenses!A2:J").await?;
        Ok(rows
            .iter()
            .filter_map(|row| parse_expense_row(row))
            .filter(|r| r.user_id == user_id)
            .collect())
    }

    async fn all_users(&self) -> Result<Vec<UserProfile>> {
        let rows = self.read_rows("Users!A2:G").await?;
        Ok(rows.iter().filter_map(|row| parse_user_row(row)).collect())
    }

    async fn register_user(&self, user: &UserInfo, now: DateTime<Utc>) -> Result<()> {
        match self.user_row(user.id).await? {
            Some((row, mut profile)) => {
                profile.touch(user, now);
                self.write_row(&format!("Users!A{row}:G{row}"), user_to_row(&profile))
                    .await
            }
            None => {
                let profile = UserProfile::new(user, now);
                self.append_rows(
                    "Users!A:G",
                    vec![user_to_row(&profile).into_iter().map(Value::String).collect()],
                )
                .await
            }
        }
    }

    async fn update_user_total(&self, user_id: i64, total: f64) -> Result<()> {
        let (row, _) = self
            .user_row(user_id)
            .await?
            .ok_or_else(|| anyhow!("user {user_id} not found in Users sheet"))?;
        self.write_row(&format!("Users!G{row}"), vec![format!("{total:.2}")])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expense_row_round_trip() {
        let record = ExpenseRecord {
            date: NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(),
            time: NaiveTime::from_hms_opt(20, 15, 3).unwrap(),
            user_id: 42,
            username: "ali".to_string(),
            item: "Nasi ayam".to_string(),
            amount: 10.5,
            location: "Gerai".to_string(),
            category: Category::MakanMinum,
            photo_url: String::new(),
            notes: "sedap".to_string(),
        };

        let row: Vec<String> = expense_to_row(&record)
            .into_iter()
            .map(cell_to_string)
            .collect();
        assert_eq!(row[0], "30/08/2026");
        assert_eq!(row[5], "10.50");
        assert_eq!(row[7], "Makan & Minum");

        let parsed = parse_expense_row(&row).unwrap();
        assert_eq!(parsed.user_id, 42);
        assert_eq!(parsed.amount, 10.5);
        assert_eq!(parsed.category, Category::MakanMinum);
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        assert!(parse_expense_row(&["not a date".to_string()]).is_none());
        assert!(parse_user_row(&["".to_string()]).is_none());
    }
}
