//! File-backed store: append-only `expenses.jsonl` plus a rewritten
//! `users.json`, both under the configured data directory.
//!
//! Good enough for a single-process deployment — writes go through one
//! mutex, and the expense log is append-only so a crash can at worst
//! lose the row being written.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use belanja_core::record::{ExpenseRecord, UserInfo, UserProfile};

use crate::BelanjaStore;

#[derive(Debug)]
pub struct JsonlStore {
    expenses_path: PathBuf,
    users_path: PathBuf,
    // Serializes writers; readers re-read the files each call.
    write_lock: Mutex<()>,
}

impl JsonlStore {
    /// Open (creating the directory if needed).
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        Ok(Self {
            expenses_path: dir.join("expenses.jsonl"),
            users_path: dir.join("users.json"),
            write_lock: Mutex::new(()),
        })
    }

    fn read_expenses(&self) -> Result<Vec<ExpenseRecord>> {
        if !self.expenses_path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.expenses_path)
            .with_context(|| format!("read {}", self.expenses_path.display()))?;

        let mut records = Vec::new();
        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let record: ExpenseRecord =
                serde_json::from_str(line).context("parse expenses.jsonl line")?;
            records.push(record);
        }
        Ok(records)
    }

    fn read_users(&self) -> Result<Vec<UserProfile>> {
        if !self.users_path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.users_path)
            .with_context(|| format!("read {}", self.users_path.display()))?;
        Ok(serde_json::from_str(&raw).context("parse users.json")?)
    }

    fn write_users(&self, users: &[UserProfile]) -> Result<()> {
        let json = serde_json::to_string_pretty(users)?;
        fs::write(&self.users_path, json)
            .with_context(|| format!("write {}", self.users_path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl BelanjaStore for JsonlStore {
    async fn append_expenses(&self, records: &[ExpenseRecord]) -> Result<()> {
        let _guard = self.write_lock.lock().expect("jsonl write lock");
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.expenses_path)
            .with_context(|| format!("open {}", self.expenses_path.display()))?;
        for record in records {
            let line = serde_json::to_string(record)?;
            writeln!(file, "{line}")?;
        }
        Ok(())
    }

    async fn expenses_for_user(&self, user_id: i64) -> Result<Vec<ExpenseRecord>> {
        Ok(self
            .read_expenses()?
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .collect())
    }

    async fn all_users(&self) -> Result<Vec<UserProfile>> {
        self.read_users()
    }

    async fn register_user(&self, user: &UserInfo, now: DateTime<Utc>) -> Result<()> {
        let _guard = self.write_lock.lock().expect("jsonl write lock");
        let mut users = self.read_users()?;
        match users.iter_mut().find(|u| u.user_id == user.id) {
            Some(existing) => existing.touch(user, now),
            None => users.push(UserProfile::new(user, now)),
        }
        self.write_users(&users)
    }

    async fn update_user_total(&self, user_id: i64, total: f64) -> Result<()> {
        let _guard = self.write_lock.lock().expect("jsonl write lock");
        let mut users = self.read_users()?;
        if let Some(u) = users.iter_mut().find(|u| u.user_id == user_id) {
            u.total_expenses = total;
            self.write_users(&users)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use belanja_core::category::Category;
    use chrono::{NaiveDate, NaiveTime};

    fn rec(user_id: i64, item: &str, amount: f64) -> ExpenseRecord {
        ExpenseRecord {
            date: NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(),
            time: NaiveTime::from_hms_opt(20, 15, 0).unwrap(),
            user_id,
            username: "ali".to_string(),
            item: item.to_string(),
            amount,
            location: "Gerai".to_string(),
            category: Category::MakanMinum,
            photo_url: String::new(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn test_expenses_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = JsonlStore::open(dir.path()).unwrap();
            store
                .append_expenses(&[rec(1, "Nasi", 10.5), rec(1, "Kopi", 3.0)])
                .await
                .unwrap();
        }

        let store = JsonlStore::open(dir.path()).unwrap();
        let records = store.expenses_for_user(1).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].item, "Nasi");
        assert_eq!(records[1].amount, 3.0);
    }

    #[tokio::test]
    async fn test_empty_store_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::open(dir.path()).unwrap();
        assert!(store.expenses_for_user(1).await.unwrap().is_empty());
        assert!(store.all_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_and_total_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::open(dir.path()).unwrap();
        let user = UserInfo {
            id: 7,
            username: Some("siti".to_string()),
            first_name: "Siti".to_string(),
            last_name: None,
        };

        store.register_user(&user, Utc::now()).await.unwrap();
        store.update_user_total(7, 42.5).await.unwrap();

        let users = store.all_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "siti");
        assert_eq!(users[0].total_expenses, 42.5);
    }
}
