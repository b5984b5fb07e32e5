//! In-memory store. Canonical backend for tests and `backend = "memory"`
//! runs; everything lives behind one mutex and vanishes on shutdown.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use belanja_core::record::{ExpenseRecord, UserInfo, UserProfile};

use crate::BelanjaStore;

#[derive(Debug, Default)]
struct Inner {
    expenses: Vec<ExpenseRecord>,
    users: Vec<UserProfile>,
}

#[derive(Debug, Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BelanjaStore for MemStore {
    async fn append_expenses(&self, records: &[ExpenseRecord]) -> Result<()> {
        let mut inner = self.inner.lock().expect("mem store lock");
        inner.expenses.extend_from_slice(records);
        Ok(())
    }

    async fn expenses_for_user(&self, user_id: i64) -> Result<Vec<ExpenseRecord>> {
        let inner = self.inner.lock().expect("mem store lock");
        Ok(inner
            .expenses
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn all_users(&self) -> Result<Vec<UserProfile>> {
        let inner = self.inner.lock().expect("mem store lock");
        Ok(inner.users.clone())
    }

    async fn register_user(&self, user: &UserInfo, now: DateTime<Utc>) -> Result<()> {
        let mut inner = self.inner.lock().expect("mem store lock");
        match inner.users.iter_mut().find(|u| u.user_id == user.id) {
            Some(existing) => existing.touch(user, now),
            None => inner.users.push(UserProfile::new(user, now)),
        }
        Ok(())
    }

    async fn update_user_total(&self, user_id: i64, total: f64) -> Result<()> {
        let mut inner = self.inner.lock().expect("mem store lock");
        if let Some(u) = inner.users.iter_mut().find(|u| u.user_id == user_id) {
            u.total_expenses = total;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recompute_user_total;
    use belanja_core::category::Category;
    use chrono::{NaiveDate, NaiveTime};

    fn rec(user_id: i64, amount: f64) -> ExpenseRecord {
        ExpenseRecord {
            date: NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(),
            time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            user_id,
            username: "ali".to_string(),
            item: "Nasi".to_string(),
            amount,
            location: String::new(),
            category: Category::MakanMinum,
            photo_url: String::new(),
            notes: String::new(),
        }
    }

    fn user(id: i64) -> UserInfo {
        UserInfo {
            id,
            username: Some("ali".to_string()),
            first_name: "Ali".to_string(),
            last_name: None,
        }
    }

    #[tokio::test]
    async fn test_append_and_query_by_user() {
        let store = MemStore::new();
        store
            .append_expenses(&[rec(1, 10.0), rec(2, 99.0), rec(1, 5.0)])
            .await
            .unwrap();

        let mine = store.expenses_for_user(1).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|r| r.user_id == 1));
    }

    #[tokio::test]
    async fn test_register_is_idempotent_per_user() {
        let store = MemStore::new();
        let now = Utc::now();
        store.register_user(&user(1), now).await.unwrap();
        store.register_user(&user(1), now).await.unwrap();
        store.register_user(&user(2), now).await.unwrap();
        assert_eq!(store.all_users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_recompute_user_total() {
        let store = MemStore::new();
        store.register_user(&user(1), Utc::now()).await.unwrap();
        store
            .append_expenses(&[rec(1, 10.0), rec(1, 20.0), rec(1, 5.5)])
            .await
            .unwrap();

        let total = recompute_user_total(&store, 1).await.unwrap();
        assert_eq!(total, 35.5);
        let users = store.all_users().await.unwrap();
        assert_eq!(users[0].total_expenses, 35.5);
    }
}
