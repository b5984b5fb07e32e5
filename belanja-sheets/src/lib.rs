//! belanja-sheets: persistence for expense records and user profiles.
//!
//! The bots talk to a [`BelanjaStore`] trait object; backends are an
//! in-memory store (tests, throwaway runs), an append-only JSONL file
//! store, and — behind the `gsheets` feature — the Google Sheets
//! spreadsheet the original deployment used.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use belanja_core::record::{ExpenseRecord, UserInfo, UserProfile};

pub mod jsonl;
pub mod mem;
#[cfg(feature = "gsheets")]
pub mod sheets;

pub use jsonl::JsonlStore;
pub use mem::MemStore;
#[cfg(feature = "gsheets")]
pub use sheets::SheetsStore;

/// Narrow persistence contract the bots are written against.
///
/// No transactional guarantee: a multi-record append may partially
/// fail, and callers treat any error as "the whole write failed".
#[async_trait]
pub trait BelanjaStore: Send + Sync {
    /// Append finalized expense rows.
    async fn append_expenses(&self, records: &[ExpenseRecord]) -> Result<()>;

    /// All expense rows for one user, oldest first.
    async fn expenses_for_user(&self, user_id: i64) -> Result<Vec<ExpenseRecord>>;

    /// Every known user profile (broadcast targets).
    async fn all_users(&self) -> Result<Vec<UserProfile>>;

    /// Insert a first-time user, or refresh last-active on a returning
    /// one.
    async fn register_user(&self, user: &UserInfo, now: DateTime<Utc>) -> Result<()>;

    /// Overwrite the derived running total on a user profile.
    async fn update_user_total(&self, user_id: i64, total: f64) -> Result<()>;
}

/// Re-derive a user's running total from their expense rows and write
/// it back. Called after every commit.
pub async fn recompute_user_total(store: &dyn BelanjaStore, user_id: i64) -> Result<f64> {
    let records = store.expenses_for_user(user_id).await?;
    let total = belanja_core::report::total(&records);
    store.update_user_total(user_id, total).await?;
    Ok(total)
}
