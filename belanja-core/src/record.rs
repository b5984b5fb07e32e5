//! Persisted record types: expense rows and user profiles.
//!
//! Field names mirror the spreadsheet columns the records land in.
//! String fields that may be absent (location, photo, notes) are kept
//! as empty strings, matching the sheet representation.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// One expense row. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseRecord {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub user_id: i64,
    pub username: String,
    pub item: String,
    pub amount: f64,
    pub location: String,
    pub category: Category,
    pub photo_url: String,
    pub notes: String,
}

/// Transport-level identity of the person talking to the bot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

/// One row in the Users sheet. `total_expenses` is derived and
/// recomputed after every commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub user_id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub join_date: NaiveDate,
    pub last_active: DateTime<Utc>,
    pub total_expenses: f64,
}

impl UserProfile {
    /// Fresh profile for a user seen for the first time.
    pub fn new(user: &UserInfo, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone().unwrap_or_default(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone().unwrap_or_default(),
            join_date: now.date_naive(),
            last_active: now,
            total_expenses: 0.0,
        }
    }

    /// Refresh mutable identity fields on a returning user.
    pub fn touch(&mut self, user: &UserInfo, now: DateTime<Utc>) {
        if let Some(username) = &user.username {
            self.username = username.clone();
        }
        self.last_active = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user() -> UserInfo {
        UserInfo {
            id: 42,
            username: Some("aminah".to_string()),
            first_name: "Aminah".to_string(),
            last_name: None,
        }
    }

    #[test]
    fn test_new_profile_defaults() {
        let now = Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap();
        let p = UserProfile::new(&user(), now);
        assert_eq!(p.user_id, 42);
        assert_eq!(p.username, "aminah");
        assert_eq!(p.last_name, "");
        assert_eq!(p.join_date, now.date_naive());
        assert_eq!(p.total_expenses, 0.0);
    }

    #[test]
    fn test_touch_updates_last_active() {
        let t0 = Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2026, 8, 30, 9, 0, 0).unwrap();
        let mut p = UserProfile::new(&user(), t0);
        p.touch(&user(), t1);
        assert_eq!(p.last_active, t1);
        assert_eq!(p.join_date, t0.date_naive());
    }
}
