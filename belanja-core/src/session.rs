//! In-progress expense entry sessions and the keyed session store.
//!
//! A session holds everything a conversation has told us since the
//! first parsed expense line: the primary item, any follow-up items,
//! the shared location/photo/notes, and the single pending-input flag.
//! Sessions are ephemeral — they live in memory until committed or
//! cancelled, and do not survive a restart.
//!
//! The store hands out one lock slot per conversation. Holding the slot
//! lock across an event's full processing serializes that conversation
//! without blocking any other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::sync::Mutex as AsyncMutex;

use crate::expense::ParsedExpense;
use crate::record::{ExpenseRecord, UserInfo};

/// What the conversation is waiting for next. Exactly one variant at a
/// time; an open session is always waiting for something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Awaiting {
    Location,
    AdditionalItems,
    Photo,
    Notes,
}

/// One conversation's uncommitted expense entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub primary: ParsedExpense,
    pub additional: Vec<ParsedExpense>,
    /// Shared location, used by every item that has none of its own.
    pub location: Option<String>,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    /// Creation instant; all items in the session are dated with it.
    pub opened_at: DateTime<Utc>,
    pub awaiting: Awaiting,
}

impl Session {
    /// Open a session from the first parsed expense. If the parse
    /// already carried a location we skip straight to asking for more
    /// items.
    pub fn open(primary: ParsedExpense, opened_at: DateTime<Utc>) -> Self {
        let location = primary.location.clone();
        let awaiting = if location.is_some() {
            Awaiting::AdditionalItems
        } else {
            Awaiting::Location
        };
        Self {
            primary,
            additional: Vec::new(),
            location,
            photo_url: None,
            notes: None,
            opened_at,
            awaiting,
        }
    }

    pub fn item_count(&self) -> usize {
        1 + self.additional.len()
    }

    /// Finalize into one record per item (primary first). All records
    /// share the session date/time/photo/notes; an item's own location
    /// wins over the shared one.
    pub fn into_records(self, user: &UserInfo, tz: Tz) -> Vec<ExpenseRecord> {
        let local = self.opened_at.with_timezone(&tz);
        let date = local.date_naive();
        let time = local.time();
        let shared_location = self.location.unwrap_or_default();
        let photo_url = self.photo_url.unwrap_or_default();
        let notes = self.notes.unwrap_or_default();
        let username = user.username.clone().unwrap_or_default();

        let mut items = Vec::with_capacity(1 + self.additional.len());
        items.push(self.primary);
        items.extend(self.additional);

        items
            .into_iter()
            .map(|item| ExpenseRecord {
                date,
                time,
                user_id: user.id,
                username: username.clone(),
                item: item.item,
                amount: item.amount,
                location: item.location.unwrap_or_else(|| shared_location.clone()),
                category: item.category,
                photo_url: photo_url.clone(),
                notes: notes.clone(),
            })
            .collect()
    }
}

/// One lockable slot per conversation.
pub type SessionSlot = Arc<AsyncMutex<Option<Session>>>;

/// Keyed store of at-most-one session per conversation id.
#[derive(Debug, Default)]
pub struct SessionStore {
    slots: Mutex<HashMap<i64, SessionSlot>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the slot for a conversation. Callers lock the
    /// returned slot for the duration of one event's processing.
    pub fn slot(&self, chat_id: i64) -> SessionSlot {
        let mut slots = self.slots.lock().expect("session slot map");
        slots.entry(chat_id).or_default().clone()
    }

    /// Discard any open session for the conversation. Returns whether
    /// one existed.
    pub async fn cancel(&self, chat_id: i64) -> bool {
        let slot = self.slot(chat_id);
        let mut guard = slot.lock().await;
        guard.take().is_some()
    }

    /// True when the conversation has an open session.
    pub async fn is_open(&self, chat_id: i64) -> bool {
        let slot = self.slot(chat_id);
        slot.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use chrono::TimeZone;
    use chrono_tz::Asia::Kuala_Lumpur;

    fn expense(item: &str, amount: f64, location: Option<&str>) -> ParsedExpense {
        ParsedExpense {
            item: item.to_string(),
            amount,
            location: location.map(str::to_string),
            category: crate::category::categorize(item),
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

    #[test]
    fn test_open_without_location_awaits_location() {
        let s = Session::open(expense("Nasi ayam", 10.5, None), Utc::now());
        assert_eq!(s.awaiting, Awaiting::Location);
        assert_eq!(s.location, None);
    }

    #[test]
    fn test_open_with_location_awaits_additional_items() {
        let s = Session::open(expense("Makan", 15.0, Some("Restoran ABC")), Utc::now());
        assert_eq!(s.awaiting, Awaiting::AdditionalItems);
        assert_eq!(s.location.as_deref(), Some("Restoran ABC"));
    }

    #[test]
    fn test_into_records_shares_session_fields() {
        // 18:30 UTC = 02:30 next day in Kuala Lumpur.
        let opened = Utc.with_ymd_and_hms(2026, 8, 29, 18, 30, 0).unwrap();
        let mut s = Session::open(expense("Nasi ayam", 10.5, None), opened);
        s.location = Some("Kedai Pak Mat".to_string());
        s.additional.push(expense("Kopi", 3.0, None));
        s.additional.push(expense("Teh tarik", 2.5, Some("Mamak Bistro")));
        s.notes = Some("makan malam".to_string());

        let records = s.into_records(&user(), Kuala_Lumpur);
        assert_eq!(records.len(), 3);
        for r in &records {
            assert_eq!(r.date, chrono::NaiveDate::from_ymd_opt(2026, 8, 30).unwrap());
            assert_eq!(r.user_id, 7);
            assert_eq!(r.notes, "makan malam");
        }
        assert_eq!(records[0].item, "Nasi ayam");
        assert_eq!(records[0].location, "Kedai Pak Mat");
        assert_eq!(records[1].location, "Kedai Pak Mat");
        // Item-level location overrides the shared one.
        assert_eq!(records[2].location, "Mamak Bistro");
        assert_eq!(records[2].category, Category::MakanMinum);
    }

    #[tokio::test]
    async fn test_store_cancel_clears_slot() {
        let store = SessionStore::new();
        {
            let slot = store.slot(1);
            *slot.lock().await = Some(Session::open(expense("Nasi", 5.0, None), Utc::now()));
        }
        assert!(store.is_open(1).await);
        assert!(store.cancel(1).await);
        assert!(!store.is_open(1).await);
        // Cancelling again is a no-op.
        assert!(!store.cancel(1).await);
    }

    #[tokio::test]
    async fn test_store_slots_are_per_conversation() {
        let store = SessionStore::new();
        let a = store.slot(1);
        let b = store.slot(2);
        let _guard = a.lock().await;
        // Locking chat 1 must not block chat 2.
        assert!(b.try_lock().is_ok());
        // Same chat id returns the same slot.
        assert!(store.slot(1).try_lock().is_err());
    }
}
