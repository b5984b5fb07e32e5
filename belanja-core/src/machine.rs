//! Conversation state machine for the expense input flow.
//!
//! [`step`] is a pure transition function: current session (if any) +
//! one inbound event in, next session + reply texts + optional commit
//! out. No IO happens here; the caller owns the session slot, persists
//! the commit, and sends the replies.
//!
//! Flow, mirroring the original bot:
//!
//! ```text
//! (idle) --parsed, no location--> AwaitingLocation
//! (idle) --parsed with location-> AwaitingAdditionalItems
//! AwaitingLocation --text/pin--> AwaitingAdditionalItems
//! AwaitingAdditionalItems --"tidak"/"selesai"--> AwaitingPhoto
//! AwaitingAdditionalItems --parsed--> AwaitingAdditionalItems (append)
//! AwaitingPhoto --photo--> AwaitingNotes
//! AwaitingPhoto --"skip"--> commit
//! AwaitingNotes --any text--> commit ("selesai" means: no notes)
//! ```
//!
//! Cancel is not an event: the command layer drops the session slot.

use chrono::{DateTime, Utc};

use crate::expense::{ParsedExpense, parse_expense};
use crate::session::{Awaiting, Session};

/// One inbound conversation event. Commands are filtered out before
/// the machine sees anything.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Text(String),
    Photo { file_url: String },
    Location { latitude: f64, longitude: f64 },
}

/// A finalized session plus the confirmation to send once it has been
/// persisted. The caller substitutes an error reply when the write
/// fails.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub session: Session,
    pub reply: String,
}

/// Result of one transition. `commit` being `Some` implies `session`
/// is `None` — the conversation is back to idle.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub session: Option<Session>,
    pub replies: Vec<String>,
    pub commit: Option<Commit>,
}

impl Outcome {
    fn stay(session: Session, reply: impl Into<String>) -> Self {
        Self {
            session: Some(session),
            replies: vec![reply.into()],
            commit: None,
        }
    }

    fn ignore(session: Option<Session>) -> Self {
        Self {
            session,
            replies: Vec::new(),
            commit: None,
        }
    }

    fn idle(reply: impl Into<String>) -> Self {
        Self {
            session: None,
            replies: vec![reply.into()],
            commit: None,
        }
    }

    fn commit(session: Session, reply: impl Into<String>) -> Self {
        Self {
            session: None,
            replies: Vec::new(),
            commit: Some(Commit {
                session,
                reply: reply.into(),
            }),
        }
    }
}

pub const MSG_PARSE_FAIL: &str = "🤔 Maaf, saya tidak faham format itu.\n\n💡 Contoh yang betul:\n• \"Nasi ayam RM10.50\"\n• \"Makan tengahari RM15 di Restoran ABC\"\n• \"Groceries RM45.80\"\n\nSila cuba lagi!";
pub const MSG_LOCATION_RECEIVED: &str =
    "📍 Lokasi diterima! Ada apa-apa lagi yang dibeli? Taip \"tidak\" jika sudah selesai.";
pub const MSG_PROMPT_PHOTO: &str =
    "📸 Boleh upload gambar resit? (Optional - taip \"skip\" untuk langkau)";
pub const MSG_PHOTO_RECEIVED: &str = "📸 Gambar diterima! Sekarang sila taip sebarang nota tambahan atau taip \"selesai\" untuk simpan.";
pub const MSG_SAVED: &str =
    "✅ Belanja berjaya disimpan! Taip belanja seterusnya bila-bila masa.";
pub const MSG_SAVED_COMPLETE: &str =
    "✅ Belanja berjaya disimpan dengan lengkap! Taip belanja seterusnya bila-bila masa.";
pub const MSG_REPROMPT_ADDITIONAL: &str = "🤔 Saya tidak faham. Taip item seterusnya (contoh: \"Kopi RM5\") atau \"tidak\" jika sudah selesai.";
pub const MSG_REPROMPT_PHOTO: &str =
    "📸 Hantar gambar resit, atau taip \"skip\" untuk langkau.";

fn prompt_location(primary: &ParsedExpense) -> String {
    format!(
        "💰 Rekod: {} - RM{:.2}\n\n📍 Di mana anda membelinya? (Taip nama tempat atau hantar lokasi)",
        primary.item, primary.amount
    )
}

fn prompt_anything_else(primary: &ParsedExpense, location: &str) -> String {
    format!(
        "💰 Rekod: {} - RM{:.2}\n📍 Lokasi: {}\n\nAda apa-apa lagi yang dibeli? Taip \"tidak\" jika sudah selesai.",
        primary.item, primary.amount, location
    )
}

fn ack_added(item: &ParsedExpense) -> String {
    format!(
        "✅ Ditambah: {} - RM{:.2}\n\nAda lagi? Taip \"tidak\" jika sudah selesai.",
        item.item, item.amount
    )
}

fn is_done_token(text: &str) -> bool {
    let t = text.trim().to_lowercase();
    t == "tidak" || t == "selesai"
}

/// Advance one conversation by one event.
pub fn step(session: Option<Session>, event: Inbound, now: DateTime<Utc>) -> Outcome {
    match session {
        None => start(event, now),
        Some(s) => advance(s, event),
    }
}

fn start(event: Inbound, now: DateTime<Utc>) -> Outcome {
    let Inbound::Text(text) = event else {
        // Photos and pins mean nothing without an open session.
        return Outcome::ignore(None);
    };

    match parse_expense(&text) {
        Some(parsed) => {
            let session = Session::open(parsed, now);
            let reply = match &session.location {
                None => prompt_location(&session.primary),
                Some(loc) => prompt_anything_else(&session.primary, loc),
            };
            Outcome::stay(session, reply)
        }
        None => Outcome::idle(MSG_PARSE_FAIL),
    }
}

fn advance(mut s: Session, event: Inbound) -> Outcome {
    match (s.awaiting, event) {
        (Awaiting::Location, Inbound::Text(text)) => {
            s.location = Some(text.trim().to_string());
            s.awaiting = Awaiting::AdditionalItems;
            Outcome::stay(s, MSG_LOCATION_RECEIVED)
        }
        (Awaiting::Location, Inbound::Location { latitude, longitude }) => {
            s.location = Some(format!("{latitude},{longitude}"));
            s.awaiting = Awaiting::AdditionalItems;
            Outcome::stay(s, MSG_LOCATION_RECEIVED)
        }

        (Awaiting::AdditionalItems, Inbound::Text(text)) => {
            if is_done_token(&text) {
                s.awaiting = Awaiting::Photo;
                return Outcome::stay(s, MSG_PROMPT_PHOTO);
            }
            match parse_expense(&text) {
                Some(item) => {
                    let ack = ack_added(&item);
                    s.additional.push(item);
                    Outcome::stay(s, ack)
                }
                None => Outcome::stay(s, MSG_REPROMPT_ADDITIONAL),
            }
        }

        (Awaiting::Photo, Inbound::Photo { file_url }) => {
            s.photo_url = Some(file_url);
            s.awaiting = Awaiting::Notes;
            Outcome::stay(s, MSG_PHOTO_RECEIVED)
        }
        (Awaiting::Photo, Inbound::Text(text)) => {
            if text.trim().eq_ignore_ascii_case("skip") {
                Outcome::commit(s, MSG_SAVED)
            } else {
                Outcome::stay(s, MSG_REPROMPT_PHOTO)
            }
        }

        (Awaiting::Notes, Inbound::Text(text)) => {
            if !text.trim().eq_ignore_ascii_case("selesai") {
                s.notes = Some(text.trim().to_string());
            }
            Outcome::commit(s, MSG_SAVED_COMPLETE)
        }

        // Photos and pins arriving in the wrong state are dropped.
        (_, _) => Outcome::ignore(Some(s)),
    }
}
