//! belanja-core: domain logic for the Belanja expense-tracking bots.
//!
//! Everything here is transport- and storage-agnostic: parsing free
//! text into expenses, categorizing them, driving the per-conversation
//! entry session, and aggregating persisted records into reports.

pub mod category;
pub mod expense;
pub mod machine;
pub mod record;
pub mod report;
pub mod session;
pub mod time;

pub use category::{Category, categorize};
pub use expense::{ParsedExpense, parse_expense};
pub use machine::{Commit, Inbound, Outcome, step};
pub use record::{ExpenseRecord, UserInfo, UserProfile};
pub use session::{Awaiting, Session, SessionSlot, SessionStore};
