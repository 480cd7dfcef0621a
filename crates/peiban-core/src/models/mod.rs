//! Data models for Peiban entities.
//!
//! - `User`, `Gender`, `ProfileUpdate`: account identity and profile edits
//! - `CheckinRecord`, `CheckinStatus`, `CheckinCalendar`: daily check-ins
//! - `LogEntry`, `LogPage`: photo + text journal entries
//! - Auth exchange payloads: `LoginResponse`, `SendCodeResponse`

pub mod auth;
pub mod checkin;
pub mod log;
pub mod user;

pub use auth::{HealthStatus, LoginResponse, SendCodeResponse};
pub use checkin::{CheckinCalendar, CheckinRecord, CheckinStatus};
pub use log::{LogEntry, LogPage};
pub use user::{AvatarResponse, Gender, ProfileUpdate, User};
