//! Content renderers for each route.

pub mod compose;
pub mod detail;
pub mod history;
pub mod home;
pub mod login;
pub mod profile;
