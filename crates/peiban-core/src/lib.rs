//! Core library for the Peiban check-in and journal client.
//!
//! - `api`: REST client for the Peiban backend
//! - `auth`: session store, route guard and token storage
//! - `models`: data types returned by the backend
//! - `config`: application configuration
//! - `validate`: client-side input checks shared by every front end

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod validate;

pub use api::{ApiClient, ApiError};
pub use auth::{guard, GuardDecision, Route, Session, SessionState, SessionStore};
pub use config::Config;
