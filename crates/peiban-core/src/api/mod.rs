//! REST API client module for the Peiban backend.
//!
//! This module provides the `ApiClient` for the login exchanges, profile,
//! check-in and journal endpoints.
//!
//! Authenticated endpoints carry the session token as a bearer credential.
//! The token is opaque to the client and never inspected.

pub mod client;
pub mod error;

pub use client::{image_url, ApiClient, ImageUpload};
pub use error::ApiError;
