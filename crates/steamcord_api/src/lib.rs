//! Client for the Steamcord HTTP API.
//!
//! The [`RemoteAccountService`] trait is what the plugin talks to;
//! [`SteamcordApiClient`] implements it over HTTP. Failures are always
//! returned as [`ApiError`], and every non-success status is logged with a
//! hint about its likely cause.

pub mod client;
pub mod error;

pub use client::{ActionBatch, RemoteAccountService, SteamcordApiClient, DEFAULT_BASE_URI};
pub use error::{status_message, ApiError, ApiResult};
