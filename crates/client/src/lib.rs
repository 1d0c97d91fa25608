//! Clementine API client.
//!
//! A thin HTTP client for the Clementine server that manages two
//! independent token sessions, one per trust domain, and selects which one
//! to attach purely from the request's destination path.

#![cfg_attr(not(test), forbid(unsafe_code))]

mod client;
mod destination;
mod error;
mod session;

pub use client::ApiClient;
pub use destination::Destination;
pub use error::ClientError;
pub use session::{SessionState, SessionView};
