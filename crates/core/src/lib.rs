//! Clementine Core - Shared types library.
//!
//! This crate provides common types used across all Clementine components:
//! - `server` - REST backend (storefront and admin APIs)
//! - `client` - API client with dual-token session handling
//! - `cli` - Command-line tools for migrations and admin provisioning
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
