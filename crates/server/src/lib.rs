//! Clementine server - storefront and back-office API.
//!
//! Serves the public storefront user endpoints and the admin back-office
//! endpoints from one binary, with fully separate credential stores and
//! token trust domains for each.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
