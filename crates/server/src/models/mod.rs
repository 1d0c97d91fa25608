//! Domain types for the server.

pub mod account;

pub use account::{AdminAccount, AdminPublic, UserAccount, UserPublic};
