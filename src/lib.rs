//! A small, concurrency-safe collection of name-keyed records (cookies).
//!
//! Records live in one ordered, unique-by-name collection per
//! [`CookieManager`]. A dedicated worker thread owns that collection and
//! applies updates one batch at a time; readers iterate the last published
//! version without locking.

pub mod config;
pub mod cookies;
pub mod errors;
pub mod manager;

pub use config::ManagerConfig;
pub use cookies::{Cookie, Record};
pub use errors::ManagerError;
pub use manager::{
    CloseOutcome, CookieManager, ManagerEvent, ManagerId, Snapshot, StoreOutcome, Subscription,
};
