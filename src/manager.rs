// src/manager.rs
//! The cookie manager: a collection owned by one worker, fed through a queue.

mod command;
mod events;
mod manager;
mod snapshot;
mod state;
mod worker;

pub use command::CloseOutcome;
pub use command::StoreOutcome;
pub use events::ManagerEvent;
pub use events::Subscription;
pub use manager::CookieManager;
pub use manager::ManagerId;
pub use snapshot::Snapshot;
