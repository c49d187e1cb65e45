//! Data access layer: user records and the store contract.

pub mod memory;
pub mod models;
pub mod store;

pub use memory::MemoryUserStore;
pub use models::{Plan, PublicUser, User};
pub use store::{PgUserStore, QuotaOutcome, UserStore};
