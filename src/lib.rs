//! Clients and their phone numbers in PostgreSQL.
//!
//! [`ContactStore`] holds the business rules and drives any
//! [`ContactBackend`]: a `sqlx::PgConnection` owned by the caller, or the
//! in-memory [`MemoryBackend`].

pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod memory;
pub mod models;
pub mod store;

pub use backend::ContactBackend;
pub use config::Config;
pub use error::{Outcome, Rejection, RejectionKind, StoreError};
pub use memory::MemoryBackend;
pub use models::{Client, ClientQuery, ClientUpdate, NewClient, Phone};
pub use store::{AddedClient, ContactStore, DeletedClient, PhoneChange, UpdatedClient};
