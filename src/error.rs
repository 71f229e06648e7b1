//! Error and rejection types for contact store operations.

use thiserror::Error;

/// A storage-layer failure. These are never recovered locally.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A unique or referential constraint was violated at the storage layer,
    /// typically because another writer got past a guard check first.
    #[error("Constraint violated: {0}")]
    Constraint(String),

    /// A value exceeds the width of its `VARCHAR` column.
    #[error("Value too long: {0}")]
    ValueTooLong(String),

    #[error("Table {0} does not exist")]
    MissingTable(&'static str),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Broad category of a [`Rejection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    NotFound,
    Conflict,
}

/// A business-rule failure caught by a guard lookup.
///
/// Rejections are reported outcomes, not errors: the store is left unchanged
/// by the rejected part of the operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Client with client_id = {0} does not exist")]
    ClientNotFound(i32),

    #[error("Phone number {0} does not exist")]
    PhoneNotFound(String),

    #[error("Client with client_id = {client_id} has no phone with phone_id = {phone_id}")]
    PhoneNotOwned { client_id: i32, phone_id: i32 },

    #[error("Client with email = {0} already exists")]
    EmailTaken(String),

    #[error("Phone number {0} is already taken")]
    PhoneTaken(String),
}

impl Rejection {
    pub fn kind(&self) -> RejectionKind {
        match self {
            Rejection::ClientNotFound(_)
            | Rejection::PhoneNotFound(_)
            | Rejection::PhoneNotOwned { .. } => RejectionKind::NotFound,
            Rejection::EmailTaken(_) | Rejection::PhoneTaken(_) => RejectionKind::Conflict,
        }
    }
}

/// Result of a guarded operation: the storage call succeeded, and the inner
/// result says whether the business rules allowed the change.
pub type Outcome<T> = std::result::Result<T, Rejection>;
