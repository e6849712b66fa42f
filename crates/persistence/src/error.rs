// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::result::DatabaseErrorKind;

/// Errors that can occur during persistence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// A database error occurred.
    DatabaseError(String),
    /// Database connection failed.
    DatabaseConnectionFailed(String),
    /// Database migration failed.
    MigrationFailed(String),
    /// Query execution failed.
    QueryFailed(String),
    /// The requested booking was not found.
    BookingNotFound(i64),
    /// No booking carries the requested reference.
    BookingReferenceNotFound(String),
    /// The requested guide was not found.
    GuideNotFound(i64),
    /// The requested payout was not found.
    PayoutNotFound(i64),
    /// The booking row changed since it was read.
    VersionConflict {
        booking_id: i64,
        expected_version: i64,
    },
    /// The payout was settled by another writer.
    PayoutNotPending(i64),
    /// A unique constraint rejected the write.
    UniqueViolation(String),
    /// A stored row could not be turned back into a domain value.
    ReconstructionError(String),
    /// Serialization/deserialization error.
    SerializationError(String),
    /// Initialization error.
    InitializationError(String),
    /// Foreign key enforcement is not enabled.
    ForeignKeyEnforcementNotEnabled,
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::DatabaseConnectionFailed(msg) => {
                write!(f, "Database connection failed: {msg}")
            }
            Self::MigrationFailed(msg) => write!(f, "Migration failed: {msg}"),
            Self::QueryFailed(msg) => write!(f, "Query failed: {msg}"),
            Self::BookingNotFound(id) => write!(f, "Booking not found: {id}"),
            Self::BookingReferenceNotFound(reference) => {
                write!(f, "Booking not found: {reference}")
            }
            Self::GuideNotFound(id) => write!(f, "Guide not found: {id}"),
            Self::PayoutNotFound(id) => write!(f, "Payout not found: {id}"),
            Self::VersionConflict {
                booking_id,
                expected_version,
            } => {
                write!(
                    f,
                    "Booking {booking_id} was modified after version {expected_version} was read; refetch and retry"
                )
            }
            Self::PayoutNotPending(id) => {
                write!(f, "Payout {id} is no longer pending; refetch and retry")
            }
            Self::UniqueViolation(msg) => write!(f, "Duplicate record: {msg}"),
            Self::ReconstructionError(msg) => write!(f, "Record reconstruction error: {msg}"),
            Self::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
            Self::InitializationError(msg) => write!(f, "Initialization error: {msg}"),
            Self::ForeignKeyEnforcementNotEnabled => {
                write!(f, "Foreign key enforcement is not enabled")
            }
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<diesel::result::Error> for PersistenceError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::UniqueViolation(info.message().to_string())
            }
            _ => Self::DatabaseError(err.to_string()),
        }
    }
}

impl From<diesel::ConnectionError> for PersistenceError {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::DatabaseConnectionFailed(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<tourdesk_domain::DomainError> for PersistenceError {
    fn from(err: tourdesk_domain::DomainError) -> Self {
        Self::ReconstructionError(err.to_string())
    }
}
