// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for Tourdesk.
//!
//! This crate stores bookings, their activity timelines, guides and guide
//! payouts in `SQLite` through Diesel.
//!
//! ## Write Discipline
//!
//! - A booking write and its activity record share one transaction.
//! - Booking updates are compare-and-swap on the `version` column. A writer
//!   holding a stale version gets `VersionConflict` and nothing is written.
//! - Payout settlement is compare-and-swap on `status = 'pending'`.
//! - A unique index on `(guide_id, period_start, period_end)` rejects a second
//!   payout for the same guide and window. A partial unique index allows at
//!   most one pending windowless payout per guide.
//! - Read-then-write sequences that check the payout ledger run inside
//!   [`Persistence::immediate_transaction`], which takes the write lock first.
//! - Activity records are never updated or deleted.
//!
//! ## Testing Philosophy
//!
//! - Tests run against isolated in-memory databases (`new_in_memory`)
//! - Migrations are embedded and applied on every connection

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use diesel::SqliteConnection;
use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;
use tourdesk::BookingTransition;
use tourdesk_audit::ActivityRecord;
use tourdesk_domain::{Booking, Guide, PayoutRecord, RevenueQuery};
use tracing::{info, warn};

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use error::PersistenceError;
pub use queries::BookingFilter;

/// Type alias kept for call sites that name the backend explicitly.
pub type SqlitePersistence = Persistence;

/// A booking as stored, together with the activity record written with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedBooking {
    pub booking: Booking,
    /// `None` when the transition was a no-op and nothing was written.
    pub activity: Option<ActivityRecord>,
}

/// Persistence adapter for bookings, activity, guides and payouts.
pub struct Persistence {
    pub(crate) conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique shared-cache database via atomic counter,
    /// so tests are isolated from one another.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String =
            format!("file:memdb_tourdesk_{db_id}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;
        backend::sqlite::enable_wal_mode(&mut conn)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        backend::sqlite::verify_foreign_key_enforcement(&mut self.conn)
    }

    /// Runs `f` inside a single `BEGIN IMMEDIATE` transaction.
    ///
    /// The database write lock is held from the first statement, so reads in
    /// `f` see the state its writes commit against. Persistence calls made
    /// inside `f` nest as savepoints. Commits when `f` returns `Ok`, rolls back
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or a `PersistenceError` if the transaction
    /// cannot be started or committed.
    pub fn immediate_transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<PersistenceError>,
    {
        AnsiTransactionManager::begin_transaction_sql(&mut self.conn, "BEGIN IMMEDIATE")
            .map_err(PersistenceError::from)?;

        match f(self) {
            Ok(value) => {
                AnsiTransactionManager::commit_transaction(&mut self.conn)
                    .map_err(PersistenceError::from)?;
                Ok(value)
            }
            Err(err) => {
                let rollback = AnsiTransactionManager::rollback_transaction(&mut self.conn);
                if let Err(rollback_err) = rollback {
                    warn!(error = %rollback_err, "Rollback of immediate transaction failed");
                }
                Err(err)
            }
        }
    }

    // ========================================================================
    // Guides
    // ========================================================================

    /// Registers a guide.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_guide(
        &mut self,
        name: &str,
        phone: Option<&str>,
        is_active: bool,
        now: OffsetDateTime,
    ) -> Result<Guide, PersistenceError> {
        let guide_id: i64 = mutations::insert_guide(&mut self.conn, name, phone, is_active, now)?;
        queries::get_guide(&mut self.conn, guide_id)
    }

    /// Retrieves a guide by ID.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::GuideNotFound` if no such guide exists.
    pub fn get_guide(&mut self, guide_id: i64) -> Result<Guide, PersistenceError> {
        queries::get_guide(&mut self.conn, guide_id)
    }

    /// Lists all guides, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_guides(&mut self) -> Result<Vec<Guide>, PersistenceError> {
        queries::list_guides(&mut self.conn)
    }

    /// Sets a guide's active flag and returns the updated guide.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::GuideNotFound` if no such guide exists.
    pub fn set_guide_active(
        &mut self,
        guide_id: i64,
        is_active: bool,
    ) -> Result<Guide, PersistenceError> {
        mutations::set_guide_active(&mut self.conn, guide_id, is_active)?;
        queries::get_guide(&mut self.conn, guide_id)
    }

    // ========================================================================
    // Bookings
    // ========================================================================

    /// Persists a newly created booking and its `created` activity record.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::UniqueViolation` if the booking reference is
    /// already taken; nothing is written in that case.
    pub fn insert_booking(
        &mut self,
        transition: &BookingTransition,
    ) -> Result<PersistedBooking, PersistenceError> {
        self.conn.transaction::<_, PersistenceError, _>(|conn| {
            let booking_id: i64 = mutations::insert_booking(conn, &transition.new_booking)?;

            let activity: Option<ActivityRecord> = match &transition.activity {
                Some(record) => {
                    let mut bound: ActivityRecord = record.for_booking(booking_id);
                    bound.activity_id = Some(mutations::insert_activity(conn, &bound)?);
                    Some(bound)
                }
                None => None,
            };

            let booking: Booking = queries::get_booking(conn, booking_id)?;
            info!(booking_id, reference = %booking.booking_reference, "Booking created");
            Ok(PersistedBooking { booking, activity })
        })
    }

    /// Persists a transition on an existing booking.
    ///
    /// The booking row is rewritten only if it still carries
    /// `expected_version`; the activity record is appended in the same
    /// transaction. A no-op transition writes nothing.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::VersionConflict` if another writer got
    /// there first, or `BookingNotFound` if the booking does not exist.
    pub fn persist_booking_transition(
        &mut self,
        transition: &BookingTransition,
        expected_version: i64,
        now: OffsetDateTime,
    ) -> Result<PersistedBooking, PersistenceError> {
        if transition.is_noop() {
            return Ok(PersistedBooking {
                booking: transition.new_booking.clone(),
                activity: None,
            });
        }

        self.conn.transaction::<_, PersistenceError, _>(|conn| {
            mutations::update_booking(conn, &transition.new_booking, expected_version, now)?;

            let activity: Option<ActivityRecord> = match &transition.activity {
                Some(record) => {
                    let mut stored: ActivityRecord = record.clone();
                    stored.activity_id = Some(mutations::insert_activity(conn, &stored)?);
                    Some(stored)
                }
                None => None,
            };

            let booking_id: i64 = transition.new_booking.booking_id.ok_or_else(|| {
                PersistenceError::SerializationError(String::from("booking has no id"))
            })?;
            let booking: Booking = queries::get_booking(conn, booking_id)?;
            Ok(PersistedBooking { booking, activity })
        })
    }

    /// Retrieves a booking by ID.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::BookingNotFound` if no such booking exists.
    pub fn get_booking(&mut self, booking_id: i64) -> Result<Booking, PersistenceError> {
        queries::get_booking(&mut self.conn, booking_id)
    }

    /// Retrieves a booking by reference.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::BookingReferenceNotFound` if no booking carries it.
    pub fn get_booking_by_reference(
        &mut self,
        reference: &str,
    ) -> Result<Booking, PersistenceError> {
        queries::get_booking_by_reference(&mut self.conn, reference)
    }

    /// Lists bookings matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_bookings(
        &mut self,
        filter: &BookingFilter,
    ) -> Result<Vec<Booking>, PersistenceError> {
        queries::list_bookings(&mut self.conn, filter)
    }

    /// Reads the booking set for revenue aggregation from a single snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn revenue_snapshot(
        &mut self,
        query: &RevenueQuery,
    ) -> Result<Vec<Booking>, PersistenceError> {
        let filter: BookingFilter = BookingFilter {
            status: query.status_filter,
            payment_status: None,
            guide_id: query.guide_id,
            date_from: query.date_from,
            date_to: query.date_to,
        };
        self.conn
            .transaction::<_, PersistenceError, _>(|conn| queries::list_bookings(conn, &filter))
    }

    // ========================================================================
    // Activity
    // ========================================================================

    /// Retrieves a booking's activity timeline, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::BookingNotFound` if the booking does not exist.
    pub fn list_activity(
        &mut self,
        booking_id: i64,
    ) -> Result<Vec<ActivityRecord>, PersistenceError> {
        queries::list_activity(&mut self.conn, booking_id)
    }

    // ========================================================================
    // Payouts
    // ========================================================================

    /// Persists a pending payout.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::UniqueViolation` for a duplicate
    /// `(guide, window)` or a second pending windowless payout for the guide,
    /// or `GuideNotFound` if the guide does not exist.
    pub fn insert_payout(
        &mut self,
        record: &PayoutRecord,
    ) -> Result<PayoutRecord, PersistenceError> {
        self.conn.transaction::<_, PersistenceError, _>(|conn| {
            queries::get_guide(conn, record.guide_id)?;
            let payout_id: i64 = mutations::insert_payout(conn, record)?;
            queries::get_payout(conn, payout_id)
        })
    }

    /// Persists the settlement of a pending payout.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::PayoutNotPending` if another writer settled
    /// it first, or `PayoutNotFound` if it does not exist.
    pub fn settle_payout(
        &mut self,
        settled: &PayoutRecord,
    ) -> Result<PayoutRecord, PersistenceError> {
        self.conn.transaction::<_, PersistenceError, _>(|conn| {
            mutations::settle_payout(conn, settled)?;
            let payout_id: i64 = settled.payout_id.ok_or_else(|| {
                PersistenceError::SerializationError(String::from("payout has no id"))
            })?;
            queries::get_payout(conn, payout_id)
        })
    }

    /// Retrieves a payout by ID.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::PayoutNotFound` if no such payout exists.
    pub fn get_payout(&mut self, payout_id: i64) -> Result<PayoutRecord, PersistenceError> {
        queries::get_payout(&mut self.conn, payout_id)
    }

    /// Lists payouts, newest first, optionally for one guide.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_payouts(
        &mut self,
        guide_id: Option<i64>,
    ) -> Result<Vec<PayoutRecord>, PersistenceError> {
        queries::list_payouts(&mut self.conn, guide_id)
    }
}
