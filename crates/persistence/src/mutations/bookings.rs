// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Booking writes.
//!
//! Updates are compare-and-swap on the `version` column: a write lands only
//! if the row still carries the version the caller read.

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::OffsetDateTime;
use tourdesk_domain::Booking;
use tracing::{debug, warn};

use crate::backend::sqlite::get_last_insert_rowid;
use crate::data_models::BookingValues;
use crate::diesel_schema::bookings;
use crate::error::PersistenceError;
use crate::queries::bookings::booking_exists;

/// Inserts a new booking.
///
/// # Returns
///
/// The booking ID assigned by the database.
///
/// # Errors
///
/// Returns `PersistenceError::UniqueViolation` if the reference is taken,
/// or another error if the insert fails.
pub fn insert_booking(
    conn: &mut SqliteConnection,
    booking: &Booking,
) -> Result<i64, PersistenceError> {
    let values: BookingValues = BookingValues::from_booking(booking, booking.created_at)?;

    diesel::insert_into(bookings::table)
        .values(&values)
        .execute(conn)?;

    let booking_id: i64 = get_last_insert_rowid(conn)?;
    debug!(
        booking_id,
        reference = %booking.booking_reference,
        "Inserted booking"
    );
    Ok(booking_id)
}

/// Rewrites a booking row if it still carries `expected_version`.
///
/// # Arguments
///
/// * `conn` - The active database connection
/// * `booking` - The new booking value; must carry its ID
/// * `expected_version` - The version the caller read
/// * `updated_at` - The time of the write
///
/// # Errors
///
/// Returns an error if:
/// - The booking does not exist (`BookingNotFound`)
/// - The row moved past `expected_version` (`VersionConflict`)
/// - The update fails
pub fn update_booking(
    conn: &mut SqliteConnection,
    booking: &Booking,
    expected_version: i64,
    updated_at: OffsetDateTime,
) -> Result<(), PersistenceError> {
    let booking_id: i64 = booking.booking_id.ok_or_else(|| {
        PersistenceError::SerializationError(String::from("cannot update an unsaved booking"))
    })?;
    let values: BookingValues = BookingValues::from_booking(booking, updated_at)?;

    let rows_affected: usize = diesel::update(
        bookings::table
            .filter(bookings::booking_id.eq(booking_id))
            .filter(bookings::version.eq(expected_version)),
    )
    .set(&values)
    .execute(conn)?;

    if rows_affected == 0 {
        if !booking_exists(conn, booking_id)? {
            return Err(PersistenceError::BookingNotFound(booking_id));
        }
        warn!(booking_id, expected_version, "Booking version conflict");
        return Err(PersistenceError::VersionConflict {
            booking_id,
            expected_version,
        });
    }

    debug!(booking_id, version = booking.version, "Updated booking");
    Ok(())
}
