// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tourdesk_audit::ActivityRecord;

use crate::data_models::ActivityRow;
use crate::diesel_schema::activity_records;
use crate::error::PersistenceError;
use crate::queries::bookings::booking_exists;

/// Retrieves a booking's activity timeline, oldest first.
///
/// Ties on `created_at` are broken by insertion order.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `booking_id` - The booking whose history to read
///
/// # Errors
///
/// Returns `PersistenceError::BookingNotFound` if the booking does not exist.
pub fn list_activity(
    conn: &mut SqliteConnection,
    booking_id: i64,
) -> Result<Vec<ActivityRecord>, PersistenceError> {
    if !booking_exists(conn, booking_id)? {
        return Err(PersistenceError::BookingNotFound(booking_id));
    }

    let rows: Vec<ActivityRow> = activity_records::table
        .filter(activity_records::booking_id.eq(booking_id))
        .order((
            activity_records::created_at.asc(),
            activity_records::activity_id.asc(),
        ))
        .select(ActivityRow::as_select())
        .load(conn)?;

    rows.into_iter().map(ActivityRecord::try_from).collect()
}
