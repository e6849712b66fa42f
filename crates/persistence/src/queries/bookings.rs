// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Booking queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use time::Date;
use tourdesk_domain::{Booking, BookingStatus, PaymentStatus, format_date};
use tracing::debug;

use crate::data_models::BookingRow;
use crate::diesel_schema::bookings;
use crate::error::PersistenceError;

/// Optional filters for listing bookings. Unset fields match everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub guide_id: Option<i64>,
    /// Inclusive lower bound on visit date.
    pub date_from: Option<Date>,
    /// Inclusive upper bound on visit date.
    pub date_to: Option<Date>,
}

/// Retrieves a booking by ID.
///
/// # Errors
///
/// Returns `PersistenceError::BookingNotFound` if no such booking exists.
pub fn get_booking(
    conn: &mut SqliteConnection,
    booking_id: i64,
) -> Result<Booking, PersistenceError> {
    debug!(booking_id, "Looking up booking");

    let row: Option<BookingRow> = bookings::table
        .filter(bookings::booking_id.eq(booking_id))
        .select(BookingRow::as_select())
        .first(conn)
        .optional()?;

    row.ok_or(PersistenceError::BookingNotFound(booking_id))?
        .try_into()
}

/// Retrieves a booking by its human-facing reference.
///
/// # Errors
///
/// Returns `PersistenceError::BookingReferenceNotFound` if no booking carries it.
pub fn get_booking_by_reference(
    conn: &mut SqliteConnection,
    reference: &str,
) -> Result<Booking, PersistenceError> {
    let row: Option<BookingRow> = bookings::table
        .filter(bookings::booking_reference.eq(reference))
        .select(BookingRow::as_select())
        .first(conn)
        .optional()?;

    row.ok_or_else(|| PersistenceError::BookingReferenceNotFound(reference.to_string()))?
        .try_into()
}

/// Returns true if a booking with this ID exists.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn booking_exists(
    conn: &mut SqliteConnection,
    booking_id: i64,
) -> Result<bool, PersistenceError> {
    let count: i64 = bookings::table
        .filter(bookings::booking_id.eq(booking_id))
        .count()
        .get_result(conn)?;
    Ok(count > 0)
}

/// Lists bookings matching `filter`, ordered by visit date then ID.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be reconstructed.
pub fn list_bookings(
    conn: &mut SqliteConnection,
    filter: &BookingFilter,
) -> Result<Vec<Booking>, PersistenceError> {
    let mut query: bookings::BoxedQuery<'_, Sqlite> = bookings::table.into_boxed();

    if let Some(status) = filter.status {
        query = query.filter(bookings::status.eq(status.as_str()));
    }
    if let Some(payment_status) = filter.payment_status {
        query = query.filter(bookings::payment_status.eq(payment_status.as_str()));
    }
    if let Some(guide_id) = filter.guide_id {
        query = query.filter(bookings::assigned_guide_id.eq(guide_id));
    }
    if let Some(from) = filter.date_from {
        query = query.filter(bookings::visit_date.ge(format_date(from)?));
    }
    if let Some(to) = filter.date_to {
        query = query.filter(bookings::visit_date.le(format_date(to)?));
    }

    let rows: Vec<BookingRow> = query
        .order((bookings::visit_date.asc(), bookings::booking_id.asc()))
        .select(BookingRow::as_select())
        .load(conn)?;

    debug!(count = rows.len(), "Loaded bookings");

    rows.into_iter().map(Booking::try_from).collect()
}
