// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use num_traits::ToPrimitive;
use tourdesk_domain::{PayoutRecord, PayoutStatus, format_date};
use tracing::info;

use crate::backend::sqlite::get_last_insert_rowid;
use crate::data_models::format_timestamp;
use crate::diesel_schema::payout_records;
use crate::error::PersistenceError;

/// Inserts a pending payout.
///
/// # Returns
///
/// The payout ID assigned by the database.
///
/// # Errors
///
/// Returns `PersistenceError::UniqueViolation` if the guide already has a
/// payout for the same window, or another error if the insert fails.
pub fn insert_payout(
    conn: &mut SqliteConnection,
    record: &PayoutRecord,
) -> Result<i64, PersistenceError> {
    let tours_count: i32 = record.tours_count.to_i32().ok_or_else(|| {
        PersistenceError::SerializationError(format!(
            "tours count {} does not fit the schema",
            record.tours_count
        ))
    })?;
    let period_start: Option<String> = record.window.period_start.map(format_date).transpose()?;
    let period_end: Option<String> = record.window.period_end.map(format_date).transpose()?;

    diesel::insert_into(payout_records::table)
        .values((
            payout_records::guide_id.eq(record.guide_id),
            payout_records::amount.eq(record.amount),
            payout_records::tours_count.eq(tours_count),
            payout_records::period_start.eq(period_start),
            payout_records::period_end.eq(period_end),
            payout_records::status.eq(record.status.as_str()),
            payout_records::notes.eq(record.notes.as_deref()),
            payout_records::created_at.eq(format_timestamp(record.created_at)?),
        ))
        .execute(conn)?;

    let payout_id: i64 = get_last_insert_rowid(conn)?;
    info!(
        payout_id,
        guide_id = record.guide_id,
        amount = record.amount,
        "Recorded pending payout"
    );
    Ok(payout_id)
}

/// Writes settlement fields, provided the row is still pending.
///
/// # Errors
///
/// Returns an error if:
/// - The payout does not exist (`PayoutNotFound`)
/// - The payout was already settled (`PayoutNotPending`)
/// - The update fails
pub fn settle_payout(
    conn: &mut SqliteConnection,
    settled: &PayoutRecord,
) -> Result<(), PersistenceError> {
    let payout_id: i64 = settled.payout_id.ok_or_else(|| {
        PersistenceError::SerializationError(String::from("cannot settle an unsaved payout"))
    })?;
    let paid_at: Option<String> = settled.paid_at.map(format_timestamp).transpose()?;

    let rows_affected: usize = diesel::update(
        payout_records::table
            .filter(payout_records::payout_id.eq(payout_id))
            .filter(payout_records::status.eq(PayoutStatus::Pending.as_str())),
    )
    .set((
        payout_records::status.eq(settled.status.as_str()),
        payout_records::payment_method.eq(settled.payment_method.map(|m| m.as_str())),
        payout_records::payment_reference.eq(settled.payment_reference.as_deref()),
        payout_records::paid_at.eq(paid_at),
    ))
    .execute(conn)?;

    if rows_affected == 0 {
        let exists: i64 = payout_records::table
            .filter(payout_records::payout_id.eq(payout_id))
            .count()
            .get_result(conn)?;
        if exists == 0 {
            return Err(PersistenceError::PayoutNotFound(payout_id));
        }
        return Err(PersistenceError::PayoutNotPending(payout_id));
    }

    info!(payout_id, "Payout marked paid");
    Ok(())
}
