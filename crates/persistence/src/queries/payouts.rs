// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use tourdesk_domain::PayoutRecord;

use crate::data_models::PayoutRow;
use crate::diesel_schema::payout_records;
use crate::error::PersistenceError;

/// Retrieves a payout by ID.
///
/// # Errors
///
/// Returns `PersistenceError::PayoutNotFound` if no such payout exists.
pub fn get_payout(
    conn: &mut SqliteConnection,
    payout_id: i64,
) -> Result<PayoutRecord, PersistenceError> {
    let row: Option<PayoutRow> = payout_records::table
        .filter(payout_records::payout_id.eq(payout_id))
        .select(PayoutRow::as_select())
        .first(conn)
        .optional()?;

    row.ok_or(PersistenceError::PayoutNotFound(payout_id))?
        .try_into()
}

/// Lists payouts, newest first, optionally for a single guide.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be reconstructed.
pub fn list_payouts(
    conn: &mut SqliteConnection,
    guide_id: Option<i64>,
) -> Result<Vec<PayoutRecord>, PersistenceError> {
    let mut query: payout_records::BoxedQuery<'_, Sqlite> = payout_records::table.into_boxed();
    if let Some(guide_id) = guide_id {
        query = query.filter(payout_records::guide_id.eq(guide_id));
    }

    let rows: Vec<PayoutRow> = query
        .order((
            payout_records::created_at.desc(),
            payout_records::payout_id.desc(),
        ))
        .select(PayoutRow::as_select())
        .load(conn)?;

    rows.into_iter().map(PayoutRecord::try_from).collect()
}
