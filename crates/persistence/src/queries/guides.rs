// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tourdesk_domain::Guide;
use tracing::debug;

use crate::data_models::GuideRow;
use crate::diesel_schema::guides;
use crate::error::PersistenceError;

/// Retrieves a guide by ID.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `guide_id` - The guide ID
///
/// # Errors
///
/// Returns `PersistenceError::GuideNotFound` if no such guide exists.
pub fn get_guide(conn: &mut SqliteConnection, guide_id: i64) -> Result<Guide, PersistenceError> {
    debug!(guide_id, "Looking up guide");

    let row: Option<GuideRow> = guides::table
        .filter(guides::guide_id.eq(guide_id))
        .select(GuideRow::as_select())
        .first(conn)
        .optional()?;

    row.map(Guide::from)
        .ok_or(PersistenceError::GuideNotFound(guide_id))
}

/// Lists all guides, ordered by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_guides(conn: &mut SqliteConnection) -> Result<Vec<Guide>, PersistenceError> {
    let rows: Vec<GuideRow> = guides::table
        .order(guides::guide_id.asc())
        .select(GuideRow::as_select())
        .load(conn)?;

    Ok(rows.into_iter().map(Guide::from).collect())
}
