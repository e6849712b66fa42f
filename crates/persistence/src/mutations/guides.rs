// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::OffsetDateTime;
use tracing::info;

use crate::backend::sqlite::get_last_insert_rowid;
use crate::data_models::format_timestamp;
use crate::diesel_schema::guides;
use crate::error::PersistenceError;

/// Inserts a guide.
///
/// # Returns
///
/// The guide ID assigned by the database.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_guide(
    conn: &mut SqliteConnection,
    name: &str,
    phone: Option<&str>,
    is_active: bool,
    created_at: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(guides::table)
        .values((
            guides::name.eq(name),
            guides::phone.eq(phone),
            guides::is_active.eq(i32::from(is_active)),
            guides::created_at.eq(format_timestamp(created_at)?),
        ))
        .execute(conn)?;

    let guide_id: i64 = get_last_insert_rowid(conn)?;
    info!(guide_id, name, "Registered guide");
    Ok(guide_id)
}

/// Sets a guide's active flag.
///
/// # Errors
///
/// Returns `PersistenceError::GuideNotFound` if no such guide exists.
pub fn set_guide_active(
    conn: &mut SqliteConnection,
    guide_id: i64,
    is_active: bool,
) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::update(guides::table.filter(guides::guide_id.eq(guide_id)))
        .set(guides::is_active.eq(i32::from(is_active)))
        .execute(conn)?;

    if rows_affected == 0 {
        return Err(PersistenceError::GuideNotFound(guide_id));
    }
    info!(guide_id, is_active, "Updated guide active flag");
    Ok(())
}
