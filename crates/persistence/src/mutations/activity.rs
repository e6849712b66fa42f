// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tourdesk_audit::ActivityRecord;
use tracing::debug;

use crate::backend::sqlite::get_last_insert_rowid;
use crate::data_models::{ActorData, format_timestamp};
use crate::diesel_schema::activity_records;
use crate::error::PersistenceError;

/// Appends an activity record.
///
/// # Arguments
///
/// * `conn` - The active database connection
/// * `record` - The record to append. Must carry a booking ID.
///
/// # Returns
///
/// The activity ID assigned by the database.
///
/// # Errors
///
/// Returns an error if the record has no booking ID, or persistence or
/// serialization fails.
pub fn insert_activity(
    conn: &mut SqliteConnection,
    record: &ActivityRecord,
) -> Result<i64, PersistenceError> {
    let booking_id: i64 = record.booking_id.ok_or_else(|| {
        PersistenceError::SerializationError(String::from(
            "activity record is not bound to a booking",
        ))
    })?;

    let actor_data: ActorData = ActorData {
        id: record.actor.id.clone(),
        actor_type: record.actor.actor_type.clone(),
    };
    let actor_json: String = serde_json::to_string(&actor_data)?;

    diesel::insert_into(activity_records::table)
        .values((
            activity_records::booking_id.eq(booking_id),
            activity_records::action.eq(record.action.as_str()),
            activity_records::old_status.eq(record.old_status.as_str()),
            activity_records::new_status.eq(record.new_status.map(|s| s.as_str())),
            activity_records::description.eq(&record.description),
            activity_records::actor_json.eq(actor_json),
            activity_records::created_at.eq(format_timestamp(record.created_at)?),
        ))
        .execute(conn)?;

    let activity_id: i64 = get_last_insert_rowid(conn)?;
    debug!(booking_id, activity_id, action = %record.action, "Appended activity record");

    Ok(activity_id)
}
