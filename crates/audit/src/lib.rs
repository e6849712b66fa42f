// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;
use tourdesk_domain::{BookingStatus, DomainError};

#[cfg(test)]
mod tests;

/// Represents the entity performing an action.
///
/// An actor is any identifiable entity that initiates a state change.
/// This is usually a front-desk operator, occasionally a system process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The unique identifier for this actor.
    pub id: String,
    /// The type of actor (e.g., "operator", "system").
    pub actor_type: String,
}

impl Actor {
    /// Creates a new Actor.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this actor
    /// * `actor_type` - The type of actor
    #[must_use]
    pub const fn new(id: String, actor_type: String) -> Self {
        Self { id, actor_type }
    }

    /// The actor used for changes not initiated by a person.
    #[must_use]
    pub fn system() -> Self {
        Self::new(String::from("system"), String::from("system"))
    }
}

/// What kind of change an activity record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    /// The booking was created.
    Created,
    /// The lifecycle status moved along an allowed edge.
    StatusChanged,
    /// A guide was assigned or replaced.
    Assigned,
    /// The visitor checked in.
    CheckedIn,
    /// The visitor checked out and the tour completed.
    CheckedOut,
    /// The payment axis changed.
    PaymentUpdated,
    /// Admin notes were replaced.
    NotesUpdated,
}

impl ActivityAction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::StatusChanged => "status_changed",
            Self::Assigned => "assigned",
            Self::CheckedIn => "checked_in",
            Self::CheckedOut => "checked_out",
            Self::PaymentUpdated => "payment_updated",
            Self::NotesUpdated => "notes_updated",
        }
    }
}

impl FromStr for ActivityAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "status_changed" => Ok(Self::StatusChanged),
            "assigned" => Ok(Self::Assigned),
            "checked_in" => Ok(Self::CheckedIn),
            "checked_out" => Ok(Self::CheckedOut),
            "payment_updated" => Ok(Self::PaymentUpdated),
            "notes_updated" => Ok(Self::NotesUpdated),
            _ => Err(DomainError::InvalidField {
                field: "action",
                reason: format!("unknown activity action '{s}'"),
            }),
        }
    }
}

impl std::fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable entry in a booking's activity timeline.
///
/// Every successful booking mutation produces exactly one activity record,
/// written in the same transaction as the booking itself. Records are never
/// updated or deleted. They capture:
/// - Which booking changed
/// - What happened (action and description)
/// - The status before and after
/// - Who did it, and when
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    /// Database identifier. `None` until persisted.
    pub activity_id: Option<i64>,
    /// The booking this record belongs to. `None` only for a booking that
    /// has not been persisted yet.
    pub booking_id: Option<i64>,
    pub action: ActivityAction,
    /// The booking status before the change.
    pub old_status: BookingStatus,
    /// The booking status after the change, when the change touched it.
    pub new_status: Option<BookingStatus>,
    pub description: String,
    pub actor: Actor,
    pub created_at: OffsetDateTime,
}

impl ActivityRecord {
    /// Creates a new `ActivityRecord`.
    ///
    /// Once created, an activity record is immutable.
    ///
    /// # Arguments
    ///
    /// * `booking_id` - The booking that changed, if persisted
    /// * `action` - What kind of change occurred
    /// * `old_status` - The status before the change
    /// * `new_status` - The status after the change, if it applies
    /// * `description` - Human-readable summary for the timeline
    /// * `actor` - Who performed the change
    /// * `created_at` - When the change happened
    #[must_use]
    pub const fn new(
        booking_id: Option<i64>,
        action: ActivityAction,
        old_status: BookingStatus,
        new_status: Option<BookingStatus>,
        description: String,
        actor: Actor,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            activity_id: None,
            booking_id,
            action,
            old_status,
            new_status,
            description,
            actor,
            created_at,
        }
    }

    /// Returns a copy bound to a persisted booking id.
    ///
    /// Used after inserting a new booking, when the id is first known.
    #[must_use]
    pub fn for_booking(&self, booking_id: i64) -> Self {
        let mut record: Self = self.clone();
        record.booking_id = Some(booking_id);
        record
    }

    /// Returns true if this record changed the booking's lifecycle status.
    #[must_use]
    pub fn changed_status(&self) -> bool {
        self.new_status.is_some_and(|new| new != self.old_status)
    }
}
