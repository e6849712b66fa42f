// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row types and their conversions to and from domain values.
//!
//! Dates are stored as `YYYY-MM-DD` text and timestamps as fixed-width UTC
//! text, so lexical order matches chronological order.

use diesel::prelude::*;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use time::format_description::FormatItem;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};
use tourdesk_audit::{ActivityAction, ActivityRecord, Actor};
use tourdesk_domain::{
    Booking, BookingReference, BookingStatus, GroupSize, Guide, PaymentMethod, PaymentStatus,
    PayoutRecord, PayoutStatus, PayoutWindow, TourDetails, TourType, VisitorInfo, format_date,
    format_visit_time, parse_date, parse_visit_time,
};

use crate::diesel_schema::{activity_records, bookings, guides, payout_records};
use crate::error::PersistenceError;

const TIMESTAMP_FORMAT: &[FormatItem<'_>] = time::macros::format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
);

/// Formats a timestamp for storage.
///
/// # Errors
///
/// Returns an error if formatting fails.
pub fn format_timestamp(value: OffsetDateTime) -> Result<String, PersistenceError> {
    value
        .to_offset(UtcOffset::UTC)
        .format(TIMESTAMP_FORMAT)
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

/// Parses a stored timestamp.
///
/// # Errors
///
/// Returns an error if the text is not a stored timestamp.
pub fn parse_timestamp(value: &str) -> Result<OffsetDateTime, PersistenceError> {
    PrimitiveDateTime::parse(value, TIMESTAMP_FORMAT)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|e| {
            PersistenceError::ReconstructionError(format!("invalid timestamp '{value}': {e}"))
        })
}

fn format_optional_timestamp(
    value: Option<OffsetDateTime>,
) -> Result<Option<String>, PersistenceError> {
    value.map(format_timestamp).transpose()
}

fn parse_optional_timestamp(
    value: Option<&str>,
) -> Result<Option<OffsetDateTime>, PersistenceError> {
    value.map(parse_timestamp).transpose()
}

fn parse_payment_method(value: Option<&str>) -> Result<Option<PaymentMethod>, PersistenceError> {
    Ok(value.map(str::parse::<PaymentMethod>).transpose()?)
}

/// Serializable representation of an Actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorData {
    pub id: String,
    pub actor_type: String,
}

// ============================================================================
// Guides
// ============================================================================

#[derive(Queryable, Selectable)]
#[diesel(table_name = guides)]
pub struct GuideRow {
    pub guide_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub is_active: i32,
}

impl From<GuideRow> for Guide {
    fn from(row: GuideRow) -> Self {
        Self::new(row.guide_id, row.name, row.phone, row.is_active != 0)
    }
}

// ============================================================================
// Bookings
// ============================================================================

#[derive(Queryable, Selectable)]
#[diesel(table_name = bookings)]
pub struct BookingRow {
    pub booking_id: i64,
    pub booking_reference: String,
    pub visitor_name: String,
    pub visitor_email: String,
    pub visitor_phone: Option<String>,
    pub visitor_nationality: Option<String>,
    pub visit_date: String,
    pub visit_time: Option<String>,
    pub tour_type: String,
    pub group_size: String,
    pub number_of_people: i32,
    pub status: String,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub total_amount: i64,
    pub assigned_guide_id: Option<i64>,
    pub check_in_time: Option<String>,
    pub check_out_time: Option<String>,
    pub admin_notes: Option<String>,
    pub created_at: String,
    pub version: i64,
}

impl TryFrom<BookingRow> for Booking {
    type Error = PersistenceError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let number_of_people: u32 = row.number_of_people.to_u32().ok_or_else(|| {
            PersistenceError::ReconstructionError(format!(
                "booking {} has invalid head count {}",
                row.booking_id, row.number_of_people
            ))
        })?;

        Ok(Self {
            booking_id: Some(row.booking_id),
            booking_reference: BookingReference::parse(&row.booking_reference)?,
            visitor: VisitorInfo::new(
                row.visitor_name,
                row.visitor_email,
                row.visitor_phone,
                row.visitor_nationality,
            ),
            tour: TourDetails {
                visit_date: parse_date("visit_date", &row.visit_date)?,
                visit_time: row.visit_time.as_deref().map(parse_visit_time).transpose()?,
                tour_type: row.tour_type.parse::<TourType>()?,
                group_size: row.group_size.parse::<GroupSize>()?,
                number_of_people,
            },
            status: row.status.parse::<BookingStatus>()?,
            payment_status: row.payment_status.parse::<PaymentStatus>()?,
            payment_method: parse_payment_method(row.payment_method.as_deref())?,
            total_amount: row.total_amount,
            assigned_guide_id: row.assigned_guide_id,
            check_in_time: parse_optional_timestamp(row.check_in_time.as_deref())?,
            check_out_time: parse_optional_timestamp(row.check_out_time.as_deref())?,
            admin_notes: row.admin_notes,
            created_at: parse_timestamp(&row.created_at)?,
            version: row.version,
        })
    }
}

/// Column values for inserting or rewriting a booking.
#[derive(Insertable, AsChangeset)]
#[diesel(table_name = bookings)]
#[diesel(treat_none_as_null = true)]
pub struct BookingValues {
    pub booking_reference: String,
    pub visitor_name: String,
    pub visitor_email: String,
    pub visitor_phone: Option<String>,
    pub visitor_nationality: Option<String>,
    pub visit_date: String,
    pub visit_time: Option<String>,
    pub tour_type: String,
    pub group_size: String,
    pub number_of_people: i32,
    pub status: String,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub total_amount: i64,
    pub assigned_guide_id: Option<i64>,
    pub check_in_time: Option<String>,
    pub check_out_time: Option<String>,
    pub admin_notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub version: i64,
}

impl BookingValues {
    /// Builds column values from a booking, stamping `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be represented in the schema.
    pub fn from_booking(
        booking: &Booking,
        updated_at: OffsetDateTime,
    ) -> Result<Self, PersistenceError> {
        let number_of_people: i32 = booking.tour.number_of_people.to_i32().ok_or_else(|| {
            PersistenceError::SerializationError(format!(
                "head count {} does not fit the schema",
                booking.tour.number_of_people
            ))
        })?;

        Ok(Self {
            booking_reference: booking.booking_reference.value().to_string(),
            visitor_name: booking.visitor.name.clone(),
            visitor_email: booking.visitor.email.clone(),
            visitor_phone: booking.visitor.phone.clone(),
            visitor_nationality: booking.visitor.nationality.clone(),
            visit_date: format_date(booking.tour.visit_date)?,
            visit_time: booking.tour.visit_time.map(format_visit_time).transpose()?,
            tour_type: booking.tour.tour_type.as_str().to_string(),
            group_size: booking.tour.group_size.as_str().to_string(),
            number_of_people,
            status: booking.status.as_str().to_string(),
            payment_status: booking.payment_status.as_str().to_string(),
            payment_method: booking.payment_method.map(|m| m.as_str().to_string()),
            total_amount: booking.total_amount,
            assigned_guide_id: booking.assigned_guide_id,
            check_in_time: format_optional_timestamp(booking.check_in_time)?,
            check_out_time: format_optional_timestamp(booking.check_out_time)?,
            admin_notes: booking.admin_notes.clone(),
            created_at: format_timestamp(booking.created_at)?,
            updated_at: format_timestamp(updated_at)?,
            version: booking.version,
        })
    }
}

// ============================================================================
// Activity
// ============================================================================

#[derive(Queryable, Selectable)]
#[diesel(table_name = activity_records)]
pub struct ActivityRow {
    pub activity_id: i64,
    pub booking_id: i64,
    pub action: String,
    pub old_status: String,
    pub new_status: Option<String>,
    pub description: String,
    pub actor_json: String,
    pub created_at: String,
}

impl TryFrom<ActivityRow> for ActivityRecord {
    type Error = PersistenceError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        let actor_data: ActorData = serde_json::from_str(&row.actor_json)?;
        let mut record: Self = Self::new(
            Some(row.booking_id),
            row.action.parse::<ActivityAction>()?,
            row.old_status.parse::<BookingStatus>()?,
            row.new_status
                .as_deref()
                .map(str::parse::<BookingStatus>)
                .transpose()?,
            row.description,
            Actor::new(actor_data.id, actor_data.actor_type),
            parse_timestamp(&row.created_at)?,
        );
        record.activity_id = Some(row.activity_id);
        Ok(record)
    }
}

// ============================================================================
// Payouts
// ============================================================================

#[derive(Queryable, Selectable)]
#[diesel(table_name = payout_records)]
pub struct PayoutRow {
    pub payout_id: i64,
    pub guide_id: i64,
    pub amount: i64,
    pub tours_count: i32,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub status: String,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub paid_at: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl TryFrom<PayoutRow> for PayoutRecord {
    type Error = PersistenceError;

    fn try_from(row: PayoutRow) -> Result<Self, Self::Error> {
        let tours_count: u32 = row.tours_count.to_u32().ok_or_else(|| {
            PersistenceError::ReconstructionError(format!(
                "payout {} has invalid tours count {}",
                row.payout_id, row.tours_count
            ))
        })?;

        Ok(Self {
            payout_id: Some(row.payout_id),
            guide_id: row.guide_id,
            amount: row.amount,
            tours_count,
            window: PayoutWindow::new(
                row.period_start
                    .as_deref()
                    .map(|d| parse_date("period_start", d))
                    .transpose()?,
                row.period_end
                    .as_deref()
                    .map(|d| parse_date("period_end", d))
                    .transpose()?,
            ),
            status: row.status.parse::<PayoutStatus>()?,
            payment_method: parse_payment_method(row.payment_method.as_deref())?,
            payment_reference: row.payment_reference,
            paid_at: parse_optional_timestamp(row.paid_at.as_deref())?,
            notes: row.notes,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}
