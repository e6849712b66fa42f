// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Dates travel as `YYYY-MM-DD`, times of day as `HH:MM`, and timestamps as
//! RFC 3339. Enumerations travel as their lowercase wire names.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tourdesk_audit::ActivityRecord;
use tourdesk_domain::{
    AmountBreakdown, Booking, Guide, GuideRevenue, PayoutRecord, PayoutSummary, RevenueReport,
    format_date, format_visit_time,
};

use crate::error::ApiError;

fn format_timestamp(value: OffsetDateTime) -> Result<String, ApiError> {
    value.format(&Rfc3339).map_err(|e| ApiError::Internal {
        message: format!("Failed to format timestamp: {e}"),
    })
}

fn format_optional_timestamp(value: Option<OffsetDateTime>) -> Result<Option<String>, ApiError> {
    value.map(format_timestamp).transpose()
}

// ============================================================================
// Guides
// ============================================================================

/// API request to register a guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGuideRequest {
    /// The guide's name.
    pub name: String,
    /// Contact phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Whether the guide may take bookings. Defaults to true.
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// API request to change a guide's active flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetGuideActiveRequest {
    pub is_active: bool,
}

/// Guide as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideInfo {
    pub guide_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub is_active: bool,
}

impl From<&Guide> for GuideInfo {
    fn from(guide: &Guide) -> Self {
        Self {
            guide_id: guide.guide_id,
            name: guide.name.clone(),
            phone: guide.phone.clone(),
            is_active: guide.is_active,
        }
    }
}

/// API response listing guides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListGuidesResponse {
    pub guides: Vec<GuideInfo>,
}

// ============================================================================
// Bookings
// ============================================================================

/// API request to create a booking.
///
/// This DTO is distinct from domain types and represents the API contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    /// The visitor's full name.
    pub name: String,
    /// The visitor's email address.
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    /// Visit date (`YYYY-MM-DD`).
    pub visit_date: String,
    /// Requested start time (`HH:MM`).
    #[serde(default)]
    pub visit_time: Option<String>,
    /// `standard`, `premium` or `educational`.
    pub tour_type: String,
    /// `individual`, `small_group` or `large_group`.
    pub group_size: String,
    pub number_of_people: u32,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

/// API request to move a booking to a new status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionBookingRequest {
    /// The requested status.
    pub status: String,
    /// The version the caller last read, if it wants the write guarded.
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// API request to assign a guide to a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignGuideRequest {
    pub guide_id: i64,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// API request for operations that carry no data beyond the version guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VersionedRequest {
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// API request to change a booking's payment status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePaymentRequest {
    /// `pending`, `paid` or `refunded`.
    pub payment_status: String,
    /// The method, if the operator recorded one.
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// API request to replace a booking's admin notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNotesRequest {
    /// The new notes. Absent or blank clears them.
    #[serde(default)]
    pub admin_notes: Option<String>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// API request to list bookings. Every filter is optional.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListBookingsRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub guide_id: Option<i64>,
    /// Inclusive lower bound on visit date.
    #[serde(default)]
    pub date_from: Option<String>,
    /// Inclusive upper bound on visit date.
    #[serde(default)]
    pub date_to: Option<String>,
}

/// Booking as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingInfo {
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
    pub number_of_people: u32,
    pub status: String,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub total_amount: i64,
    pub assigned_guide_id: Option<i64>,
    pub check_in_time: Option<String>,
    pub check_out_time: Option<String>,
    /// Whole minutes between check-in and check-out, once both are recorded.
    pub tour_duration_minutes: Option<i64>,
    pub admin_notes: Option<String>,
    pub created_at: String,
    pub version: i64,
}

impl TryFrom<&Booking> for BookingInfo {
    type Error = ApiError;

    fn try_from(booking: &Booking) -> Result<Self, Self::Error> {
        let booking_id: i64 = booking.booking_id.ok_or_else(|| ApiError::Internal {
            message: String::from("Booking has no identifier"),
        })?;

        Ok(Self {
            booking_id,
            booking_reference: booking.booking_reference.value().to_string(),
            visitor_name: booking.visitor.name.clone(),
            visitor_email: booking.visitor.email.clone(),
            visitor_phone: booking.visitor.phone.clone(),
            visitor_nationality: booking.visitor.nationality.clone(),
            visit_date: format_date(booking.tour.visit_date)?,
            visit_time: booking.tour.visit_time.map(format_visit_time).transpose()?,
            tour_type: booking.tour.tour_type.as_str().to_string(),
            group_size: booking.tour.group_size.as_str().to_string(),
            number_of_people: booking.tour.number_of_people,
            status: booking.status.as_str().to_string(),
            payment_status: booking.payment_status.as_str().to_string(),
            payment_method: booking.payment_method.map(|m| m.as_str().to_string()),
            total_amount: booking.total_amount,
            assigned_guide_id: booking.assigned_guide_id,
            check_in_time: format_optional_timestamp(booking.check_in_time)?,
            check_out_time: format_optional_timestamp(booking.check_out_time)?,
            tour_duration_minutes: booking.tour_duration().map(|d| d.whole_minutes()),
            admin_notes: booking.admin_notes.clone(),
            created_at: format_timestamp(booking.created_at)?,
            version: booking.version,
        })
    }
}

/// Activity record as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityInfo {
    pub activity_id: Option<i64>,
    pub booking_id: Option<i64>,
    pub action: String,
    pub old_status: String,
    pub new_status: Option<String>,
    pub description: String,
    pub actor_id: String,
    pub actor_type: String,
    pub created_at: String,
}

impl TryFrom<&ActivityRecord> for ActivityInfo {
    type Error = ApiError;

    fn try_from(record: &ActivityRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            activity_id: record.activity_id,
            booking_id: record.booking_id,
            action: record.action.as_str().to_string(),
            old_status: record.old_status.as_str().to_string(),
            new_status: record.new_status.map(|s| s.as_str().to_string()),
            description: record.description.clone(),
            actor_id: record.actor.id.clone(),
            actor_type: record.actor.actor_type.clone(),
            created_at: format_timestamp(record.created_at)?,
        })
    }
}

/// API response for any booking mutation.
///
/// `activity` is `None` only when the request changed nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingMutationResponse {
    pub booking: BookingInfo,
    pub activity: Option<ActivityInfo>,
    pub message: String,
}

/// API response listing bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBookingsResponse {
    pub bookings: Vec<BookingInfo>,
}

/// API response carrying a booking's activity timeline, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTimelineResponse {
    pub booking_id: i64,
    pub activity: Vec<ActivityInfo>,
}

// ============================================================================
// Revenue
// ============================================================================

/// API request for a revenue report. Every filter is optional.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RevenueReportRequest {
    #[serde(default)]
    pub guide_id: Option<i64>,
    #[serde(default)]
    pub date_from: Option<String>,
    #[serde(default)]
    pub date_to: Option<String>,
    /// Only bookings in this status.
    #[serde(default)]
    pub status: Option<String>,
    /// Reference date for weekly and monthly figures. Defaults to today.
    #[serde(default)]
    pub as_of: Option<String>,
}

/// One guide's figures in a revenue report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideRevenueInfo {
    pub guide_id: i64,
    pub total_bookings: u32,
    pub completed_tours: u32,
    pub paid_tours: u32,
    pub pending_tours: u32,
    pub total_revenue: i64,
    pub paid_revenue: i64,
    pub pending_revenue: i64,
    pub guide_share: i64,
    pub platform_share: i64,
}

impl From<&GuideRevenue> for GuideRevenueInfo {
    fn from(g: &GuideRevenue) -> Self {
        Self {
            guide_id: g.guide_id,
            total_bookings: g.total_bookings,
            completed_tours: g.completed_tours,
            paid_tours: g.paid_tours,
            pending_tours: g.pending_tours,
            total_revenue: g.total_revenue,
            paid_revenue: g.paid_revenue,
            pending_revenue: g.pending_revenue,
            guide_share: g.guide_share,
            platform_share: g.platform_share,
        }
    }
}

/// One bucket of a breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    /// The bucket's wire name. `unspecified` for tours with no payment method.
    pub key: String,
    pub count: u32,
    pub amount: i64,
}

impl BreakdownEntry {
    fn new(key: &str, breakdown: AmountBreakdown) -> Self {
        Self {
            key: key.to_string(),
            count: breakdown.count,
            amount: breakdown.amount,
        }
    }
}

/// Totals across every booking in a revenue report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueTotalsInfo {
    pub total_bookings: u32,
    pub completed_tours: u32,
    pub total_revenue: i64,
    pub paid_revenue: i64,
    pub pending_revenue: i64,
    pub weekly_revenue: i64,
    pub monthly_revenue: i64,
    pub unassigned_revenue: i64,
    pub by_payment_method: Vec<BreakdownEntry>,
    pub by_tour_type: Vec<BreakdownEntry>,
    pub by_status: Vec<BreakdownEntry>,
}

/// API response for a revenue report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueReportResponse {
    pub guide_share_rate_bps: u32,
    pub as_of: String,
    pub guide_id: Option<i64>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub status: Option<String>,
    /// Ascending by guide ID.
    pub guides: Vec<GuideRevenueInfo>,
    pub totals: RevenueTotalsInfo,
}

impl TryFrom<&RevenueReport> for RevenueReportResponse {
    type Error = ApiError;

    fn try_from(report: &RevenueReport) -> Result<Self, Self::Error> {
        let totals = &report.totals;

        Ok(Self {
            guide_share_rate_bps: report.guide_share_rate.basis_points(),
            as_of: format_date(report.as_of)?,
            guide_id: report.query.guide_id,
            date_from: report.query.date_from.map(format_date).transpose()?,
            date_to: report.query.date_to.map(format_date).transpose()?,
            status: report.query.status_filter.map(|s| s.as_str().to_string()),
            guides: report.guides.iter().map(GuideRevenueInfo::from).collect(),
            totals: RevenueTotalsInfo {
                total_bookings: totals.total_bookings,
                completed_tours: totals.completed_tours,
                total_revenue: totals.total_revenue,
                paid_revenue: totals.paid_revenue,
                pending_revenue: totals.pending_revenue,
                weekly_revenue: totals.weekly_revenue,
                monthly_revenue: totals.monthly_revenue,
                unassigned_revenue: totals.unassigned_revenue,
                by_payment_method: totals
                    .by_payment_method
                    .iter()
                    .map(|(method, b)| {
                        BreakdownEntry::new(method.map_or("unspecified", |m| m.as_str()), *b)
                    })
                    .collect(),
                by_tour_type: totals
                    .by_tour_type
                    .iter()
                    .map(|(tour_type, b)| BreakdownEntry::new(tour_type.as_str(), *b))
                    .collect(),
                by_status: totals
                    .by_status
                    .iter()
                    .map(|(status, b)| BreakdownEntry::new(status.as_str(), *b))
                    .collect(),
            },
        })
    }
}

// ============================================================================
// Payouts
// ============================================================================

/// API request to record a pending payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePayoutRequest {
    pub guide_id: i64,
    pub amount: i64,
    pub tours_count: u32,
    /// Start of the revenue window the amount was read from (`YYYY-MM-DD`).
    #[serde(default)]
    pub period_start: Option<String>,
    /// End of the revenue window the amount was read from (`YYYY-MM-DD`).
    #[serde(default)]
    pub period_end: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// API request to settle a payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkPayoutPaidRequest {
    pub payment_method: String,
    #[serde(default)]
    pub payment_reference: Option<String>,
}

/// API request to list payouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListPayoutsRequest {
    #[serde(default)]
    pub guide_id: Option<i64>,
}

/// Payout as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutInfo {
    pub payout_id: i64,
    pub guide_id: i64,
    pub amount: i64,
    pub tours_count: u32,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub status: String,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub paid_at: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl TryFrom<&PayoutRecord> for PayoutInfo {
    type Error = ApiError;

    fn try_from(record: &PayoutRecord) -> Result<Self, Self::Error> {
        let payout_id: i64 = record.payout_id.ok_or_else(|| ApiError::Internal {
            message: String::from("Payout has no identifier"),
        })?;

        Ok(Self {
            payout_id,
            guide_id: record.guide_id,
            amount: record.amount,
            tours_count: record.tours_count,
            period_start: record.window.period_start.map(format_date).transpose()?,
            period_end: record.window.period_end.map(format_date).transpose()?,
            status: record.status.as_str().to_string(),
            payment_method: record.payment_method.map(|m| m.as_str().to_string()),
            payment_reference: record.payment_reference.clone(),
            paid_at: format_optional_timestamp(record.paid_at)?,
            notes: record.notes.clone(),
            created_at: format_timestamp(record.created_at)?,
        })
    }
}

/// API response for payout creation and settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutMutationResponse {
    pub payout: PayoutInfo,
    /// Ledger totals after the change.
    pub summary: PayoutSummary,
}

/// API response listing payouts, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPayoutsResponse {
    pub payouts: Vec<PayoutInfo>,
}
