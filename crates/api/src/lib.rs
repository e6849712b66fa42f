// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary for Tourdesk.
//!
//! Handlers translate wire DTOs into core commands, run them against the
//! persistence layer and translate every lower-level error into [`ApiError`].

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod error;
mod handlers;
mod request_response;

#[cfg(test)]
mod tests;

use tourdesk_domain::GuideShareRate;

pub use error::{ApiError, translate_core_error, translate_domain_error, translate_persistence_error};
pub use handlers::{
    MAX_REFERENCE_ATTEMPTS, assign_guide, check_in, check_out, create_booking,
    create_booking_with_tokens, create_guide, create_payout, get_activity, get_booking,
    get_booking_by_reference, get_payout, guide_balance, list_bookings, list_guides, list_payouts,
    mark_payout_paid, payout_summary, revenue_report, set_guide_active, transition_booking,
    update_notes, update_payment,
};
pub use request_response::{
    ActivityInfo, ActivityTimelineResponse, AssignGuideRequest, BookingInfo,
    BookingMutationResponse, BreakdownEntry, CreateBookingRequest, CreateGuideRequest,
    CreatePayoutRequest, GuideInfo, GuideRevenueInfo, ListBookingsRequest, ListBookingsResponse,
    ListGuidesResponse, ListPayoutsRequest, ListPayoutsResponse, MarkPayoutPaidRequest,
    PayoutInfo, PayoutMutationResponse, RevenueReportRequest, RevenueReportResponse,
    RevenueTotalsInfo, SetGuideActiveRequest, TransitionBookingRequest, UpdateNotesRequest,
    UpdatePaymentRequest, VersionedRequest,
};
pub use tourdesk_domain::{GuideBalance, PayoutSummary};

/// Revenue and payout settings, fixed at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevenuePolicy {
    /// The guide's cut of paid tour revenue.
    pub guide_share_rate: GuideShareRate,
    /// When true, payouts may not exceed the guide's computed share.
    pub enforce_payout_cap: bool,
}

impl Default for RevenuePolicy {
    fn default() -> Self {
        Self {
            guide_share_rate: GuideShareRate::DEFAULT,
            enforce_payout_cap: true,
        }
    }
}
