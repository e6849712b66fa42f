// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for state-changing and read-only operations.
//!
//! Every handler takes the persistence layer explicitly and, where time
//! matters, the current time. Nothing here holds state between calls.

use std::str::FromStr;
use time::{Date, OffsetDateTime, Time};
use tourdesk::{
    BookingCommand, BookingTransition, NewBooking, PayoutCommand, PayoutRequest, ShareCap, apply,
    apply_payout, create_booking as create_booking_transition, open_payout,
    parse_requested_status,
};
use tourdesk_audit::{ActivityRecord, Actor};
use tourdesk_domain::{
    Booking, BookingReference, BookingStatus, GroupSize, Guide, GuideBalance, PaymentMethod,
    PaymentStatus, PayoutRecord, PayoutSummary, PayoutWindow, RevenueQuery, RevenueReport,
    TourDetails, TourType, VisitorInfo, compute_revenue_report,
    guide_balance as compute_guide_balance, ledger_total, parse_date, parse_visit_time,
    summarize_payouts, validate_date_range,
};
use tourdesk_persistence::{BookingFilter, PersistedBooking, PersistenceError, SqlitePersistence};
use tracing::{debug, warn};

use crate::RevenuePolicy;
use crate::error::{ApiError, translate_persistence_error};
use crate::request_response::{
    ActivityInfo, ActivityTimelineResponse, AssignGuideRequest, BookingInfo,
    BookingMutationResponse, CreateBookingRequest, CreateGuideRequest, CreatePayoutRequest,
    GuideInfo, ListBookingsRequest, ListBookingsResponse, ListGuidesResponse,
    ListPayoutsRequest, ListPayoutsResponse, MarkPayoutPaidRequest, PayoutInfo,
    PayoutMutationResponse, RevenueReportRequest, RevenueReportResponse, SetGuideActiveRequest,
    TransitionBookingRequest, UpdateNotesRequest, UpdatePaymentRequest, VersionedRequest,
};

/// How many fresh references to try before giving up on a booking insert.
pub const MAX_REFERENCE_ATTEMPTS: u32 = 5;

// ============================================================================
// Guides
// ============================================================================

/// Registers a guide.
///
/// # Errors
///
/// Returns an error if the name is blank or the insert fails.
pub fn create_guide(
    persistence: &mut SqlitePersistence,
    request: &CreateGuideRequest,
    now: OffsetDateTime,
) -> Result<GuideInfo, ApiError> {
    let name: &str = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation {
            field: Some(String::from("name")),
            message: String::from("name is required"),
        });
    }

    let phone: Option<&str> = request.phone.as_deref().filter(|p| !p.trim().is_empty());
    let guide: Guide =
        persistence.create_guide(name, phone, request.is_active.unwrap_or(true), now)?;
    Ok(GuideInfo::from(&guide))
}

/// Lists all guides, ordered by ID.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_guides(persistence: &mut SqlitePersistence) -> Result<ListGuidesResponse, ApiError> {
    let guides: Vec<Guide> = persistence.list_guides()?;
    Ok(ListGuidesResponse {
        guides: guides.iter().map(GuideInfo::from).collect(),
    })
}

/// Activates or deactivates a guide.
///
/// Existing assignments are untouched; an inactive guide only stops
/// receiving new ones.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if the guide does not exist.
pub fn set_guide_active(
    persistence: &mut SqlitePersistence,
    guide_id: i64,
    request: SetGuideActiveRequest,
) -> Result<GuideInfo, ApiError> {
    let guide: Guide = persistence.set_guide_active(guide_id, request.is_active)?;
    Ok(GuideInfo::from(&guide))
}

// ============================================================================
// Bookings
// ============================================================================

/// Creates a booking with a randomly generated reference.
///
/// # Errors
///
/// Returns an error if:
/// - A required field is missing or malformed
/// - The head count does not fit the group size
/// - No free reference was found within `MAX_REFERENCE_ATTEMPTS`
/// - Database operations fail
pub fn create_booking(
    persistence: &mut SqlitePersistence,
    request: CreateBookingRequest,
    actor: Actor,
    now: OffsetDateTime,
) -> Result<BookingMutationResponse, ApiError> {
    create_booking_with_tokens(persistence, request, actor, now, rand::random::<u32>)
}

/// Creates a booking, drawing reference tokens from `next_token`.
///
/// A reference collision is retried with a fresh token, up to
/// `MAX_REFERENCE_ATTEMPTS` times.
///
/// # Errors
///
/// See [`create_booking`].
pub fn create_booking_with_tokens<F>(
    persistence: &mut SqlitePersistence,
    request: CreateBookingRequest,
    actor: Actor,
    now: OffsetDateTime,
    mut next_token: F,
) -> Result<BookingMutationResponse, ApiError>
where
    F: FnMut() -> u32,
{
    let new_booking: NewBooking = parse_new_booking(request)?;

    for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
        let reference: BookingReference = BookingReference::generate(now.date(), next_token());
        let transition: BookingTransition =
            create_booking_transition(new_booking.clone(), reference, actor.clone(), now)?;

        match persistence.insert_booking(&transition) {
            Ok(persisted) => {
                let message: String =
                    format!("Created booking {}", persisted.booking.booking_reference);
                return mutation_response(&persisted, message);
            }
            Err(PersistenceError::UniqueViolation(detail)) => {
                warn!(attempt, detail = %detail, "Booking reference collision, retrying");
            }
            Err(e) => return Err(translate_persistence_error(e)),
        }
    }

    Err(ApiError::Internal {
        message: format!(
            "Could not allocate a unique booking reference after {MAX_REFERENCE_ATTEMPTS} attempts"
        ),
    })
}

fn parse_new_booking(request: CreateBookingRequest) -> Result<NewBooking, ApiError> {
    let visit_date: Date = parse_date("visit_date", &request.visit_date)?;
    let visit_time: Option<Time> = request
        .visit_time
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(parse_visit_time)
        .transpose()?;
    let tour_type: TourType = TourType::from_str(request.tour_type.trim())?;
    let group_size: GroupSize = GroupSize::from_str(request.group_size.trim())?;
    let payment_method: Option<PaymentMethod> = parse_optional_method(request.payment_method)?;

    Ok(NewBooking {
        visitor: VisitorInfo::new(
            request.name.trim().to_string(),
            request.email.trim().to_string(),
            non_blank(request.phone),
            non_blank(request.nationality),
        ),
        tour: TourDetails {
            visit_date,
            visit_time,
            tour_type,
            group_size,
            number_of_people: request.number_of_people,
        },
        payment_method,
        admin_notes: non_blank(request.admin_notes),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_optional_method(value: Option<String>) -> Result<Option<PaymentMethod>, ApiError> {
    Ok(non_blank(value)
        .map(|m| PaymentMethod::from_str(&m))
        .transpose()?)
}

fn parse_optional_date(field: &'static str, value: Option<&str>) -> Result<Option<Date>, ApiError> {
    Ok(value
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_date(field, v))
        .transpose()?)
}

/// Retrieves a booking by ID.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if the booking does not exist.
pub fn get_booking(
    persistence: &mut SqlitePersistence,
    booking_id: i64,
) -> Result<BookingInfo, ApiError> {
    let booking: Booking = persistence.get_booking(booking_id)?;
    BookingInfo::try_from(&booking)
}

/// Retrieves a booking by its reference.
///
/// # Errors
///
/// Returns `ApiError::Validation` for a malformed reference and
/// `ApiError::NotFound` if no booking carries it.
pub fn get_booking_by_reference(
    persistence: &mut SqlitePersistence,
    reference: &str,
) -> Result<BookingInfo, ApiError> {
    let reference: BookingReference = BookingReference::parse(reference.trim())?;
    let booking: Booking = persistence.get_booking_by_reference(reference.value())?;
    BookingInfo::try_from(&booking)
}

/// Lists bookings matching the request's filters.
///
/// # Errors
///
/// Returns an error if a filter is malformed or the query fails.
pub fn list_bookings(
    persistence: &mut SqlitePersistence,
    request: &ListBookingsRequest,
) -> Result<ListBookingsResponse, ApiError> {
    let date_from: Option<Date> = parse_optional_date("date_from", request.date_from.as_deref())?;
    let date_to: Option<Date> = parse_optional_date("date_to", request.date_to.as_deref())?;
    validate_date_range(date_from, date_to)?;

    let filter: BookingFilter = BookingFilter {
        status: request
            .status
            .as_deref()
            .map(parse_requested_status)
            .transpose()?,
        payment_status: request
            .payment_status
            .as_deref()
            .map(|s| PaymentStatus::from_str(s.trim()))
            .transpose()?,
        guide_id: request.guide_id,
        date_from,
        date_to,
    };

    let bookings: Vec<Booking> = persistence.list_bookings(&filter)?;
    Ok(ListBookingsResponse {
        bookings: bookings
            .iter()
            .map(BookingInfo::try_from)
            .collect::<Result<Vec<_>, _>>()?,
    })
}

/// Moves a booking along an allowed status edge.
///
/// A request for `completed` is only honoured once the visitor has checked
/// in, and then completes through check-out.
///
/// # Errors
///
/// Returns an error if:
/// - The status string is unknown (`Validation`)
/// - The booking does not exist (`NotFound`)
/// - The edge is not allowed (`InvalidTransition`)
/// - Another writer changed the booking (`Conflict`)
pub fn transition_booking(
    persistence: &mut SqlitePersistence,
    booking_id: i64,
    request: &TransitionBookingRequest,
    actor: Actor,
    now: OffsetDateTime,
) -> Result<BookingMutationResponse, ApiError> {
    let new_status: BookingStatus = parse_requested_status(&request.status)?;
    run_booking_command(
        persistence,
        booking_id,
        request.expected_version,
        BookingCommand::Transition { new_status },
        actor,
        now,
    )
}

/// Assigns a guide to a booking.
///
/// Reassigning the guide already on the booking changes nothing.
///
/// # Errors
///
/// Returns an error if:
/// - The booking or guide does not exist (`NotFound`)
/// - The guide is inactive (`Unauthorized`)
/// - The booking is completed or cancelled (`InvalidTransition`)
/// - Another writer changed the booking (`Conflict`)
pub fn assign_guide(
    persistence: &mut SqlitePersistence,
    booking_id: i64,
    request: AssignGuideRequest,
    actor: Actor,
    now: OffsetDateTime,
) -> Result<BookingMutationResponse, ApiError> {
    let guide: Guide = persistence.get_guide(request.guide_id)?;
    run_booking_command(
        persistence,
        booking_id,
        request.expected_version,
        BookingCommand::AssignGuide { guide },
        actor,
        now,
    )
}

/// Records the visitor's arrival.
///
/// # Errors
///
/// Returns `ApiError::InvalidTransition` unless the booking is confirmed and
/// not yet checked in.
pub fn check_in(
    persistence: &mut SqlitePersistence,
    booking_id: i64,
    request: VersionedRequest,
    actor: Actor,
    now: OffsetDateTime,
) -> Result<BookingMutationResponse, ApiError> {
    run_booking_command(
        persistence,
        booking_id,
        request.expected_version,
        BookingCommand::CheckIn,
        actor,
        now,
    )
}

/// Records the visitor's departure and completes the tour.
///
/// # Errors
///
/// Returns `ApiError::InvalidTransition` unless the visitor is checked in
/// and not yet checked out, and `ApiError::Validation` if `now` precedes
/// the check-in time.
pub fn check_out(
    persistence: &mut SqlitePersistence,
    booking_id: i64,
    request: VersionedRequest,
    actor: Actor,
    now: OffsetDateTime,
) -> Result<BookingMutationResponse, ApiError> {
    run_booking_command(
        persistence,
        booking_id,
        request.expected_version,
        BookingCommand::CheckOut,
        actor,
        now,
    )
}

/// Changes a booking's payment status.
///
/// # Errors
///
/// Returns an error if the status or method is unknown, the booking does
/// not exist, or another writer changed it.
pub fn update_payment(
    persistence: &mut SqlitePersistence,
    booking_id: i64,
    request: UpdatePaymentRequest,
    actor: Actor,
    now: OffsetDateTime,
) -> Result<BookingMutationResponse, ApiError> {
    let payment_status: PaymentStatus = PaymentStatus::from_str(request.payment_status.trim())?;
    let payment_method: Option<PaymentMethod> = parse_optional_method(request.payment_method)?;
    run_booking_command(
        persistence,
        booking_id,
        request.expected_version,
        BookingCommand::UpdatePaymentStatus {
            payment_status,
            payment_method,
        },
        actor,
        now,
    )
}

/// Replaces a booking's admin notes.
///
/// # Errors
///
/// Returns an error if the booking does not exist or another writer changed it.
pub fn update_notes(
    persistence: &mut SqlitePersistence,
    booking_id: i64,
    request: UpdateNotesRequest,
    actor: Actor,
    now: OffsetDateTime,
) -> Result<BookingMutationResponse, ApiError> {
    run_booking_command(
        persistence,
        booking_id,
        request.expected_version,
        BookingCommand::UpdateNotes {
            notes: request.admin_notes,
        },
        actor,
        now,
    )
}

/// Reads the booking, applies `command` and persists the outcome.
///
/// The write is guarded by the version that was read here; when the caller
/// supplied `expected_version` it must match as well.
fn run_booking_command(
    persistence: &mut SqlitePersistence,
    booking_id: i64,
    expected_version: Option<i64>,
    command: BookingCommand,
    actor: Actor,
    now: OffsetDateTime,
) -> Result<BookingMutationResponse, ApiError> {
    let booking: Booking = persistence.get_booking(booking_id)?;

    if let Some(expected) = expected_version.filter(|v| *v != booking.version) {
        return Err(translate_persistence_error(
            PersistenceError::VersionConflict {
                booking_id,
                expected_version: expected,
            },
        ));
    }

    let operation: &'static str = command.operation();
    let transition: BookingTransition = apply(&booking, command, actor, now)?;
    let persisted: PersistedBooking =
        persistence.persist_booking_transition(&transition, booking.version, now)?;

    debug!(
        booking_id,
        version = persisted.booking.version,
        operation,
        "Applied booking command"
    );

    let message: String = if persisted.activity.is_some() {
        format!("Booking {} updated", persisted.booking.booking_reference)
    } else {
        format!(
            "Booking {} already in requested state",
            persisted.booking.booking_reference
        )
    };
    mutation_response(&persisted, message)
}

fn mutation_response(
    persisted: &PersistedBooking,
    message: String,
) -> Result<BookingMutationResponse, ApiError> {
    Ok(BookingMutationResponse {
        booking: BookingInfo::try_from(&persisted.booking)?,
        activity: persisted
            .activity
            .as_ref()
            .map(ActivityInfo::try_from)
            .transpose()?,
        message,
    })
}

/// Retrieves a booking's activity timeline, oldest first.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if the booking does not exist.
pub fn get_activity(
    persistence: &mut SqlitePersistence,
    booking_id: i64,
) -> Result<ActivityTimelineResponse, ApiError> {
    let records: Vec<ActivityRecord> = persistence.list_activity(booking_id)?;
    Ok(ActivityTimelineResponse {
        booking_id,
        activity: records
            .iter()
            .map(ActivityInfo::try_from)
            .collect::<Result<Vec<_>, _>>()?,
    })
}

// ============================================================================
// Revenue
// ============================================================================

/// Computes a revenue report over the current booking set.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `request` - Filters and the optional reference date
/// * `policy` - The configured guide share rate
/// * `today` - Reference date used when the request names none
///
/// # Errors
///
/// Returns an error if a filter is malformed or the snapshot read fails.
pub fn revenue_report(
    persistence: &mut SqlitePersistence,
    request: &RevenueReportRequest,
    policy: RevenuePolicy,
    today: Date,
) -> Result<RevenueReportResponse, ApiError> {
    let date_from: Option<Date> = parse_optional_date("date_from", request.date_from.as_deref())?;
    let date_to: Option<Date> = parse_optional_date("date_to", request.date_to.as_deref())?;
    validate_date_range(date_from, date_to)?;
    let as_of: Date = parse_optional_date("as_of", request.as_of.as_deref())?.unwrap_or(today);

    let query: RevenueQuery = RevenueQuery {
        guide_id: request.guide_id,
        date_from,
        date_to,
        status_filter: request
            .status
            .as_deref()
            .map(parse_requested_status)
            .transpose()?,
    };

    let report: RevenueReport = compute_report(persistence, &query, policy, as_of)?;
    RevenueReportResponse::try_from(&report)
}

fn compute_report(
    persistence: &mut SqlitePersistence,
    query: &RevenueQuery,
    policy: RevenuePolicy,
    as_of: Date,
) -> Result<RevenueReport, ApiError> {
    let bookings: Vec<Booking> = persistence.revenue_snapshot(query)?;
    Ok(compute_revenue_report(
        &bookings,
        query,
        policy.guide_share_rate,
        as_of,
    ))
}

/// The guide's all-time share of paid, completed tours.
fn all_time_guide_share(
    persistence: &mut SqlitePersistence,
    guide_id: i64,
    policy: RevenuePolicy,
    as_of: Date,
) -> Result<i64, ApiError> {
    let query: RevenueQuery = RevenueQuery {
        guide_id: Some(guide_id),
        ..RevenueQuery::default()
    };
    let report: RevenueReport = compute_report(persistence, &query, policy, as_of)?;
    Ok(report.guide(guide_id).map_or(0, |g| g.guide_share))
}

// ============================================================================
// Payouts
// ============================================================================

/// Records a pending payout for a guide.
///
/// When the payout cap is enforced, pending and paid payouts plus this one
/// may not exceed the guide's all-time share. The cap read and the insert run
/// in one immediate transaction.
///
/// # Errors
///
/// Returns an error if:
/// - The amount is not positive or exceeds the guide's share (`Validation`)
/// - The window is half-open or reversed (`Validation`)
/// - The ledger totals would no longer fit in an `i64` (`Validation`)
/// - The guide does not exist (`NotFound`)
/// - A payout for the same guide and window exists, or the guide already has
///   a pending windowless payout (`Conflict`)
pub fn create_payout(
    persistence: &mut SqlitePersistence,
    request: CreatePayoutRequest,
    policy: RevenuePolicy,
    now: OffsetDateTime,
) -> Result<PayoutMutationResponse, ApiError> {
    let period_start: Option<Date> =
        parse_optional_date("period_start", request.period_start.as_deref())?;
    let period_end: Option<Date> =
        parse_optional_date("period_end", request.period_end.as_deref())?;

    let stored: PayoutRecord =
        persistence.immediate_transaction(|p| -> Result<PayoutRecord, ApiError> {
            let guide: Guide = p.get_guide(request.guide_id)?;
            let mut ledger: Vec<PayoutRecord> = p.list_payouts(None)?;

            let cap: Option<ShareCap> = if policy.enforce_payout_cap {
                let guide_share: i64 =
                    all_time_guide_share(p, guide.guide_id, policy, now.date())?;
                let balance: GuideBalance =
                    compute_guide_balance(guide.guide_id, guide_share, &ledger)?;
                Some(ShareCap {
                    guide_share,
                    committed: balance.paid_out.saturating_add(balance.pending),
                })
            } else {
                None
            };

            let record: PayoutRecord = open_payout(
                &guide,
                PayoutRequest {
                    guide_id: request.guide_id,
                    amount: request.amount,
                    tours_count: request.tours_count,
                    window: PayoutWindow::new(period_start, period_end),
                    notes: non_blank(request.notes),
                },
                cap,
                now,
            )
            .inspect_err(|e| {
                warn!(guide_id = guide.guide_id, error = %e, "Payout rejected");
            })?;

            // Every later summary and settlement must stay representable.
            ledger.push(record.clone());
            ledger_total(&ledger).inspect_err(|e| {
                warn!(guide_id = guide.guide_id, error = %e, "Payout ledger would overflow");
            })?;

            Ok(p.insert_payout(&record)?)
        })?;

    payout_mutation_response(persistence, &stored, now)
}

/// Settles a pending payout.
///
/// # Errors
///
/// Returns an error if:
/// - The payment method is unknown (`Validation`)
/// - The payout does not exist (`NotFound`)
/// - The payout is already paid (`Conflict`)
/// - Settling would push paid payouts past the guide's share (`Validation`)
pub fn mark_payout_paid(
    persistence: &mut SqlitePersistence,
    payout_id: i64,
    request: MarkPayoutPaidRequest,
    policy: RevenuePolicy,
    now: OffsetDateTime,
) -> Result<PayoutMutationResponse, ApiError> {
    let payment_method: PaymentMethod = PaymentMethod::from_str(request.payment_method.trim())?;

    let stored: PayoutRecord =
        persistence.immediate_transaction(|p| -> Result<PayoutRecord, ApiError> {
            let record: PayoutRecord = p.get_payout(payout_id)?;

            let cap: Option<ShareCap> = if policy.enforce_payout_cap {
                let guide_share: i64 =
                    all_time_guide_share(p, record.guide_id, policy, now.date())?;
                let existing: Vec<PayoutRecord> = p.list_payouts(Some(record.guide_id))?;
                let balance: GuideBalance =
                    compute_guide_balance(record.guide_id, guide_share, &existing)?;
                Some(ShareCap {
                    guide_share,
                    committed: balance.paid_out,
                })
            } else {
                None
            };

            let settled: PayoutRecord = apply_payout(
                &record,
                PayoutCommand::MarkPaid {
                    payment_method,
                    payment_reference: non_blank(request.payment_reference),
                },
                cap,
                now,
            )?;

            Ok(p.settle_payout(&settled)?)
        })?;

    payout_mutation_response(persistence, &stored, now)
}

fn payout_mutation_response(
    persistence: &mut SqlitePersistence,
    record: &PayoutRecord,
    now: OffsetDateTime,
) -> Result<PayoutMutationResponse, ApiError> {
    Ok(PayoutMutationResponse {
        payout: PayoutInfo::try_from(record)?,
        summary: payout_summary(persistence, now)?,
    })
}

/// Retrieves a payout by ID.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if the payout does not exist.
pub fn get_payout(
    persistence: &mut SqlitePersistence,
    payout_id: i64,
) -> Result<PayoutInfo, ApiError> {
    let record: PayoutRecord = persistence.get_payout(payout_id)?;
    PayoutInfo::try_from(&record)
}

/// Lists payouts, newest first, optionally for one guide.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_payouts(
    persistence: &mut SqlitePersistence,
    request: ListPayoutsRequest,
) -> Result<ListPayoutsResponse, ApiError> {
    let records: Vec<PayoutRecord> = persistence.list_payouts(request.guide_id)?;
    Ok(ListPayoutsResponse {
        payouts: records
            .iter()
            .map(PayoutInfo::try_from)
            .collect::<Result<Vec<_>, _>>()?,
    })
}

/// Computes ledger totals as of `now`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn payout_summary(
    persistence: &mut SqlitePersistence,
    now: OffsetDateTime,
) -> Result<PayoutSummary, ApiError> {
    let records: Vec<PayoutRecord> = persistence.list_payouts(None)?;
    Ok(summarize_payouts(&records, now)?)
}

/// Computes a guide's all-time share against their payouts.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if the guide does not exist.
pub fn guide_balance(
    persistence: &mut SqlitePersistence,
    guide_id: i64,
    policy: RevenuePolicy,
    today: Date,
) -> Result<GuideBalance, ApiError> {
    persistence.get_guide(guide_id)?;
    let guide_share: i64 = all_time_guide_share(persistence, guide_id, policy, today)?;
    let records: Vec<PayoutRecord> = persistence.list_payouts(Some(guide_id))?;
    Ok(compute_guide_balance(guide_id, guide_share, &records)?)
}
