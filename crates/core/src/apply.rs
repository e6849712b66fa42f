// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::{BookingCommand, NewBooking, PayoutCommand, PayoutRequest};
use crate::error::CoreError;
use crate::state::{BookingTransition, ShareCap};
use time::OffsetDateTime;
use tourdesk_audit::{ActivityAction, ActivityRecord, Actor};
use tourdesk_domain::{
    Booking, BookingReference, BookingStatus, DomainError, Guide, PaymentStatus, PayoutRecord,
    check_within_share, quote_total, validate_visitor_info,
};

/// Creates a new booking from operator input.
///
/// The booking starts `pending` on both axes, with its total quoted from the
/// pricing table. The reference is supplied by the caller so that collisions
/// can be retried against the store.
///
/// # Arguments
///
/// * `new_booking` - Visitor and tour details
/// * `reference` - A freshly generated booking reference
/// * `actor` - The operator creating the booking
/// * `now` - The creation time
///
/// # Errors
///
/// Returns an error if:
/// - The visitor's name or email is missing or malformed
/// - The head count does not fit the group size
pub fn create_booking(
    new_booking: NewBooking,
    reference: BookingReference,
    actor: Actor,
    now: OffsetDateTime,
) -> Result<BookingTransition, CoreError> {
    validate_visitor_info(&new_booking.visitor)?;

    let total_amount: i64 = quote_total(
        new_booking.tour.tour_type,
        new_booking.tour.group_size,
        new_booking.tour.number_of_people,
    )?;

    let description: String = format!(
        "Booking {reference} created for {} ({} x {}, {} people)",
        new_booking.visitor.name,
        new_booking.tour.tour_type,
        new_booking.tour.group_size,
        new_booking.tour.number_of_people
    );

    let booking: Booking = Booking {
        booking_id: None,
        booking_reference: reference,
        visitor: new_booking.visitor,
        tour: new_booking.tour,
        status: BookingStatus::Pending,
        payment_status: PaymentStatus::Pending,
        payment_method: new_booking.payment_method,
        total_amount,
        assigned_guide_id: None,
        check_in_time: None,
        check_out_time: None,
        admin_notes: new_booking.admin_notes,
        created_at: now,
        version: 1,
    };

    let activity: ActivityRecord = ActivityRecord::new(
        None,
        ActivityAction::Created,
        BookingStatus::Pending,
        Some(BookingStatus::Pending),
        description,
        actor,
        now,
    );

    Ok(BookingTransition {
        new_booking: booking,
        activity: Some(activity),
    })
}

/// Applies a command to a booking, producing the new booking and its activity record.
///
/// The input booking is never modified. On success the returned booking has
/// its `version` incremented by one, except for a no-op guide reassignment.
///
/// # Arguments
///
/// * `booking` - The booking as last read (immutable)
/// * `command` - The command to apply
/// * `actor` - The operator performing this action
/// * `now` - The time of the action
///
/// # Errors
///
/// Returns an error if:
/// - The requested status edge is not allowed
/// - The operation is not permitted in the booking's current status
/// - The guide is inactive
/// - Check-out would precede check-in
pub fn apply(
    booking: &Booking,
    command: BookingCommand,
    actor: Actor,
    now: OffsetDateTime,
) -> Result<BookingTransition, CoreError> {
    match command {
        BookingCommand::Transition { new_status } => {
            booking.status.validate_transition(new_status)?;

            if new_status == BookingStatus::Completed {
                // Completion always goes through check-out.
                if booking.check_in_time.is_none() {
                    return Err(CoreError::DomainViolation(
                        DomainError::InvalidStatusTransition {
                            from: booking.status.as_str().to_string(),
                            to: new_status.as_str().to_string(),
                            reason: String::from(
                                "the visitor must be checked in before the tour can complete",
                            ),
                        },
                    ));
                }
                return complete_via_checkout(booking, actor, now);
            }

            let mut new_booking: Booking = next_version(booking);
            new_booking.status = new_status;

            let activity: ActivityRecord = ActivityRecord::new(
                booking.booking_id,
                ActivityAction::StatusChanged,
                booking.status,
                Some(new_status),
                format!("Status changed from {} to {new_status}", booking.status),
                actor,
                now,
            );

            Ok(BookingTransition {
                new_booking,
                activity: Some(activity),
            })
        }
        BookingCommand::AssignGuide { guide } => assign_guide(booking, &guide, actor, now),
        BookingCommand::CheckIn => {
            if booking.status != BookingStatus::Confirmed {
                return Err(not_permitted(
                    "check in",
                    booking,
                    "only confirmed bookings can be checked in",
                ));
            }
            if booking.check_in_time.is_some() {
                return Err(not_permitted(
                    "check in",
                    booking,
                    "the visitor is already checked in",
                ));
            }

            let mut new_booking: Booking = next_version(booking);
            new_booking.check_in_time = Some(now);

            let activity: ActivityRecord = ActivityRecord::new(
                booking.booking_id,
                ActivityAction::CheckedIn,
                booking.status,
                None,
                String::from("Visitor checked in"),
                actor,
                now,
            );

            Ok(BookingTransition {
                new_booking,
                activity: Some(activity),
            })
        }
        BookingCommand::CheckOut => complete_via_checkout(booking, actor, now),
        BookingCommand::UpdatePaymentStatus {
            payment_status,
            payment_method,
        } => {
            let mut new_booking: Booking = next_version(booking);
            new_booking.payment_status = payment_status;
            if payment_method.is_some() {
                new_booking.payment_method = payment_method;
            }

            let description: String = new_booking.payment_method.map_or_else(
                || {
                    format!(
                        "Payment status changed from {} to {payment_status}",
                        booking.payment_status
                    )
                },
                |method| {
                    format!(
                        "Payment status changed from {} to {payment_status} ({method})",
                        booking.payment_status
                    )
                },
            );

            let activity: ActivityRecord = ActivityRecord::new(
                booking.booking_id,
                ActivityAction::PaymentUpdated,
                booking.status,
                None,
                description,
                actor,
                now,
            );

            Ok(BookingTransition {
                new_booking,
                activity: Some(activity),
            })
        }
        BookingCommand::UpdateNotes { notes } => {
            let mut new_booking: Booking = next_version(booking);
            new_booking.admin_notes = notes.filter(|n| !n.trim().is_empty());

            let activity: ActivityRecord = ActivityRecord::new(
                booking.booking_id,
                ActivityAction::NotesUpdated,
                booking.status,
                None,
                String::from("Admin notes updated"),
                actor,
                now,
            );

            Ok(BookingTransition {
                new_booking,
                activity: Some(activity),
            })
        }
    }
}

fn assign_guide(
    booking: &Booking,
    guide: &Guide,
    actor: Actor,
    now: OffsetDateTime,
) -> Result<BookingTransition, CoreError> {
    if !booking.status.accepts_guide_assignment() {
        return Err(not_permitted(
            "assign a guide to",
            booking,
            "guides can only be assigned to pending or confirmed bookings",
        ));
    }
    if !guide.is_active {
        return Err(CoreError::DomainViolation(DomainError::InactiveGuide {
            guide_id: guide.guide_id,
        }));
    }
    if booking.assigned_guide_id == Some(guide.guide_id) {
        return Ok(BookingTransition {
            new_booking: booking.clone(),
            activity: None,
        });
    }

    let description: String = booking.assigned_guide_id.map_or_else(
        || format!("Guide {} ({}) assigned", guide.guide_id, guide.name),
        |previous| {
            format!(
                "Guide {} ({}) assigned, replacing guide {previous}",
                guide.guide_id, guide.name
            )
        },
    );

    let mut new_booking: Booking = next_version(booking);
    new_booking.assigned_guide_id = Some(guide.guide_id);

    let activity: ActivityRecord = ActivityRecord::new(
        booking.booking_id,
        ActivityAction::Assigned,
        booking.status,
        None,
        description,
        actor,
        now,
    );

    Ok(BookingTransition {
        new_booking,
        activity: Some(activity),
    })
}

/// Sets the check-out time and completes the tour in one step.
fn complete_via_checkout(
    booking: &Booking,
    actor: Actor,
    now: OffsetDateTime,
) -> Result<BookingTransition, CoreError> {
    let Some(check_in) = booking.check_in_time else {
        return Err(not_permitted(
            "check out",
            booking,
            "the visitor has not checked in",
        ));
    };
    if booking.check_out_time.is_some() {
        return Err(not_permitted(
            "check out",
            booking,
            "the visitor is already checked out",
        ));
    }
    booking.status.validate_transition(BookingStatus::Completed)?;
    if now < check_in {
        return Err(CoreError::DomainViolation(
            DomainError::CheckOutBeforeCheckIn {
                check_in: check_in.to_string(),
                check_out: now.to_string(),
            },
        ));
    }

    let mut new_booking: Booking = next_version(booking);
    new_booking.check_out_time = Some(now);
    new_booking.status = BookingStatus::Completed;

    let minutes: i64 = (now - check_in).whole_minutes();
    let activity: ActivityRecord = ActivityRecord::new(
        booking.booking_id,
        ActivityAction::CheckedOut,
        booking.status,
        Some(BookingStatus::Completed),
        format!(
            "Visitor checked out after {}h{:02}m; tour completed",
            minutes / 60,
            minutes % 60
        ),
        actor,
        now,
    );

    Ok(BookingTransition {
        new_booking,
        activity: Some(activity),
    })
}

fn next_version(booking: &Booking) -> Booking {
    let mut next: Booking = booking.clone();
    next.version = booking.version + 1;
    next
}

fn not_permitted(operation: &'static str, booking: &Booking, reason: &str) -> CoreError {
    CoreError::DomainViolation(DomainError::OperationNotPermitted {
        operation,
        status: booking.status.as_str().to_string(),
        reason: reason.to_string(),
    })
}

/// Opens a pending payout for a guide.
///
/// Opening a payout does not touch any booking.
///
/// # Arguments
///
/// * `guide` - The guide being paid, as currently stored
/// * `request` - The operator's payout request
/// * `cap` - The guide's share position, when the share cap is enforced.
///   `committed` must cover both pending and paid payouts.
/// * `now` - The creation time
///
/// # Errors
///
/// Returns an error if:
/// - The request names a different guide
/// - The amount is not positive
/// - The amount would exceed the guide's unpaid share
pub fn open_payout(
    guide: &Guide,
    request: PayoutRequest,
    cap: Option<ShareCap>,
    now: OffsetDateTime,
) -> Result<PayoutRecord, CoreError> {
    if request.guide_id != guide.guide_id {
        return Err(CoreError::DomainViolation(DomainError::InvalidField {
            field: "guide_id",
            reason: format!(
                "payout for guide {} opened against guide {}",
                request.guide_id, guide.guide_id
            ),
        }));
    }

    let record: PayoutRecord = PayoutRecord::new_pending(
        request.guide_id,
        request.amount,
        request.tours_count,
        request.window,
        request.notes,
        now,
    )?;

    if let Some(cap) = cap {
        check_within_share(guide.guide_id, cap.guide_share, cap.committed, record.amount)?;
    }

    Ok(record)
}

/// Applies a command to an existing payout.
///
/// # Arguments
///
/// * `record` - The payout as last read
/// * `command` - The command to apply
/// * `cap` - The guide's share position, when the share cap is enforced.
///   `committed` must cover paid payouts only.
/// * `now` - The time of the action
///
/// # Errors
///
/// Returns an error if:
/// - The payout is already paid
/// - Settling would push paid payouts past the guide's share
pub fn apply_payout(
    record: &PayoutRecord,
    command: PayoutCommand,
    cap: Option<ShareCap>,
    now: OffsetDateTime,
) -> Result<PayoutRecord, CoreError> {
    match command {
        PayoutCommand::MarkPaid {
            payment_method,
            payment_reference,
        } => {
            let settled: PayoutRecord = record.settle(payment_method, payment_reference, now)?;
            if let Some(cap) = cap {
                check_within_share(
                    record.guide_id,
                    cap.guide_share,
                    cap.committed,
                    record.amount,
                )?;
            }
            Ok(settled)
        }
    }
}
