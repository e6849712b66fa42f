// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::{
    CREATED_AT, create_test_actor, create_test_new_booking, store_booking, store_guide,
    store_step,
};
use crate::{BookingFilter, PersistenceError, SqlitePersistence};
use time::macros::{date, datetime};
use tourdesk::{BookingCommand, create_booking};
use tourdesk_domain::{
    Booking, BookingReference, BookingStatus, PaymentMethod, PaymentStatus, RevenueQuery,
};

#[test]
fn test_insert_booking_round_trips_all_fields() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let stored = store_booking(&mut persistence, 0x0000_00A1);

    let booking: Booking = stored.booking;
    let booking_id: i64 = booking.booking_id.unwrap();
    assert_eq!(booking.booking_reference.value(), "TD-20250601-000000A1");
    assert_eq!(booking.visitor.nationality.as_deref(), Some("Kenya"));
    assert_eq!(booking.tour.visit_date, date!(2025 - 06 - 10));
    assert_eq!(booking.tour.visit_time, Some(time::macros::time!(09:00)));
    assert_eq!(booking.total_amount, 15_000);
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.version, 1);
    assert_eq!(booking.created_at, CREATED_AT);

    let activity = stored.activity.unwrap();
    assert_eq!(activity.booking_id, Some(booking_id));
    assert!(activity.activity_id.is_some());

    let fetched: Booking = persistence.get_booking(booking_id).unwrap();
    assert_eq!(fetched, booking);
}

#[test]
fn test_get_booking_by_reference() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let stored = store_booking(&mut persistence, 0x0000_00B2);

    let fetched = persistence
        .get_booking_by_reference("TD-20250601-000000B2")
        .unwrap();
    assert_eq!(fetched.booking_id, stored.booking.booking_id);

    assert_eq!(
        persistence.get_booking_by_reference("TD-20250601-FFFFFFFF"),
        Err(PersistenceError::BookingReferenceNotFound(String::from(
            "TD-20250601-FFFFFFFF"
        )))
    );
}

#[test]
fn test_unknown_booking_is_not_found() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    assert_eq!(
        persistence.get_booking(404),
        Err(PersistenceError::BookingNotFound(404))
    );
}

#[test]
fn test_duplicate_reference_rejected_and_nothing_written() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    store_booking(&mut persistence, 7);

    let duplicate = create_booking(
        create_test_new_booking(),
        BookingReference::generate(CREATED_AT.date(), 7),
        create_test_actor(),
        CREATED_AT,
    )
    .unwrap();

    let result = persistence.insert_booking(&duplicate);
    assert!(matches!(result, Err(PersistenceError::UniqueViolation(_))));
    assert_eq!(
        persistence
            .list_bookings(&BookingFilter::default())
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn test_transition_persists_new_version() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let booking: Booking = store_booking(&mut persistence, 1).booking;

    let confirmed: Booking = store_step(
        &mut persistence,
        &booking,
        BookingCommand::Transition {
            new_status: BookingStatus::Confirmed,
        },
        datetime!(2025-06-01 09:00 UTC),
    );

    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert_eq!(confirmed.version, 2);
    assert_eq!(
        persistence.get_booking(booking.booking_id.unwrap()).unwrap(),
        confirmed
    );
}

#[test]
fn test_check_in_and_out_times_round_trip() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let guide = store_guide(&mut persistence, "Amina");
    let mut booking: Booking = store_booking(&mut persistence, 1).booking;

    booking = store_step(
        &mut persistence,
        &booking,
        BookingCommand::Transition {
            new_status: BookingStatus::Confirmed,
        },
        datetime!(2025-06-01 09:00 UTC),
    );
    booking = store_step(
        &mut persistence,
        &booking,
        BookingCommand::AssignGuide { guide },
        datetime!(2025-06-01 09:01 UTC),
    );
    booking = store_step(
        &mut persistence,
        &booking,
        BookingCommand::CheckIn,
        datetime!(2025-06-10 09:00 UTC),
    );
    booking = store_step(
        &mut persistence,
        &booking,
        BookingCommand::CheckOut,
        datetime!(2025-06-10 11:05 UTC),
    );

    let fetched: Booking = persistence.get_booking(booking.booking_id.unwrap()).unwrap();
    assert_eq!(fetched.status, BookingStatus::Completed);
    assert_eq!(fetched.check_in_time, Some(datetime!(2025-06-10 09:00 UTC)));
    assert_eq!(fetched.check_out_time, Some(datetime!(2025-06-10 11:05 UTC)));
    assert_eq!(
        fetched.tour_duration(),
        Some(time::Duration::minutes(125))
    );
    assert_eq!(fetched.version, 5);
}

#[test]
fn test_list_bookings_filters() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let guide = store_guide(&mut persistence, "Amina");
    let guide_id: i64 = guide.guide_id;

    let first: Booking = store_booking(&mut persistence, 1).booking;
    let second: Booking = store_booking(&mut persistence, 2).booking;
    store_booking(&mut persistence, 3);

    store_step(
        &mut persistence,
        &first,
        BookingCommand::AssignGuide { guide },
        datetime!(2025-06-01 09:00 UTC),
    );
    store_step(
        &mut persistence,
        &second,
        BookingCommand::UpdatePaymentStatus {
            payment_status: PaymentStatus::Paid,
            payment_method: Some(PaymentMethod::Card),
        },
        datetime!(2025-06-01 09:00 UTC),
    );

    let all = persistence.list_bookings(&BookingFilter::default()).unwrap();
    assert_eq!(all.len(), 3);

    let by_guide = persistence
        .list_bookings(&BookingFilter {
            guide_id: Some(guide_id),
            ..BookingFilter::default()
        })
        .unwrap();
    assert_eq!(by_guide.len(), 1);
    assert_eq!(by_guide[0].booking_id, first.booking_id);

    let paid = persistence
        .list_bookings(&BookingFilter {
            payment_status: Some(PaymentStatus::Paid),
            ..BookingFilter::default()
        })
        .unwrap();
    assert_eq!(paid.len(), 1);
    assert_eq!(paid[0].payment_method, Some(PaymentMethod::Card));

    let out_of_range = persistence
        .list_bookings(&BookingFilter {
            date_from: Some(date!(2025 - 06 - 11)),
            ..BookingFilter::default()
        })
        .unwrap();
    assert!(out_of_range.is_empty());

    let in_range = persistence
        .list_bookings(&BookingFilter {
            date_from: Some(date!(2025 - 06 - 10)),
            date_to: Some(date!(2025 - 06 - 10)),
            status: Some(BookingStatus::Pending),
            ..BookingFilter::default()
        })
        .unwrap();
    assert_eq!(in_range.len(), 3);
}

#[test]
fn test_revenue_snapshot_applies_query() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let booking: Booking = store_booking(&mut persistence, 1).booking;
    store_booking(&mut persistence, 2);
    store_step(
        &mut persistence,
        &booking,
        BookingCommand::Transition {
            new_status: BookingStatus::Cancelled,
        },
        datetime!(2025-06-01 09:00 UTC),
    );

    let cancelled = persistence
        .revenue_snapshot(&RevenueQuery {
            status_filter: Some(BookingStatus::Cancelled),
            ..RevenueQuery::default()
        })
        .unwrap();
    assert_eq!(cancelled.len(), 1);

    let everything = persistence
        .revenue_snapshot(&RevenueQuery::default())
        .unwrap();
    assert_eq!(everything.len(), 2);
}

#[test]
fn test_guides_active_flag() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let guide = store_guide(&mut persistence, "Amina");
    assert!(guide.is_active);

    let deactivated = persistence.set_guide_active(guide.guide_id, false).unwrap();
    assert!(!deactivated.is_active);
    assert!(!persistence.get_guide(guide.guide_id).unwrap().is_active);

    assert_eq!(
        persistence.set_guide_active(99, true),
        Err(PersistenceError::GuideNotFound(99))
    );
    assert_eq!(
        persistence.get_guide(99),
        Err(PersistenceError::GuideNotFound(99))
    );
}

#[test]
fn test_assigning_unknown_guide_is_rejected_by_foreign_key() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let booking: Booking = store_booking(&mut persistence, 1).booking;

    let ghost = tourdesk_domain::Guide::new(77, String::from("Ghost"), None, true);
    let transition = tourdesk::apply(
        &booking,
        BookingCommand::AssignGuide { guide: ghost },
        create_test_actor(),
        datetime!(2025-06-01 09:00 UTC),
    )
    .unwrap();

    let result = persistence.persist_booking_transition(
        &transition,
        booking.version,
        datetime!(2025-06-01 09:00 UTC),
    );
    assert!(matches!(result, Err(PersistenceError::DatabaseError(_))));
    assert_eq!(
        persistence
            .get_booking(booking.booking_id.unwrap())
            .unwrap()
            .assigned_guide_id,
        None
    );
}
