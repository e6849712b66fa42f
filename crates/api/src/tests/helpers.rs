// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use time::OffsetDateTime;
use time::macros::datetime;
use tourdesk_audit::Actor;
use tourdesk_persistence::SqlitePersistence;

use crate::{
    AssignGuideRequest, BookingInfo, CreateBookingRequest, CreateGuideRequest, GuideInfo,
    TransitionBookingRequest, UpdatePaymentRequest, VersionedRequest, assign_guide, check_in,
    check_out, create_booking_with_tokens, create_guide, transition_booking, update_payment,
};

/// Booking creation time used across the API tests.
pub const BOOKED_AT: OffsetDateTime = datetime!(2025-06-01 08:00 UTC);
pub const CHECK_IN_AT: OffsetDateTime = datetime!(2025-06-10 09:00 UTC);
pub const CHECK_OUT_AT: OffsetDateTime = datetime!(2025-06-10 11:05 UTC);

pub fn create_test_persistence() -> SqlitePersistence {
    SqlitePersistence::new_in_memory().unwrap()
}

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("desk-7"), String::from("operator"))
}

pub fn create_valid_booking_request() -> CreateBookingRequest {
    CreateBookingRequest {
        name: String::from("Ada Visitor"),
        email: String::from("ada@example.com"),
        phone: Some(String::from("+254 700 000000")),
        nationality: Some(String::from("Kenya")),
        visit_date: String::from("2025-06-10"),
        visit_time: Some(String::from("09:00")),
        tour_type: String::from("standard"),
        group_size: String::from("individual"),
        number_of_people: 1,
        payment_method: None,
        admin_notes: None,
    }
}

pub fn create_test_guide(persistence: &mut SqlitePersistence, name: &str) -> GuideInfo {
    create_guide(
        persistence,
        &CreateGuideRequest {
            name: name.to_string(),
            phone: None,
            is_active: None,
        },
        BOOKED_AT,
    )
    .unwrap()
}

/// Creates a booking whose reference token is `token`.
pub fn create_test_booking(persistence: &mut SqlitePersistence, token: u32) -> BookingInfo {
    create_booking_with_tokens(
        persistence,
        create_valid_booking_request(),
        create_test_actor(),
        BOOKED_AT,
        || token,
    )
    .unwrap()
    .booking
}

/// Walks a fresh booking through confirm, assign, check-in, check-out and payment.
pub fn create_paid_completed_booking(
    persistence: &mut SqlitePersistence,
    token: u32,
    guide_id: i64,
) -> BookingInfo {
    let booking: BookingInfo = create_test_booking(persistence, token);
    let booking_id: i64 = booking.booking_id;

    transition_booking(
        persistence,
        booking_id,
        &TransitionBookingRequest {
            status: String::from("confirmed"),
            expected_version: None,
        },
        create_test_actor(),
        BOOKED_AT,
    )
    .unwrap();
    assign_guide(
        persistence,
        booking_id,
        AssignGuideRequest {
            guide_id,
            expected_version: None,
        },
        create_test_actor(),
        BOOKED_AT,
    )
    .unwrap();
    check_in(
        persistence,
        booking_id,
        VersionedRequest::default(),
        create_test_actor(),
        CHECK_IN_AT,
    )
    .unwrap();
    check_out(
        persistence,
        booking_id,
        VersionedRequest::default(),
        create_test_actor(),
        CHECK_OUT_AT,
    )
    .unwrap();
    update_payment(
        persistence,
        booking_id,
        UpdatePaymentRequest {
            payment_status: String::from("paid"),
            payment_method: Some(String::from("cash")),
            expected_version: None,
        },
        create_test_actor(),
        CHECK_OUT_AT,
    )
    .unwrap()
    .booking
}
