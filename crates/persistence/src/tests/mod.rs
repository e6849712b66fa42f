// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod booking_tests;

use crate::{PersistedBooking, SqlitePersistence};
use time::OffsetDateTime;
use time::macros::{date, datetime};
use tourdesk::{BookingCommand, NewBooking, apply, create_booking};
use tourdesk_audit::Actor;
use tourdesk_domain::{
    Booking, BookingReference, GroupSize, Guide, TourDetails, TourType, VisitorInfo,
};

pub const CREATED_AT: OffsetDateTime = datetime!(2025-06-01 08:00 UTC);

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("desk-1"), String::from("operator"))
}

pub fn create_test_new_booking() -> NewBooking {
    NewBooking {
        visitor: VisitorInfo::new(
            String::from("Ada Visitor"),
            String::from("ada@example.com"),
            None,
            Some(String::from("Kenya")),
        ),
        tour: TourDetails {
            visit_date: date!(2025 - 06 - 10),
            visit_time: Some(time::macros::time!(09:00)),
            tour_type: TourType::Standard,
            group_size: GroupSize::Individual,
            number_of_people: 1,
        },
        payment_method: None,
        admin_notes: None,
    }
}

/// Creates and stores a booking with the given reference token.
pub fn store_booking(persistence: &mut SqlitePersistence, token: u32) -> PersistedBooking {
    let transition = create_booking(
        create_test_new_booking(),
        BookingReference::generate(CREATED_AT.date(), token),
        create_test_actor(),
        CREATED_AT,
    )
    .unwrap();
    persistence.insert_booking(&transition).unwrap()
}

/// Applies a command against the stored booking and persists it.
pub fn store_step(
    persistence: &mut SqlitePersistence,
    booking: &Booking,
    command: BookingCommand,
    at: OffsetDateTime,
) -> Booking {
    let transition = apply(booking, command, create_test_actor(), at).unwrap();
    persistence
        .persist_booking_transition(&transition, booking.version, at)
        .unwrap()
        .booking
}

pub fn store_guide(persistence: &mut SqlitePersistence, name: &str) -> Guide {
    persistence.create_guide(name, None, true, CREATED_AT).unwrap()
}
