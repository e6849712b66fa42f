// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{BookingCommand, BookingTransition, NewBooking, apply, create_booking};
use time::OffsetDateTime;
use time::macros::{date, datetime};
use tourdesk_audit::Actor;
use tourdesk_domain::{
    Booking, BookingReference, BookingStatus, GroupSize, Guide, TourDetails, TourType,
    VisitorInfo,
};

pub const CREATED_AT: OffsetDateTime = datetime!(2025-06-01 08:00 UTC);

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("desk-1"), String::from("operator"))
}

pub fn create_test_guide(guide_id: i64) -> Guide {
    Guide::new(guide_id, format!("Guide {guide_id}"), None, true)
}

pub fn create_test_new_booking() -> NewBooking {
    NewBooking {
        visitor: VisitorInfo::new(
            String::from("Ada Visitor"),
            String::from("ada@example.com"),
            Some(String::from("+10000000000")),
            None,
        ),
        tour: TourDetails {
            visit_date: date!(2025 - 06 - 10),
            visit_time: None,
            tour_type: TourType::Standard,
            group_size: GroupSize::Individual,
            number_of_people: 1,
        },
        payment_method: None,
        admin_notes: None,
    }
}

/// A freshly created booking, as if persisted with id 1.
pub fn create_test_booking() -> Booking {
    let result: BookingTransition = create_booking(
        create_test_new_booking(),
        BookingReference::generate(CREATED_AT.date(), 0xCAFE_0001),
        create_test_actor(),
        CREATED_AT,
    )
    .unwrap();
    let mut booking: Booking = result.new_booking;
    booking.booking_id = Some(1);
    booking
}

/// Applies a command that is expected to succeed.
pub fn step(booking: &Booking, command: BookingCommand, at: OffsetDateTime) -> Booking {
    apply(booking, command, create_test_actor(), at)
        .unwrap()
        .new_booking
}

pub fn confirmed_booking() -> Booking {
    step(
        &create_test_booking(),
        BookingCommand::Transition {
            new_status: BookingStatus::Confirmed,
        },
        datetime!(2025-06-01 09:00 UTC),
    )
}

pub fn checked_in_booking(at: OffsetDateTime) -> Booking {
    step(&confirmed_booking(), BookingCommand::CheckIn, at)
}
