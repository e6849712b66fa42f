// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]


use crate::{
    Booking, BookingReference, BookingStatus, GroupSize, PaymentMethod, PaymentStatus,
    TourDetails, TourType, VisitorInfo,
};
use time::Date;
use time::macros::{date, datetime};

/// Builds a persisted-looking booking with the given lifecycle fields.
pub fn create_test_booking(
    booking_id: i64,
    guide_id: Option<i64>,
    visit_date: Date,
    status: BookingStatus,
    payment_status: PaymentStatus,
    total_amount: i64,
) -> Booking {
    Booking {
        booking_id: Some(booking_id),
        booking_reference: BookingReference::generate(date!(2025 - 05 - 20), 0x00AB_0000 + 1),
        visitor: VisitorInfo::new(
            String::from("Ada Visitor"),
            String::from("ada@example.com"),
            None,
            None,
        ),
        tour: TourDetails {
            visit_date,
            visit_time: None,
            tour_type: TourType::Standard,
            group_size: GroupSize::Individual,
            number_of_people: 1,
        },
        status,
        payment_status,
        payment_method: Some(PaymentMethod::Cash),
        total_amount,
        assigned_guide_id: guide_id,
        check_in_time: None,
        check_out_time: None,
        admin_notes: None,
        created_at: datetime!(2025-05-20 10:00 UTC),
        version: 1,
    }
}
