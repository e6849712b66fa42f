// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::pricing::{GroupSize, PaymentMethod, TourType};
use crate::status::{BookingStatus, PaymentStatus};
use time::{Date, Duration, OffsetDateTime, Time};

/// Contact details supplied by the visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorInfo {
    /// Full name.
    pub name: String,
    /// Contact email address.
    pub email: String,
    /// Contact phone number, if given.
    pub phone: Option<String>,
    /// Country of residence, if given.
    pub nationality: Option<String>,
}

impl VisitorInfo {
    #[must_use]
    pub const fn new(
        name: String,
        email: String,
        phone: Option<String>,
        nationality: Option<String>,
    ) -> Self {
        Self {
            name,
            email,
            phone,
            nationality,
        }
    }
}

/// What was booked and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TourDetails {
    /// The day of the visit. Also the revenue recognition date.
    pub visit_date: Date,
    /// The requested start time, if any.
    pub visit_time: Option<Time>,
    pub tour_type: TourType,
    pub group_size: GroupSize,
    pub number_of_people: u32,
}

/// A human-facing unique booking reference.
///
/// Format: `TD-YYYYMMDD-XXXXXXXX`, where the date is the creation date and
/// the suffix is eight uppercase hexadecimal digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BookingReference(String);

impl BookingReference {
    const PREFIX: &'static str = "TD-";

    /// Builds a reference from the creation date and a random token.
    #[must_use]
    pub fn generate(created_on: Date, token: u32) -> Self {
        Self(format!(
            "{}{:04}{:02}{:02}-{token:08X}",
            Self::PREFIX,
            created_on.year(),
            u8::from(created_on.month()),
            created_on.day()
        ))
    }

    /// Parses and validates an existing reference.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidField` if the string is not a well-formed reference.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let invalid = || DomainError::InvalidField {
            field: "booking_reference",
            reason: format!("'{value}' is not of the form TD-YYYYMMDD-XXXXXXXX"),
        };

        let rest: &str = value.strip_prefix(Self::PREFIX).ok_or_else(invalid)?;
        let (date_part, token_part) = rest.split_once('-').ok_or_else(invalid)?;

        if date_part.len() != 8 || !date_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if token_part.len() != 8
            || !token_part
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
        {
            return Err(invalid());
        }

        Ok(Self(value.to_string()))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookingReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single booked tour.
///
/// Bookings are never deleted. Every change goes through the booking state
/// machine, which bumps `version` once per successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    /// Database identifier. `None` until persisted.
    pub booking_id: Option<i64>,
    pub booking_reference: BookingReference,
    pub visitor: VisitorInfo,
    pub tour: TourDetails,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    /// Quoted at creation from the pricing table. Never recomputed.
    pub total_amount: i64,
    pub assigned_guide_id: Option<i64>,
    pub check_in_time: Option<OffsetDateTime>,
    pub check_out_time: Option<OffsetDateTime>,
    pub admin_notes: Option<String>,
    pub created_at: OffsetDateTime,
    /// Optimistic concurrency counter. Starts at 1.
    pub version: i64,
}

impl Booking {
    /// Returns the database identifier, if the booking has been persisted.
    #[must_use]
    pub const fn booking_id(&self) -> Option<i64> {
        self.booking_id
    }

    /// Time between check-in and check-out, once both are recorded.
    #[must_use]
    pub fn tour_duration(&self) -> Option<Duration> {
        match (self.check_in_time, self.check_out_time) {
            (Some(check_in), Some(check_out)) => Some(check_out - check_in),
            _ => None,
        }
    }

    /// True when the tour counts toward guide earnings.
    #[must_use]
    pub fn is_payout_eligible(&self) -> bool {
        self.status == BookingStatus::Completed && self.payment_status == PaymentStatus::Paid
    }
}

/// A tour guide.
///
/// Guides are reference data; the booking core only reads them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guide {
    pub guide_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub is_active: bool,
}

impl Guide {
    #[must_use]
    pub const fn new(guide_id: i64, name: String, phone: Option<String>, is_active: bool) -> Self {
        Self {
            guide_id,
            name,
            phone,
            is_active,
        }
    }
}
