// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field was missing or blank.
    MissingField {
        /// The name of the missing field.
        field: &'static str,
    },
    /// A field was present but malformed.
    InvalidField {
        /// The name of the invalid field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// A booking status string could not be parsed.
    InvalidBookingStatus(String),
    /// A payment status string could not be parsed.
    InvalidPaymentStatus(String),
    /// A payment method string could not be parsed.
    InvalidPaymentMethod(String),
    /// A tour type string could not be parsed.
    InvalidTourType(String),
    /// A group size string could not be parsed.
    InvalidGroupSize(String),
    /// A payout status string could not be parsed.
    InvalidPayoutStatus(String),
    /// The head count does not fit the selected group size.
    GroupSizeMismatch {
        /// The selected group size.
        group_size: String,
        /// The requested number of people.
        number_of_people: u32,
        /// Smallest head count accepted for this group size.
        min: u32,
        /// Largest head count accepted for this group size.
        max: u32,
    },
    /// A status edge that is not in the transition table was requested.
    InvalidStatusTransition {
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
        /// Why the edge was rejected.
        reason: String,
    },
    /// An operation is not permitted in the booking's current lifecycle position.
    OperationNotPermitted {
        /// The operation that was attempted.
        operation: &'static str,
        /// The booking's current status.
        status: String,
        /// Why the operation was rejected.
        reason: String,
    },
    /// Check-out was attempted with a timestamp earlier than check-in.
    CheckOutBeforeCheckIn {
        /// The recorded check-in time.
        check_in: String,
        /// The attempted check-out time.
        check_out: String,
    },
    /// The guide exists but is not active.
    InactiveGuide {
        /// The guide identifier.
        guide_id: i64,
    },
    /// The payout was already settled.
    PayoutAlreadyPaid {
        /// The payout identifier.
        payout_id: i64,
    },
    /// A payout amount must be positive.
    InvalidPayoutAmount {
        /// The rejected amount.
        amount: i64,
    },
    /// A payout would exceed the guide's computed share.
    PayoutExceedsShare {
        /// The guide identifier.
        guide_id: i64,
        /// The amount requested.
        requested: i64,
        /// The amount still available under the computed share.
        available: i64,
    },
    /// A share rate outside 0..=10000 basis points.
    InvalidShareRate {
        /// The rejected rate in basis points.
        basis_points: u32,
    },
    /// A date range where the start falls after the end.
    InvalidDateRange {
        /// The start of the range.
        from: time::Date,
        /// The end of the range.
        to: time::Date,
    },
    /// Failed to parse a date or timestamp string.
    DateParseError {
        /// The invalid string.
        date_string: String,
        /// The parser's message.
        error: String,
    },
    /// A monetary computation overflowed.
    AmountOverflow {
        /// Description of the computation that failed.
        operation: &'static str,
    },
}

impl std::fmt::Display for DomainError {
    #[allow(clippy::too_many_lines)]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "Required field '{field}' is missing"),
            Self::InvalidField { field, reason } => {
                write!(f, "Invalid value for '{field}': {reason}")
            }
            Self::InvalidBookingStatus(s) => write!(f, "Invalid booking status: {s}"),
            Self::InvalidPaymentStatus(s) => write!(f, "Invalid payment status: {s}"),
            Self::InvalidPaymentMethod(s) => write!(f, "Invalid payment method: {s}"),
            Self::InvalidTourType(s) => write!(f, "Invalid tour type: {s}"),
            Self::InvalidGroupSize(s) => write!(f, "Invalid group size: {s}"),
            Self::InvalidPayoutStatus(s) => write!(f, "Invalid payout status: {s}"),
            Self::GroupSizeMismatch {
                group_size,
                number_of_people,
                min,
                max,
            } => {
                write!(
                    f,
                    "Group size '{group_size}' accepts {min} to {max} people, got {number_of_people}"
                )
            }
            Self::InvalidStatusTransition { from, to, reason } => {
                write!(f, "Cannot transition booking from '{from}' to '{to}': {reason}")
            }
            Self::OperationNotPermitted {
                operation,
                status,
                reason,
            } => {
                write!(
                    f,
                    "Cannot {operation} a booking in status '{status}': {reason}"
                )
            }
            Self::CheckOutBeforeCheckIn {
                check_in,
                check_out,
            } => {
                write!(
                    f,
                    "Check-out time {check_out} is earlier than check-in time {check_in}"
                )
            }
            Self::InactiveGuide { guide_id } => {
                write!(f, "Guide {guide_id} is inactive and cannot be assigned")
            }
            Self::PayoutAlreadyPaid { payout_id } => {
                write!(f, "Payout {payout_id} has already been paid")
            }
            Self::InvalidPayoutAmount { amount } => {
                write!(f, "Invalid payout amount: {amount}. Must be greater than 0")
            }
            Self::PayoutExceedsShare {
                guide_id,
                requested,
                available,
            } => {
                write!(
                    f,
                    "Payout of {requested} for guide {guide_id} exceeds the unpaid computed share of {available}"
                )
            }
            Self::InvalidShareRate { basis_points } => {
                write!(
                    f,
                    "Invalid share rate: {basis_points} basis points. Must be between 0 and 10000"
                )
            }
            Self::InvalidDateRange { from, to } => {
                write!(f, "Invalid date range: {from} is after {to}")
            }
            Self::DateParseError { date_string, error } => {
                write!(f, "Failed to parse date '{date_string}': {error}")
            }
            Self::AmountOverflow { operation } => {
                write!(f, "Amount overflow while {operation}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
