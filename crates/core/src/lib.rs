// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod apply;
mod command;
mod error;
mod state;

#[cfg(test)]
mod tests;

use tourdesk_domain::{BookingStatus, DomainError};

// Re-export public types and functions
pub use apply::{apply, apply_payout, create_booking, open_payout};
pub use command::{BookingCommand, NewBooking, PayoutCommand, PayoutRequest};
pub use error::CoreError;
pub use state::{BookingTransition, ShareCap};

/// Validates a status string from an operator before it becomes a command.
///
/// This is a read-only validation that does not create activity records.
///
/// # Arguments
///
/// * `value` - The requested status, as received
///
/// # Returns
///
/// * `Ok(BookingStatus)` if the string names a status
/// * `Err(DomainError::InvalidBookingStatus)` otherwise
///
/// # Errors
///
/// Returns an error if the string is not one of the four booking statuses.
pub fn parse_requested_status(value: &str) -> Result<BookingStatus, DomainError> {
    value.trim().parse::<BookingStatus>()
}
