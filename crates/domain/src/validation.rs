// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::VisitorInfo;
use time::{Date, Time};

const DATE_FORMAT: &[time::format_description::FormatItem<'_>] =
    time::macros::format_description!("[year]-[month]-[day]");

const TIME_FORMAT: &[time::format_description::FormatItem<'_>] =
    time::macros::format_description!("[hour]:[minute]");

/// Validates the visitor's contact fields.
///
/// # Errors
///
/// Returns an error if:
/// - The name is blank
/// - The email is blank
/// - The email has no `@` or nothing on either side of it
pub fn validate_visitor_info(visitor: &VisitorInfo) -> Result<(), DomainError> {
    if visitor.name.trim().is_empty() {
        return Err(DomainError::MissingField { field: "name" });
    }

    let email: &str = visitor.email.trim();
    if email.is_empty() {
        return Err(DomainError::MissingField { field: "email" });
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(DomainError::InvalidField {
            field: "email",
            reason: format!("'{email}' is not an email address"),
        }),
    }
}

/// Parses a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns `DomainError::MissingField` for a blank string and
/// `DomainError::DateParseError` for a malformed one.
pub fn parse_date(field: &'static str, value: &str) -> Result<Date, DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::MissingField { field });
    }
    Date::parse(value.trim(), DATE_FORMAT).map_err(|e| DomainError::DateParseError {
        date_string: value.to_string(),
        error: e.to_string(),
    })
}

/// Formats a date as `YYYY-MM-DD`.
///
/// # Errors
///
/// Returns an error if formatting fails.
pub fn format_date(date: Date) -> Result<String, DomainError> {
    date.format(DATE_FORMAT)
        .map_err(|e| DomainError::DateParseError {
            date_string: date.to_string(),
            error: e.to_string(),
        })
}

/// Parses an `HH:MM` time of day.
///
/// # Errors
///
/// Returns `DomainError::DateParseError` if the value is malformed.
pub fn parse_visit_time(value: &str) -> Result<Time, DomainError> {
    Time::parse(value.trim(), TIME_FORMAT).map_err(|e| DomainError::DateParseError {
        date_string: value.to_string(),
        error: e.to_string(),
    })
}

/// Formats a time of day as `HH:MM`.
///
/// # Errors
///
/// Returns an error if formatting fails.
pub fn format_visit_time(value: Time) -> Result<String, DomainError> {
    value
        .format(TIME_FORMAT)
        .map_err(|e| DomainError::DateParseError {
            date_string: value.to_string(),
            error: e.to_string(),
        })
}

/// Validates an optional inclusive date range.
///
/// # Errors
///
/// Returns `DomainError::InvalidDateRange` if `from` is after `to`.
pub fn validate_date_range(from: Option<Date>, to: Option<Date>) -> Result<(), DomainError> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(DomainError::InvalidDateRange { from, to }),
        _ => Ok(()),
    }
}
