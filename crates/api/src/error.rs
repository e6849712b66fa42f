// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use tourdesk::CoreError;
use tourdesk_domain::DomainError;
use tourdesk_persistence::PersistenceError;

/// API-level errors.
///
/// These are distinct from domain, core and persistence errors and represent
/// the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Invalid input was provided.
    Validation {
        /// The field that was invalid, when one field is to blame.
        field: Option<String>,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    NotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// The operation is not allowed in the record's current state.
    InvalidTransition {
        /// A human-readable description of the rejected move.
        message: String,
    },
    /// Another writer changed the record, or a duplicate was submitted.
    Conflict {
        /// A human-readable description of the conflict.
        message: String,
    },
    /// The actor or referenced party may not perform this action.
    Unauthorized {
        /// A human-readable description of the refusal.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl ApiError {
    /// Short machine-readable kind, used in error bodies.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::NotFound { .. } => "not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Conflict { .. } => "conflict",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Internal { .. } => "internal",
        }
    }

    fn validation(field: &str, message: String) -> Self {
        Self::Validation {
            field: Some(field.to_string()),
            message,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation {
                field: Some(field),
                message,
            } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::Validation {
                field: None,
                message,
            } => write!(f, "Invalid input: {message}"),
            Self::NotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::InvalidTransition { message } => write!(f, "Invalid transition: {message}"),
            Self::Conflict { message } => write!(f, "Conflict: {message}"),
            Self::Unauthorized { message } => write!(f, "Unauthorized: {message}"),
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::MissingField { field } => {
            ApiError::validation(field, format!("{field} is required"))
        }
        DomainError::InvalidField { field, reason } => ApiError::validation(field, reason),
        DomainError::InvalidBookingStatus(value) => {
            ApiError::validation("status", format!("'{value}' is not a booking status"))
        }
        DomainError::InvalidPaymentStatus(value) => ApiError::validation(
            "payment_status",
            format!("'{value}' is not a payment status"),
        ),
        DomainError::InvalidPaymentMethod(value) => ApiError::validation(
            "payment_method",
            format!("'{value}' is not a payment method"),
        ),
        DomainError::InvalidTourType(value) => {
            ApiError::validation("tour_type", format!("'{value}' is not a tour type"))
        }
        DomainError::InvalidGroupSize(value) => {
            ApiError::validation("group_size", format!("'{value}' is not a group size"))
        }
        DomainError::InvalidPayoutStatus(value) => {
            ApiError::validation("status", format!("'{value}' is not a payout status"))
        }
        err @ DomainError::GroupSizeMismatch { .. } => {
            ApiError::validation("number_of_people", err.to_string())
        }
        err @ (DomainError::InvalidStatusTransition { .. }
        | DomainError::OperationNotPermitted { .. }) => ApiError::InvalidTransition {
            message: err.to_string(),
        },
        err @ DomainError::CheckOutBeforeCheckIn { .. } => {
            ApiError::validation("check_out_time", err.to_string())
        }
        err @ DomainError::InactiveGuide { .. } => ApiError::Unauthorized {
            message: err.to_string(),
        },
        DomainError::PayoutAlreadyPaid { payout_id } => ApiError::Conflict {
            message: format!("Payout {payout_id} has already been paid"),
        },
        err @ DomainError::InvalidPayoutAmount { .. } => {
            ApiError::validation("amount", err.to_string())
        }
        err @ DomainError::PayoutExceedsShare { .. } => {
            ApiError::validation("amount", err.to_string())
        }
        err @ DomainError::InvalidShareRate { .. } => {
            ApiError::validation("guide_share_rate", err.to_string())
        }
        err @ DomainError::InvalidDateRange { .. } => {
            ApiError::validation("date_from", err.to_string())
        }
        DomainError::DateParseError { date_string, error } => ApiError::validation(
            "date",
            format!("Failed to parse '{date_string}': {error}"),
        ),
        err @ DomainError::AmountOverflow { .. } => ApiError::Validation {
            field: None,
            message: err.to_string(),
        },
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
    }
}

/// Translates a persistence error into an API error.
///
/// Not-found and conflict outcomes keep their meaning; everything else is
/// reported as internal.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::BookingNotFound(booking_id) => ApiError::NotFound {
            resource_type: String::from("Booking"),
            message: format!("Booking {booking_id} does not exist"),
        },
        PersistenceError::BookingReferenceNotFound(reference) => ApiError::NotFound {
            resource_type: String::from("Booking"),
            message: format!("No booking with reference '{reference}'"),
        },
        PersistenceError::GuideNotFound(guide_id) => ApiError::NotFound {
            resource_type: String::from("Guide"),
            message: format!("Guide {guide_id} does not exist"),
        },
        PersistenceError::PayoutNotFound(payout_id) => ApiError::NotFound {
            resource_type: String::from("Payout"),
            message: format!("Payout {payout_id} does not exist"),
        },
        err @ (PersistenceError::VersionConflict { .. } | PersistenceError::PayoutNotPending(_)) => {
            ApiError::Conflict {
                message: err.to_string(),
            }
        }
        PersistenceError::UniqueViolation(detail) => ApiError::Conflict {
            message: format!("A matching record already exists ({detail})"),
        },
        other => ApiError::Internal {
            message: other.to_string(),
        },
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        translate_domain_error(err)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        translate_core_error(err)
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        translate_persistence_error(err)
    }
}
