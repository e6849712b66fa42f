// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{ApiError, translate_core_error, translate_domain_error, translate_persistence_error};
use tourdesk::CoreError;
use tourdesk_domain::DomainError;
use tourdesk_persistence::PersistenceError;

#[test]
fn test_domain_errors_map_to_taxonomy() {
    assert_eq!(
        translate_domain_error(DomainError::MissingField { field: "email" }).kind(),
        "validation"
    );
    assert_eq!(
        translate_domain_error(DomainError::InvalidStatusTransition {
            from: String::from("completed"),
            to: String::from("pending"),
            reason: String::from("completed is terminal"),
        })
        .kind(),
        "invalid_transition"
    );
    assert_eq!(
        translate_domain_error(DomainError::InactiveGuide { guide_id: 3 }).kind(),
        "unauthorized"
    );
    assert_eq!(
        translate_domain_error(DomainError::PayoutAlreadyPaid { payout_id: 9 }).kind(),
        "conflict"
    );
    assert_eq!(
        translate_domain_error(DomainError::PayoutExceedsShare {
            guide_id: 1,
            requested: 2,
            available: 1,
        })
        .kind(),
        "validation"
    );
}

#[test]
fn test_core_error_unwraps_domain_violation() {
    let err: ApiError = translate_core_error(CoreError::DomainViolation(
        DomainError::InvalidPayoutAmount { amount: -5 },
    ));
    assert!(matches!(
        err,
        ApiError::Validation { ref field, .. } if field.as_deref() == Some("amount")
    ));
}

#[test]
fn test_persistence_errors_map_to_taxonomy() {
    assert_eq!(
        translate_persistence_error(PersistenceError::BookingNotFound(1)).kind(),
        "not_found"
    );
    assert_eq!(
        translate_persistence_error(PersistenceError::VersionConflict {
            booking_id: 1,
            expected_version: 2,
        })
        .kind(),
        "conflict"
    );
    assert_eq!(
        translate_persistence_error(PersistenceError::PayoutNotPending(4)).kind(),
        "conflict"
    );
    assert_eq!(
        translate_persistence_error(PersistenceError::UniqueViolation(String::from("dup")))
            .kind(),
        "conflict"
    );
    assert_eq!(
        translate_persistence_error(PersistenceError::DatabaseError(String::from("disk")))
            .kind(),
        "internal"
    );
}

#[test]
fn test_conflict_message_asks_for_refetch() {
    let err: ApiError = translate_persistence_error(PersistenceError::VersionConflict {
        booking_id: 1,
        expected_version: 2,
    });
    assert!(err.to_string().contains("refetch and retry"));
}
