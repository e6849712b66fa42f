// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{create_paid_completed_booking, create_test_guide, create_test_persistence};
use crate::{
    ApiError, CreatePayoutRequest, GuideBalance, ListPayoutsRequest, MarkPayoutPaidRequest,
    PayoutInfo, PayoutMutationResponse, PayoutSummary, RevenuePolicy, create_payout, get_payout,
    guide_balance, list_payouts, mark_payout_paid, payout_summary,
};
use time::OffsetDateTime;
use time::macros::{date, datetime};
use tourdesk_persistence::SqlitePersistence;

const PAYOUT_AT: OffsetDateTime = datetime!(2025-07-01 09:00 UTC);

fn uncapped() -> RevenuePolicy {
    RevenuePolicy {
        enforce_payout_cap: false,
        ..RevenuePolicy::default()
    }
}

fn payout_request(guide_id: i64, amount: i64, month: u8) -> CreatePayoutRequest {
    CreatePayoutRequest {
        guide_id,
        amount,
        tours_count: 1,
        period_start: Some(format!("2025-{month:02}-01")),
        period_end: Some(format!("2025-{month:02}-28")),
        notes: None,
    }
}

fn cash() -> MarkPayoutPaidRequest {
    MarkPayoutPaidRequest {
        payment_method: String::from("cash"),
        payment_reference: None,
    }
}

/// One guide with one completed, paid standard tour: share 10 500.
fn setup_earning_guide() -> (SqlitePersistence, i64) {
    let mut persistence = create_test_persistence();
    let guide = create_test_guide(&mut persistence, "Amina");
    create_paid_completed_booking(&mut persistence, 1, guide.guide_id);
    (persistence, guide.guide_id)
}

#[test]
fn test_payout_up_to_share_is_accepted() {
    let (mut persistence, guide_id) = setup_earning_guide();

    let response: PayoutMutationResponse = create_payout(
        &mut persistence,
        payout_request(guide_id, 10_500, 6),
        RevenuePolicy::default(),
        PAYOUT_AT,
    )
    .unwrap();
    assert_eq!(response.summary.total_pending, 10_500);
    assert_eq!(response.summary.guides_awaiting_payment, 1);

    let payout: PayoutInfo = response.payout;
    assert_eq!(payout.status, "pending");
    assert_eq!(payout.amount, 10_500);
    assert_eq!(payout.period_start.as_deref(), Some("2025-06-01"));
    assert_eq!(payout.paid_at, None);
}

#[test]
fn test_payout_beyond_share_rejected_under_default_policy() {
    let (mut persistence, guide_id) = setup_earning_guide();
    create_payout(
        &mut persistence,
        payout_request(guide_id, 10_500, 6),
        RevenuePolicy::default(),
        PAYOUT_AT,
    )
    .unwrap();

    let result = create_payout(
        &mut persistence,
        payout_request(guide_id, 1, 7),
        RevenuePolicy::default(),
        PAYOUT_AT,
    );
    assert!(matches!(
        result,
        Err(ApiError::Validation { ref field, .. }) if field.as_deref() == Some("amount")
    ));
    assert_eq!(
        list_payouts(&mut persistence, ListPayoutsRequest::default())
            .unwrap()
            .payouts
            .len(),
        1
    );
}

#[test]
fn test_payout_beyond_share_accepted_when_cap_disabled() {
    let (mut persistence, guide_id) = setup_earning_guide();

    let payout = create_payout(
        &mut persistence,
        payout_request(guide_id, 50_000, 6),
        uncapped(),
        PAYOUT_AT,
    )
    .unwrap()
    .payout;
    assert_eq!(payout.amount, 50_000);
}

#[test]
fn test_guide_without_earnings_cannot_be_paid_under_cap() {
    let mut persistence = create_test_persistence();
    let guide = create_test_guide(&mut persistence, "Baraka");

    let result = create_payout(
        &mut persistence,
        payout_request(guide.guide_id, 100, 6),
        RevenuePolicy::default(),
        PAYOUT_AT,
    );
    assert!(matches!(result, Err(ApiError::Validation { .. })));
}

#[test]
fn test_duplicate_window_is_conflict() {
    let (mut persistence, guide_id) = setup_earning_guide();
    create_payout(
        &mut persistence,
        payout_request(guide_id, 5_000, 6),
        RevenuePolicy::default(),
        PAYOUT_AT,
    )
    .unwrap()
    .payout;

    let result = create_payout(
        &mut persistence,
        payout_request(guide_id, 5_000, 6),
        RevenuePolicy::default(),
        PAYOUT_AT,
    );
    assert!(matches!(result, Err(ApiError::Conflict { .. })));
}

fn windowless_request(guide_id: i64, amount: i64) -> CreatePayoutRequest {
    CreatePayoutRequest {
        period_start: None,
        period_end: None,
        ..payout_request(guide_id, amount, 6)
    }
}

#[test]
fn test_windowless_double_submit_is_conflict() {
    for policy in [RevenuePolicy::default(), uncapped()] {
        let (mut persistence, guide_id) = setup_earning_guide();
        create_payout(
            &mut persistence,
            windowless_request(guide_id, 5_000),
            policy,
            PAYOUT_AT,
        )
        .unwrap();

        let result = create_payout(
            &mut persistence,
            windowless_request(guide_id, 5_000),
            policy,
            PAYOUT_AT,
        );
        assert!(matches!(result, Err(ApiError::Conflict { .. })));

        let summary: PayoutSummary = payout_summary(&mut persistence, PAYOUT_AT).unwrap();
        assert_eq!(summary.total_pending, 5_000);
    }
}

#[test]
fn test_windowless_payout_allowed_after_previous_is_paid() {
    let (mut persistence, guide_id) = setup_earning_guide();
    let first: PayoutInfo = create_payout(
        &mut persistence,
        windowless_request(guide_id, 5_000),
        RevenuePolicy::default(),
        PAYOUT_AT,
    )
    .unwrap()
    .payout;
    mark_payout_paid(
        &mut persistence,
        first.payout_id,
        cash(),
        RevenuePolicy::default(),
        PAYOUT_AT,
    )
    .unwrap();

    let second: PayoutInfo = create_payout(
        &mut persistence,
        windowless_request(guide_id, 5_000),
        RevenuePolicy::default(),
        PAYOUT_AT,
    )
    .unwrap()
    .payout;
    assert_eq!(second.status, "pending");
    assert_ne!(second.payout_id, first.payout_id);
}

#[test]
fn test_half_open_window_rejected() {
    let (mut persistence, guide_id) = setup_earning_guide();

    let mut start_only = payout_request(guide_id, 100, 6);
    start_only.period_end = None;
    assert!(matches!(
        create_payout(&mut persistence, start_only, uncapped(), PAYOUT_AT),
        Err(ApiError::Validation { ref field, .. }) if field.as_deref() == Some("period_end")
    ));

    let mut end_only = payout_request(guide_id, 100, 6);
    end_only.period_start = None;
    assert!(matches!(
        create_payout(&mut persistence, end_only, uncapped(), PAYOUT_AT),
        Err(ApiError::Validation { ref field, .. }) if field.as_deref() == Some("period_start")
    ));

    assert!(
        list_payouts(&mut persistence, ListPayoutsRequest::default())
            .unwrap()
            .payouts
            .is_empty()
    );
}

#[test]
fn test_ledger_overflow_rejected_and_summary_still_served() {
    let (mut persistence, guide_id) = setup_earning_guide();
    let half: i64 = i64::MAX / 2 + 1;
    create_payout(
        &mut persistence,
        payout_request(guide_id, half, 6),
        uncapped(),
        PAYOUT_AT,
    )
    .unwrap();

    let result = create_payout(
        &mut persistence,
        payout_request(guide_id, half, 7),
        uncapped(),
        PAYOUT_AT,
    );
    assert!(matches!(result, Err(ApiError::Validation { field: None, .. })));

    let summary: PayoutSummary = payout_summary(&mut persistence, PAYOUT_AT).unwrap();
    assert_eq!(summary.total_pending, half);
    let balance: GuideBalance =
        guide_balance(&mut persistence, guide_id, uncapped(), PAYOUT_AT.date()).unwrap();
    assert_eq!(balance.pending, half);
}

#[test]
fn test_payout_input_errors() {
    let (mut persistence, guide_id) = setup_earning_guide();

    assert!(matches!(
        create_payout(
            &mut persistence,
            payout_request(guide_id, 0, 6),
            uncapped(),
            PAYOUT_AT
        ),
        Err(ApiError::Validation { .. })
    ));
    assert!(matches!(
        create_payout(
            &mut persistence,
            payout_request(999, 100, 6),
            uncapped(),
            PAYOUT_AT
        ),
        Err(ApiError::NotFound { .. })
    ));

    let mut reversed = payout_request(guide_id, 100, 6);
    reversed.period_start = Some(String::from("2025-06-30"));
    reversed.period_end = Some(String::from("2025-06-01"));
    assert!(matches!(
        create_payout(&mut persistence, reversed, uncapped(), PAYOUT_AT),
        Err(ApiError::Validation { .. })
    ));
}

#[test]
fn test_mark_paid_once() {
    let (mut persistence, guide_id) = setup_earning_guide();
    let payout = create_payout(
        &mut persistence,
        payout_request(guide_id, 10_500, 6),
        RevenuePolicy::default(),
        PAYOUT_AT,
    )
    .unwrap()
    .payout;

    let response: PayoutMutationResponse = mark_payout_paid(
        &mut persistence,
        payout.payout_id,
        MarkPayoutPaidRequest {
            payment_method: String::from("mobile_money"),
            payment_reference: Some(String::from("MM-5521")),
        },
        RevenuePolicy::default(),
        PAYOUT_AT,
    )
    .unwrap();
    assert_eq!(response.summary.total_paid_out, 10_500);
    assert_eq!(response.summary.total_pending, 0);
    assert_eq!(response.summary.guides_awaiting_payment, 0);

    let paid: PayoutInfo = response.payout;
    assert_eq!(paid.status, "paid");
    assert_eq!(paid.payment_method.as_deref(), Some("mobile_money"));
    assert_eq!(paid.payment_reference.as_deref(), Some("MM-5521"));
    assert_eq!(paid.paid_at.as_deref(), Some("2025-07-01T09:00:00Z"));

    let again = mark_payout_paid(
        &mut persistence,
        payout.payout_id,
        cash(),
        RevenuePolicy::default(),
        datetime!(2025-07-02 09:00 UTC),
    );
    assert!(matches!(again, Err(ApiError::Conflict { .. })));

    let stored = get_payout(&mut persistence, payout.payout_id).unwrap();
    assert_eq!(stored, paid);
}

#[test]
fn test_mark_paid_rechecks_share() {
    let (mut persistence, guide_id) = setup_earning_guide();
    let payout = create_payout(
        &mut persistence,
        payout_request(guide_id, 20_000, 6),
        uncapped(),
        PAYOUT_AT,
    )
    .unwrap()
    .payout;

    let result = mark_payout_paid(
        &mut persistence,
        payout.payout_id,
        cash(),
        RevenuePolicy::default(),
        PAYOUT_AT,
    );
    assert!(matches!(result, Err(ApiError::Validation { .. })));
    assert_eq!(
        get_payout(&mut persistence, payout.payout_id).unwrap().status,
        "pending"
    );

    let paid = mark_payout_paid(
        &mut persistence,
        payout.payout_id,
        cash(),
        uncapped(),
        PAYOUT_AT,
    )
    .unwrap()
    .payout;
    assert_eq!(paid.status, "paid");
}

#[test]
fn test_mark_paid_unknown_payout_is_not_found() {
    let mut persistence = create_test_persistence();
    let result = mark_payout_paid(
        &mut persistence,
        12,
        cash(),
        RevenuePolicy::default(),
        PAYOUT_AT,
    );
    assert!(matches!(result, Err(ApiError::NotFound { .. })));
}

#[test]
fn test_summary_and_balance() {
    let (mut persistence, guide_id) = setup_earning_guide();
    let other = create_test_guide(&mut persistence, "Baraka");

    let june = create_payout(
        &mut persistence,
        payout_request(guide_id, 6_000, 6),
        RevenuePolicy::default(),
        PAYOUT_AT,
    )
    .unwrap()
    .payout;
    create_payout(
        &mut persistence,
        payout_request(guide_id, 3_000, 7),
        RevenuePolicy::default(),
        PAYOUT_AT,
    )
    .unwrap();
    create_payout(
        &mut persistence,
        payout_request(other.guide_id, 700, 6),
        uncapped(),
        PAYOUT_AT,
    )
    .unwrap();
    mark_payout_paid(
        &mut persistence,
        june.payout_id,
        cash(),
        RevenuePolicy::default(),
        PAYOUT_AT,
    )
    .unwrap();

    let summary: PayoutSummary =
        payout_summary(&mut persistence, datetime!(2025-07-15 12:00 UTC)).unwrap();
    assert_eq!(summary.total_paid_out, 6_000);
    assert_eq!(summary.total_pending, 3_700);
    assert_eq!(summary.this_month_paid, 6_000);
    assert_eq!(summary.guides_awaiting_payment, 2);

    let balance: GuideBalance = guide_balance(
        &mut persistence,
        guide_id,
        RevenuePolicy::default(),
        date!(2025 - 07 - 15),
    )
    .unwrap();
    assert_eq!(balance.guide_share, 10_500);
    assert_eq!(balance.paid_out, 6_000);
    assert_eq!(balance.pending, 3_000);
    assert_eq!(balance.outstanding, 1_500);

    let listed = list_payouts(
        &mut persistence,
        ListPayoutsRequest {
            guide_id: Some(guide_id),
        },
    )
    .unwrap();
    assert_eq!(listed.payouts.len(), 2);

    assert!(matches!(
        guide_balance(
            &mut persistence,
            404,
            RevenuePolicy::default(),
            date!(2025 - 07 - 15)
        ),
        Err(ApiError::NotFound { .. })
    ));
}
