// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Guide payout records and ledger arithmetic.
//!
//! A payout moves from `pending` to `paid` exactly once. Nothing moves it
//! back.

use crate::error::DomainError;
use crate::pricing::PaymentMethod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use time::{Date, OffsetDateTime};

/// Settlement state of a payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    /// Recorded, not yet transferred to the guide
    Pending,
    /// Transferred. Terminal.
    Paid,
}

impl PayoutStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

impl FromStr for PayoutStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            _ => Err(DomainError::InvalidPayoutStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The aggregator window a payout was computed from.
///
/// Together with the guide, the window identifies the underlying tour set;
/// at most one payout may exist per `(guide, window)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PayoutWindow {
    pub period_start: Option<Date>,
    pub period_end: Option<Date>,
}

impl PayoutWindow {
    #[must_use]
    pub const fn new(period_start: Option<Date>, period_end: Option<Date>) -> Self {
        Self {
            period_start,
            period_end,
        }
    }

    /// Checks that the window is either fully open or a closed, ordered range.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidField` when only one bound is set, and
    /// `DomainError::InvalidDateRange` when the start falls after the end.
    pub fn validate(&self) -> Result<(), DomainError> {
        match (self.period_start, self.period_end) {
            (None, None) => Ok(()),
            (Some(from), Some(to)) if from > to => Err(DomainError::InvalidDateRange { from, to }),
            (Some(_), Some(_)) => Ok(()),
            (Some(_), None) => Err(DomainError::InvalidField {
                field: "period_end",
                reason: String::from("required when period_start is set"),
            }),
            (None, Some(_)) => Err(DomainError::InvalidField {
                field: "period_start",
                reason: String::from("required when period_end is set"),
            }),
        }
    }

    /// True when neither bound is set.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.period_start.is_none() && self.period_end.is_none()
    }
}

/// A recorded transfer of guide-share earnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutRecord {
    /// Database identifier. `None` until persisted.
    pub payout_id: Option<i64>,
    pub guide_id: i64,
    pub amount: i64,
    pub tours_count: u32,
    pub window: PayoutWindow,
    pub status: PayoutStatus,
    /// Set when paid.
    pub payment_method: Option<PaymentMethod>,
    pub payment_reference: Option<String>,
    /// Set when paid.
    pub paid_at: Option<OffsetDateTime>,
    pub notes: Option<String>,
    pub created_at: OffsetDateTime,
}

impl PayoutRecord {
    /// Creates a pending payout.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPayoutAmount` if `amount` is not positive,
    /// or the error from [`PayoutWindow::validate`] for a malformed window.
    pub fn new_pending(
        guide_id: i64,
        amount: i64,
        tours_count: u32,
        window: PayoutWindow,
        notes: Option<String>,
        created_at: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        if amount <= 0 {
            return Err(DomainError::InvalidPayoutAmount { amount });
        }
        window.validate()?;

        Ok(Self {
            payout_id: None,
            guide_id,
            amount,
            tours_count,
            window,
            status: PayoutStatus::Pending,
            payment_method: None,
            payment_reference: None,
            paid_at: None,
            notes,
            created_at,
        })
    }

    /// Returns a copy of this record settled at `paid_at`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::PayoutAlreadyPaid` if the record is already paid.
    pub fn settle(
        &self,
        payment_method: PaymentMethod,
        payment_reference: Option<String>,
        paid_at: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        if self.status == PayoutStatus::Paid {
            return Err(DomainError::PayoutAlreadyPaid {
                payout_id: self.payout_id.unwrap_or_default(),
            });
        }

        let mut settled: Self = self.clone();
        settled.status = PayoutStatus::Paid;
        settled.payment_method = Some(payment_method);
        settled.payment_reference = payment_reference;
        settled.paid_at = Some(paid_at);
        Ok(settled)
    }
}

/// Ledger-wide totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PayoutSummary {
    pub total_paid_out: i64,
    pub total_pending: i64,
    /// Paid records whose `paid_at` falls in the month of the reference time.
    pub this_month_paid: i64,
    /// Distinct guides with at least one pending record.
    pub guides_awaiting_payment: u32,
}

fn add_amount(total: i64, amount: i64, operation: &'static str) -> Result<i64, DomainError> {
    total
        .checked_add(amount)
        .ok_or(DomainError::AmountOverflow { operation })
}

/// Sums every amount in the ledger, paid and pending alike.
///
/// # Errors
///
/// Returns `DomainError::AmountOverflow` if the sum does not fit in an `i64`.
pub fn ledger_total(records: &[PayoutRecord]) -> Result<i64, DomainError> {
    records
        .iter()
        .try_fold(0_i64, |total, r| add_amount(total, r.amount, "payout ledger total"))
}

/// Computes ledger totals as of `now`.
///
/// # Errors
///
/// Returns `DomainError::AmountOverflow` if any total does not fit in an `i64`.
pub fn summarize_payouts(
    records: &[PayoutRecord],
    now: OffsetDateTime,
) -> Result<PayoutSummary, DomainError> {
    let mut summary: PayoutSummary = PayoutSummary::default();
    let mut awaiting: BTreeSet<i64> = BTreeSet::new();

    for record in records {
        match record.status {
            PayoutStatus::Paid => {
                summary.total_paid_out =
                    add_amount(summary.total_paid_out, record.amount, "total paid out")?;
                let paid_this_month: bool = record.paid_at.is_some_and(|paid_at| {
                    paid_at.year() == now.year() && paid_at.month() == now.month()
                });
                if paid_this_month {
                    summary.this_month_paid =
                        add_amount(summary.this_month_paid, record.amount, "paid this month")?;
                }
            }
            PayoutStatus::Pending => {
                summary.total_pending =
                    add_amount(summary.total_pending, record.amount, "total pending")?;
                awaiting.insert(record.guide_id);
            }
        }
    }

    summary.guides_awaiting_payment = u32::try_from(awaiting.len()).unwrap_or(u32::MAX);
    Ok(summary)
}

/// A guide's earnings position against the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideBalance {
    pub guide_id: i64,
    /// Share computed from completed, paid tours.
    pub guide_share: i64,
    pub paid_out: i64,
    pub pending: i64,
    /// `guide_share - paid_out - pending`. Negative when payouts drifted past earnings.
    pub outstanding: i64,
}

/// Computes a guide's balance from the aggregator's share and their payout records.
///
/// # Errors
///
/// Returns `DomainError::AmountOverflow` if a total does not fit in an `i64`.
pub fn guide_balance(
    guide_id: i64,
    guide_share: i64,
    records: &[PayoutRecord],
) -> Result<GuideBalance, DomainError> {
    let (paid_out, pending) = records
        .iter()
        .filter(|r| r.guide_id == guide_id)
        .try_fold((0_i64, 0_i64), |(paid, pending), r| match r.status {
            PayoutStatus::Paid => Ok((add_amount(paid, r.amount, "guide paid out")?, pending)),
            PayoutStatus::Pending => Ok((paid, add_amount(pending, r.amount, "guide pending")?)),
        })?;

    let outstanding: i64 = guide_share
        .checked_sub(paid_out)
        .and_then(|rest| rest.checked_sub(pending))
        .ok_or(DomainError::AmountOverflow {
            operation: "guide outstanding balance",
        })?;

    Ok(GuideBalance {
        guide_id,
        guide_share,
        paid_out,
        pending,
        outstanding,
    })
}

/// Rejects a payout that would push committed payouts past the computed share.
///
/// `committed` is the sum of the guide's payouts already counted against the
/// share (pending and paid when opening a payout, paid only when settling one).
///
/// # Errors
///
/// Returns `DomainError::PayoutExceedsShare` when `committed + requested > guide_share`.
pub fn check_within_share(
    guide_id: i64,
    guide_share: i64,
    committed: i64,
    requested: i64,
) -> Result<(), DomainError> {
    let available: i64 = guide_share.saturating_sub(committed).max(0);
    if requested > available {
        return Err(DomainError::PayoutExceedsShare {
            guide_id,
            requested,
            available,
        });
    }
    Ok(())
}
