// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Revenue aggregation.
//!
//! Everything here is a pure function of the booking slice it is handed.
//! Callers are responsible for reading that slice from a single consistent
//! snapshot. Nothing is cached between calls.
//!
//! Revenue is recognised on the visit date of completed tours.

use crate::error::DomainError;
use crate::pricing::{PaymentMethod, TourType};
use crate::status::{BookingStatus, PaymentStatus};
use crate::types::Booking;
use std::collections::BTreeMap;
use time::{Date, Duration};

/// Basis points in 100%.
const FULL_RATE_BPS: u32 = 10_000;

/// The guide's cut of paid tour revenue, in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuideShareRate(u32);

impl GuideShareRate {
    /// 70% to the guide, 30% to the platform.
    pub const DEFAULT: Self = Self(7_000);

    /// Creates a rate from basis points.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidShareRate` above 10000.
    pub const fn from_basis_points(basis_points: u32) -> Result<Self, DomainError> {
        if basis_points > FULL_RATE_BPS {
            return Err(DomainError::InvalidShareRate { basis_points });
        }
        Ok(Self(basis_points))
    }

    #[must_use]
    pub const fn basis_points(&self) -> u32 {
        self.0
    }

    /// Splits paid revenue into `(guide_share, platform_share)`.
    ///
    /// The guide share is rounded down; the platform takes the remainder so
    /// the two always sum to `paid_revenue`.
    #[must_use]
    pub fn split(&self, paid_revenue: i64) -> (i64, i64) {
        let guide_share: i128 =
            i128::from(paid_revenue) * i128::from(self.0) / i128::from(FULL_RATE_BPS);
        let guide_share: i64 = i64::try_from(guide_share).unwrap_or(paid_revenue);
        (guide_share, paid_revenue - guide_share)
    }
}

impl Default for GuideShareRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Filter applied to the booking set before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RevenueQuery {
    pub guide_id: Option<i64>,
    /// Inclusive lower bound on visit date.
    pub date_from: Option<Date>,
    /// Inclusive upper bound on visit date.
    pub date_to: Option<Date>,
    pub status_filter: Option<BookingStatus>,
}

impl RevenueQuery {
    /// Returns true if `booking` falls inside this filter.
    #[must_use]
    pub fn matches(&self, booking: &Booking) -> bool {
        if self
            .guide_id
            .is_some_and(|guide_id| booking.assigned_guide_id != Some(guide_id))
        {
            return false;
        }
        if self.date_from.is_some_and(|from| booking.tour.visit_date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| booking.tour.visit_date > to) {
            return false;
        }
        self.status_filter
            .is_none_or(|status| booking.status == status)
    }
}

/// Per-guide earnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuideRevenue {
    pub guide_id: i64,
    /// All bookings assigned to the guide within the filter.
    pub total_bookings: u32,
    pub completed_tours: u32,
    pub paid_tours: u32,
    pub pending_tours: u32,
    pub total_revenue: i64,
    pub paid_revenue: i64,
    pub pending_revenue: i64,
    pub guide_share: i64,
    pub platform_share: i64,
}

impl GuideRevenue {
    const fn empty(guide_id: i64) -> Self {
        Self {
            guide_id,
            total_bookings: 0,
            completed_tours: 0,
            paid_tours: 0,
            pending_tours: 0,
            total_revenue: 0,
            paid_revenue: 0,
            pending_revenue: 0,
            guide_share: 0,
            platform_share: 0,
        }
    }
}

/// Count and summed amount for one bucket of a breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AmountBreakdown {
    pub count: u32,
    pub amount: i64,
}

impl AmountBreakdown {
    fn add(&mut self, amount: i64) {
        self.count += 1;
        self.amount = self.amount.saturating_add(amount);
    }
}

/// Totals across every booking in the filter, assigned or not.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RevenueTotals {
    pub total_bookings: u32,
    pub completed_tours: u32,
    /// Sum over completed tours.
    pub total_revenue: i64,
    pub paid_revenue: i64,
    pub pending_revenue: i64,
    /// Completed tours visited in the seven days ending on the reference date.
    pub weekly_revenue: i64,
    /// Completed tours visited in the reference date's calendar month.
    pub monthly_revenue: i64,
    /// Completed tours with no guide assigned.
    pub unassigned_revenue: i64,
    /// Completed tours, by payment method. `None` collects tours with no method recorded.
    pub by_payment_method: BTreeMap<Option<PaymentMethod>, AmountBreakdown>,
    /// Completed tours, by tour type.
    pub by_tour_type: BTreeMap<TourType, AmountBreakdown>,
    /// Every booking in the filter, by status.
    pub by_status: BTreeMap<BookingStatus, AmountBreakdown>,
}

/// Result of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevenueReport {
    pub query: RevenueQuery,
    pub guide_share_rate: GuideShareRate,
    /// Reference date for the weekly and monthly figures.
    pub as_of: Date,
    /// Guides with at least one assigned booking, ascending by id.
    pub guides: Vec<GuideRevenue>,
    pub totals: RevenueTotals,
}

impl RevenueReport {
    /// Looks up one guide's figures.
    #[must_use]
    pub fn guide(&self, guide_id: i64) -> Option<&GuideRevenue> {
        self.guides.iter().find(|g| g.guide_id == guide_id)
    }
}

/// Aggregates revenue over `bookings`.
///
/// The output depends only on the set of bookings, never on their order.
#[must_use]
pub fn compute_revenue_report(
    bookings: &[Booking],
    query: &RevenueQuery,
    rate: GuideShareRate,
    as_of: Date,
) -> RevenueReport {
    let week_start: Date = as_of.saturating_sub(Duration::days(6));
    let mut per_guide: BTreeMap<i64, GuideRevenue> = BTreeMap::new();
    let mut totals: RevenueTotals = RevenueTotals::default();

    for booking in bookings.iter().filter(|b| query.matches(b)) {
        let amount: i64 = booking.total_amount;
        let completed: bool = booking.status == BookingStatus::Completed;

        totals.total_bookings += 1;
        totals.by_status.entry(booking.status).or_default().add(amount);

        if completed {
            let visit_date: Date = booking.tour.visit_date;
            totals.completed_tours += 1;
            totals.total_revenue = totals.total_revenue.saturating_add(amount);
            match booking.payment_status {
                PaymentStatus::Paid => {
                    totals.paid_revenue = totals.paid_revenue.saturating_add(amount);
                }
                PaymentStatus::Pending => {
                    totals.pending_revenue = totals.pending_revenue.saturating_add(amount);
                }
                PaymentStatus::Refunded => {}
            }
            if visit_date >= week_start && visit_date <= as_of {
                totals.weekly_revenue = totals.weekly_revenue.saturating_add(amount);
            }
            if visit_date.year() == as_of.year() && visit_date.month() == as_of.month() {
                totals.monthly_revenue = totals.monthly_revenue.saturating_add(amount);
            }
            if booking.assigned_guide_id.is_none() {
                totals.unassigned_revenue = totals.unassigned_revenue.saturating_add(amount);
            }
            totals
                .by_payment_method
                .entry(booking.payment_method)
                .or_default()
                .add(amount);
            totals
                .by_tour_type
                .entry(booking.tour.tour_type)
                .or_default()
                .add(amount);
        }

        let Some(guide_id) = booking.assigned_guide_id else {
            continue;
        };
        let entry: &mut GuideRevenue = per_guide
            .entry(guide_id)
            .or_insert_with(|| GuideRevenue::empty(guide_id));

        entry.total_bookings += 1;
        if !completed {
            continue;
        }
        entry.completed_tours += 1;
        entry.total_revenue = entry.total_revenue.saturating_add(amount);
        if booking.is_payout_eligible() {
            entry.paid_tours += 1;
            entry.paid_revenue = entry.paid_revenue.saturating_add(amount);
        } else if booking.payment_status == PaymentStatus::Pending {
            entry.pending_tours += 1;
            entry.pending_revenue = entry.pending_revenue.saturating_add(amount);
        }
    }

    let guides: Vec<GuideRevenue> = per_guide
        .into_values()
        .map(|mut g| {
            let (guide_share, platform_share) = rate.split(g.paid_revenue);
            g.guide_share = guide_share;
            g.platform_share = platform_share;
            g
        })
        .collect();

    RevenueReport {
        query: *query,
        guide_share_rate: rate,
        as_of,
        guides,
        totals,
    }
}
