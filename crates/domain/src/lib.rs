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

mod error;
mod payout;
mod pricing;
mod revenue;
mod status;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use payout::{
    GuideBalance, PayoutRecord, PayoutStatus, PayoutSummary, PayoutWindow, check_within_share,
    guide_balance, ledger_total, summarize_payouts,
};
pub use pricing::{GroupSize, PaymentMethod, TourType, price_per_person, quote_total};
pub use revenue::{
    AmountBreakdown, GuideRevenue, GuideShareRate, RevenueQuery, RevenueReport, RevenueTotals,
    compute_revenue_report,
};
pub use status::{BookingStatus, PaymentStatus};

// Re-export public types
pub use error::DomainError;
pub use types::{Booking, BookingReference, Guide, TourDetails, VisitorInfo};
pub use validation::{
    format_date, format_visit_time, parse_date, parse_visit_time, validate_date_range,
    validate_visitor_info,
};
