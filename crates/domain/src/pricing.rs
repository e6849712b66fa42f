// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tour pricing.
//!
//! A booking's total is quoted exactly once, at creation, from a fixed
//! per-person price table keyed by tour type and group size.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The kind of tour being booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourType {
    Standard,
    Premium,
    Educational,
}

impl TourType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Premium => "premium",
            Self::Educational => "educational",
        }
    }
}

impl FromStr for TourType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "premium" => Ok(Self::Premium),
            "educational" => Ok(Self::Educational),
            _ => Err(DomainError::InvalidTourType(s.to_string())),
        }
    }
}

impl std::fmt::Display for TourType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Group size bracket for a booking.
///
/// Each bracket accepts a fixed range of head counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupSize {
    /// 1 to 4 people
    Individual,
    /// 5 to 15 people
    SmallGroup,
    /// 16 to 60 people
    LargeGroup,
}

impl GroupSize {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::SmallGroup => "small_group",
            Self::LargeGroup => "large_group",
        }
    }

    /// Inclusive head-count range accepted by this bracket.
    #[must_use]
    pub const fn head_count_range(&self) -> (u32, u32) {
        match self {
            Self::Individual => (1, 4),
            Self::SmallGroup => (5, 15),
            Self::LargeGroup => (16, 60),
        }
    }

    /// Checks that `number_of_people` fits this bracket.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::GroupSizeMismatch` if the head count is out of range.
    pub fn validate_head_count(&self, number_of_people: u32) -> Result<(), DomainError> {
        let (min, max) = self.head_count_range();
        if number_of_people < min || number_of_people > max {
            return Err(DomainError::GroupSizeMismatch {
                group_size: self.as_str().to_string(),
                number_of_people,
                min,
                max,
            });
        }
        Ok(())
    }
}

impl FromStr for GroupSize {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "individual" => Ok(Self::Individual),
            "small_group" => Ok(Self::SmallGroup),
            "large_group" => Ok(Self::LargeGroup),
            _ => Err(DomainError::InvalidGroupSize(s.to_string())),
        }
    }
}

impl std::fmt::Display for GroupSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How money changed hands, for bookings and for guide payouts alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    MobileMoney,
    Online,
}

impl PaymentMethod {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::BankTransfer => "bank_transfer",
            Self::MobileMoney => "mobile_money",
            Self::Online => "online",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "bank_transfer" => Ok(Self::BankTransfer),
            "mobile_money" => Ok(Self::MobileMoney),
            "online" => Ok(Self::Online),
            _ => Err(DomainError::InvalidPaymentMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the per-person price for a tour type and group size.
#[must_use]
pub const fn price_per_person(tour_type: TourType, group_size: GroupSize) -> i64 {
    match (tour_type, group_size) {
        (TourType::Standard, GroupSize::Individual) => 15_000,
        (TourType::Standard, GroupSize::SmallGroup) => 12_000,
        (TourType::Standard, GroupSize::LargeGroup) => 10_000,
        (TourType::Premium, GroupSize::Individual) => 25_000,
        (TourType::Premium, GroupSize::SmallGroup) => 20_000,
        (TourType::Premium, GroupSize::LargeGroup) => 17_000,
        (TourType::Educational, GroupSize::Individual) => 8_000,
        (TourType::Educational, GroupSize::SmallGroup) => 6_000,
        (TourType::Educational, GroupSize::LargeGroup) => 5_000,
    }
}

/// Quotes the total amount for a booking.
///
/// The result is deterministic for a given input and is stored once on
/// the booking; it is never recomputed afterwards.
///
/// # Errors
///
/// Returns an error if the head count does not fit the group size.
pub fn quote_total(
    tour_type: TourType,
    group_size: GroupSize,
    number_of_people: u32,
) -> Result<i64, DomainError> {
    group_size.validate_head_count(number_of_people)?;
    price_per_person(tour_type, group_size)
        .checked_mul(i64::from(number_of_people))
        .ok_or(DomainError::AmountOverflow {
            operation: "quoting booking total",
        })
}
