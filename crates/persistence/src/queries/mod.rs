// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Query modules for persistence layer.
//!
//! This module contains all read-only queries for the persistence layer.
//!
//! ## Module Organization
//!
//! - `activity` — Activity timeline queries
//! - `bookings` — Booking lookups, filtered listings and revenue snapshots
//! - `guides` — Guide reference data
//! - `payouts` — Payout ledger queries

pub mod activity;
pub mod bookings;
pub mod guides;
pub mod payouts;

pub use activity::list_activity;
pub use bookings::{BookingFilter, get_booking, get_booking_by_reference, list_bookings};
pub use guides::{get_guide, list_guides};
pub use payouts::{get_payout, list_payouts};
