// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Mutation modules.
//!
//! This module contains all state-changing operations for the persistence layer.
//! Mutations use Diesel DSL, with `last_insert_rowid()` from the `backend`
//! module as the only raw SQL.
//!
//! ## Module Organization
//!
//! - `activity` — Append-only activity inserts
//! - `bookings` — Booking inserts and compare-and-swap updates
//! - `guides` — Guide reference data
//! - `payouts` — Payout inserts and settlement
//!
//! Callers wrap multi-statement writes in a transaction; see `lib.rs`.

pub mod activity;
pub mod bookings;
pub mod guides;
pub mod payouts;

pub use activity::insert_activity;
pub use bookings::{insert_booking, update_booking};
pub use guides::{insert_guide, set_guide_active};
pub use payouts::{insert_payout, settle_payout};
