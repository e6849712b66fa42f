// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use tourdesk_audit::ActivityRecord;
use tourdesk_domain::Booking;

/// The result of a successful booking transition.
///
/// Transitions are atomic: they either succeed completely or fail without side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingTransition {
    /// The booking after the transition.
    pub new_booking: Booking,
    /// The activity record to append, in the same write as the booking.
    ///
    /// `None` only when the command was a no-op (reassigning the guide
    /// already on the booking); the booking is then returned unchanged.
    pub activity: Option<ActivityRecord>,
}

impl BookingTransition {
    /// Returns true if nothing needs to be written.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.activity.is_none()
    }
}

/// The guide's position against the share cap when a payout is opened or settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareCap {
    /// The guide's all-time computed share.
    pub guide_share: i64,
    /// Payouts already counted against the share.
    pub committed: i64,
}
