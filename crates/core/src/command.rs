// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use tourdesk_domain::{
    BookingStatus, Guide, PaymentMethod, PaymentStatus, PayoutWindow, TourDetails, VisitorInfo,
};

/// Everything an operator supplies to open a booking.
///
/// The amount is never supplied; it is quoted from the pricing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub visitor: VisitorInfo,
    pub tour: TourDetails,
    /// Payment method the visitor intends to use, if known at booking time.
    pub payment_method: Option<PaymentMethod>,
    pub admin_notes: Option<String>,
}

/// A command represents operator intent against an existing booking, as data only.
///
/// Commands are the only way to request booking state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingCommand {
    /// Move the lifecycle status along an allowed edge.
    Transition {
        /// The requested status.
        new_status: BookingStatus,
    },
    /// Assign a guide, replacing any previous assignment.
    AssignGuide {
        /// The guide as currently stored.
        guide: Guide,
    },
    /// Record the visitor's arrival.
    CheckIn,
    /// Record the visitor's departure and complete the tour.
    CheckOut,
    /// Change the payment axis. Independent of the lifecycle status.
    UpdatePaymentStatus {
        /// The new payment status.
        payment_status: PaymentStatus,
        /// The method, when the operator recorded one. `None` keeps the current method.
        payment_method: Option<PaymentMethod>,
    },
    /// Replace the admin notes.
    UpdateNotes {
        /// The new notes. `None` clears them.
        notes: Option<String>,
    },
}

impl BookingCommand {
    /// Operation name used in error messages.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Transition { .. } => "transition",
            Self::AssignGuide { .. } => "assign a guide to",
            Self::CheckIn => "check in",
            Self::CheckOut => "check out",
            Self::UpdatePaymentStatus { .. } => "update payment of",
            Self::UpdateNotes { .. } => "update notes of",
        }
    }
}

/// An operator's request to record a payout for a guide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutRequest {
    pub guide_id: i64,
    pub amount: i64,
    pub tours_count: u32,
    /// The aggregator window the amount was read from.
    pub window: PayoutWindow,
    pub notes: Option<String>,
}

/// Commands against an existing payout record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayoutCommand {
    /// Settle a pending payout.
    MarkPaid {
        /// How the guide was paid.
        payment_method: PaymentMethod,
        /// External transfer reference, if any.
        payment_reference: Option<String>,
    },
}
