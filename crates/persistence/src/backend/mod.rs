// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Database backend-specific code.
//!
//! This module isolates connection setup, migrations and the few helpers
//! that cannot be expressed in Diesel DSL. All booking, activity, guide and
//! payout queries live in `queries/` and `mutations/`.

pub mod sqlite;
