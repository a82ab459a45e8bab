// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions over [`Database`](crate::Database).

pub mod bookings;
pub mod employees;
