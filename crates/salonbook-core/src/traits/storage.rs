// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The database collaborator, as seen by the assistant.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::SalonError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{DateRange, Employee, NewEmployee, ReassignOutcome, RevenueSummary};

/// Execution target for assistant actions.
///
/// Each method is exactly one logical database operation. Record lifecycle
/// (listing, editing, deleting) belongs to the admin dashboard's CRUD layer
/// and is not part of this trait.
#[async_trait]
pub trait SalonStore: PluginAdapter {
    /// Creates an employee record.
    async fn create_employee(&self, employee: &NewEmployee) -> Result<Employee, SalonError>;

    /// Sums revenue of completed bookings in the range.
    async fn query_revenue(&self, range: &DateRange) -> Result<RevenueSummary, SalonError>;

    /// Moves an employee's open bookings on `date` to other stylists in one
    /// atomic batch. With `target` set, every booking goes to that stylist.
    async fn reassign_bookings(
        &self,
        employee_name: &str,
        date: NaiveDate,
        target: Option<&str>,
    ) -> Result<ReassignOutcome, SalonError>;

    /// Assigns a booking to a stylist and returns the stylist's stored name.
    async fn assign_booking(&self, booking_id: &str, stylist_name: &str)
        -> Result<String, SalonError>;

    /// Cancels a booking and returns its id.
    async fn cancel_booking(&self, booking_id: &str) -> Result<String, SalonError>;
}
