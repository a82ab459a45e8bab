// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`SalonStore`] that records every call.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use salonbook_core::types::{
    BookingAssignment, DateRange, Employee, NewEmployee, ReassignOutcome, RevenueSummary,
};
use salonbook_core::{AdapterType, HealthStatus, PluginAdapter, SalonError, SalonStore};

/// One call received by a [`RecordingStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    CreateEmployee(NewEmployee),
    QueryRevenue(DateRange),
    Reassign {
        employee: String,
        date: NaiveDate,
        target: Option<String>,
    },
    Assign {
        booking_id: String,
        stylist: String,
    },
    Cancel(String),
}

/// Store double with canned results and injectable write failures.
pub struct RecordingStore {
    calls: Mutex<Vec<StoreCall>>,
    fail_next: AtomicUsize,
    fail_all: AtomicBool,
    revenue: Mutex<(f64, usize)>,
    reassign_to: Mutex<Vec<String>>,
}

impl std::fmt::Debug for RecordingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingStore")
            .field("calls", &self.calls().len())
            .finish_non_exhaustive()
    }
}

impl Default for RecordingStore {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_next: AtomicUsize::new(0),
            fail_all: AtomicBool::new(false),
            revenue: Mutex::new((0.0, 0)),
            reassign_to: Mutex::new(vec!["Anita".to_string()]),
        }
    }
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total and booking count returned by revenue queries.
    pub fn with_revenue(self, total: f64, bookings: usize) -> Self {
        if let Ok(mut revenue) = self.revenue.lock() {
            *revenue = (total, bookings);
        }
        self
    }

    /// Stylists handed out round-robin by untargeted reassignments. An empty
    /// list leaves every booking unassigned.
    pub fn with_stylists(self, names: &[&str]) -> Self {
        if let Ok(mut stylists) = self.reassign_to.lock() {
            *stylists = names.iter().map(|n| n.to_string()).collect();
        }
        self
    }

    /// The next `n` calls fail with a database write error.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Every call fails until cleared.
    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: StoreCall) -> Result<(), SalonError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        let scheduled = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if scheduled || self.fail_all.load(Ordering::SeqCst) {
            return Err(SalonError::DatabaseWrite("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for RecordingStore {
    fn name(&self) -> &str {
        "recording"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, SalonError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl SalonStore for RecordingStore {
    async fn create_employee(&self, employee: &NewEmployee) -> Result<Employee, SalonError> {
        self.record(StoreCall::CreateEmployee(employee.clone()))?;
        Ok(Employee {
            id: uuid::Uuid::new_v4().to_string(),
            name: employee.name.clone(),
            role: employee.role.clone(),
            phone: employee.phone.clone(),
            email: employee.email.clone(),
            active: true,
            created_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    async fn query_revenue(&self, range: &DateRange) -> Result<RevenueSummary, SalonError> {
        self.record(StoreCall::QueryRevenue(*range))?;
        let (total, bookings) = self.revenue.lock().map(|r| *r).unwrap_or((0.0, 0));
        Ok(RevenueSummary {
            range: *range,
            total,
            bookings,
        })
    }

    async fn reassign_bookings(
        &self,
        employee_name: &str,
        date: NaiveDate,
        target: Option<&str>,
    ) -> Result<ReassignOutcome, SalonError> {
        self.record(StoreCall::Reassign {
            employee: employee_name.to_string(),
            date,
            target: target.map(String::from),
        })?;
        let stylists = self.reassign_to.lock().map(|s| s.clone()).unwrap_or_default();
        let assignments: Vec<BookingAssignment> = (0..2)
            .map(|i| BookingAssignment {
                booking_id: format!("b{}", i + 1),
                stylist_name: match target {
                    Some(t) => Some(t.to_string()),
                    None if stylists.is_empty() => None,
                    None => Some(stylists[i % stylists.len()].clone()),
                },
            })
            .collect();
        Ok(ReassignOutcome {
            count: assignments.len(),
            assignments,
        })
    }

    async fn assign_booking(&self, booking_id: &str, stylist_name: &str) -> Result<String, SalonError> {
        self.record(StoreCall::Assign {
            booking_id: booking_id.to_string(),
            stylist: stylist_name.to_string(),
        })?;
        Ok(stylist_name.to_string())
    }

    async fn cancel_booking(&self, booking_id: &str) -> Result<String, SalonError> {
        self.record(StoreCall::Cancel(booking_id.to_string()))?;
        Ok(booking_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fail_next_applies_once() {
        let store = RecordingStore::new();
        store.fail_next(1);
        assert!(store.cancel_booking("b-1").await.is_err());
        assert_eq!(store.cancel_booking("b-1").await.unwrap(), "b-1");
        assert_eq!(store.calls().len(), 2);
    }

    #[tokio::test]
    async fn untargeted_reassignment_rotates_stylists() {
        let store = RecordingStore::new().with_stylists(&["Anita", "Kavya"]);
        let day = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        let outcome = store.reassign_bookings("Priya", day, None).await.unwrap();
        let names: Vec<_> = outcome
            .assignments
            .iter()
            .map(|a| a.stylist_name.as_deref())
            .collect();
        assert_eq!(names, [Some("Anita"), Some("Kavya")]);

        let none = RecordingStore::new().with_stylists(&[]);
        let outcome = none.reassign_bookings("Priya", day, None).await.unwrap();
        assert!(outcome.assignments.iter().all(|a| a.stylist_name.is_none()));
    }
}
