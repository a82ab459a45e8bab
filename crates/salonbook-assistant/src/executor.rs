// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs completed actions against the salon store.
//!
//! Each handler re-checks its required fields, performs exactly one store
//! operation and formats a confirmation. Store errors never propagate: they
//! become a parenthetical note on the confirmation and `success: false`.

use std::sync::Arc;

use chrono::NaiveDate;
use salonbook_core::types::{DateRange, NewEmployee};
use salonbook_core::{SalonError, SalonStore};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::action::{ActionKind, Entities, parse_date};

/// Structured outcome returned to the client as `actionResult`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub data: serde_json::Value,
}

/// Confirmation text plus the structured result.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub message: String,
    pub result: ActionResult,
}

impl Execution {
    fn ok(kind: ActionKind, message: String, data: serde_json::Value) -> Self {
        Self {
            message,
            result: ActionResult {
                success: true,
                kind,
                data,
            },
        }
    }

    fn failed(kind: ActionKind, attempt: &str, error: &SalonError) -> Self {
        warn!(action = %kind, error = %error, "action failed");
        Self {
            message: format!("{attempt} (Note: {error})"),
            result: ActionResult {
                success: false,
                kind,
                data: json!({ "error": error.to_string() }),
            },
        }
    }
}

/// Executes actions against a [`SalonStore`].
#[derive(Clone)]
pub struct ActionExecutor {
    store: Arc<dyn SalonStore>,
}

impl std::fmt::Debug for ActionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionExecutor")
            .field("store", &self.store.name())
            .finish()
    }
}

fn field<'a>(kind: ActionKind, entities: &'a Entities, name: &str) -> Result<&'a str, SalonError> {
    entities
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SalonError::MissingField {
            action: kind.to_string(),
            field: name.to_string(),
        })
}

fn date_field(
    kind: ActionKind,
    entities: &Entities,
    name: &str,
    today: NaiveDate,
) -> Result<NaiveDate, SalonError> {
    let raw = field(kind, entities, name)?;
    parse_date(raw, today).ok_or_else(|| invalid_date(name, raw))
}

fn invalid_date(name: &str, raw: &str) -> SalonError {
    SalonError::InvalidField {
        field: name.to_string(),
        value: raw.to_string(),
    }
}

fn new_employee(entities: &Entities) -> Result<NewEmployee, SalonError> {
    let kind = ActionKind::AddEmployee;
    Ok(NewEmployee {
        name: field(kind, entities, "name")?.to_string(),
        role: field(kind, entities, "role")?.to_string(),
        phone: field(kind, entities, "phone")?.to_string(),
        email: field(kind, entities, "email")?.to_string(),
    })
}

impl ActionExecutor {
    pub fn new(store: Arc<dyn SalonStore>) -> Self {
        Self { store }
    }

    /// Runs `kind` with `entities`. Relative dates resolve against `today`.
    pub async fn execute(&self, kind: ActionKind, entities: &Entities, today: NaiveDate) -> Execution {
        let execution = match kind {
            ActionKind::AddEmployee => self.add_employee(entities).await,
            ActionKind::GetRevenue => self.get_revenue(entities, today).await,
            ActionKind::ReassignAppointments => self.reassign(entities, today).await,
            ActionKind::AssignBooking => self.assign(entities).await,
            ActionKind::CancelBooking => self.cancel(entities).await,
            ActionKind::Chat => Execution::ok(kind, String::new(), json!({})),
        };
        if execution.result.success && kind.is_action() {
            info!(action = %kind, "action executed");
        }
        execution
    }

    async fn add_employee(&self, entities: &Entities) -> Execution {
        let kind = ActionKind::AddEmployee;
        let employee = match new_employee(entities) {
            Ok(e) => e,
            Err(e) => return Execution::failed(kind, "I couldn't add the employee yet.", &e),
        };

        match self.store.create_employee(&employee).await {
            Ok(created) => Execution::ok(
                kind,
                format!(
                    "Done! {} has been added as a {} (phone {}, email {}).",
                    created.name, created.role, created.phone, created.email
                ),
                serde_json::to_value(&created).unwrap_or_default(),
            ),
            Err(e) => Execution::failed(
                kind,
                &format!("I couldn't add {} to the team.", employee.name),
                &e,
            ),
        }
    }

    async fn get_revenue(&self, entities: &Entities, today: NaiveDate) -> Execution {
        let kind = ActionKind::GetRevenue;
        let start = match date_field(kind, entities, "date", today) {
            Ok(d) => d,
            Err(e) => return Execution::failed(kind, "I couldn't look up revenue.", &e),
        };
        let end = match entities.get("endDate") {
            Some(raw) => match parse_date(raw, today) {
                Some(d) => d,
                None => {
                    let e = invalid_date("endDate", raw);
                    return Execution::failed(kind, "I couldn't look up revenue.", &e);
                }
            },
            None => start,
        };
        let range = DateRange::between(start, end);
        let label = if range.start == range.end {
            range.start.format("%Y-%m-%d").to_string()
        } else {
            format!("{} to {}", range.start.format("%Y-%m-%d"), range.end.format("%Y-%m-%d"))
        };

        match self.store.query_revenue(&range).await {
            Ok(summary) => Execution::ok(
                kind,
                format!(
                    "Revenue for {label}: {:.2} from {} completed booking{}.",
                    summary.total,
                    summary.bookings,
                    if summary.bookings == 1 { "" } else { "s" }
                ),
                json!({
                    "startDate": range.start,
                    "endDate": range.end,
                    "total": summary.total,
                    "bookings": summary.bookings,
                }),
            ),
            Err(e) => Execution::failed(kind, &format!("I couldn't look up revenue for {label}."), &e),
        }
    }

    async fn reassign(&self, entities: &Entities, today: NaiveDate) -> Execution {
        let kind = ActionKind::ReassignAppointments;
        let employee = match field(kind, entities, "employeeName") {
            Ok(name) => name,
            Err(e) => return Execution::failed(kind, "I couldn't reassign the appointments.", &e),
        };
        let date = match date_field(kind, entities, "date", today) {
            Ok(d) => d,
            Err(e) => {
                return Execution::failed(
                    kind,
                    &format!("I couldn't reassign {employee}'s appointments."),
                    &e,
                );
            }
        };
        let target = entities
            .get("toEmployeeName")
            .map(|t| t.trim())
            .filter(|t| !t.is_empty());
        let day = date.format("%Y-%m-%d");

        match self.store.reassign_bookings(employee, date, target).await {
            Ok(outcome) => {
                let message = match (outcome.count, target) {
                    (0, _) => format!("{employee} has no open appointments on {day}, so nothing was reassigned."),
                    (n, Some(to)) => format!(
                        "Reassigned {n} appointment{} from {employee} to {to} on {day}.",
                        if n == 1 { "" } else { "s" }
                    ),
                    (n, None) => format!(
                        "Reassigned {n} of {employee}'s appointment{} on {day} to other stylists.",
                        if n == 1 { "" } else { "s" }
                    ),
                };
                Execution::ok(
                    kind,
                    message,
                    json!({
                        "employeeName": employee,
                        "date": date,
                        "count": outcome.count,
                        "assignments": outcome.assignments,
                    }),
                )
            }
            Err(e) => Execution::failed(
                kind,
                &format!("I couldn't reassign {employee}'s appointments on {day}."),
                &e,
            ),
        }
    }

    async fn assign(&self, entities: &Entities) -> Execution {
        let kind = ActionKind::AssignBooking;
        let (booking_id, stylist) = match (
            field(kind, entities, "bookingId"),
            field(kind, entities, "stylistName"),
        ) {
            (Ok(b), Ok(s)) => (b, s),
            (Err(e), _) | (_, Err(e)) => {
                return Execution::failed(kind, "I couldn't assign the booking.", &e);
            }
        };

        match self.store.assign_booking(booking_id, stylist).await {
            Ok(assigned) => Execution::ok(
                kind,
                format!("Booking {booking_id} is now assigned to {assigned}."),
                json!({ "bookingId": booking_id, "stylistName": assigned }),
            ),
            Err(e) => Execution::failed(
                kind,
                &format!("I couldn't assign booking {booking_id} to {stylist}."),
                &e,
            ),
        }
    }

    async fn cancel(&self, entities: &Entities) -> Execution {
        let kind = ActionKind::CancelBooking;
        let booking_id = match field(kind, entities, "bookingId") {
            Ok(b) => b,
            Err(e) => return Execution::failed(kind, "I couldn't cancel the booking.", &e),
        };

        match self.store.cancel_booking(booking_id).await {
            Ok(id) => Execution::ok(
                kind,
                format!("Booking {id} has been cancelled."),
                json!({ "bookingId": id }),
            ),
            Err(e) => Execution::failed(kind, &format!("I couldn't cancel booking {booking_id}."), &e),
        }
    }
}
