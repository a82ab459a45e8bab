// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Booking operations: revenue aggregation, reassignment, assignment and
//! cancellation.

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, params};
use salonbook_core::SalonError;
use salonbook_core::types::{BookingAssignment, DateRange, ReassignOutcome, RevenueSummary};
use tracing::debug;

use crate::database::{Database, query_err, write_err};
use crate::models::{BookingRecord, NewBooking};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn booking_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BookingRecord> {
    let status: String = row.get(6)?;
    Ok(BookingRecord {
        id: row.get(0)?,
        customer_name: row.get(1)?,
        service: row.get(2)?,
        date: row.get(3)?,
        time: row.get(4)?,
        stylist_name: row.get(5)?,
        status: status
            .parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?,
        amount: row.get(7)?,
        price: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Insert a booking and return its generated id.
pub async fn insert_booking(db: &Database, booking: &NewBooking) -> Result<String, SalonError> {
    let booking = booking.clone();
    let id = uuid::Uuid::new_v4().to_string();
    let row_id = id.clone();
    let now = chrono::Utc::now().to_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO bookings (id, customer_name, service, date, time, stylist_name,
                                       status, amount, price, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
                params![
                    row_id,
                    booking.customer_name,
                    booking.service,
                    booking.date.format(DATE_FORMAT).to_string(),
                    booking.time,
                    booking.stylist_name,
                    booking.status.to_string(),
                    booking.amount,
                    booking.price,
                    now,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(write_err)?;
    Ok(id)
}

/// Get a booking by id.
pub async fn get_booking(db: &Database, id: &str) -> Result<Option<BookingRecord>, SalonError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, customer_name, service, date, time, stylist_name, status,
                        amount, price, created_at, updated_at
                 FROM bookings WHERE id = ?1",
                params![id],
                booking_from_row,
            )
            .optional()
        })
        .await
        .map_err(query_err)
}

/// Sum revenue of completed bookings whose date falls in the range.
///
/// Each booking contributes `amount`, falling back to `price`, falling back
/// to zero.
pub async fn query_revenue(db: &Database, range: &DateRange) -> Result<RevenueSummary, SalonError> {
    let range = *range;
    let start = range.start.format(DATE_FORMAT).to_string();
    let end = range.end.format(DATE_FORMAT).to_string();
    let (total, bookings) = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COALESCE(SUM(COALESCE(amount, price, 0)), 0), COUNT(*)
                 FROM bookings
                 WHERE status = 'completed' AND date BETWEEN ?1 AND ?2",
                params![start, end],
                |row| Ok((row.get::<_, f64>(0)?, row.get::<_, i64>(1)?)),
            )
        })
        .await
        .map_err(query_err)?;

    Ok(RevenueSummary {
        range,
        total,
        bookings: usize::try_from(bookings).unwrap_or_default(),
    })
}

enum Reassigned {
    Done(ReassignOutcome),
    UnknownTarget,
}

/// Move every open booking of `employee_name` on `date` to other stylists.
///
/// With `target` set, all bookings go to that active employee. Otherwise they
/// are distributed round-robin over the other active employees in name order;
/// when there is nobody else the stylist is cleared. Runs in one transaction.
pub async fn reassign_bookings(
    db: &Database,
    employee_name: &str,
    date: NaiveDate,
    target: Option<&str>,
) -> Result<ReassignOutcome, SalonError> {
    let source = employee_name.trim().to_string();
    let target = target.map(|t| t.trim().to_string());
    let target_label = target.clone().unwrap_or_default();
    let day = date.format(DATE_FORMAT).to_string();

    let result = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let candidates: Vec<String> = match &target {
                Some(name) => {
                    let found: Option<String> = tx
                        .query_row(
                            "SELECT name FROM employees
                             WHERE name = ?1 COLLATE NOCASE AND active = 1 LIMIT 1",
                            params![name],
                            |row| row.get(0),
                        )
                        .optional()?;
                    match found {
                        Some(stored) => vec![stored],
                        None => return Ok(Reassigned::UnknownTarget),
                    }
                }
                None => {
                    let mut stmt = tx.prepare(
                        "SELECT name FROM employees
                         WHERE active = 1 AND name <> ?1 COLLATE NOCASE
                         ORDER BY name COLLATE NOCASE",
                    )?;
                    let rows = stmt.query_map(params![source], |row| row.get(0))?;
                    rows.collect::<Result<_, _>>()?
                }
            };

            let booking_ids: Vec<String> = {
                let mut stmt = tx.prepare(
                    "SELECT id FROM bookings
                     WHERE date = ?1 AND stylist_name = ?2 COLLATE NOCASE
                       AND status IN ('pending', 'confirmed')
                     ORDER BY time, created_at",
                )?;
                let rows = stmt.query_map(params![day, source], |row| row.get(0))?;
                rows.collect::<Result<_, _>>()?
            };

            let now = chrono::Utc::now().to_rfc3339();
            let mut assignments = Vec::with_capacity(booking_ids.len());
            for (i, booking_id) in booking_ids.into_iter().enumerate() {
                let stylist = (!candidates.is_empty()).then(|| candidates[i % candidates.len()].clone());
                tx.execute(
                    "UPDATE bookings SET stylist_name = ?1, updated_at = ?2 WHERE id = ?3",
                    params![stylist, now, booking_id],
                )?;
                assignments.push(BookingAssignment {
                    booking_id,
                    stylist_name: stylist,
                });
            }

            tx.commit()?;
            Ok(Reassigned::Done(ReassignOutcome {
                count: assignments.len(),
                assignments,
            }))
        })
        .await
        .map_err(write_err)?;

    match result {
        Reassigned::Done(outcome) => {
            debug!(employee = employee_name, count = outcome.count, "bookings reassigned");
            Ok(outcome)
        }
        Reassigned::UnknownTarget => Err(SalonError::NotFound {
            entity: "employee",
            id: target_label,
        }),
    }
}

enum Assigned {
    Done(String),
    UnknownEmployee,
    UnknownBooking,
    Cancelled,
}

/// Assign a booking to an active employee. Returns the employee's stored name.
pub async fn assign_booking(
    db: &Database,
    booking_id: &str,
    stylist_name: &str,
) -> Result<String, SalonError> {
    let booking_id = booking_id.trim().to_string();
    let stylist = stylist_name.trim().to_string();
    let (id_label, stylist_label) = (booking_id.clone(), stylist.clone());

    let result = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let stored: Option<String> = tx
                .query_row(
                    "SELECT name FROM employees
                     WHERE name = ?1 COLLATE NOCASE AND active = 1 LIMIT 1",
                    params![stylist],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(stored) = stored else {
                return Ok(Assigned::UnknownEmployee);
            };

            let status: Option<String> = tx
                .query_row(
                    "SELECT status FROM bookings WHERE id = ?1",
                    params![booking_id],
                    |row| row.get(0),
                )
                .optional()?;
            match status.as_deref() {
                None => return Ok(Assigned::UnknownBooking),
                Some("cancelled") => return Ok(Assigned::Cancelled),
                Some(_) => {}
            }

            tx.execute(
                "UPDATE bookings SET stylist_name = ?1, updated_at = ?2 WHERE id = ?3",
                params![stored, chrono::Utc::now().to_rfc3339(), booking_id],
            )?;
            tx.commit()?;
            Ok(Assigned::Done(stored))
        })
        .await
        .map_err(write_err)?;

    match result {
        Assigned::Done(name) => Ok(name),
        Assigned::UnknownEmployee => Err(SalonError::NotFound {
            entity: "employee",
            id: stylist_label,
        }),
        Assigned::UnknownBooking => Err(SalonError::NotFound {
            entity: "booking",
            id: id_label,
        }),
        Assigned::Cancelled => Err(SalonError::DatabaseWrite(format!(
            "booking `{id_label}` is cancelled"
        ))),
    }
}

/// Cancel a booking. Cancelling an already-cancelled booking is a no-op.
pub async fn cancel_booking(db: &Database, booking_id: &str) -> Result<String, SalonError> {
    let id = booking_id.trim().to_string();
    let row_id = id.clone();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE bookings SET status = 'cancelled', updated_at = ?1 WHERE id = ?2",
                params![chrono::Utc::now().to_rfc3339(), row_id],
            )
        })
        .await
        .map_err(write_err)?;

    if changed == 0 {
        return Err(SalonError::NotFound {
            entity: "booking",
            id,
        });
    }
    Ok(id)
}
