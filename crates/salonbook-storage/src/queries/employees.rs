// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Employee operations.

use rusqlite::{OptionalExtension, params};
use salonbook_core::SalonError;
use salonbook_core::types::{Employee, NewEmployee};

use crate::database::{Database, query_err, write_err};

const EMPLOYEE_COLUMNS: &str = "id, name, role, phone, email, active, created_at";

pub(crate) fn employee_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get(0)?,
        name: row.get(1)?,
        role: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        active: row.get::<_, i64>(5)? != 0,
        created_at: row.get(6)?,
    })
}

/// Insert a new, active employee.
pub async fn create_employee(db: &Database, employee: &NewEmployee) -> Result<Employee, SalonError> {
    let record = Employee {
        id: uuid::Uuid::new_v4().to_string(),
        name: employee.name.trim().to_string(),
        role: employee.role.trim().to_string(),
        phone: employee.phone.trim().to_string(),
        email: employee.email.trim().to_string(),
        active: true,
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    let row = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO employees (id, name, role, phone, email, active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
                params![row.id, row.name, row.role, row.phone, row.email, row.created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(write_err)?;
    Ok(record)
}

/// Look up an employee by name, case-insensitively.
pub async fn find_employee(db: &Database, name: &str) -> Result<Option<Employee>, SalonError> {
    let name = name.trim().to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {EMPLOYEE_COLUMNS} FROM employees
                     WHERE name = ?1 COLLATE NOCASE ORDER BY active DESC, created_at LIMIT 1"
                ),
                params![name],
                employee_from_row,
            )
            .optional()
        })
        .await
        .map_err(query_err)
}

/// List employees ordered by name, optionally only active ones.
pub async fn list_employees(db: &Database, active_only: bool) -> Result<Vec<Employee>, SalonError> {
    db.connection()
        .call(move |conn| {
            let sql = if active_only {
                format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE active = 1 ORDER BY name COLLATE NOCASE")
            } else {
                format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY name COLLATE NOCASE")
            };
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], employee_from_row)?;
            rows.collect()
        })
        .await
        .map_err(query_err)
}

/// Mark an employee inactive. Returns false if no employee has that name.
pub async fn deactivate_employee(db: &Database, name: &str) -> Result<bool, SalonError> {
    let name = name.trim().to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE employees SET active = 0 WHERE name = ?1 COLLATE NOCASE",
                params![name],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(write_err)
}
