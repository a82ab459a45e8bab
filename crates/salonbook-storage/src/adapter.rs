// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`SalonStore`] trait.

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info};

use salonbook_config::model::StorageConfig;
use salonbook_core::types::{DateRange, Employee, NewEmployee, ReassignOutcome, RevenueSummary};
use salonbook_core::{AdapterType, HealthStatus, PluginAdapter, SalonError, SalonStore};

use crate::database::{Database, query_err};
use crate::queries;

/// SQLite-backed salon store.
///
/// Wraps a [`Database`] handle and delegates every operation to the typed
/// query modules.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Opens the configured database, running migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, SalonError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        info!(path = config.database_path, "SQLite store ready");
        Ok(Self { db })
    }

    /// Wraps an already-open database.
    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    /// The underlying database, for seeding and inspection.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Checkpoints the WAL so the database file is self-contained.
    pub async fn shutdown(&self) -> Result<(), SalonError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(query_err)?;
        debug!("SQLite store checkpointed");
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, SalonError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(query_err)?;
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl SalonStore for SqliteStore {
    async fn create_employee(&self, employee: &NewEmployee) -> Result<Employee, SalonError> {
        queries::employees::create_employee(&self.db, employee).await
    }

    async fn query_revenue(&self, range: &DateRange) -> Result<RevenueSummary, SalonError> {
        queries::bookings::query_revenue(&self.db, range).await
    }

    async fn reassign_bookings(
        &self,
        employee_name: &str,
        date: NaiveDate,
        target: Option<&str>,
    ) -> Result<ReassignOutcome, SalonError> {
        queries::bookings::reassign_bookings(&self.db, employee_name, date, target).await
    }

    async fn assign_booking(
        &self,
        booking_id: &str,
        stylist_name: &str,
    ) -> Result<String, SalonError> {
        queries::bookings::assign_booking(&self.db, booking_id, stylist_name).await
    }

    async fn cancel_booking(&self, booking_id: &str) -> Result<String, SalonError> {
        queries::bookings::cancel_booking(&self.db, booking_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opens_from_config_and_reports_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("salon.db").to_string_lossy().into_owned(),
            wal_mode: true,
        };
        let store = SqliteStore::open(&config).await.unwrap();
        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.adapter_type(), AdapterType::Storage);
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn usable_as_trait_object() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("s.db").to_str().unwrap(), false)
            .await
            .unwrap();
        let store: std::sync::Arc<dyn SalonStore> = std::sync::Arc::new(SqliteStore::from_database(db));
        let employee = store
            .create_employee(&NewEmployee {
                name: "Rahul".into(),
                role: "stylist".into(),
                phone: "9876543210".into(),
                email: "rahul@x.com".into(),
            })
            .await
            .unwrap();
        assert_eq!(employee.name, "Rahul");
    }
}
