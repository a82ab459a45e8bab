// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode and migrations.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::path::Path;

use salonbook_core::SalonError;
use tracing::debug;

use crate::migrations;

/// Handle to the single SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Opens (creating if needed) the database at `path`, applies PRAGMAs and
    /// runs pending migrations. `:memory:` opens a private in-memory database.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, SalonError> {
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(SalonError::storage)?;
            }
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(SalonError::storage)?;

        conn.call(move |conn| -> Result<(), SalonError> {
            apply_pragmas(conn, wal_mode).map_err(SalonError::storage)?;
            migrations::run_migrations(conn)
        })
        .await
        .map_err(flatten_call_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// Returns the connection for query modules.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }
}

fn apply_pragmas(conn: &rusqlite::Connection, wal_mode: bool) -> Result<(), rusqlite::Error> {
    if wal_mode {
        conn.pragma_update(None, "journal_mode", "WAL")?;
    }
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

fn flatten_call_err(e: tokio_rusqlite::Error<SalonError>) -> SalonError {
    match e {
        tokio_rusqlite::Error::Error(inner) => inner,
        other => SalonError::Storage {
            source: other.to_string().into(),
        },
    }
}

/// Maps a failed read to [`SalonError::DatabaseQuery`].
pub(crate) fn query_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> SalonError {
    SalonError::DatabaseQuery(e.to_string())
}

/// Maps a failed write to [`SalonError::DatabaseWrite`].
pub(crate) fn write_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> SalonError {
    SalonError::DatabaseWrite(e.to_string())
}
