//! Key-value persistence for notification settings.
//!
//! Values are opaque strings (the service stores JSON). There is no schema
//! versioning; a value that no longer parses is treated as absent by the caller.

use anyhow::{Context, Result};
use chrono::Utc;
use dashmap::DashMap;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Mutex;

/// String key-value store surviving service restarts.
pub trait SettingsStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>>;

    fn save(&self, key: &str, value: &str) -> Result<()>;
}

/// Settings persisted in a SQLite table.
pub struct SqliteSettingsStore {
    conn: Mutex<Connection>,
}

impl SqliteSettingsStore {
    /// Opens (or creates) the SQLite database and ensures the table exists.
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open settings DB at {}", db_path))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_table()?;
        Ok(store)
    }

    fn create_table(&self) -> Result<()> {
        let conn = self.conn.lock().expect("settings DB lock poisoned");
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS settings (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .context("Failed to create settings table")?;
        Ok(())
    }
}

impl SettingsStore for SqliteSettingsStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().expect("settings DB lock poisoned");
        conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("Failed to load setting {}", key))
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().expect("settings DB lock poisoned");
        conn.execute(
            "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )
        .with_context(|| format!("Failed to save setting {}", key))?;
        Ok(())
    }
}

/// Non-persistent store (tests, or when no settings path is configured).
#[derive(Default)]
pub struct MemorySettingsStore {
    values: DashMap<String, String>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).map(|v| v.clone()))
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
