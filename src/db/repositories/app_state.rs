use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::db::{helpers::parse_datetime, Database};

const LAST_LOGIN_KEY: &str = "last_login";

impl Database {
    /// Stores `now` as the latest login and returns the one before it.
    pub async fn record_login(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            let previous: Option<String> = tx
                .query_row(
                    "SELECT value FROM app_state WHERE key = ?1",
                    params![LAST_LOGIN_KEY],
                    |row| row.get(0),
                )
                .optional()?;
            tx.execute(
                "INSERT OR REPLACE INTO app_state (key, value) VALUES (?1, ?2)",
                params![LAST_LOGIN_KEY, now.to_rfc3339()],
            )
            .with_context(|| "failed to store last login")?;
            tx.commit()?;

            previous
                .map(|value| parse_datetime(&value, LAST_LOGIN_KEY))
                .transpose()
        })
        .await
    }
}
