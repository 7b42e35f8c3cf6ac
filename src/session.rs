//! Phrase store sessions.
//!
//! Every connection the store opens, at startup or when replacing a closed
//! one, goes through [`connect`]. Limits come from `[database.timeouts]`:
//!
//! ```toml
//! [database.timeouts]
//! connect = "5s"      # give up on unreachable hosts
//! statement = "30s"   # bound SELECT/INSERT runtime
//! lock = "2s"         # inserts never queue behind long locks
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::time::Duration;
use tokio_postgres::{Client, NoTls};

/// Per-session limits, deserialized from `[database.timeouts]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionTimeouts {
    #[serde(deserialize_with = "duration_from_str")]
    pub connect: Duration,
    #[serde(deserialize_with = "duration_from_str")]
    pub statement: Duration,
    #[serde(deserialize_with = "duration_from_str")]
    pub lock: Duration,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            statement: Duration::from_secs(30),
            lock: Duration::from_secs(2),
        }
    }
}

impl SessionTimeouts {
    /// Statements run once per new session.
    fn setup_sql(&self) -> String {
        format!(
            "SET statement_timeout = {}; SET lock_timeout = {};",
            self.statement.as_millis(),
            self.lock.as_millis(),
        )
    }
}

impl fmt::Display for SessionTimeouts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "connect {:?}, statement {:?}, lock {:?}",
            self.connect, self.statement, self.lock
        )
    }
}

/// Open one store connection.
///
/// The connection future is driven by a spawned task that logs when the
/// server side goes away; the client then reports `is_closed()` and the
/// store replaces it on next use.
pub async fn connect(database_url: &str, timeouts: &SessionTimeouts, slot: usize) -> Result<Client> {
    let (client, connection) =
        tokio::time::timeout(timeouts.connect, tokio_postgres::connect(database_url, NoTls))
            .await
            .with_context(|| format!("Connection timed out after {:?}", timeouts.connect))?
            .context("Failed to connect to database")?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::warn!(slot, error = %e, "database connection closed");
        }
    });

    client
        .batch_execute(&timeouts.setup_sql())
        .await
        .context("Failed to set session timeouts")?;

    Ok(client)
}

/// Parse "500ms", "5s" or "1m". A bare number is seconds.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let s = input.trim();
    let (digits, millis_per_unit) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1_000)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60_000)
    } else {
        (s, 1_000)
    };

    let digits = digits.trim();
    if digits.is_empty() {
        bail!("Invalid duration '{}': missing number", input);
    }
    let count: u64 = digits
        .parse()
        .with_context(|| format!("Invalid duration '{}'", input))?;
    let millis = count
        .checked_mul(millis_per_unit)
        .with_context(|| format!("Invalid duration '{}': too large", input))?;

    Ok(Duration::from_millis(millis))
}

/// serde adapter for duration strings.
pub fn duration_from_str<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).map_err(|e| serde::de::Error::custom(format!("{e:#}")))
}
