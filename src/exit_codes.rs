//! Exit code policy for wordmatch.
//!
//! - `0` = Success
//! - `10` = General operational failure
//! - `11` = Connection failure (database unreachable at startup)
//! - `12` = Configuration error
//!
//! Lets scripts tell "the service is misconfigured" apart from "the database
//! is down".

use crate::store::StorageError;

/// Exit code: general operational failure
pub const OPERATIONAL_FAILURE: i32 = 10;

/// Exit code: connection failure
pub const CONNECTION_FAILURE: i32 = 11;

/// Exit code: configuration error
pub const CONFIG_ERROR: i32 = 12;

/// Marker for errors caused by bad configuration or arguments.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ConfigError(pub String);

/// Pick the exit code for a failed run by walking the error chain.
pub fn for_error(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if cause.downcast_ref::<ConfigError>().is_some() {
            return CONFIG_ERROR;
        }
        if let Some(StorageError::Connect(_)) = cause.downcast_ref::<StorageError>() {
            return CONNECTION_FAILURE;
        }
    }
    OPERATIONAL_FAILURE
}
