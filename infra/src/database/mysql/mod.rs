//! MySQL implementations of the core persistence traits

mod session_activity_repository_impl;
mod session_store_impl;
mod user_lookup_impl;

pub use session_activity_repository_impl::MySqlSessionActivityRepository;
pub use session_store_impl::MySqlSessionStore;
pub use user_lookup_impl::MySqlUserLookup;

use sqlx::mysql::MySqlRow;
use sqlx::Row;
use tg_core::errors::StoreError;
use uuid::Uuid;

/// Translate a SQLx failure into the store contract
///
/// Unique key violations become [`StoreError::Conflict`]; everything the
/// caller cannot act on is reported as unavailability.
pub(crate) fn map_sqlx_error(operation: &'static str, error: sqlx::Error) -> StoreError {
    match error {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::Conflict,
        sqlx::Error::PoolTimedOut => {
            tracing::warn!(operation = operation, "Database pool timed out");
            StoreError::Timeout
        }
        other => {
            tracing::error!(operation = operation, error = %other, "Database operation failed");
            StoreError::Unavailable(format!("{}: {}", operation, other))
        }
    }
}

/// Read a column, reporting a decode failure as a broken backend
pub(crate) fn column<'r, T>(row: &'r MySqlRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::MySql> + sqlx::Type<sqlx::MySql>,
{
    row.try_get(name)
        .map_err(|e| StoreError::Unavailable(format!("Failed to get {}: {}", name, e)))
}

/// Parse a UUID stored as `CHAR(36)`
pub(crate) fn parse_uuid(value: &str, name: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(value).map_err(|e| StoreError::Unavailable(format!("Invalid {} UUID: {}", name, e)))
}

pub(crate) fn uuid_column(row: &MySqlRow, name: &str) -> Result<Uuid, StoreError> {
    let value: String = column(row, name)?;
    parse_uuid(&value, name)
}

pub(crate) fn optional_uuid_column(row: &MySqlRow, name: &str) -> Result<Option<Uuid>, StoreError> {
    let value: Option<String> = column(row, name)?;
    value.map(|v| parse_uuid(&v, name)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert_eq!(map_sqlx_error("find", sqlx::Error::RowNotFound), StoreError::NotFound);
    }

    #[test]
    fn test_pool_timeout_maps_to_timeout() {
        assert_eq!(map_sqlx_error("find", sqlx::Error::PoolTimedOut), StoreError::Timeout);
    }

    #[test]
    fn test_other_errors_are_unavailable() {
        let error = map_sqlx_error("revoke", sqlx::Error::PoolClosed);
        match error {
            StoreError::Unavailable(message) => assert!(message.starts_with("revoke:")),
            other => panic!("Expected Unavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_uuid(&id.to_string(), "id"), Ok(id));
        assert!(matches!(parse_uuid("not-a-uuid", "id"), Err(StoreError::Unavailable(_))));
    }
}
