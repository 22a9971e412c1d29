// sqlx::Error -> AppError mapping

use pgkeeper_core::error::AppError;

/// Convert sqlx::Error to AppError with the PostgreSQL SQLSTATE classified
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                match code_str {
                    "55P03" => AppError::Database(format!(
                        "Lock not available (lock_timeout): {}",
                        db_err.message()
                    )),
                    "57014" => {
                        AppError::Database(format!("Statement canceled: {}", db_err.message()))
                    }
                    "42P01" => {
                        AppError::Database(format!("Undefined table: {}", db_err.message()))
                    }
                    "3D000" => {
                        AppError::Database(format!("Unknown database: {}", db_err.message()))
                    }
                    "28P01" | "28000" => AppError::Database(format!(
                        "Authentication failed: {}",
                        db_err.message()
                    )),
                    _ => AppError::Database(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Database(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => {
            AppError::Database(format!("Column not found: {}", col))
        }
        _ => {
            // Connection, TLS, protocol errors
            AppError::Database(format!("Connection error: {}", err))
        }
    }
}
