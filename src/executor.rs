//! Query executor capability consumed by the exporter
//!
//! The exporter never talks to a database directly; it needs two operations,
//! running a statement and reading a single scalar. Implement
//! [`QueryExecutor`] for whatever connection type the application uses. With
//! the `mysql` feature enabled it is implemented for `mysql::Conn` and
//! `mysql::PooledConn`.

use crate::error::BoxError;

/// Minimal database access needed by an export
pub trait QueryExecutor {
    /// Execute a statement, discarding any result
    fn execute_statement(&mut self, sql: &str) -> Result<(), BoxError>;

    /// Run a query and return the first column of the first row
    ///
    /// `Ok(None)` means no row or SQL `NULL`.
    fn query_scalar(&mut self, sql: &str) -> Result<Option<String>, BoxError>;
}

impl<E: QueryExecutor + ?Sized> QueryExecutor for &mut E {
    fn execute_statement(&mut self, sql: &str) -> Result<(), BoxError> {
        (**self).execute_statement(sql)
    }

    fn query_scalar(&mut self, sql: &str) -> Result<Option<String>, BoxError> {
        (**self).query_scalar(sql)
    }
}

impl<E: QueryExecutor + ?Sized> QueryExecutor for Box<E> {
    fn execute_statement(&mut self, sql: &str) -> Result<(), BoxError> {
        (**self).execute_statement(sql)
    }

    fn query_scalar(&mut self, sql: &str) -> Result<Option<String>, BoxError> {
        (**self).query_scalar(sql)
    }
}

#[cfg(feature = "mysql")]
mod mysql_impl {
    use super::QueryExecutor;
    use crate::error::BoxError;
    use mysql::prelude::Queryable;

    macro_rules! impl_query_executor {
        ($($conn:ty),+) => {
            $(
                impl QueryExecutor for $conn {
                    fn execute_statement(&mut self, sql: &str) -> Result<(), BoxError> {
                        self.query_drop(sql)?;
                        Ok(())
                    }

                    fn query_scalar(&mut self, sql: &str) -> Result<Option<String>, BoxError> {
                        let value: Option<Option<String>> = self.query_first(sql)?;
                        Ok(value.flatten())
                    }
                }
            )+
        };
    }

    impl_query_executor!(mysql::Conn, mysql::PooledConn);
}
