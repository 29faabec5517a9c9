use futures::future::BoxFuture;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::error::AppError;

/// Connection provider: owns the pool and hands each request its own
/// connection for the duration of a transactional unit of work. No
/// connection is ever shared across two in-flight requests.
#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    /// Build the pool lazily so the server can bind and report health even
    /// while the store is unreachable; the first acquisition surfaces the
    /// connection error instead.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy(&config.url)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply embedded migrations. Failure is reported to the caller; startup
    /// decides whether to continue degraded.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!().run(&self.pool).await?;
        info!("database migrations applied");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Run `work` inside a transaction.
    ///
    /// Commits on `Ok`, rolls back on `Err`, logs the failing operation by
    /// name, and propagates the original error unchanged. No partial write
    /// from `work` is visible outside the transaction boundary.
    pub async fn run<T, F>(&self, op: &'static str, work: F) -> Result<T, AppError>
    where
        T: Send,
        F: for<'t> FnOnce(
                &'t mut Transaction<'static, Postgres>,
            ) -> BoxFuture<'t, Result<T, AppError>>
            + Send,
    {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        match work(&mut tx).await {
            Ok(value) => {
                tx.commit().await.map_err(AppError::Database)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(op, error = %rollback_err, "rollback itself failed");
                }
                err.log(op);
                Err(err)
            }
        }
    }
}

/// Postgres signals unique-constraint violations with SQLSTATE 23505. Used
/// to map the review-uniqueness race to the same warning the pre-check gives.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;

    #[derive(Debug)]
    struct FakeDbError {
        code: Option<&'static str>,
    }

    impl std::fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "fake database error")
        }
    }

    impl std::error::Error for FakeDbError {}

    impl DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "fake database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn kind(&self) -> ErrorKind {
            match self.code {
                Some("23505") => ErrorKind::UniqueViolation,
                _ => ErrorKind::Other,
            }
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn unique_violation_is_detected_by_sqlstate() {
        let duplicate = sqlx::Error::Database(Box::new(FakeDbError { code: Some("23505") }));
        assert!(is_unique_violation(&duplicate));
    }

    #[test]
    fn other_database_errors_are_not_unique_violations() {
        let fk = sqlx::Error::Database(Box::new(FakeDbError { code: Some("23503") }));
        assert!(!is_unique_violation(&fk));

        let codeless = sqlx::Error::Database(Box::new(FakeDbError { code: None }));
        assert!(!is_unique_violation(&codeless));

        assert!(!is_unique_violation(&sqlx::Error::PoolClosed));
    }
}
