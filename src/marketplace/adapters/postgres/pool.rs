//! Explicitly managed `PostgreSQL` connection pool.
//!
//! The pool is opened once at startup, passed to adapters, and closed at
//! shutdown. Each unit of work acquires a connection for its own scope; the
//! connection returns to the pool when the scope ends on every exit path.

use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError, PooledConnection};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::marketplace::ports::RepositoryError;

/// `PostgreSQL` connection pool type.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Connection checked out of a [`DatabasePool`].
pub type PooledPgConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// Errors raised while opening or using a [`DatabasePool`].
#[derive(Debug, Clone, Error)]
pub enum DatabasePoolError {
    /// The pool could not be built.
    #[error("failed to open database pool: {0}")]
    Open(Arc<PoolError>),

    /// The pool has been closed.
    #[error("database pool is closed")]
    Closed,

    /// No connection became available.
    #[error("failed to acquire database connection: {0}")]
    Acquire(Arc<PoolError>),

    /// The blocking task running the unit of work failed.
    #[error("database task failed: {0}")]
    Task(Arc<tokio::task::JoinError>),
}

/// Shared, explicitly closed handle to the connection pool.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    inner: PgPool,
    closed: Arc<AtomicBool>,
}

impl DatabasePool {
    const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

    /// Opens a pool of at most `max_size` connections to `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabasePoolError::Open`] when the initial connections
    /// cannot be established.
    pub fn open(database_url: &str, max_size: u32) -> Result<Self, DatabasePoolError> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let inner = Pool::builder()
            .max_size(max_size)
            .connection_timeout(Self::CONNECTION_TIMEOUT)
            .build(manager)
            .map_err(|err| DatabasePoolError::Open(Arc::new(err)))?;
        info!(max_size, "database pool opened");
        Ok(Self::from_pool(inner))
    }

    /// Wraps an already built pool.
    #[must_use]
    pub fn from_pool(inner: PgPool) -> Self {
        Self {
            inner,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Closes the pool. Subsequent acquisitions fail with
    /// [`DatabasePoolError::Closed`]; idle connections are released once the
    /// last handle is dropped.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("database pool closed");
        }
    }

    /// Returns `true` once [`Self::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Checks out a connection for the caller's scope.
    ///
    /// # Errors
    ///
    /// Returns [`DatabasePoolError::Closed`] after [`Self::close`] or
    /// [`DatabasePoolError::Acquire`] when no connection becomes available.
    pub fn acquire(&self) -> Result<PooledPgConnection, DatabasePoolError> {
        if self.is_closed() {
            return Err(DatabasePoolError::Closed);
        }
        self.inner
            .get()
            .map_err(|err| DatabasePoolError::Acquire(Arc::new(err)))
    }

    /// Runs `work` with a scoped connection on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `work`, or a [`DatabasePoolError`]
    /// converted into `E` when acquisition or the blocking task fails.
    pub async fn run<F, T, E>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<DatabasePoolError> + Send + 'static,
    {
        let pool = self.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.acquire()?;
            work(&mut connection)
        })
        .await
        .map_err(|err| E::from(DatabasePoolError::Task(Arc::new(err))))?
    }
}

impl From<DatabasePoolError> for RepositoryError {
    fn from(err: DatabasePoolError) -> Self {
        Self::persistence(err)
    }
}
