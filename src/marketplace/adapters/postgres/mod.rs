//! `PostgreSQL` adapters for marketplace persistence.

mod migrations;
mod models;
mod pool;
mod repository;
mod schema;

pub use migrations::{MIGRATIONS, MigrationError, apply_migrations};
pub use pool::{DatabasePool, DatabasePoolError, PgPool, PooledPgConnection};
pub use repository::PostgresMarketplaceRepository;
