//! PostgreSQL pool setup and migrations

mod postgres;

pub use postgres::{create_lazy_pool, create_pool, run_migrations, DatabaseConfig};

pub use sqlx::postgres::PgPool;
