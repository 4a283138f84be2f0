//! # relay-db
//!
//! Database layer implementing repository traits with PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! This crate provides PostgreSQL implementations for all repository traits
//! defined in `relay-core`. It handles:
//!
//! - Connection pool management
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers
//! - Repository implementations
//! - An in-memory store with the same semantics, for tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_db::pool::{create_pool, DatabaseConfig};
//! use relay_db::repositories::PgSupportEventRepository;
//! use relay_core::traits::SupportEventRepository;
//!
//! async fn example(app_config: &relay_common::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from(&app_config.database);
//!     let pool = create_pool(&config).await?;
//!     let tickets = PgSupportEventRepository::new(pool);
//!
//!     let ticket = tickets.find_by_id(1).await?;
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use memory::MemoryStore;
pub use pool::{
    create_lazy_pool, create_pool, run_migrations, DatabaseConfig, PgPool,
};
pub use repositories::{
    PgDeliveryStatsRepository, PgInAppNotificationRepository, PgMessageRepository,
    PgNotificationQueueRepository, PgNotificationTemplateRepository, PgPreferenceRepository,
    PgReadCursorRepository, PgRoomRepository, PgSupportEventRepository,
};
