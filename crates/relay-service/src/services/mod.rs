//! Business logic services
//!
//! This module contains all service layer implementations that handle
//! business logic, validation, and orchestration of domain operations.

pub mod context;
pub mod error;
pub mod notification;
pub mod preference;
pub mod support;
pub mod unread;

// Re-export all services for convenience
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use notification::NotificationService;
pub use preference::PreferenceService;
pub use support::SupportService;
pub use unread::UnreadService;
