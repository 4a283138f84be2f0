//! Route handlers
//!
//! All HTTP request handlers organized by domain.

pub mod auth;
pub mod health;
pub mod notifications;
pub mod preferences;
pub mod rooms;
pub mod support;
