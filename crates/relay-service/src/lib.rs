//! # relay-service
//!
//! Application layer containing business logic, services, and DTOs.

pub mod dto;
pub mod services;

pub use dto::{
    CreateSupportEventRequest, NotificationListQuery, PinNotificationRequest,
    RateSupportEventRequest, UnreadResponse, UpdateSupportStatusRequest,
};
pub use services::{
    NotificationService, PreferenceService, ServiceContext, ServiceContextBuilder, ServiceError,
    ServiceResult, SupportService, UnreadService,
};
