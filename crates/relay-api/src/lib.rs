//! # relay-api
//!
//! REST trigger surface built with Axum. The same router serves the
//! WebSocket gateway at `/gateway`.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{
    create_app, create_app_state, create_app_state_with, postgres_services, run, serve,
};
pub use state::AppState;
