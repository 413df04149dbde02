//! HTTP API
//!
//! A thin axum layer over the services. Authentication happens upstream; the
//! acting user's id arrives in the `x-user-id` header.

pub mod http;
pub mod rest;
pub mod state;

pub use http::create_router;
pub use state::AppState;
