//! HTTP surface for the match stream relay

pub mod http;

pub use http::{create_router, AppError, AppResult, AppState};
