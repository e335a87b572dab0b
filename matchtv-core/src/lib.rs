//! Shared building blocks for the match stream relay: configuration,
//! logging, errors, the scrape cache and the schedule sources.

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod resilience;
pub mod spoof;

pub use config::Config;
pub use error::{Error, Result};
