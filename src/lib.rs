pub mod common;
pub mod config;
pub mod observability;
pub mod parser;
pub mod tracking;

// Layered boundaries: use cases and ports in app, adapters in infra
pub mod app;
pub mod infra;

pub use common::{Result, ScraperError};
