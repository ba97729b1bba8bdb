pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod services;

pub use engine::LedgerEngine;
pub use error::{AppError, Result};
