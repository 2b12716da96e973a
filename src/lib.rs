//! Publication Hub - Backend Library
//!
//! Court and tribunal list publication backend: identity-keyed upsert of
//! incoming publications, rendered-file lifecycle, and daily maintenance.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod storage;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, Result};
