//! Business logic services.

pub mod file_generation;
pub mod publication_file_service;
pub mod publication_service;
pub mod scheduler_service;
pub mod search_extraction;
