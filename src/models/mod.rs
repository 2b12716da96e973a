//! Database models (SQLx).

pub mod artefact;
pub mod publication_files;
