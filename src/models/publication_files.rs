//! Rendered publication file set.
//!
//! Produced once by the file generator and consumed immediately by the
//! lifecycle manager; never persisted as an entity.

use bytes::Bytes;
use serde::Serialize;

/// The triple of rendered files for one artefact. Any buffer may be empty
/// when the corresponding rendering was not produced.
#[derive(Debug, Clone, Default)]
pub struct PublicationFiles {
    /// Primary (English) PDF
    pub primary_pdf: Bytes,
    /// Additional Welsh-variant PDF (non-SJP lists only)
    pub additional_pdf: Bytes,
    /// Excel rendering (SJP lists only)
    pub excel: Bytes,
}

/// Byte sizes of whichever rendered files exist for an artefact.
/// An absent file reports as `None`, not zero, so partially generated file
/// sets stay representable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicationFileSizes {
    pub primary_pdf: Option<u64>,
    pub additional_pdf: Option<u64>,
    pub excel: Option<u64>,
}
