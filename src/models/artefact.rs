//! Artefact model.
//!
//! An artefact is one version of a published list, judgment or outcome for a
//! specific location, content date, language and source system. At most one
//! current artefact exists per identity tuple; newer submissions replace it
//! and bump `superseded_count`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Category of the published document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "artefact_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtefactType {
    List,
    Judgement,
    Outcome,
    StatusUpdates,
}

/// Publication sensitivity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sensitivity", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sensitivity {
    Public,
    Classified,
    Private,
}

/// Language of the publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "language", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Language {
    English,
    Welsh,
    BiLingual,
}

/// Court/tribunal list type. Governs the expiry rule and which rendered
/// file variants exist in blob storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "list_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListType {
    CivilDailyCauseList,
    FamilyDailyCauseList,
    CivilAndFamilyDailyCauseList,
    CrownDailyList,
    CrownFirmList,
    CrownWarnedList,
    MagistratesPublicList,
    MagistratesStandardList,
    SscsDailyList,
    CareStandardsList,
    EtFortnightlyPressList,
    SjpPublicList,
    SjpPressList,
    SjpDeltaPressList,
}

impl ListType {
    /// Single Justice Procedure lists. They carry an Excel rendering but no
    /// separate Welsh PDF variant in storage.
    pub fn is_sjp(&self) -> bool {
        matches!(
            self,
            ListType::SjpPublicList | ListType::SjpPressList | ListType::SjpDeltaPressList
        )
    }

    /// SJP lists stay displayable for a week; everything else expires the
    /// same day it was received.
    pub fn has_weekly_expiry(&self) -> bool {
        self.is_sjp()
    }
}

/// Business identity of a publication. At most one current artefact exists
/// per tuple; content date equality is exact, not range-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtefactIdentity {
    pub location_id: String,
    pub content_date: DateTime<Utc>,
    pub language: Language,
    pub list_type: ListType,
    pub provenance: String,
}

/// Artefact entity
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Artefact {
    pub artefact_id: Uuid,
    pub source_artefact_id: String,
    pub artefact_type: ArtefactType,
    pub sensitivity: Sensitivity,
    pub language: Language,
    pub provenance: String,
    pub location_id: String,
    pub content_date: DateTime<Utc>,
    pub list_type: ListType,
    pub display_from: Option<DateTime<Utc>>,
    pub display_to: Option<DateTime<Utc>>,
    pub last_received_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub superseded_count: i32,
    pub payload_size_kb: Option<f32>,
    pub search: Option<serde_json::Value>,
    pub is_flat_file: bool,
}

impl Artefact {
    /// Identity tuple for this artefact.
    pub fn identity(&self) -> ArtefactIdentity {
        ArtefactIdentity {
            location_id: self.location_id.clone(),
            content_date: self.content_date,
            language: self.language,
            list_type: self.list_type,
            provenance: self.provenance.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sjp_lists_are_classified_as_sjp() {
        assert!(ListType::SjpPublicList.is_sjp());
        assert!(ListType::SjpPressList.is_sjp());
        assert!(ListType::SjpDeltaPressList.is_sjp());
        assert!(!ListType::CivilDailyCauseList.is_sjp());
        assert!(!ListType::CrownWarnedList.is_sjp());
    }

    #[test]
    fn weekly_expiry_matches_sjp_classification() {
        assert!(ListType::SjpPublicList.has_weekly_expiry());
        assert!(ListType::SjpPressList.has_weekly_expiry());
        assert!(!ListType::MagistratesPublicList.has_weekly_expiry());
        assert!(!ListType::SscsDailyList.has_weekly_expiry());
    }
}
