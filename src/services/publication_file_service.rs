//! Rendered file lifecycle for artefacts.
//!
//! Owns the blob keys for the primary PDF, the Welsh-variant PDF and the
//! Excel rendering of a publication. Upload, deletion, existence and size
//! lookups all tolerate partially generated file sets: the three files are
//! handled independently and a missing one is never an error.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::Result;
use crate::models::artefact::{Language, ListType};
use crate::models::publication_files::PublicationFileSizes;
use crate::services::file_generation::FileGenerator;
use crate::storage::BlobStore;

const PDF_EXTENSION: &str = ".pdf";
const EXCEL_EXTENSION: &str = ".xlsx";
const WELSH_SUFFIX: &str = "_cy";

/// Blob key for the primary PDF
fn primary_pdf_key(artefact_id: Uuid) -> String {
    format!("{artefact_id}{PDF_EXTENSION}")
}

/// Blob key for the Welsh-variant PDF
fn additional_pdf_key(artefact_id: Uuid) -> String {
    format!("{artefact_id}{WELSH_SUFFIX}{PDF_EXTENSION}")
}

/// Blob key for the Excel rendering
fn excel_key(artefact_id: Uuid) -> String {
    format!("{artefact_id}{EXCEL_EXTENSION}")
}

/// Publication file service
pub struct PublicationFileService {
    blob: Arc<dyn BlobStore>,
    generator: Arc<dyn FileGenerator>,
}

impl PublicationFileService {
    /// Create a new publication file service
    pub fn new(blob: Arc<dyn BlobStore>, generator: Arc<dyn FileGenerator>) -> Self {
        Self { blob, generator }
    }

    /// Generate and upload the rendered files for an artefact.
    ///
    /// A generator that reports no output is logged and ignored. Otherwise
    /// each of the three buffers is uploaded independently iff non-empty;
    /// a zero-length buffer is never written.
    pub async fn generate_files(&self, artefact_id: Uuid, payload: &[u8]) -> Result<()> {
        let Some(files) = self.generator.generate(artefact_id, payload).await? else {
            tracing::warn!(%artefact_id, "File generation produced no output, nothing uploaded");
            return Ok(());
        };

        if !files.primary_pdf.is_empty() {
            self.blob
                .put(&primary_pdf_key(artefact_id), files.primary_pdf)
                .await?;
        }
        if !files.additional_pdf.is_empty() {
            self.blob
                .put(&additional_pdf_key(artefact_id), files.additional_pdf)
                .await?;
        }
        if !files.excel.is_empty() {
            self.blob.put(&excel_key(artefact_id), files.excel).await?;
        }

        Ok(())
    }

    /// Delete the rendered files known to exist for this list type and
    /// language combination.
    ///
    /// The primary PDF is always removed. Non-SJP Welsh publications carry a
    /// separate Welsh PDF; SJP lists carry an Excel form instead. The three
    /// deletions are independent and tolerate already-absent blobs.
    pub async fn delete_files(
        &self,
        artefact_id: Uuid,
        list_type: ListType,
        language: Language,
    ) -> Result<()> {
        self.blob.delete(&primary_pdf_key(artefact_id)).await?;

        if language == Language::Welsh && !list_type.is_sjp() {
            self.blob.delete(&additional_pdf_key(artefact_id)).await?;
        }

        if list_type.is_sjp() {
            self.blob.delete(&excel_key(artefact_id)).await?;
        }

        Ok(())
    }

    /// True iff any of the three possible rendered files exists.
    pub async fn file_exists(&self, artefact_id: Uuid) -> Result<bool> {
        Ok(self.blob.exists(&primary_pdf_key(artefact_id)).await?
            || self.blob.exists(&additional_pdf_key(artefact_id)).await?
            || self.blob.exists(&excel_key(artefact_id)).await?)
    }

    /// Byte sizes of the rendered files; absent files report as `None`.
    pub async fn get_file_sizes(&self, artefact_id: Uuid) -> Result<PublicationFileSizes> {
        Ok(PublicationFileSizes {
            primary_pdf: self.blob.size(&primary_pdf_key(artefact_id)).await?,
            additional_pdf: self.blob.size(&additional_pdf_key(artefact_id)).await?,
            excel: self.blob.size(&excel_key(artefact_id)).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::error::AppError;
    use crate::models::publication_files::PublicationFiles;

    /// In-memory blob store counting deletions.
    #[derive(Default)]
    struct MockBlobStore {
        blobs: Mutex<HashMap<String, Bytes>>,
        delete_calls: AtomicUsize,
    }

    impl MockBlobStore {
        fn keys(&self) -> Vec<String> {
            let mut keys: Vec<_> = self.blobs.lock().unwrap().keys().cloned().collect();
            keys.sort();
            keys
        }
    }

    #[async_trait]
    impl BlobStore for MockBlobStore {
        async fn put(&self, key: &str, content: Bytes) -> Result<()> {
            self.blobs.lock().unwrap().insert(key.to_string(), content);
            Ok(())
        }

        async fn get(&self, key: &str) -> Result<Bytes> {
            self.blobs
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("Blob not found: {}", key)))
        }

        async fn exists(&self, key: &str) -> Result<bool> {
            Ok(self.blobs.lock().unwrap().contains_key(key))
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            self.blobs.lock().unwrap().remove(key);
            Ok(())
        }

        async fn size(&self, key: &str) -> Result<Option<u64>> {
            Ok(self
                .blobs
                .lock()
                .unwrap()
                .get(key)
                .map(|b| b.len() as u64))
        }
    }

    /// Generator returning a scripted file set.
    struct MockGenerator {
        files: Option<PublicationFiles>,
    }

    #[async_trait]
    impl FileGenerator for MockGenerator {
        async fn generate(
            &self,
            _artefact_id: Uuid,
            _payload: &[u8],
        ) -> Result<Option<PublicationFiles>> {
            Ok(self.files.clone())
        }
    }

    fn service_with(
        files: Option<PublicationFiles>,
    ) -> (PublicationFileService, Arc<MockBlobStore>) {
        let blob = Arc::new(MockBlobStore::default());
        let svc =
            PublicationFileService::new(blob.clone(), Arc::new(MockGenerator { files }));
        (svc, blob)
    }

    #[tokio::test]
    async fn only_non_empty_buffers_are_uploaded() {
        let id = Uuid::new_v4();
        let (svc, blob) = service_with(Some(PublicationFiles {
            primary_pdf: Bytes::from_static(b"%PDF"),
            additional_pdf: Bytes::new(),
            excel: Bytes::new(),
        }));

        svc.generate_files(id, b"{}").await.unwrap();

        assert_eq!(blob.keys(), vec![format!("{id}.pdf")]);
    }

    #[tokio::test]
    async fn full_file_set_uploads_all_three() {
        let id = Uuid::new_v4();
        let (svc, blob) = service_with(Some(PublicationFiles {
            primary_pdf: Bytes::from_static(b"%PDF"),
            additional_pdf: Bytes::from_static(b"%PDF-cy"),
            excel: Bytes::from_static(b"xlsx"),
        }));

        svc.generate_files(id, b"{}").await.unwrap();

        assert_eq!(
            blob.keys(),
            vec![
                format!("{id}.pdf"),
                format!("{id}.xlsx"),
                format!("{id}_cy.pdf"),
            ]
        );
    }

    #[tokio::test]
    async fn failed_generation_uploads_nothing_and_does_not_error() {
        let id = Uuid::new_v4();
        let (svc, blob) = service_with(None);

        svc.generate_files(id, b"{}").await.unwrap();

        assert!(blob.keys().is_empty());
    }

    #[tokio::test]
    async fn welsh_non_sjp_delete_removes_both_pdfs_only() {
        let id = Uuid::new_v4();
        let (svc, blob) = service_with(None);

        svc.delete_files(id, ListType::CivilDailyCauseList, Language::Welsh)
            .await
            .unwrap();

        assert_eq!(blob.delete_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn sjp_delete_removes_primary_pdf_and_excel() {
        let id = Uuid::new_v4();
        let (svc, blob) = service_with(None);

        for language in [Language::English, Language::Welsh] {
            blob.delete_calls.store(0, Ordering::SeqCst);
            svc.delete_files(id, ListType::SjpPublicList, language)
                .await
                .unwrap();
            assert_eq!(blob.delete_calls.load(Ordering::SeqCst), 2);
        }
    }

    #[tokio::test]
    async fn english_non_sjp_delete_removes_primary_pdf_only() {
        let id = Uuid::new_v4();
        let (svc, blob) = service_with(None);

        svc.delete_files(id, ListType::MagistratesPublicList, Language::English)
            .await
            .unwrap();

        assert_eq!(blob.delete_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sjp_delete_targets_the_excel_key() {
        let id = Uuid::new_v4();
        let (svc, blob) = service_with(None);

        blob.put(&format!("{id}.pdf"), Bytes::from_static(b"pdf"))
            .await
            .unwrap();
        blob.put(&format!("{id}.xlsx"), Bytes::from_static(b"xlsx"))
            .await
            .unwrap();
        blob.put(&format!("{id}_cy.pdf"), Bytes::from_static(b"cy"))
            .await
            .unwrap();

        svc.delete_files(id, ListType::SjpPressList, Language::English)
            .await
            .unwrap();

        // The Welsh PDF is untouched for SJP lists
        assert_eq!(blob.keys(), vec![format!("{id}_cy.pdf")]);
    }

    #[tokio::test]
    async fn file_exists_with_a_single_file_present() {
        let id = Uuid::new_v4();
        let (svc, blob) = service_with(None);

        assert!(!svc.file_exists(id).await.unwrap());

        blob.put(&format!("{id}.xlsx"), Bytes::from_static(b"xlsx"))
            .await
            .unwrap();
        assert!(svc.file_exists(id).await.unwrap());
    }

    #[tokio::test]
    async fn partial_file_sizes_report_none_for_missing_slots() {
        let id = Uuid::new_v4();
        let (svc, blob) = service_with(None);

        blob.put(&format!("{id}.pdf"), Bytes::from_static(b"12345"))
            .await
            .unwrap();

        let sizes = svc.get_file_sizes(id).await.unwrap();
        assert_eq!(
            sizes,
            PublicationFileSizes {
                primary_pdf: Some(5),
                additional_pdf: None,
                excel: None,
            }
        );
    }
}
