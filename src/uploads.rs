//! Document upload to the payment platform and the pending-document retry queue.

use std::collections::HashSet;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rusqlite::Connection;
use tracing::{debug, error, info, warn};

use crate::account_holder::{DocumentDetail, UploadDocumentRequest};
use crate::clients::{MarketplaceClient, PaymentPlatformClient};
use crate::documents::{classify_documents, ClassifiedDocument, DocumentTypeCache};
use crate::error::{Result, SyncError};
use crate::models::ShopDocument;
use crate::repository::DocRetryRepository;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UploadReport {
    pub uploaded: usize,
    /// Recorded as pending: missing shareholder identity or a failed upload.
    pub deferred: usize,
    /// Failed with a server-side error the platform retries itself.
    pub failed: usize,
}

impl UploadReport {
    fn absorb(&mut self, other: UploadReport) {
        self.uploaded += other.uploaded;
        self.deferred += other.deferred;
        self.failed += other.failed;
    }
}

pub fn build_upload_request(classified: &ClassifiedDocument, content: &[u8]) -> UploadDocumentRequest {
    UploadDocumentRequest {
        document_content: STANDARD.encode(content),
        document_detail: DocumentDetail {
            account_holder_code: classified.document.shop_id.clone(),
            shareholder_code: classified.shareholder_code.clone(),
            document_type: classified.document_type,
            filename: classified.document.file_name.clone(),
        },
    }
}

fn upload_one(
    marketplace: &dyn MarketplaceClient,
    payments: &dyn PaymentPlatformClient,
    classified: &ClassifiedDocument,
) -> Result<()> {
    let content = marketplace.download_document(&classified.document.id)?;
    let request = build_upload_request(classified, &content);
    payments.upload_document(&request)
}

/// Classifies and uploads the given documents. A successful upload clears any
/// pending entry; other failures are queued unless the platform retries them.
/// Documents classification skips lose their pending entry.
pub fn process_documents(
    conn: &Connection,
    marketplace: &dyn MarketplaceClient,
    payments: &dyn PaymentPlatformClient,
    documents: &[ShopDocument],
    max_ubos: u32,
) -> Result<UploadReport> {
    let mut cache = DocumentTypeCache::default();
    let classification = classify_documents(conn, marketplace, documents, &mut cache, max_ubos)?;
    let mut report = UploadReport {
        deferred: classification.deferred.len(),
        ..Default::default()
    };

    // documents classification skipped
    let handled: HashSet<&str> = classification
        .documents
        .iter()
        .map(|c| c.document.id.as_str())
        .chain(classification.deferred.iter().map(String::as_str))
        .collect();
    for skipped in documents.iter().filter(|d| !handled.contains(d.id.as_str())) {
        if conn.find_pending(&skipped.id)?.is_some() {
            info!(shop_id = %skipped.shop_id, doc_id = %skipped.id, "dropping pending document that no longer classifies");
            conn.delete_pending(&skipped.id)?;
        }
    }

    for classified in &classification.documents {
        let doc_id = &classified.document.id;
        let shop_id = &classified.document.shop_id;
        match upload_one(marketplace, payments, classified) {
            Ok(()) => {
                conn.delete_pending(doc_id)?;
                debug!(shop_id = %shop_id, doc_id = %doc_id, document_type = %classified.document_type, "document uploaded");
                report.uploaded += 1;
            }
            Err(SyncError::Api(e)) if e.platform_retries() => {
                error!(shop_id = %shop_id, doc_id = %doc_id, error = %e, "document upload failed, left to platform retry");
                report.failed += 1;
            }
            Err(e) => {
                warn!(shop_id = %shop_id, doc_id = %doc_id, error = %e, "document upload failed, queued for retry");
                conn.record_failure(doc_id, shop_id)?;
                report.deferred += 1;
            }
        }
    }
    info!(
        uploaded = report.uploaded,
        deferred = report.deferred,
        failed = report.failed,
        "documents processed"
    );
    Ok(report)
}

/// Fetches every document of the given shops and processes them.
pub fn submit_documents(
    conn: &Connection,
    marketplace: &dyn MarketplaceClient,
    payments: &dyn PaymentPlatformClient,
    shop_ids: &[String],
    max_ubos: u32,
) -> Result<UploadReport> {
    let documents = marketplace.get_shop_documents(shop_ids)?;
    debug!(count = documents.len(), "retrieved shop documents");
    process_documents(conn, marketplace, payments, &documents, max_ubos)
}

/// Reprocesses only the documents pending for one shop. Pending entries whose
/// document no longer exists on the marketplace are dropped.
pub fn retry_documents_for_shop(
    conn: &Connection,
    marketplace: &dyn MarketplaceClient,
    payments: &dyn PaymentPlatformClient,
    shop_id: &str,
    max_ubos: u32,
) -> Result<UploadReport> {
    let pending = conn.find_pending_for_shop(shop_id)?;
    if pending.is_empty() {
        return Ok(UploadReport::default());
    }
    let documents = marketplace.get_shop_documents(&[shop_id.to_string()])?;
    let available: HashSet<&str> = documents.iter().map(|d| d.id.as_str()).collect();
    for gone in pending.iter().filter(|p| !available.contains(p.doc_id.as_str())) {
        info!(shop_id, doc_id = %gone.doc_id, "pending document no longer on marketplace");
        conn.delete_pending(&gone.doc_id)?;
    }
    let wanted: HashSet<&str> = pending.iter().map(|p| p.doc_id.as_str()).collect();
    let retry: Vec<ShopDocument> = documents
        .iter()
        .filter(|d| wanted.contains(d.id.as_str()))
        .cloned()
        .collect();
    debug!(shop_id, count = retry.len(), "retrying pending documents");
    process_documents(conn, marketplace, payments, &retry, max_ubos)
}

/// Retry pass over several shops; one shop's failure does not stop the others.
pub fn retry_documents(
    conn: &Connection,
    marketplace: &dyn MarketplaceClient,
    payments: &dyn PaymentPlatformClient,
    shop_ids: &[String],
    max_ubos: u32,
) -> UploadReport {
    let mut report = UploadReport::default();
    for shop_id in shop_ids {
        match retry_documents_for_shop(conn, marketplace, payments, shop_id, max_ubos) {
            Ok(r) => report.absorb(r),
            Err(e) => error!(shop_id = %shop_id, error = %e, "document retry failed"),
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account_holder::DocumentType;
    use crate::db::test_db;
    use crate::error::ApiError;
    use crate::models::ShareholderMapping;
    use crate::repository::ShareholderMappingRepository;
    use crate::testing::{shop_document, shop_with_fields, FakeMarketplace, FakePaymentPlatform};

    fn marketplace() -> FakeMarketplace {
        FakeMarketplace {
            shops: vec![shop_with_fields(
                "1",
                &[("adyen-individual-photoidtype", "ID_CARD"), ("adyen-ubo1-photoidtype", "PASSPORT")],
            )],
            documents: vec![
                shop_document("10", "adyen-individual-photoid", "1"),
                shop_document("11", "adyen-individual-photoid-rear", "1"),
                shop_document("12", "adyen-ubo1-photoid", "1"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_upload_request_is_base64_encoded() {
        let classified = ClassifiedDocument {
            document: shop_document("10", "adyen-individual-photoid", "1"),
            document_type: DocumentType::IdCardFront,
            shareholder_code: None,
        };
        let request = build_upload_request(&classified, b"hello");
        assert_eq!(request.document_content, "aGVsbG8=");
        assert_eq!(request.document_detail.account_holder_code, "1");
        assert_eq!(request.document_detail.filename, "10.png");
    }

    #[test]
    fn test_submit_uploads_and_defers() {
        let (_dir, conn) = test_db();
        let marketplace = marketplace();
        let payments = FakePaymentPlatform::default();
        let report = submit_documents(&conn, &marketplace, &payments, &["1".to_string()], 4).unwrap();
        assert_eq!(report, UploadReport { uploaded: 2, deferred: 1, failed: 0 });
        let uploads = payments.uploads.borrow();
        assert_eq!(uploads[0].document_detail.document_type, DocumentType::IdCardFront);
        assert_eq!(uploads[1].document_detail.document_type, DocumentType::IdCardBack);
        assert!(conn.find_pending("12").unwrap().is_some());
    }

    #[test]
    fn test_retry_sends_only_pending_documents() {
        let (_dir, conn) = test_db();
        let marketplace = marketplace();
        let payments = FakePaymentPlatform::default();
        submit_documents(&conn, &marketplace, &payments, &["1".to_string()], 4).unwrap();
        conn.save_mapping(&ShareholderMapping {
            id: None,
            shop_id: "1".into(),
            ubo_number: 1,
            shareholder_code: "SH-1".into(),
        })
        .unwrap();

        let report = retry_documents_for_shop(&conn, &marketplace, &payments, "1", 4).unwrap();
        assert_eq!(report.uploaded, 1);
        let uploads = payments.uploads.borrow();
        assert_eq!(uploads.len(), 3);
        assert_eq!(uploads[2].document_detail.shareholder_code.as_deref(), Some("SH-1"));
        assert_eq!(uploads[2].document_detail.document_type, DocumentType::Passport);
        assert!(conn.all_pending().unwrap().is_empty());
    }

    #[test]
    fn test_retry_without_pending_does_nothing() {
        let (_dir, conn) = test_db();
        let marketplace = marketplace();
        let payments = FakePaymentPlatform::default();
        let report = retry_documents_for_shop(&conn, &marketplace, &payments, "1", 4).unwrap();
        assert_eq!(report, UploadReport::default());
        assert!(payments.uploads.borrow().is_empty());
        assert!(marketplace.downloads.borrow().is_empty());
    }

    #[test]
    fn test_client_error_is_queued() {
        let (_dir, conn) = test_db();
        let marketplace = marketplace();
        let payments = FakePaymentPlatform {
            upload_error: Some(ApiError::new(422, "000_012", "invalid document")),
            ..Default::default()
        };
        let report = submit_documents(&conn, &marketplace, &payments, &["1".to_string()], 4).unwrap();
        assert_eq!(report, UploadReport { uploaded: 0, deferred: 3, failed: 0 });
        assert_eq!(conn.find_pending_for_shop("1").unwrap().len(), 3);
    }

    #[test]
    fn test_server_error_is_not_queued() {
        let (_dir, conn) = test_db();
        let marketplace = marketplace();
        let payments = FakePaymentPlatform {
            upload_error: Some(ApiError::new(503, "000_000", "unavailable")),
            ..Default::default()
        };
        let report = submit_documents(&conn, &marketplace, &payments, &["1".to_string()], 4).unwrap();
        assert_eq!(report, UploadReport { uploaded: 0, deferred: 1, failed: 2 });
        // only the UBO document without identity is pending
        assert_eq!(conn.all_pending().unwrap().len(), 1);
    }

    #[test]
    fn test_repeated_failure_bumps_counter() {
        let (_dir, conn) = test_db();
        let mut marketplace = marketplace();
        marketplace.failing_downloads.insert("10".into());
        let payments = FakePaymentPlatform::default();
        submit_documents(&conn, &marketplace, &payments, &["1".to_string()], 4).unwrap();
        retry_documents_for_shop(&conn, &marketplace, &payments, "1", 4).unwrap();
        assert_eq!(conn.find_pending("10").unwrap().unwrap().times_failed, 2);
    }

    #[test]
    fn test_pending_document_that_no_longer_classifies_is_dropped() {
        let (_dir, conn) = test_db();
        let mut marketplace = marketplace();
        // passport has no back side, and the ubo type was cleared
        marketplace.shops[0]
            .additional_fields
            .retain(|f| f.code != "adyen-individual-photoidtype" && f.code != "adyen-ubo1-photoidtype");
        marketplace.shops[0]
            .additional_fields
            .push(crate::models::AdditionalField::new("adyen-individual-photoidtype", "PASSPORT"));
        conn.record_failure("11", "1").unwrap();
        conn.record_failure("12", "1").unwrap();
        let payments = FakePaymentPlatform::default();

        let report = retry_documents_for_shop(&conn, &marketplace, &payments, "1", 4).unwrap();
        assert_eq!(report, UploadReport::default());
        assert!(payments.uploads.borrow().is_empty());
        assert!(conn.all_pending().unwrap().is_empty());
        assert!(marketplace.downloads.borrow().is_empty());
    }

    #[test]
    fn test_vanished_document_is_dropped_from_queue() {
        let (_dir, conn) = test_db();
        conn.record_failure("99", "1").unwrap();
        let marketplace = marketplace();
        let payments = FakePaymentPlatform::default();
        let report = retry_documents_for_shop(&conn, &marketplace, &payments, "1", 4).unwrap();
        assert_eq!(report, UploadReport::default());
        assert!(conn.find_pending("99").unwrap().is_none());
    }
}
