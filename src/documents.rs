//! Classification of marketplace document uploads into platform document types.
//!
//! Uploads are named `adyen-<entity>-photoid` (front) and `adyen-<entity>-photoid-rear`
//! (rear), where the entity is `individual` or `ubo<n>`. The base document type for an
//! entity comes from its `adyen-<entity>-photoidtype` custom field and is looked up at
//! most once per (shop, entity) for the lifetime of a [`DocumentTypeCache`].

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::account_holder::DocumentType;
use crate::clients::MarketplaceClient;
use crate::error::{Result, SyncError};
use crate::models::ShopDocument;
use crate::repository::{DocRetryRepository, ShareholderMappingRepository};

const PREFIX: &str = "adyen-";
const PHOTO_ID: &str = "-photoid";
const PHOTO_ID_REAR: &str = "-photoid-rear";
const PHOTO_ID_TYPE: &str = "-photoidtype";
const BANK_PROOF: &str = "adyen-bankproof";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSide {
    Front,
    Rear,
}

impl DocumentSide {
    fn suffix(self) -> &'static str {
        match self {
            Self::Front => "_FRONT",
            Self::Rear => "_BACK",
        }
    }
}

/// Who a photo id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEntity {
    Individual,
    Ubo(u32),
}

impl DocumentEntity {
    pub fn entity_name(&self) -> String {
        match self {
            Self::Individual => "individual".to_string(),
            Self::Ubo(n) => format!("ubo{n}"),
        }
    }

    /// Attaches the entity's identity. UBO documents need a persisted shareholder mapping.
    fn build(
        &self,
        repo: &impl ShareholderMappingRepository,
        document: &ShopDocument,
        document_type: DocumentType,
    ) -> Result<ClassifiedDocument> {
        let shareholder_code = match self {
            Self::Individual => None,
            Self::Ubo(n) => {
                let mapping = repo.find_mapping(&document.shop_id, *n)?.ok_or_else(|| {
                    SyncError::MappingNotFound {
                        shop_id: document.shop_id.clone(),
                        ubo: *n,
                    }
                })?;
                Some(mapping.shareholder_code)
            }
        };
        Ok(ClassifiedDocument {
            document: document.clone(),
            document_type,
            shareholder_code,
        })
    }
}

/// What a marketplace document type code refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSlot {
    PhotoId { entity: DocumentEntity, side: DocumentSide },
    BankProof,
}

impl DocumentSlot {
    /// Case-insensitive; UBO numbers outside `1..=max_ubos` are not recognized.
    pub fn parse(type_code: &str, max_ubos: u32) -> Option<Self> {
        let code = type_code.trim().to_lowercase();
        if code == BANK_PROOF {
            return Some(Self::BankProof);
        }
        let rest = code.strip_prefix(PREFIX)?;
        let (entity, side) = if let Some(entity) = rest.strip_suffix(PHOTO_ID_REAR) {
            (entity, DocumentSide::Rear)
        } else if let Some(entity) = rest.strip_suffix(PHOTO_ID) {
            (entity, DocumentSide::Front)
        } else {
            return None;
        };
        let entity = if entity == "individual" {
            DocumentEntity::Individual
        } else {
            let n: u32 = entity.strip_prefix("ubo")?.parse().ok()?;
            if n == 0 || n > max_ubos {
                return None;
            }
            DocumentEntity::Ubo(n)
        };
        Some(Self::PhotoId { entity, side })
    }
}

/// Outcome of combining a base document type with a side suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedDocumentType {
    /// The composite (base + side) type exists.
    Supported(DocumentType),
    /// Only the base type exists; it has no front/back variants.
    UnsupportedComposite(DocumentType),
    /// The base type itself is not a platform document type.
    Unknown,
}

impl ResolvedDocumentType {
    pub fn resolve(base: &str, side: DocumentSide) -> Self {
        let base = base.trim().to_uppercase();
        if let Some(composite) = DocumentType::parse(&format!("{base}{}", side.suffix())) {
            return Self::Supported(composite);
        }
        match DocumentType::parse(&base) {
            Some(base) => Self::UnsupportedComposite(base),
            None => Self::Unknown,
        }
    }

    /// Type to upload a document under. Fronts fall back to the bare base
    /// type; rears are only sent under a real composite type.
    pub fn for_side(self, side: DocumentSide) -> Option<DocumentType> {
        match (self, side) {
            (Self::Supported(t), _) => Some(t),
            (Self::UnsupportedComposite(base), DocumentSide::Front) => Some(base),
            _ => None,
        }
    }
}

/// Per-run memo of base document types keyed by (shop id, entity name).
#[derive(Debug, Default)]
pub struct DocumentTypeCache {
    entries: HashMap<(String, String), Option<String>>,
    remote_lookups: usize,
}

impl DocumentTypeCache {
    pub fn remote_lookups(&self) -> usize {
        self.remote_lookups
    }

    pub fn base_type(
        &mut self,
        marketplace: &dyn MarketplaceClient,
        shop_id: &str,
        entity: DocumentEntity,
    ) -> Result<Option<String>> {
        let key = (shop_id.to_string(), entity.entity_name());
        if let Some(cached) = self.entries.get(&key) {
            return Ok(cached.clone());
        }
        self.remote_lookups += 1;
        let field = format!("{PREFIX}{}{PHOTO_ID_TYPE}", key.1);
        let base = marketplace
            .get_shop(shop_id)?
            .and_then(|shop| shop.custom_field(&field));
        debug!(shop_id, field = %field, base = ?base, "looked up photo id type");
        self.entries.insert(key, base.clone());
        Ok(base)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedDocument {
    pub document: ShopDocument,
    pub document_type: DocumentType,
    pub shareholder_code: Option<String>,
}

#[derive(Debug, Default)]
pub struct Classification {
    pub documents: Vec<ClassifiedDocument>,
    /// Document ids recorded as pending because their UBO has no shareholder code yet.
    pub deferred: Vec<String>,
}

/// Classifies documents, recording a pending entry for every UBO document
/// whose shareholder mapping does not exist yet.
pub fn classify_documents<R>(
    repo: &R,
    marketplace: &dyn MarketplaceClient,
    documents: &[ShopDocument],
    cache: &mut DocumentTypeCache,
    max_ubos: u32,
) -> Result<Classification>
where
    R: ShareholderMappingRepository + DocRetryRepository,
{
    let mut classification = Classification::default();
    for document in documents {
        let (entity, side) = match DocumentSlot::parse(&document.type_code, max_ubos) {
            Some(DocumentSlot::BankProof) => {
                classification.documents.push(ClassifiedDocument {
                    document: document.clone(),
                    document_type: DocumentType::BankStatement,
                    shareholder_code: None,
                });
                continue;
            }
            Some(DocumentSlot::PhotoId { entity, side }) => (entity, side),
            None => {
                debug!(doc_id = %document.id, type_code = %document.type_code, "not a synchronized document");
                continue;
            }
        };

        let Some(base) = cache.base_type(marketplace, &document.shop_id, entity)? else {
            info!(
                shop_id = %document.shop_id,
                entity = %entity.entity_name(),
                "no photo id type set, skipping document"
            );
            continue;
        };
        let resolved = ResolvedDocumentType::resolve(&base, side);
        let Some(document_type) = resolved.for_side(side) else {
            match resolved {
                ResolvedDocumentType::Unknown => warn!(
                    shop_id = %document.shop_id,
                    entity = %entity.entity_name(),
                    base = %base,
                    "photo id type is not a known document type"
                ),
                _ => info!(
                    shop_id = %document.shop_id,
                    entity = %entity.entity_name(),
                    "{base}{} is not supported, skipping document",
                    side.suffix()
                ),
            }
            continue;
        };

        match entity.build(repo, document, document_type) {
            Ok(classified) => classification.documents.push(classified),
            Err(SyncError::MappingNotFound { shop_id, ubo }) => {
                warn!(shop_id = %shop_id, ubo, doc_id = %document.id, "no shareholder mapping, document deferred");
                repo.record_failure(&document.id, &document.shop_id)?;
                classification.deferred.push(document.id.clone());
            }
            Err(e) => return Err(e),
        }
    }
    Ok(classification)
}
