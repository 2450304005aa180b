use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{debug, error, info, warn};

use crate::account_holder::{
    AccountHolder, AccountHolderDetails, AccountHolderResponse, BusinessDetails, CreateAccountHolderRequest,
    Gender, IndividualDetails, LegalEntity, Name, PersonalData, UpdateAccountHolderRequest,
};
use crate::address::shop_address;
use crate::bank::{bank_details_for_update, build_bank_account_detail, clean_up_bank_accounts};
use crate::clients::{InvalidFieldsNotifier, MarketplaceClient, PaymentPlatformClient};
use crate::delta;
use crate::error::{Result, SyncError};
use crate::models::{ContactInformation, Shop, ShopsPage, ShopsRequest};
use crate::settings::EngineConfig;
use crate::shareholders::{extract_shareholders, format_date_of_birth, update_shareholder_mapping};
use crate::uploads::{retry_documents, UploadReport};

const LEGAL_ENTITY_FIELD: &str = "adyen-legal-entity-type";

// ---------------------------------------------------------------------------
// Request builders
// ---------------------------------------------------------------------------

fn contact_information(shop: &Shop) -> Result<&ContactInformation> {
    shop.contact_information
        .as_ref()
        .ok_or_else(|| SyncError::MissingData(format!("contact information for shop {}", shop.id)))
}

pub fn legal_entity(shop: &Shop) -> Result<LegalEntity> {
    let raw = shop
        .custom_field(LEGAL_ENTITY_FIELD)
        .ok_or_else(|| SyncError::MissingData(format!("{LEGAL_ENTITY_FIELD} for shop {}", shop.id)))?;
    LegalEntity::parse(&raw)
        .ok_or_else(|| SyncError::MissingData(format!("unsupported legal entity {raw:?} for shop {}", shop.id)))
}

pub fn individual_details(shop: &Shop, config: &EngineConfig) -> Result<IndividualDetails> {
    let contact = contact_information(shop)?;
    let date_of_birth = shop
        .custom_field("adyen-individual-dob")
        .and_then(|dob| format_date_of_birth(&dob, config.time_zone));
    let id_number = shop.custom_field("adyen-individual-idnumber");
    let personal_data = if date_of_birth.is_some() || id_number.is_some() {
        Some(PersonalData {
            date_of_birth,
            nationality: None,
            id_number,
        })
    } else {
        None
    };
    Ok(IndividualDetails {
        name: Some(Name {
            first_name: contact.firstname.clone(),
            last_name: contact.lastname.clone(),
            gender: contact.civility.as_deref().map(Gender::from_civility).unwrap_or_default(),
        }),
        personal_data,
    })
}

pub fn business_details(
    conn: &Connection,
    shop: &Shop,
    existing: Option<&AccountHolder>,
    config: &EngineConfig,
) -> Result<BusinessDetails> {
    let professional = shop.professional_information.clone().unwrap_or_default();
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let shareholders = extract_shareholders(conn, shop, existing, config)?;
    if shareholders.is_empty() {
        info!(shop_id = %shop.id, "no shareholder data");
    }
    Ok(BusinessDetails {
        legal_business_name: non_empty(professional.corporate_name),
        doing_business_as: shop.custom_field("adyen-business-registeredname"),
        tax_id: non_empty(professional.tax_identification_number),
        registration_number: non_empty(professional.identification_number),
        shareholders,
    })
}

/// Entity block and address shared by create and update.
fn fill_details(
    details: &mut AccountHolderDetails,
    conn: &Connection,
    shop: &Shop,
    existing: Option<&AccountHolder>,
    config: &EngineConfig,
) -> Result<LegalEntity> {
    let entity = legal_entity(shop)?;
    match entity {
        LegalEntity::Individual => details.individual_details = Some(individual_details(shop, config)?),
        LegalEntity::Business => details.business_details = Some(business_details(conn, shop, existing, config)?),
    }
    contact_information(shop)?;
    details.address = shop_address(shop, &config.house_number_patterns);
    Ok(entity)
}

pub fn create_account_holder_request(
    conn: &Connection,
    shop: &Shop,
    config: &EngineConfig,
) -> Result<CreateAccountHolderRequest> {
    let mut details = AccountHolderDetails::default();
    if let Some(bank) = build_bank_account_detail(shop, config) {
        details.bank_account_details.push(bank);
    }
    let legal_entity = fill_details(&mut details, conn, shop, None, config)?;
    details.email = contact_information(shop)?.email.clone();
    Ok(CreateAccountHolderRequest {
        account_holder_code: shop.id.clone(),
        legal_entity,
        account_holder_details: details,
        processing_tier: config.default_processing_tier,
    })
}

pub fn update_account_holder_request(
    conn: &Connection,
    shop: &Shop,
    existing: &AccountHolder,
    config: &EngineConfig,
) -> Result<UpdateAccountHolderRequest> {
    let mut details = AccountHolderDetails {
        bank_account_details: bank_details_for_update(shop, existing, config),
        ..Default::default()
    };
    fill_details(&mut details, conn, shop, Some(existing), config)?;
    Ok(UpdateAccountHolderRequest {
        account_holder_code: shop.id.clone(),
        account_holder_details: details,
    })
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShopOutcome {
    Created,
    Updated { bank_accounts_deleted: bool },
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub since: Option<DateTime<Utc>>,
    pub shops: usize,
    pub created: usize,
    pub updated: usize,
    pub bank_cleanups: usize,
    /// (shop id, reason) for every shop that could not be reconciled.
    pub failed: Vec<(String, String)>,
    pub documents: UploadReport,
    pub cursor_advanced: bool,
}

pub struct Engine<'a> {
    pub conn: &'a Connection,
    pub marketplace: &'a dyn MarketplaceClient,
    pub payments: &'a dyn PaymentPlatformClient,
    pub notifier: &'a dyn InvalidFieldsNotifier,
    pub config: &'a EngineConfig,
}

impl<'a> Engine<'a> {
    /// Every shop changed since `since`, following the marketplace's offset pagination.
    /// Shops that did not decode are collected in `rejected`.
    pub fn get_updated_shops(&self, since: DateTime<Utc>) -> Result<ShopsPage> {
        let mut updated = ShopsPage::default();
        let mut offset = 0;
        let mut total_count = 1;
        while offset < total_count {
            let request = ShopsRequest {
                updated_since: Some(since),
                offset,
                shop_ids: Vec::new(),
                paginate: true,
            };
            debug!(since = %since, offset, "requesting updated shops");
            let page = self.marketplace.get_shops(&request)?;
            total_count = page.total_count;
            if page.consumed() == 0 {
                break;
            }
            offset += page.consumed();
            for (shop_id, reason) in &page.rejected {
                warn!(shop_id = %shop_id, reason = %reason, "skipping shop");
            }
            updated.shops.extend(page.shops);
            updated.rejected.extend(page.rejected);
        }
        updated.total_count = total_count;
        Ok(updated)
    }

    /// `None` when the platform does not know the shop yet.
    pub fn lookup_account_holder(&self, shop_id: &str) -> Result<Option<AccountHolder>> {
        match self.payments.get_account_holder(shop_id) {
            Ok(holder) if !holder.account_holder_code.is_empty() => Ok(Some(holder)),
            Ok(_) => Ok(None),
            Err(SyncError::Api(e)) => {
                debug!(shop_id, error = %e, "account holder lookup failed, treating as new");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn report_invalid_fields(&self, shop: &Shop, response: &AccountHolderResponse, action: &str) {
        if response.invalid_fields.is_empty() {
            return;
        }
        let fields = response
            .invalid_fields
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        warn!(shop_id = %shop.id, action, invalid_fields = %fields, "platform reported invalid fields");
        self.notifier.handle_errors_in_response(shop, &response.invalid_fields);
    }

    fn create(&self, shop: &Shop) -> Result<ShopOutcome> {
        let request = create_account_holder_request(self.conn, shop, self.config)?;
        let response = self.payments.create_account_holder(&request)?;
        debug!(shop_id = %shop.id, psp_reference = ?response.psp_reference, "account holder created");
        update_shareholder_mapping(self.conn, shop, response.shareholders(), self.config)?;
        self.report_invalid_fields(shop, &response, "create");
        Ok(ShopOutcome::Created)
    }

    fn update(&self, shop: &Shop, existing: &AccountHolder) -> Result<ShopOutcome> {
        let request = update_account_holder_request(self.conn, shop, existing, self.config)?;
        let response = self.payments.update_account_holder(&request)?;
        debug!(shop_id = %shop.id, psp_reference = ?response.psp_reference, "account holder updated");
        update_shareholder_mapping(self.conn, shop, response.shareholders(), self.config)?;
        self.report_invalid_fields(shop, &response, "update");
        let bank_accounts_deleted = clean_up_bank_accounts(self.payments, existing, shop)?;
        Ok(ShopOutcome::Updated { bank_accounts_deleted })
    }

    /// Creates or updates the account holder for one shop.
    pub fn process_shop(&self, shop: &Shop) -> Result<ShopOutcome> {
        match self.lookup_account_holder(&shop.id)? {
            Some(existing) => self.update(shop, &existing),
            None => self.create(shop),
        }
    }

    /// One batch: reconcile every changed shop, retry their pending documents,
    /// then move the cursor to the time the batch started. A failing shop is
    /// logged and skipped.
    pub fn process_updated_shops(&self) -> Result<SyncReport> {
        let before_processing = Utc::now();
        let since = delta::get_cursor(self.conn)?;
        let ShopsPage { shops, rejected, .. } = self.get_updated_shops(since)?;
        info!(count = shops.len(), rejected = rejected.len(), since = %since, "retrieved updated shops");

        let mut report = SyncReport {
            since: Some(since),
            shops: shops.len() + rejected.len(),
            failed: rejected,
            ..Default::default()
        };
        for shop in &shops {
            match self.process_shop(shop) {
                Ok(ShopOutcome::Created) => report.created += 1,
                Ok(ShopOutcome::Updated { bank_accounts_deleted }) => {
                    report.updated += 1;
                    if bank_accounts_deleted {
                        report.bank_cleanups += 1;
                    }
                }
                Err(e) => {
                    error!(shop_id = %shop.id, error = %e, "failed to reconcile shop");
                    report.failed.push((shop.id.clone(), e.to_string()));
                }
            }
        }

        let shop_ids: Vec<String> = shops.iter().map(|s| s.id.clone()).collect();
        report.documents = retry_documents(self.conn, self.marketplace, self.payments, &shop_ids, self.config.max_ubos);
        report.cursor_advanced = delta::advance(self.conn, before_processing)?;
        Ok(report)
    }
}
