//! In-memory stand-ins for the marketplace and payment platform used by unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use crate::account_holder::{
    AccountHolder, AccountHolderDetails, AccountHolderResponse, BusinessDetails, CreateAccountHolderRequest,
    DeleteBankAccountRequest, ErrorFieldType, ShareholderContact, UpdateAccountHolderRequest,
    UploadDocumentRequest,
};
use crate::clients::{InvalidFieldsNotifier, MarketplaceClient, PaymentPlatformClient};
use crate::error::{ApiError, Result, SyncError};
use crate::models::{AdditionalField, ContactInformation, Shop, ShopDocument, ShopsPage, ShopsRequest};

#[derive(Default)]
pub struct FakeMarketplace {
    pub shops: Vec<Shop>,
    /// Shops per page; zero returns everything at once.
    pub page_size: usize,
    pub documents: Vec<ShopDocument>,
    pub failing_downloads: HashSet<String>,
    /// Undecodable shops reported on the first page as (shop id, reason).
    pub rejected: Vec<(String, String)>,
    pub shop_requests: RefCell<Vec<ShopsRequest>>,
    pub downloads: RefCell<Vec<String>>,
}

impl FakeMarketplace {
    pub fn with_shops(shops: Vec<Shop>) -> Self {
        Self { shops, ..Default::default() }
    }

    /// Requests that looked up specific shops rather than paging through updates.
    pub fn single_shop_lookups(&self) -> usize {
        self.shop_requests.borrow().iter().filter(|r| !r.shop_ids.is_empty()).count()
    }
}

impl MarketplaceClient for FakeMarketplace {
    fn get_shops(&self, request: &ShopsRequest) -> Result<ShopsPage> {
        self.shop_requests.borrow_mut().push(request.clone());
        if !request.shop_ids.is_empty() {
            let shops: Vec<Shop> = self
                .shops
                .iter()
                .filter(|s| request.shop_ids.contains(&s.id))
                .cloned()
                .collect();
            return Ok(ShopsPage {
                total_count: shops.len(),
                shops,
                ..Default::default()
            });
        }
        let take = if self.page_size == 0 { usize::MAX } else { self.page_size };
        // rejected entries sit at the head of the listing
        let rejected = if request.offset == 0 { self.rejected.clone() } else { Vec::new() };
        let start = request.offset.saturating_sub(self.rejected.len());
        let take = take.saturating_sub(rejected.len());
        Ok(ShopsPage {
            shops: self.shops.iter().skip(start).take(take).cloned().collect(),
            total_count: self.shops.len() + self.rejected.len(),
            rejected,
        })
    }

    fn get_shop_documents(&self, shop_ids: &[String]) -> Result<Vec<ShopDocument>> {
        Ok(self
            .documents
            .iter()
            .filter(|d| shop_ids.contains(&d.shop_id))
            .cloned()
            .collect())
    }

    fn download_document(&self, document_id: &str) -> Result<Vec<u8>> {
        self.downloads.borrow_mut().push(document_id.to_string());
        if self.failing_downloads.contains(document_id) {
            return Err(SyncError::Other(format!("download of {document_id} failed")));
        }
        Ok(format!("content of {document_id}").into_bytes())
    }
}

#[derive(Default)]
pub struct FakePaymentPlatform {
    pub holders: HashMap<String, AccountHolder>,
    /// Shareholder codes handed back on create/update, in order.
    pub returned_shareholder_codes: Vec<String>,
    pub invalid_fields: Vec<ErrorFieldType>,
    pub failing_shops: HashSet<String>,
    pub upload_error: Option<ApiError>,
    pub lookups: Cell<usize>,
    pub creates: RefCell<Vec<CreateAccountHolderRequest>>,
    pub updates: RefCell<Vec<UpdateAccountHolderRequest>>,
    pub deletes: RefCell<Vec<DeleteBankAccountRequest>>,
    pub uploads: RefCell<Vec<UploadDocumentRequest>>,
}

impl FakePaymentPlatform {
    fn response(&self, code: &str) -> AccountHolderResponse {
        let shareholders = self
            .returned_shareholder_codes
            .iter()
            .map(|c| ShareholderContact {
                shareholder_code: Some(c.clone()),
                ..Default::default()
            })
            .collect();
        AccountHolderResponse {
            account_holder_code: code.to_string(),
            account_holder_details: Some(AccountHolderDetails {
                business_details: Some(BusinessDetails {
                    shareholders,
                    ..Default::default()
                }),
                ..Default::default()
            }),
            invalid_fields: self.invalid_fields.clone(),
            psp_reference: Some("8815".into()),
        }
    }
}

impl PaymentPlatformClient for FakePaymentPlatform {
    fn get_account_holder(&self, account_holder_code: &str) -> Result<AccountHolder> {
        self.lookups.set(self.lookups.get() + 1);
        if self.failing_shops.contains(account_holder_code) {
            return Err(SyncError::Other("connection reset".into()));
        }
        self.holders
            .get(account_holder_code)
            .cloned()
            .ok_or_else(|| ApiError::new(422, "000_082", "Account holder does not exist").into())
    }

    fn create_account_holder(&self, request: &CreateAccountHolderRequest) -> Result<AccountHolderResponse> {
        self.creates.borrow_mut().push(request.clone());
        Ok(self.response(&request.account_holder_code))
    }

    fn update_account_holder(&self, request: &UpdateAccountHolderRequest) -> Result<AccountHolderResponse> {
        self.updates.borrow_mut().push(request.clone());
        Ok(self.response(&request.account_holder_code))
    }

    fn delete_bank_accounts(&self, request: &DeleteBankAccountRequest) -> Result<()> {
        self.deletes.borrow_mut().push(request.clone());
        Ok(())
    }

    fn upload_document(&self, request: &UploadDocumentRequest) -> Result<()> {
        if let Some(err) = &self.upload_error {
            return Err(err.clone().into());
        }
        self.uploads.borrow_mut().push(request.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub reports: RefCell<Vec<(String, usize)>>,
}

impl InvalidFieldsNotifier for RecordingNotifier {
    fn handle_errors_in_response(&self, shop: &Shop, invalid_fields: &[ErrorFieldType]) {
        self.reports.borrow_mut().push((shop.id.clone(), invalid_fields.len()));
    }
}

pub fn shop_document(id: &str, type_code: &str, shop_id: &str) -> ShopDocument {
    ShopDocument {
        id: id.to_string(),
        type_code: type_code.to_string(),
        shop_id: shop_id.to_string(),
        file_name: format!("{id}.png"),
    }
}

/// A shop with contact details in the Netherlands and the given custom fields.
pub fn shop_with_fields(id: &str, fields: &[(&str, &str)]) -> Shop {
    Shop {
        id: id.to_string(),
        contact_information: Some(ContactInformation {
            civility: Some("Mr".into()),
            firstname: Some("Jan".into()),
            lastname: Some("Jansen".into()),
            email: Some(format!("shop{id}@example.com")),
            street1: Some("Kosterpark 610b".into()),
            zip_code: Some("1111AA".into()),
            city: Some("Amsterdam".into()),
            country: Some("NLD".into()),
            state: None,
        }),
        additional_fields: fields.iter().map(|(code, value)| AdditionalField::new(code, value)).collect(),
        ..Default::default()
    }
}
