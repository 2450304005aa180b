//! Remote collaborators. The engine only talks to these traits; `http`
//! provides the production implementations.

use tracing::debug;

use crate::account_holder::{
    AccountHolder, AccountHolderResponse, CreateAccountHolderRequest, DeleteBankAccountRequest,
    ErrorFieldType, UpdateAccountHolderRequest, UploadDocumentRequest,
};
use crate::error::Result;
use crate::models::{Shop, ShopDocument, ShopsPage, ShopsRequest};

pub trait MarketplaceClient {
    fn get_shops(&self, request: &ShopsRequest) -> Result<ShopsPage>;
    fn get_shop_documents(&self, shop_ids: &[String]) -> Result<Vec<ShopDocument>>;
    fn download_document(&self, document_id: &str) -> Result<Vec<u8>>;

    fn get_shop(&self, shop_id: &str) -> Result<Option<Shop>> {
        let request = ShopsRequest {
            shop_ids: vec![shop_id.to_string()],
            ..Default::default()
        };
        Ok(self.get_shops(&request)?.shops.into_iter().next())
    }
}

pub trait PaymentPlatformClient {
    fn get_account_holder(&self, account_holder_code: &str) -> Result<AccountHolder>;
    fn create_account_holder(&self, request: &CreateAccountHolderRequest) -> Result<AccountHolderResponse>;
    fn update_account_holder(&self, request: &UpdateAccountHolderRequest) -> Result<AccountHolderResponse>;
    fn delete_bank_accounts(&self, request: &DeleteBankAccountRequest) -> Result<()>;
    fn upload_document(&self, request: &UploadDocumentRequest) -> Result<()>;
}

/// Receives remote-reported invalid fields. Not retried by the engine.
pub trait InvalidFieldsNotifier {
    fn handle_errors_in_response(&self, shop: &Shop, invalid_fields: &[ErrorFieldType]);
}

/// Default notifier: logs each reported field.
pub struct LogNotifier;

impl InvalidFieldsNotifier for LogNotifier {
    fn handle_errors_in_response(&self, shop: &Shop, invalid_fields: &[ErrorFieldType]) {
        for field in invalid_fields {
            debug!(shop_id = %shop.id, field = %field, "invalid field reported");
        }
    }
}
