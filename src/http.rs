//! Blocking HTTP clients for the marketplace and the payment platform.

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::account_holder::{
    AccountHolder, AccountHolderResponse, CreateAccountHolderRequest, DeleteBankAccountRequest,
    UpdateAccountHolderRequest, UploadDocumentRequest,
};
use crate::clients::{MarketplaceClient, PaymentPlatformClient};
use crate::error::{ApiError, Result};
use crate::models::{ShopDocument, ShopsPage, ShopsRequest};
use crate::settings::{MarketplaceSettings, PaymentPlatformSettings};

/// Turns a non-2xx response into `SyncError::Api`, decoding the platform's
/// error body when it has one.
fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    let mut err = serde_json::from_str::<ApiError>(&body)
        .unwrap_or_else(|_| ApiError::new(status.as_u16(), "", body.trim()));
    err.status = status.as_u16();
    Err(err.into())
}

pub struct MarketplaceHttpClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(serde::Deserialize)]
struct DocumentsPage {
    #[serde(default)]
    shop_documents: Vec<ShopDocument>,
}

impl MarketplaceHttpClient {
    pub fn new(settings: &MarketplaceSettings) -> Self {
        Self {
            client: Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{path}", self.base_url))
            .header("Authorization", &self.api_key)
            .header("Accept", "application/json")
    }
}

impl MarketplaceClient for MarketplaceHttpClient {
    fn get_shops(&self, request: &ShopsRequest) -> Result<ShopsPage> {
        let mut query: Vec<(&str, String)> = vec![
            ("offset", request.offset.to_string()),
            ("paginate", request.paginate.to_string()),
        ];
        if let Some(since) = request.updated_since {
            query.push(("updated_since", since.to_rfc3339()));
        }
        if !request.shop_ids.is_empty() {
            query.push(("shop_ids", request.shop_ids.join(",")));
        }
        debug!(offset = request.offset, shops = request.shop_ids.len(), "GET /api/shops");
        let resp = check(self.get("/api/shops").query(&query).send()?)?;
        Ok(ShopsPage::from_json(&resp.text()?)?)
    }

    fn get_shop_documents(&self, shop_ids: &[String]) -> Result<Vec<ShopDocument>> {
        debug!(shops = shop_ids.len(), "GET /api/shops/documents");
        let resp = check(
            self.get("/api/shops/documents")
                .query(&[("shop_ids", shop_ids.join(","))])
                .send()?,
        )?;
        let page: DocumentsPage = resp.json()?;
        Ok(page.shop_documents)
    }

    fn download_document(&self, document_id: &str) -> Result<Vec<u8>> {
        debug!(document_id, "GET /api/shops/documents/download");
        let resp = check(
            self.get("/api/shops/documents/download")
                .query(&[("document_ids", document_id)])
                .send()?,
        )?;
        Ok(resp.bytes()?.to_vec())
    }
}

pub struct PaymentPlatformHttpClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl PaymentPlatformHttpClient {
    pub fn new(settings: &PaymentPlatformSettings) -> Self {
        Self {
            client: Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            username: settings.username.clone(),
            password: settings.password.clone(),
        }
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, endpoint: &str, body: &B) -> Result<T> {
        debug!(endpoint, "POST payment platform");
        let resp = self
            .client
            .post(format!("{}/{endpoint}", self.base_url))
            .basic_auth(&self.username, Some(&self.password))
            .json(body)
            .send()?;
        Ok(check(resp)?.json()?)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GetAccountHolderRequest<'a> {
    account_holder_code: &'a str,
}

impl PaymentPlatformClient for PaymentPlatformHttpClient {
    fn get_account_holder(&self, account_holder_code: &str) -> Result<AccountHolder> {
        self.post("getAccountHolder", &GetAccountHolderRequest { account_holder_code })
    }

    fn create_account_holder(&self, request: &CreateAccountHolderRequest) -> Result<AccountHolderResponse> {
        self.post("createAccountHolder", request)
    }

    fn update_account_holder(&self, request: &UpdateAccountHolderRequest) -> Result<AccountHolderResponse> {
        self.post("updateAccountHolder", request)
    }

    fn delete_bank_accounts(&self, request: &DeleteBankAccountRequest) -> Result<()> {
        let _: serde_json::Value = self.post("deleteBankAccounts", request)?;
        Ok(())
    }

    fn upload_document(&self, request: &UploadDocumentRequest) -> Result<()> {
        let _: serde_json::Value = self.post("uploadDocument", request)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clients_trim_trailing_slash() {
        let marketplace = MarketplaceHttpClient::new(&MarketplaceSettings {
            base_url: "https://marketplace.example.com/".into(),
            api_key: "key".into(),
        });
        assert_eq!(marketplace.base_url, "https://marketplace.example.com");
        let payments = PaymentPlatformHttpClient::new(&PaymentPlatformSettings {
            base_url: "https://cal-test.example.com/cal/services/Account/v4/".into(),
            username: "ws".into(),
            password: "secret".into(),
        });
        assert_eq!(payments.base_url, "https://cal-test.example.com/cal/services/Account/v4");
    }

    #[test]
    fn test_documents_page_decodes() {
        let json = r#"{"shop_documents": [{"id": 5, "type": "adyen-bankproof", "shop_id": 2001, "file_name": "proof.pdf"}], "total_count": 1}"#;
        let page: DocumentsPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.shop_documents.len(), 1);
        assert_eq!(page.shop_documents[0].id, "5");
    }

    #[test]
    fn test_get_account_holder_body() {
        let body = serde_json::to_value(GetAccountHolderRequest { account_holder_code: "2001" }).unwrap();
        assert_eq!(body["accountHolderCode"], "2001");
    }
}
