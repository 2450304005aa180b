//! Payment-platform account holder model: the subset of the account API the
//! engine reads or writes. Field names follow the platform's camelCase wire format.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegalEntity {
    Individual,
    Business,
}

impl LegalEntity {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "INDIVIDUAL" => Some(Self::Individual),
            "BUSINESS" => Some(Self::Business),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountHolder {
    #[serde(default)]
    pub account_holder_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_entity: Option<LegalEntity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_holder_details: Option<AccountHolderDetails>,
}

impl AccountHolder {
    pub fn bank_account_details(&self) -> &[BankAccountDetail] {
        self.account_holder_details
            .as_ref()
            .map(|d| d.bank_account_details.as_slice())
            .unwrap_or(&[])
    }

    pub fn shareholders(&self) -> &[ShareholderContact] {
        self.account_holder_details
            .as_ref()
            .and_then(|d| d.business_details.as_ref())
            .map(|b| b.shareholders.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountHolderDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bank_account_details: Vec<BankAccountDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_details: Option<BusinessDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub individual_details: Option<IndividualDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccountDetail {
    #[serde(rename = "bankAccountUUID", default, skip_serializing_if = "Option::is_none")]
    pub bank_account_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iban: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    /// Routing number or sort code, depending on the scheme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_bic_swift: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_house_number_or_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_account: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doing_business_as: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shareholders: Vec<ShareholderContact>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Name>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_data: Option<PersonalData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareholderContact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shareholder_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Name>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_data: Option<PersonalData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<PhoneNumber>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Gender {
    /// Salutation lookup; anything unrecognized is `Unknown`.
    pub fn from_civility(civility: &str) -> Self {
        match civility.trim().to_uppercase().as_str() {
            "MR" => Self::Male,
            "MRS" | "MISS" => Self::Female,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Name {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub gender: Gender,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalData {
    /// `YYYY-MM-DD`, no time or zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house_number_or_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_or_province: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PhoneType {
    Landline,
    Mobile,
    Sip,
    Fax,
}

impl PhoneType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "LANDLINE" => Some(Self::Landline),
            "MOBILE" => Some(Self::Mobile),
            "SIP" => Some(Self::Sip),
            "FAX" => Some(Self::Fax),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumber {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_type: Option<PhoneType>,
}

// ---------------------------------------------------------------------------
// Requests / responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountHolderRequest {
    pub account_holder_code: String,
    pub legal_entity: LegalEntity,
    pub account_holder_details: AccountHolderDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_tier: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountHolderRequest {
    pub account_holder_code: String,
    pub account_holder_details: AccountHolderDetails,
}

/// Create and update share one response shape.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountHolderResponse {
    #[serde(default)]
    pub account_holder_code: String,
    #[serde(default)]
    pub account_holder_details: Option<AccountHolderDetails>,
    #[serde(default)]
    pub invalid_fields: Vec<ErrorFieldType>,
    #[serde(default)]
    pub psp_reference: Option<String>,
}

impl AccountHolderResponse {
    pub fn shareholders(&self) -> &[ShareholderContact] {
        self.account_holder_details
            .as_ref()
            .and_then(|d| d.business_details.as_ref())
            .map(|b| b.shareholders.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorFieldType {
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub field_type: Option<FieldType>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldType {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub field_name: Option<String>,
    #[serde(default)]
    pub shareholder_code: Option<String>,
}

impl fmt::Display for ErrorFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = self
            .field_type
            .as_ref()
            .and_then(|t| t.field.as_deref().or(t.field_name.as_deref()))
            .unwrap_or("unknown field");
        write!(
            f,
            "{} ({}): {}",
            field,
            self.error_code.map(|c| c.to_string()).unwrap_or_else(|| "-".into()),
            self.error_description.as_deref().unwrap_or("")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBankAccountRequest {
    pub account_holder_code: String,
    #[serde(rename = "bankAccountUUIDs")]
    pub bank_account_uuids: Vec<String>,
}

/// Document types the platform recognizes. Composite front/back variants
/// exist only for some base types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    BankStatement,
    Bsn,
    CompanyRegistrationScreening,
    DrivingLicence,
    DrivingLicenceBack,
    DrivingLicenceFront,
    IdCard,
    IdCardBack,
    IdCardFront,
    Passport,
    SupportingDocuments,
}

impl DocumentType {
    pub const ALL: [DocumentType; 11] = [
        Self::BankStatement,
        Self::Bsn,
        Self::CompanyRegistrationScreening,
        Self::DrivingLicence,
        Self::DrivingLicenceBack,
        Self::DrivingLicenceFront,
        Self::IdCard,
        Self::IdCardBack,
        Self::IdCardFront,
        Self::Passport,
        Self::SupportingDocuments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BankStatement => "BANK_STATEMENT",
            Self::Bsn => "BSN",
            Self::CompanyRegistrationScreening => "COMPANY_REGISTRATION_SCREENING",
            Self::DrivingLicence => "DRIVING_LICENCE",
            Self::DrivingLicenceBack => "DRIVING_LICENCE_BACK",
            Self::DrivingLicenceFront => "DRIVING_LICENCE_FRONT",
            Self::IdCard => "ID_CARD",
            Self::IdCardBack => "ID_CARD_BACK",
            Self::IdCardFront => "ID_CARD_FRONT",
            Self::Passport => "PASSPORT",
            Self::SupportingDocuments => "SUPPORTING_DOCUMENTS",
        }
    }

    /// Exact match against the platform's codes.
    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == code)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadDocumentRequest {
    /// Base64-encoded file content.
    pub document_content: String,
    pub document_detail: DocumentDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDetail {
    pub account_holder_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shareholder_code: Option<String>,
    pub document_type: DocumentType,
    pub filename: String,
}
