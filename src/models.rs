use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Marketplace ids arrive as JSON numbers on some endpoints and strings on others.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Marketplace (read-only snapshots)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Shop {
    #[serde(rename = "shop_id", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub contact_information: Option<ContactInformation>,
    #[serde(default)]
    pub professional_information: Option<ProfessionalInformation>,
    #[serde(default, rename = "payment_info")]
    pub payment_information: Option<PaymentInformation>,
    #[serde(default, rename = "currency_iso_code")]
    pub currency: Option<String>,
    #[serde(default, rename = "shop_additional_fields")]
    pub additional_fields: Vec<AdditionalField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactInformation {
    pub civility: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub street1: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    /// ISO-3 country code.
    pub country: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfessionalInformation {
    pub corporate_name: Option<String>,
    pub tax_identification_number: Option<String>,
    pub identification_number: Option<String>,
}

/// The three mutually exclusive bank schemes a seller can declare. Any other
/// `@type` decodes as `Unsupported` and yields no bank account.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "@type")]
pub enum PaymentInformation {
    #[serde(rename = "IBAN")]
    Iban {
        #[serde(default)]
        owner: Option<String>,
        #[serde(default)]
        iban: Option<String>,
        #[serde(default)]
        bic: Option<String>,
        #[serde(default)]
        bank_name: Option<String>,
        #[serde(default)]
        bank_city: Option<String>,
    },
    #[serde(rename = "ABA")]
    Aba {
        #[serde(default)]
        owner: Option<String>,
        #[serde(default)]
        bank_account_number: Option<String>,
        #[serde(default)]
        routing_number: Option<String>,
        #[serde(default)]
        bank_name: Option<String>,
        #[serde(default)]
        bank_city: Option<String>,
    },
    #[serde(rename = "UK")]
    Uk {
        #[serde(default)]
        owner: Option<String>,
        #[serde(default)]
        bank_account_number: Option<String>,
        #[serde(default)]
        bank_sort_code: Option<String>,
        #[serde(default)]
        swift_code: Option<String>,
        #[serde(default)]
        bank_name: Option<String>,
        #[serde(default)]
        bank_city: Option<String>,
    },
    #[serde(other)]
    Unsupported,
}

impl PaymentInformation {
    pub fn owner(&self) -> Option<&str> {
        match self {
            Self::Iban { owner, .. } | Self::Aba { owner, .. } | Self::Uk { owner, .. } => {
                owner.as_deref()
            }
            Self::Unsupported => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdditionalField {
    pub code: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl AdditionalField {
    pub fn new(code: &str, value: &str) -> Self {
        Self {
            code: code.to_string(),
            value: serde_json::Value::String(value.to_string()),
        }
    }

    /// Scalar value rendered as text; multi-value and empty fields yield `None`.
    pub fn single_value(&self) -> Option<String> {
        let value = match &self.value {
            serde_json::Value::String(s) => s.trim().to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

impl Shop {
    /// Single-valued custom fields keyed by lower-cased code.
    pub fn custom_fields(&self) -> HashMap<String, String> {
        self.additional_fields
            .iter()
            .filter_map(|f| f.single_value().map(|v| (f.code.to_lowercase(), v)))
            .collect()
    }

    pub fn custom_field(&self, code: &str) -> Option<String> {
        self.additional_fields
            .iter()
            .find(|f| f.code.eq_ignore_ascii_case(code))
            .and_then(AdditionalField::single_value)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShopDocument {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "type")]
    pub type_code: String,
    #[serde(deserialize_with = "string_or_number")]
    pub shop_id: String,
    #[serde(default)]
    pub file_name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShopsRequest {
    pub updated_since: Option<DateTime<Utc>>,
    pub offset: usize,
    pub shop_ids: Vec<String>,
    pub paginate: bool,
}

/// One page of the shop listing. A shop that does not decode is set aside in
/// `rejected` as (shop id, reason) so the rest of the page survives.
#[derive(Debug, Clone, Default)]
pub struct ShopsPage {
    pub shops: Vec<Shop>,
    pub total_count: usize,
    pub rejected: Vec<(String, String)>,
}

#[derive(Deserialize)]
struct RawShopsPage {
    #[serde(default)]
    shops: Vec<serde_json::Value>,
    #[serde(default)]
    total_count: usize,
}

impl ShopsPage {
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        let raw: RawShopsPage = serde_json::from_str(body)?;
        let mut page = ShopsPage {
            total_count: raw.total_count,
            ..Default::default()
        };
        for value in raw.shops {
            let shop_id = match value.get("shop_id") {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(serde_json::Value::Number(n)) => n.to_string(),
                _ => "(unknown)".to_string(),
            };
            match serde_json::from_value::<Shop>(value) {
                Ok(shop) => page.shops.push(shop),
                Err(e) => page.rejected.push((shop_id, format!("undecodable shop: {e}"))),
            }
        }
        Ok(page)
    }

    /// Listing entries this page covers, decoded or not.
    pub fn consumed(&self) -> usize {
        self.shops.len() + self.rejected.len()
    }
}

// ---------------------------------------------------------------------------
// Local persisted rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ShareholderMapping {
    pub id: Option<i64>,
    pub shop_id: String,
    pub ubo_number: u32,
    pub shareholder_code: String,
}

/// A document whose upload could not complete yet and is reattempted by a later run.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDocument {
    pub id: Option<i64>,
    pub doc_id: String,
    pub shop_id: String,
    pub times_failed: i64,
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shop_deserializes_marketplace_payload() {
        let json = r#"{
            "shop_id": 2001,
            "currency_iso_code": "EUR",
            "contact_information": {
                "civility": "Mrs", "firstname": "Jane", "lastname": "Doe",
                "email": "jane@example.com", "street1": "Kosterpark 610b",
                "zip_code": "1111AA", "city": "Amsterdam", "country": "NLD"
            },
            "payment_info": {"@type": "IBAN", "owner": "Jane Doe", "iban": "NL91ABNA0417164300", "bic": "ABNANL2A"},
            "shop_additional_fields": [
                {"code": "adyen-legal-entity-type", "type": "LIST", "value": "INDIVIDUAL"},
                {"code": "adyen-ubo1-firstname", "type": "STRING", "value": "  "},
                {"code": "tags", "type": "MULTIPLE_VALUES_LIST", "value": ["a", "b"]}
            ]
        }"#;
        let shop: Shop = serde_json::from_str(json).unwrap();
        assert_eq!(shop.id, "2001");
        assert_eq!(shop.currency.as_deref(), Some("EUR"));
        assert!(matches!(shop.payment_information, Some(PaymentInformation::Iban { .. })));
        assert_eq!(shop.payment_information.as_ref().unwrap().owner(), Some("Jane Doe"));
        let fields = shop.custom_fields();
        assert_eq!(fields.get("adyen-legal-entity-type").map(String::as_str), Some("INDIVIDUAL"));
        assert!(!fields.contains_key("adyen-ubo1-firstname"));
        assert!(!fields.contains_key("tags"));
    }

    #[test]
    fn test_unknown_bank_scheme_keeps_the_page() {
        let json = r#"{
            "total_count": 3,
            "shops": [
                {"shop_id": 1, "payment_info": {"@type": "IBAN", "iban": "NL91ABNA0417164300"}},
                {"shop_id": 2, "payment_info": {"@type": "CANADIAN", "institution_number": "001"}},
                {"shop_id": 3, "shop_additional_fields": "not a list"}
            ]
        }"#;
        let page = ShopsPage::from_json(json).unwrap();
        assert_eq!(page.total_count, 3);
        assert_eq!(page.consumed(), 3);
        let ids: Vec<&str> = page.shops.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(matches!(page.shops[1].payment_information, Some(PaymentInformation::Unsupported)));
        assert_eq!(page.shops[1].payment_information.as_ref().unwrap().owner(), None);
        assert_eq!(page.rejected.len(), 1);
        assert_eq!(page.rejected[0].0, "3");
    }

    #[test]
    fn test_custom_field_lookup_ignores_case() {
        let shop = Shop {
            id: "1".into(),
            additional_fields: vec![AdditionalField::new("ADYEN-Individual-DOB", "1989-03-15T23:00:00Z")],
            ..Default::default()
        };
        assert_eq!(shop.custom_field("adyen-individual-dob").as_deref(), Some("1989-03-15T23:00:00Z"));
        assert_eq!(shop.custom_field("adyen-individual-idnumber"), None);
    }

    #[test]
    fn test_shop_document_accepts_numeric_ids() {
        let json = r#"{"id": 77, "type": "adyen-ubo1-photoid", "shop_id": "2001", "file_name": "passport.png"}"#;
        let doc: ShopDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.id, "77");
        assert_eq!(doc.shop_id, "2001");
        assert_eq!(doc.type_code, "adyen-ubo1-photoid");
    }
}
