//! Beneficial owner (UBO) extraction from marketplace custom fields and the
//! persisted slot -> shareholder code mapping that keeps their identity stable.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::account_holder::{
    AccountHolder, Address, Gender, Name, PersonalData, PhoneNumber, PhoneType, ShareholderContact,
};
use crate::address::{iso2_from_iso3, StreetDetails};
use crate::error::Result;
use crate::models::{ShareholderMapping, Shop};
use crate::repository::ShareholderMappingRepository;
use crate::settings::EngineConfig;

/// Custom field key for one attribute of a UBO slot, e.g. `adyen-ubo2-email`.
pub fn ubo_key(ubo_number: u32, attribute: &str) -> String {
    format!("adyen-ubo{ubo_number}-{attribute}")
}

/// Values read from one slot's custom fields.
#[derive(Debug, Default, Clone)]
struct UboFields {
    civility: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    date_of_birth: Option<String>,
    nationality: Option<String>,
    id_number: Option<String>,
    house_number: Option<String>,
    street: Option<String>,
    city: Option<String>,
    postal_code: Option<String>,
    country: Option<String>,
    state_or_province: Option<String>,
    phone_country_code: Option<String>,
    phone_type: Option<String>,
    phone_number: Option<String>,
}

impl UboFields {
    fn read(fields: &HashMap<String, String>, ubo_number: u32) -> Self {
        let get = |attribute: &str| fields.get(&ubo_key(ubo_number, attribute)).cloned();
        Self {
            civility: get("civility"),
            first_name: get("firstname"),
            last_name: get("lastname"),
            email: get("email"),
            date_of_birth: get("dob"),
            nationality: get("nationality"),
            id_number: get("idnumber"),
            house_number: get("housenumber"),
            street: get("streetname"),
            city: get("city"),
            postal_code: get("zip"),
            country: get("country"),
            state_or_province: get("stateorprovince"),
            phone_country_code: get("phonecountry"),
            phone_type: get("phonetype"),
            phone_number: get("phonenumber"),
        }
    }

    fn has_mandatory(&self) -> bool {
        self.civility.is_some() && self.first_name.is_some() && self.last_name.is_some() && self.email.is_some()
    }
}

/// Slots (ascending) whose mandatory fields are all present.
pub fn extract_ubo_numbers(shop: &Shop, max_ubos: u32) -> Vec<u32> {
    let fields = shop.custom_fields();
    (1..=max_ubos)
        .filter(|&n| UboFields::read(&fields, n).has_mandatory())
        .collect()
}

/// Normalizes a marketplace timestamp to a calendar date in the marketplace time zone.
pub fn format_date_of_birth(raw: &str, tz: Tz) -> Option<String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&tz).format("%Y-%m-%d").to_string());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.format("%Y-%m-%d").to_string());
    }
    warn!(value = raw, "unparseable date of birth");
    None
}

/// Shareholder code for a slot: the persisted mapping, else a positional
/// backfill from the account holder's current shareholder list.
pub fn resolve_shareholder_code(
    repo: &impl ShareholderMappingRepository,
    shop_id: &str,
    ubo_number: u32,
    existing: Option<&AccountHolder>,
) -> Result<Option<String>> {
    if let Some(mapping) = repo.find_mapping(shop_id, ubo_number)? {
        return Ok(Some(mapping.shareholder_code));
    }
    let remote = existing.map(AccountHolder::shareholders).unwrap_or(&[]);
    let Some(code) = remote
        .get((ubo_number as usize).wrapping_sub(1))
        .and_then(|s| s.shareholder_code.as_deref())
        .filter(|c| !c.is_empty())
    else {
        return Ok(None);
    };
    if repo.find_mapping_by_code(code)?.is_some() {
        debug!(shop_id, ubo = ubo_number, code, "shareholder code already mapped elsewhere");
        return Ok(None);
    }
    let mapping = ShareholderMapping {
        id: None,
        shop_id: shop_id.to_string(),
        ubo_number,
        shareholder_code: code.to_string(),
    };
    if !repo.save_mapping(&mapping)? {
        return Ok(None);
    }
    info!(shop_id, ubo = ubo_number, code, "backfilled shareholder mapping");
    Ok(Some(code.to_string()))
}

/// Builds one shareholder per complete UBO slot. Incomplete slots are skipped.
pub fn extract_shareholders(
    repo: &impl ShareholderMappingRepository,
    shop: &Shop,
    existing: Option<&AccountHolder>,
    config: &EngineConfig,
) -> Result<Vec<ShareholderContact>> {
    let fields = shop.custom_fields();
    let pattern = shop
        .contact_information
        .as_ref()
        .and_then(|c| c.country.as_deref())
        .and_then(iso2_from_iso3)
        .and_then(|iso2| config.house_number_patterns.get(iso2));

    let mut shareholders = Vec::new();
    for ubo_number in 1..=config.max_ubos {
        let ubo = UboFields::read(&fields, ubo_number);
        if !ubo.has_mandatory() {
            continue;
        }
        let shareholder_code = resolve_shareholder_code(repo, &shop.id, ubo_number, existing)?;

        let gender = ubo.civility.as_deref().map(Gender::from_civility).unwrap_or_default();
        let mut contact = ShareholderContact {
            shareholder_code,
            name: Some(Name {
                first_name: ubo.first_name.clone(),
                last_name: ubo.last_name.clone(),
                gender,
            }),
            email: ubo.email.clone(),
            ..Default::default()
        };

        if ubo.date_of_birth.is_some() || ubo.nationality.is_some() || ubo.id_number.is_some() {
            contact.personal_data = Some(PersonalData {
                date_of_birth: ubo
                    .date_of_birth
                    .as_deref()
                    .and_then(|dob| format_date_of_birth(dob, config.time_zone)),
                nationality: ubo.nationality.clone(),
                id_number: ubo.id_number.clone(),
            });
        } else {
            debug!(shop_id = %shop.id, ubo = ubo_number, "no personal data for shareholder");
        }

        if ubo.country.is_some()
            || ubo.street.is_some()
            || ubo.house_number.is_some()
            || ubo.city.is_some()
            || ubo.postal_code.is_some()
        {
            let street =
                StreetDetails::from_single_line(ubo.house_number.as_deref(), ubo.street.as_deref(), pattern);
            contact.address = Some(Address {
                street: street.street_name,
                house_number_or_name: street.house_number_or_name,
                postal_code: ubo.postal_code.clone(),
                city: ubo.city.clone(),
                state_or_province: ubo.state_or_province.clone(),
                country: ubo.country.clone(),
            });
        } else {
            debug!(shop_id = %shop.id, ubo = ubo_number, "no address data for shareholder");
        }

        if ubo.phone_number.is_some() || ubo.phone_type.is_some() || ubo.phone_country_code.is_some() {
            let phone_type = ubo.phone_type.as_deref().and_then(|t| {
                let parsed = PhoneType::parse(t);
                if parsed.is_none() {
                    warn!(shop_id = %shop.id, ubo = ubo_number, phone_type = t, "unknown phone type");
                }
                parsed
            });
            contact.phone_number = Some(PhoneNumber {
                phone_country_code: ubo.phone_country_code.clone(),
                phone_number: ubo.phone_number.clone(),
                phone_type,
            });
        } else {
            debug!(shop_id = %shop.id, ubo = ubo_number, "no phone data for shareholder");
        }

        shareholders.push(contact);
    }
    Ok(shareholders)
}

/// Pairs the submitted UBO slots with the shareholder codes the platform
/// returned, in order, and persists any pairing not yet known.
pub fn update_shareholder_mapping(
    repo: &impl ShareholderMappingRepository,
    shop: &Shop,
    returned: &[ShareholderContact],
    config: &EngineConfig,
) -> Result<usize> {
    let mut saved = 0;
    let ubo_numbers = extract_ubo_numbers(shop, config.max_ubos);
    for (ubo_number, shareholder) in ubo_numbers.into_iter().zip(returned) {
        let Some(code) = shareholder.shareholder_code.as_deref().filter(|c| !c.is_empty()) else {
            continue;
        };
        if repo.find_mapping(&shop.id, ubo_number)?.is_some() || repo.find_mapping_by_code(code)?.is_some() {
            continue;
        }
        let mapping = ShareholderMapping {
            id: None,
            shop_id: shop.id.clone(),
            ubo_number,
            shareholder_code: code.to_string(),
        };
        if repo.save_mapping(&mapping)? {
            debug!(shop_id = %shop.id, ubo = ubo_number, code, "saved shareholder mapping");
            saved += 1;
        }
    }
    Ok(saved)
}
