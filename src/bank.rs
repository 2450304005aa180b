//! Bank account detail extraction and diffing against the account holder's
//! current bank accounts.

use tracing::{debug, info};

use crate::account_holder::{AccountHolder, BankAccountDetail, DeleteBankAccountRequest};
use crate::address::{iso2_from_iso3, shop_street_details};
use crate::clients::PaymentPlatformClient;
use crate::error::Result;
use crate::models::{PaymentInformation, Shop};
use crate::settings::EngineConfig;

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Builds the single bank account the seller declares, or `None` when the
/// scheme payload is incomplete or no currency is set.
pub fn build_bank_account_detail(shop: &Shop, config: &EngineConfig) -> Option<BankAccountDetail> {
    let Some(payment) = shop.payment_information.as_ref() else {
        info!(shop_id = %shop.id, "no bank account information");
        return None;
    };
    let Some(currency) = non_empty(&shop.currency) else {
        info!(shop_id = %shop.id, "currency not defined");
        return None;
    };

    let mut detail = match payment {
        PaymentInformation::Iban { iban, bic, bank_name, bank_city, .. } => {
            let Some(iban) = non_empty(iban) else {
                info!(shop_id = %shop.id, "empty IBAN");
                return None;
            };
            BankAccountDetail {
                iban: Some(iban.to_string()),
                bank_bic_swift: bic.clone(),
                country_code: iban.get(..2).map(String::from),
                bank_name: bank_name.clone(),
                bank_city: bank_city.clone(),
                ..Default::default()
            }
        }
        PaymentInformation::Aba { bank_account_number, routing_number, bank_name, bank_city, .. } => {
            let (Some(account), Some(routing)) = (non_empty(bank_account_number), non_empty(routing_number)) else {
                info!(shop_id = %shop.id, "empty routing number or account number");
                return None;
            };
            BankAccountDetail {
                account_number: Some(account.to_string()),
                branch_code: Some(routing.to_string()),
                country_code: Some("US".into()),
                bank_name: bank_name.clone(),
                bank_city: bank_city.clone(),
                ..Default::default()
            }
        }
        PaymentInformation::Uk { bank_account_number, bank_sort_code, swift_code, bank_name, bank_city, .. } => {
            let (Some(account), Some(sort_code)) = (non_empty(bank_account_number), non_empty(bank_sort_code)) else {
                info!(shop_id = %shop.id, "empty account number or sort code");
                return None;
            };
            BankAccountDetail {
                account_number: Some(account.to_string()),
                branch_code: Some(sort_code.to_string()),
                bank_bic_swift: swift_code.clone(),
                country_code: Some("GB".into()),
                bank_name: bank_name.clone(),
                bank_city: bank_city.clone(),
                ..Default::default()
            }
        }
        PaymentInformation::Unsupported => {
            info!(shop_id = %shop.id, "unsupported bank scheme");
            return None;
        }
    };
    detail.currency_code = Some(currency.to_string());

    if let Some(contact) = shop.contact_information.as_ref() {
        let street = shop_street_details(shop, &config.house_number_patterns);
        detail.owner_name = payment.owner().map(String::from);
        detail.owner_street = street.street_name;
        detail.owner_house_number_or_name = street.house_number_or_name;
        detail.owner_postal_code = contact.zip_code.clone();
        detail.owner_city = contact.city.clone();
        detail.owner_state = contact.state.clone();
        detail.owner_country_code = contact
            .country
            .as_deref()
            .and_then(iso2_from_iso3)
            .map(String::from);
    }
    detail.primary_account = Some(true);
    Some(detail)
}

/// Existing detail with the same scheme identity as the seller's declared account.
/// Identity fields are trimmed exactly as the builder trims them.
pub fn find_matching_detail<'a>(existing: &'a [BankAccountDetail], shop: &Shop) -> Option<&'a BankAccountDetail> {
    match shop.payment_information.as_ref()? {
        PaymentInformation::Iban { iban, .. } => {
            let iban = non_empty(iban)?;
            existing.iter().find(|d| d.iban.as_deref() == Some(iban))
        }
        PaymentInformation::Aba { bank_account_number: account, routing_number: branch, .. }
        | PaymentInformation::Uk { bank_account_number: account, bank_sort_code: branch, .. } => {
            let account = non_empty(account)?;
            let branch = non_empty(branch)?;
            existing
                .iter()
                .find(|d| d.account_number.as_deref() == Some(account) && d.branch_code.as_deref() == Some(branch))
        }
        PaymentInformation::Unsupported => None,
    }
}

/// True when any descriptive field differs; the UUID and primary flag are ignored.
pub fn is_updating_existing(new: &BankAccountDetail, existing: &BankAccountDetail) -> bool {
    !(new.iban == existing.iban
        && new.account_number == existing.account_number
        && new.branch_code == existing.branch_code
        && new.bank_name == existing.bank_name
        && new.bank_city == existing.bank_city
        && new.bank_bic_swift == existing.bank_bic_swift
        && new.country_code == existing.country_code
        && new.currency_code == existing.currency_code
        && new.owner_name == existing.owner_name
        && new.owner_street == existing.owner_street
        && new.owner_house_number_or_name == existing.owner_house_number_or_name
        && new.owner_postal_code == existing.owner_postal_code
        && new.owner_city == existing.owner_city
        && new.owner_state == existing.owner_state
        && new.owner_country_code == existing.owner_country_code)
}

/// Bank details to put on an update payload: empty when the seller's account
/// is already on file unchanged; otherwise the new detail, carrying the
/// matched UUID so the platform updates in place.
pub fn bank_details_for_update(shop: &Shop, existing: &AccountHolder, config: &EngineConfig) -> Vec<BankAccountDetail> {
    let Some(mut detail) = build_bank_account_detail(shop, config) else {
        return Vec::new();
    };
    match find_matching_detail(existing.bank_account_details(), shop) {
        Some(matched) => {
            detail.bank_account_uuid = matched.bank_account_uuid.clone();
            if is_updating_existing(&detail, matched) {
                vec![detail]
            } else {
                debug!(shop_id = %shop.id, "bank account unchanged");
                Vec::new()
            }
        }
        None => vec![detail],
    }
}

/// UUIDs of every bank account except the one matching the seller's declared account.
pub fn stale_bank_account_uuids(existing: &AccountHolder, shop: &Shop) -> Vec<String> {
    let details = existing.bank_account_details();
    let keep = find_matching_detail(details, shop).and_then(|d| d.bank_account_uuid.as_deref());
    details
        .iter()
        .filter_map(|d| d.bank_account_uuid.as_deref())
        .filter(|uuid| Some(*uuid) != keep)
        .map(String::from)
        .collect()
}

/// Deletes stale bank accounts, judged against the snapshot taken before the
/// update. Returns whether anything was deleted.
pub fn clean_up_bank_accounts(
    payments: &dyn PaymentPlatformClient,
    existing: &AccountHolder,
    shop: &Shop,
) -> Result<bool> {
    let uuids = stale_bank_account_uuids(existing, shop);
    if uuids.is_empty() {
        return Ok(false);
    }
    let request = DeleteBankAccountRequest {
        account_holder_code: existing.account_holder_code.clone(),
        bank_account_uuids: uuids,
    };
    payments.delete_bank_accounts(&request)?;
    info!(
        shop_id = %shop.id,
        count = request.bank_account_uuids.len(),
        "deleted stale bank accounts"
    );
    Ok(true)
}
