//! Address helpers shared by the account holder, bank and shareholder mappers.

use std::collections::HashMap;

use regex::Regex;

use crate::account_holder::Address;
use crate::models::Shop;

/// Marketplace custom fields carrying an explicit house number.
const HOUSE_NUMBER_FIELDS: [&str; 2] = ["adyen-individual-housenumber", "adyen-business-housenumber"];

// ISO 3166-1 alpha-3 -> alpha-2
const ISO3_TO_ISO2: &[(&str, &str)] = &[
    ("ABW", "AW"), ("AFG", "AF"), ("AGO", "AO"), ("AIA", "AI"), ("ALA", "AX"), ("ALB", "AL"),
    ("AND", "AD"), ("ARE", "AE"), ("ARG", "AR"), ("ARM", "AM"), ("ASM", "AS"), ("ATA", "AQ"),
    ("ATF", "TF"), ("ATG", "AG"), ("AUS", "AU"), ("AUT", "AT"), ("AZE", "AZ"), ("BDI", "BI"),
    ("BEL", "BE"), ("BEN", "BJ"), ("BES", "BQ"), ("BFA", "BF"), ("BGD", "BD"), ("BGR", "BG"),
    ("BHR", "BH"), ("BHS", "BS"), ("BIH", "BA"), ("BLM", "BL"), ("BLR", "BY"), ("BLZ", "BZ"),
    ("BMU", "BM"), ("BOL", "BO"), ("BRA", "BR"), ("BRB", "BB"), ("BRN", "BN"), ("BTN", "BT"),
    ("BVT", "BV"), ("BWA", "BW"), ("CAF", "CF"), ("CAN", "CA"), ("CCK", "CC"), ("CHE", "CH"),
    ("CHL", "CL"), ("CHN", "CN"), ("CIV", "CI"), ("CMR", "CM"), ("COD", "CD"), ("COG", "CG"),
    ("COK", "CK"), ("COL", "CO"), ("COM", "KM"), ("CPV", "CV"), ("CRI", "CR"), ("CUB", "CU"),
    ("CUW", "CW"), ("CXR", "CX"), ("CYM", "KY"), ("CYP", "CY"), ("CZE", "CZ"), ("DEU", "DE"),
    ("DJI", "DJ"), ("DMA", "DM"), ("DNK", "DK"), ("DOM", "DO"), ("DZA", "DZ"), ("ECU", "EC"),
    ("EGY", "EG"), ("ERI", "ER"), ("ESH", "EH"), ("ESP", "ES"), ("EST", "EE"), ("ETH", "ET"),
    ("FIN", "FI"), ("FJI", "FJ"), ("FLK", "FK"), ("FRA", "FR"), ("FRO", "FO"), ("FSM", "FM"),
    ("GAB", "GA"), ("GBR", "GB"), ("GEO", "GE"), ("GGY", "GG"), ("GHA", "GH"), ("GIB", "GI"),
    ("GIN", "GN"), ("GLP", "GP"), ("GMB", "GM"), ("GNB", "GW"), ("GNQ", "GQ"), ("GRC", "GR"),
    ("GRD", "GD"), ("GRL", "GL"), ("GTM", "GT"), ("GUF", "GF"), ("GUM", "GU"), ("GUY", "GY"),
    ("HKG", "HK"), ("HMD", "HM"), ("HND", "HN"), ("HRV", "HR"), ("HTI", "HT"), ("HUN", "HU"),
    ("IDN", "ID"), ("IMN", "IM"), ("IND", "IN"), ("IOT", "IO"), ("IRL", "IE"), ("IRN", "IR"),
    ("IRQ", "IQ"), ("ISL", "IS"), ("ISR", "IL"), ("ITA", "IT"), ("JAM", "JM"), ("JEY", "JE"),
    ("JOR", "JO"), ("JPN", "JP"), ("KAZ", "KZ"), ("KEN", "KE"), ("KGZ", "KG"), ("KHM", "KH"),
    ("KIR", "KI"), ("KNA", "KN"), ("KOR", "KR"), ("KWT", "KW"), ("LAO", "LA"), ("LBN", "LB"),
    ("LBR", "LR"), ("LBY", "LY"), ("LCA", "LC"), ("LIE", "LI"), ("LKA", "LK"), ("LSO", "LS"),
    ("LTU", "LT"), ("LUX", "LU"), ("LVA", "LV"), ("MAC", "MO"), ("MAF", "MF"), ("MAR", "MA"),
    ("MCO", "MC"), ("MDA", "MD"), ("MDG", "MG"), ("MDV", "MV"), ("MEX", "MX"), ("MHL", "MH"),
    ("MKD", "MK"), ("MLI", "ML"), ("MLT", "MT"), ("MMR", "MM"), ("MNE", "ME"), ("MNG", "MN"),
    ("MNP", "MP"), ("MOZ", "MZ"), ("MRT", "MR"), ("MSR", "MS"), ("MTQ", "MQ"), ("MUS", "MU"),
    ("MWI", "MW"), ("MYS", "MY"), ("MYT", "YT"), ("NAM", "NA"), ("NCL", "NC"), ("NER", "NE"),
    ("NFK", "NF"), ("NGA", "NG"), ("NIC", "NI"), ("NIU", "NU"), ("NLD", "NL"), ("NOR", "NO"),
    ("NPL", "NP"), ("NRU", "NR"), ("NZL", "NZ"), ("OMN", "OM"), ("PAK", "PK"), ("PAN", "PA"),
    ("PCN", "PN"), ("PER", "PE"), ("PHL", "PH"), ("PLW", "PW"), ("PNG", "PG"), ("POL", "PL"),
    ("PRI", "PR"), ("PRK", "KP"), ("PRT", "PT"), ("PRY", "PY"), ("PSE", "PS"), ("PYF", "PF"),
    ("QAT", "QA"), ("REU", "RE"), ("ROU", "RO"), ("RUS", "RU"), ("RWA", "RW"), ("SAU", "SA"),
    ("SDN", "SD"), ("SEN", "SN"), ("SGP", "SG"), ("SGS", "GS"), ("SHN", "SH"), ("SJM", "SJ"),
    ("SLB", "SB"), ("SLE", "SL"), ("SLV", "SV"), ("SMR", "SM"), ("SOM", "SO"), ("SPM", "PM"),
    ("SRB", "RS"), ("SSD", "SS"), ("STP", "ST"), ("SUR", "SR"), ("SVK", "SK"), ("SVN", "SI"),
    ("SWE", "SE"), ("SWZ", "SZ"), ("SXM", "SX"), ("SYC", "SC"), ("SYR", "SY"), ("TCA", "TC"),
    ("TCD", "TD"), ("TGO", "TG"), ("THA", "TH"), ("TJK", "TJ"), ("TKL", "TK"), ("TKM", "TM"),
    ("TLS", "TL"), ("TON", "TO"), ("TTO", "TT"), ("TUN", "TN"), ("TUR", "TR"), ("TUV", "TV"),
    ("TWN", "TW"), ("TZA", "TZ"), ("UGA", "UG"), ("UKR", "UA"), ("UMI", "UM"), ("URY", "UY"),
    ("USA", "US"), ("UZB", "UZ"), ("VAT", "VA"), ("VCT", "VC"), ("VEN", "VE"), ("VGB", "VG"),
    ("VIR", "VI"), ("VNM", "VN"), ("VUT", "VU"), ("WLF", "WF"), ("WSM", "WS"), ("YEM", "YE"),
    ("ZAF", "ZA"), ("ZMB", "ZM"), ("ZWE", "ZW"),
];

pub fn iso2_from_iso3(iso3: &str) -> Option<&'static str> {
    let iso3 = iso3.trim().to_uppercase();
    ISO3_TO_ISO2
        .iter()
        .find(|(three, _)| *three == iso3)
        .map(|(_, two)| *two)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreetDetails {
    pub street_name: Option<String>,
    pub house_number_or_name: Option<String>,
}

impl StreetDetails {
    /// An explicit house number wins; otherwise the country pattern's first
    /// group is lifted out of the street line and the rest becomes the street name.
    pub fn from_single_line(house_number: Option<&str>, street: Option<&str>, pattern: Option<&Regex>) -> Self {
        let street = street.map(str::trim).filter(|s| !s.is_empty());
        if let Some(number) = house_number.map(str::trim).filter(|s| !s.is_empty()) {
            return Self {
                street_name: street.map(String::from),
                house_number_or_name: Some(number.to_string()),
            };
        }
        let (Some(line), Some(re)) = (street, pattern) else {
            return Self {
                street_name: street.map(String::from),
                house_number_or_name: None,
            };
        };
        match re.captures(line) {
            Some(caps) => {
                let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
                let number = caps.get(1).map(|m| m.as_str().trim().to_string());
                let mut name = String::with_capacity(line.len());
                name.push_str(&line[..whole.start]);
                name.push(' ');
                name.push_str(&line[whole.end..]);
                let name = name.trim().to_string();
                Self {
                    street_name: if name.is_empty() { None } else { Some(name) },
                    house_number_or_name: number.filter(|n| !n.is_empty()),
                }
            }
            None => Self {
                street_name: Some(line.to_string()),
                house_number_or_name: None,
            },
        }
    }
}

/// Street split for a shop's contact street, using the pattern of the shop's country.
pub fn shop_street_details(shop: &Shop, patterns: &HashMap<String, Regex>) -> StreetDetails {
    let fields = shop.custom_fields();
    let house_number = HOUSE_NUMBER_FIELDS
        .iter()
        .find_map(|code| fields.get(*code))
        .map(String::as_str);
    let contact = shop.contact_information.as_ref();
    let pattern = contact
        .and_then(|c| c.country.as_deref())
        .and_then(iso2_from_iso3)
        .and_then(|iso2| patterns.get(iso2));
    StreetDetails::from_single_line(house_number, contact.and_then(|c| c.street1.as_deref()), pattern)
}

/// Account holder address; `None` when the shop has no country.
pub fn shop_address(shop: &Shop, patterns: &HashMap<String, Regex>) -> Option<Address> {
    let contact = shop.contact_information.as_ref()?;
    let iso3 = contact.country.as_deref().filter(|c| !c.trim().is_empty())?;
    let street = shop_street_details(shop, patterns);
    let is_us = iso3.eq_ignore_ascii_case("USA");
    Some(Address {
        street: street.street_name,
        house_number_or_name: street.house_number_or_name,
        postal_code: contact.zip_code.clone(),
        city: contact.city.clone(),
        state_or_province: if is_us { contact.state.clone() } else { None },
        country: iso2_from_iso3(iso3).map(String::from),
    })
}
