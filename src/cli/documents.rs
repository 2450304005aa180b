use crate::error::Result;
use crate::http::{MarketplaceHttpClient, PaymentPlatformHttpClient};
use crate::settings::load_settings;
use crate::uploads::submit_documents;

use super::open_db;

pub fn run(shop_ids: &[String]) -> Result<()> {
    let settings = load_settings()?;
    let config = settings.engine_config()?;
    let conn = open_db(&settings)?;
    let marketplace = MarketplaceHttpClient::new(&settings.marketplace);
    let payments = PaymentPlatformHttpClient::new(&settings.payment_platform);

    let report = submit_documents(&conn, &marketplace, &payments, shop_ids, config.max_ubos)?;
    println!(
        "Uploaded {}, deferred {}, failed {}",
        report.uploaded, report.deferred, report.failed
    );
    Ok(())
}
