use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::clients::LogNotifier;
use crate::error::Result;
use crate::http::{MarketplaceHttpClient, PaymentPlatformHttpClient};
use crate::reconciler::{Engine, SyncReport};
use crate::settings::load_settings;

use super::open_db;

pub fn run() -> Result<()> {
    let settings = load_settings()?;
    let config = settings.engine_config()?;
    let conn = open_db(&settings)?;
    let marketplace = MarketplaceHttpClient::new(&settings.marketplace);
    let payments = PaymentPlatformHttpClient::new(&settings.payment_platform);

    let engine = Engine {
        conn: &conn,
        marketplace: &marketplace,
        payments: &payments,
        notifier: &LogNotifier,
        config: &config,
    };
    let report = engine.process_updated_shops()?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &SyncReport) {
    let mut table = Table::new();
    table.set_header(vec!["", "Count"]);
    table.add_row(vec![Cell::new("Shops"), Cell::new(report.shops)]);
    table.add_row(vec![Cell::new("Created"), Cell::new(report.created)]);
    table.add_row(vec![Cell::new("Updated"), Cell::new(report.updated)]);
    table.add_row(vec![Cell::new("Bank cleanups"), Cell::new(report.bank_cleanups)]);
    table.add_row(vec![Cell::new("Documents uploaded"), Cell::new(report.documents.uploaded)]);
    table.add_row(vec![Cell::new("Documents deferred"), Cell::new(report.documents.deferred)]);
    table.add_row(vec![Cell::new("Failed"), Cell::new(report.failed.len())]);
    println!("Sync\n{table}");

    for (shop_id, reason) in &report.failed {
        println!("  {} shop {shop_id}: {reason}", "failed".red());
    }
    if !report.cursor_advanced {
        println!("{}", "Cursor not advanced.".yellow());
    }
}
