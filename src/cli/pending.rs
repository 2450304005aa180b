use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::repository::DocRetryRepository;
use crate::settings::load_settings;

use super::open_db;

pub fn run() -> Result<()> {
    let conn = open_db(&load_settings()?)?;
    let pending = conn.all_pending()?;

    let mut table = Table::new();
    table.set_header(vec!["Document", "Shop", "Failures", "Since"]);
    for p in &pending {
        table.add_row(vec![
            Cell::new(&p.doc_id),
            Cell::new(&p.shop_id),
            Cell::new(p.times_failed),
            Cell::new(p.created_at.as_deref().unwrap_or("")),
        ]);
    }
    println!("Pending documents\n{table}");
    Ok(())
}
