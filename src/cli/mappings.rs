use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::repository::ShareholderMappingRepository;
use crate::settings::load_settings;

use super::open_db;

pub fn run(shop: Option<&str>) -> Result<()> {
    let conn = open_db(&load_settings()?)?;
    let mappings = match shop {
        Some(shop_id) => conn.find_mappings_for_shop(shop_id)?,
        None => conn.all_mappings()?,
    };

    let mut table = Table::new();
    table.set_header(vec!["Shop", "UBO", "Shareholder Code"]);
    for m in &mappings {
        table.add_row(vec![
            Cell::new(&m.shop_id),
            Cell::new(m.ubo_number),
            Cell::new(&m.shareholder_code),
        ]);
    }
    println!("Shareholder mappings\n{table}");
    Ok(())
}
