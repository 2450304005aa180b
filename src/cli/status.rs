use crate::db::get_connection;
use crate::delta::get_cursor;
use crate::error::Result;
use crate::fmt::{format_bytes, format_cursor};
use crate::repository::{DocRetryRepository, ShareholderMappingRepository};
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings()?;
    let db_path = settings.db_path();

    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    println!("Time zone:  {}", settings.marketplace_time_zone);
    println!("Max UBOs:   {}", settings.max_ubos);

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;
        println!();
        println!("Last sync:     {}", format_cursor(get_cursor(&conn)?));
        println!("Mappings:      {}", conn.all_mappings()?.len());
        println!("Pending docs:  {}", conn.all_pending()?.len());
    } else {
        println!();
        println!("Database not found. Run `shopsync init` to set up.");
    }

    Ok(())
}
