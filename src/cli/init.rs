use std::path::PathBuf;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings()?;
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    // validate before anything is written
    settings.engine_config()?;

    std::fs::create_dir_all(PathBuf::from(&settings.data_dir))?;
    let db_path = settings.db_path();
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;
    save_settings(&settings)?;

    println!("Data dir:  {}", settings.data_dir);
    println!("Database:  {}", db_path.display());
    if settings.marketplace.base_url.is_empty() || settings.payment_platform.base_url.is_empty() {
        println!();
        println!("Add marketplace and payment_platform credentials to ~/.config/shopsync/settings.json before syncing.");
    }
    Ok(())
}
