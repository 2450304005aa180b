pub mod documents;
pub mod init;
pub mod mappings;
pub mod pending;
pub mod status;
pub mod sync;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db::{get_connection, init_db};
use crate::error::{Result, SyncError};
use crate::settings::Settings;

/// Opens the configured database, refusing to create one outside `init`.
pub(crate) fn open_db(settings: &Settings) -> Result<Connection> {
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Err(SyncError::Other(format!(
            "Database not found at {}. Run `shopsync init` first.",
            db_path.display()
        )));
    }
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;
    Ok(conn)
}

#[derive(Parser)]
#[command(
    name = "shopsync",
    about = "Keeps marketplace sellers and payment-platform account holders in sync."
)]
pub struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write settings and create the sync database.
    Init {
        /// Path for shopsync data (default: ~/Documents/shopsync)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Reconcile every shop changed since the last run.
    Sync,
    /// Classify and upload identity documents for the given shops.
    Documents {
        /// Marketplace shop ids
        #[arg(required = true)]
        shop_ids: Vec<String>,
    },
    /// List persisted shareholder mappings.
    Mappings {
        /// Only this shop's mappings
        #[arg(long)]
        shop: Option<String>,
    },
    /// List documents waiting for a retry.
    Pending,
    /// Show data location, sync cursor and queue sizes.
    Status,
}
