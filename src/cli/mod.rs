pub mod doctor;
pub mod feed;
pub mod vacuum;

use anyhow::Result;

use jotter::config::JotterConfig;
use jotter::db;
use jotter::store::Store;

/// Open the configured database behind a [`Store`] with the configured cache.
pub fn open_store(config: &JotterConfig) -> Result<Store> {
    let conn = db::open_database(config.resolved_db_path())?;
    Ok(Store::new(conn, &config.cache))
}
