//! Note storage with a read-through entity cache, orphan vacuuming, and RSS feeds.
//!
//! # Architecture
//!
//! - **Storage**: SQLite, one table per entity kind, no cross-table foreign keys
//! - **Cache**: bounded per-kind `moka` caches, invalidated after every committed write
//! - **Vacuum**: one transaction that purges rows orphaned by deleted notes and users,
//!   followed by a best-effort `VACUUM`
//! - **Feed**: RSS 2.0 built from public notes, markdown rendered to HTML
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, migrations, and health checks
//! - [`error`]: The [`StoreError`](error::StoreError) taxonomy
//! - [`store`]: The [`Store`](store::Store) facade, entity kinds, cache, and vacuum
//! - [`feed`]: Feed composition and the site profile read-through

pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod store;
