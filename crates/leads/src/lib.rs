//! Lead storage backends for LeadChat.

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryLeadStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteLeadStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresLeadStore;

use std::sync::Arc;

use leadchat_config::LeadsConfig;
use leadchat_core::error::LeadError;
use leadchat_core::lead::LeadStore;

/// Open the store selected by the configured database URL.
///
/// `memory` selects the in-memory store, `sqlite:` URLs the SQLite store and
/// `postgres://` / `postgresql://` URLs the PostgreSQL store. A scheme whose
/// feature is compiled out is reported as a storage error.
pub async fn open_store(config: &LeadsConfig) -> Result<Arc<dyn LeadStore>, LeadError> {
    let url = config.database_url();

    if url == "memory" {
        return Ok(Arc::new(InMemoryLeadStore::new()));
    }

    if url.starts_with("sqlite:") {
        #[cfg(feature = "sqlite")]
        {
            if let Some(parent) = sqlite_parent_dir(&url) {
                std::fs::create_dir_all(&parent).map_err(|e| {
                    LeadError::Storage(format!("Cannot create {}: {e}", parent.display()))
                })?;
            }
            return Ok(Arc::new(SqliteLeadStore::new(&url).await?));
        }
        #[cfg(not(feature = "sqlite"))]
        return Err(LeadError::Storage(
            "SQLite support not compiled in (enable the `sqlite` feature)".into(),
        ));
    }

    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        #[cfg(feature = "postgres")]
        {
            return Ok(Arc::new(PostgresLeadStore::connect(&url).await?));
        }
        #[cfg(not(feature = "postgres"))]
        return Err(LeadError::Storage(
            "PostgreSQL support not compiled in (enable the `postgres` feature)".into(),
        ));
    }

    Err(LeadError::Storage(format!(
        "Unsupported database URL scheme: {}",
        url.split(':').next().unwrap_or_default()
    )))
}

/// Directory that must exist before SQLite can create the database file.
#[cfg(feature = "sqlite")]
fn sqlite_parent_dir(url: &str) -> Option<std::path::PathBuf> {
    let path = url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();
    if path.is_empty() || path.contains(":memory:") {
        return None;
    }
    std::path::Path::new(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
}
