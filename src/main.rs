mod call;
mod reply;
mod store;
mod telemetry;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use store::storage::MemoryStorage;
use store::ConversationStore;
use telemetry::init_tracing;

#[cfg(feature = "sqlite-storage")]
use store::sqlite::{SqliteConfig, SqliteStorage};

fn open_storage() -> Result<Arc<dyn store::storage::StorageBackend>> {
    #[cfg(feature = "sqlite-storage")]
    {
        if let Some(path) = std::env::args().nth(1) {
            let storage = SqliteStorage::bootstrap(SqliteConfig::file(path))?;
            return Ok(Arc::new(storage));
        }
    }
    Ok(Arc::new(MemoryStorage::default()))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let store = ConversationStore::load(open_storage()?);
    for contact in store.contacts() {
        info!(
            target: "asiltcom",
            id = %contact.id,
            name = %contact.name,
            unread = contact.unread_count,
            "loaded contact"
        );
    }
    Ok(())
}
