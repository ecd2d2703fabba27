//! Persistence layer for the lead scoring engine
//!
//! Provides storage for:
//! - Leads, including the atomic score update
//! - Conversations (immutable interaction records)
//!
//! `InMemoryLeadStore` / `InMemoryConversationStore` are the default;
//! ScyllaDB-backed stores are used when persistence is enabled.

pub mod client;
pub mod error;
pub mod memory;
pub mod scylla_store;
pub mod schema;

pub use client::{ScyllaClient, ScyllaConfig};
pub use error::PersistenceError;
pub use memory::{InMemoryConversationStore, InMemoryLeadStore};
pub use scylla_store::{ScyllaConversationStore, ScyllaLeadStore};

/// Initialize the ScyllaDB persistence layer
pub async fn init(config: ScyllaConfig) -> Result<PersistenceLayer, PersistenceError> {
    let client = ScyllaClient::connect(config).await?;
    client.ensure_schema().await?;

    Ok(PersistenceLayer {
        leads: ScyllaLeadStore::new(client.clone()),
        conversations: ScyllaConversationStore::new(client),
    })
}

/// Combined ScyllaDB-backed stores
pub struct PersistenceLayer {
    pub leads: ScyllaLeadStore,
    pub conversations: ScyllaConversationStore,
}
