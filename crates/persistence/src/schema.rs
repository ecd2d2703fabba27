//! ScyllaDB schema creation

use crate::error::PersistenceError;
use scylla::Session;

pub async fn create_keyspace(
    session: &Session,
    keyspace: &str,
    replication_factor: u8,
) -> Result<(), PersistenceError> {
    let query = format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
        keyspace, replication_factor
    );

    session
        .query_unpaged(query, &[])
        .await
        .map_err(|e| PersistenceError::SchemaError(format!("Failed to create keyspace: {}", e)))?;

    Ok(())
}

pub async fn create_tables(session: &Session, keyspace: &str) -> Result<(), PersistenceError> {
    // Scoring fields are plain columns so one single-partition UPDATE covers
    // all of them; the profile travels as JSON.
    let leads_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.leads (
            lead_id TEXT,
            profile_json TEXT,
            status TEXT,
            score INT,
            score_breakdown_json TEXT,
            last_scored_at BIGINT,
            is_qualified BOOLEAN,
            qualified_at BIGINT,
            converted_at BIGINT,
            created_at BIGINT,
            updated_at BIGINT,
            PRIMARY KEY (lead_id)
        )
    "#,
        keyspace
    );

    session
        .query_unpaged(leads_table, &[])
        .await
        .map_err(|e| PersistenceError::SchemaError(format!("Failed to create leads table: {}", e)))?;

    let conversations_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.conversations (
            lead_id TEXT,
            created_at BIGINT,
            conversation_id UUID,
            duration_seconds INT,
            sentiment TEXT,
            intent TEXT,
            outcome TEXT,
            call_booked BOOLEAN,
            PRIMARY KEY ((lead_id), created_at, conversation_id)
        ) WITH CLUSTERING ORDER BY (created_at ASC, conversation_id ASC)
    "#,
        keyspace
    );

    session
        .query_unpaged(conversations_table, &[])
        .await
        .map_err(|e| {
            PersistenceError::SchemaError(format!("Failed to create conversations table: {}", e))
        })?;

    tracing::info!(keyspace = %keyspace, "Lead scoring tables created");
    Ok(())
}
