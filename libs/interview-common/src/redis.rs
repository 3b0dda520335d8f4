use crate::context::{apply_update, ClientContext, ContextError, ContextUpdate, UpdateOutcome};
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// Redis key semantics for the client context cache
/// Keys are deterministic so several API replicas share one cache

pub const CONTEXT_PREFIX: &str = "interview:context";

/// Generate the cache key for a client
pub fn context_key(client_id: &str) -> String {
    format!("{}:{}", CONTEXT_PREFIX, client_id)
}

/// Load a client's context, `None` when absent or expired
pub async fn load_context(
    conn: &mut ConnectionManager,
    client_id: &str,
) -> Result<Option<ClientContext>, ContextError> {
    let payload: Option<String> = conn.get(context_key(client_id)).await?;

    match payload {
        Some(data) => Ok(Some(serde_json::from_str(&data)?)),
        None => Ok(None),
    }
}

/// Store a client's context with a TTL
pub async fn store_context(
    conn: &mut ConnectionManager,
    client_id: &str,
    context: &ClientContext,
    ttl_secs: usize,
) -> Result<(), ContextError> {
    let payload = serde_json::to_string(context)?;
    let _: () = conn.set_ex(context_key(client_id), payload, ttl_secs as u64).await?;
    Ok(())
}

/// Redis-backed context cache
///
/// Read-merge-write is not atomic: two replicas updating the same client
/// race and the last write wins.
#[derive(Clone)]
pub struct RedisContextStore {
    conn: ConnectionManager,
    ttl_secs: usize,
}

impl RedisContextStore {
    pub async fn connect(redis_url: &str, ttl_secs: usize) -> Result<Self, ContextError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn, ttl_secs })
    }

    pub async fn get(&self, client_id: &str) -> Result<Option<ClientContext>, ContextError> {
        let mut conn = self.conn.clone();
        load_context(&mut conn, client_id).await
    }

    pub async fn update(
        &self,
        client_id: &str,
        update: ContextUpdate,
    ) -> Result<UpdateOutcome, ContextError> {
        let mut conn = self.conn.clone();
        let existing = load_context(&mut conn, client_id).await?;

        let (context, outcome) = apply_update(existing.as_ref(), update, Utc::now());
        if let Some(context) = context {
            store_context(&mut conn, client_id, &context, self.ttl_secs).await?;
        }
        Ok(outcome)
    }
}
