// Per-client interview context cache
//
// Holds the latest editor code and current question for each client so the
// interviewer model can be primed with them. The cache is advisory: it is
// capped, entries expire, and concurrent writers for the same client race
// with last-write-wins. Nothing in the grading pipeline reads it.

use crate::redis::RedisContextStore;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

/// Identical payloads arriving closer together than this are not stored again
pub const DEDUPE_WINDOW_MS: i64 = 1000;

/// Only the tail of the code participates in the payload hash
const HASH_SAMPLE_CHARS: usize = 1024;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientContext {
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub question: Option<Value>,
    pub last_hash: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextUpdate {
    pub code: String,
    pub language: String,
    pub question: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Stored { hash: String },
    /// Same payload as the previous update inside the dedupe window
    Skipped,
}

/// Cheap fingerprint of an update, used to drop rapid repeats
pub fn content_hash(update: &ContextUpdate) -> String {
    let question_id = match &update.question {
        Some(Value::Object(question)) => match question.get("id") {
            Some(id) if !id.is_null() => value_text(id),
            _ => {
                let field = |key: &str| question.get(key).map(value_text).unwrap_or_default();
                let args = question
                    .get("args")
                    .and_then(Value::as_array)
                    .map(|args| args.iter().map(value_text).collect::<Vec<_>>().join(","))
                    .unwrap_or_default();
                format!("{}|{}|{}", field("title"), field("function"), args)
            }
        },
        _ => "None".to_string(),
    };

    let chars: Vec<char> = update.code.chars().collect();
    let sample = &chars[chars.len().saturating_sub(HASH_SAMPLE_CHARS)..];
    let digest = sample
        .iter()
        .fold(5381u32, |h, ch| h.wrapping_shl(5).wrapping_add(h).wrapping_add(*ch as u32));

    format!(
        "{}|{}|{}|{}",
        chars.len(),
        update.language,
        question_id,
        digest
    )
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Merge an update into the existing entry
///
/// Returns the entry to persist, or `None` when the update is a repeat of the
/// previous one inside the dedupe window. A missing question keeps the
/// previously stored one.
pub fn apply_update(
    existing: Option<&ClientContext>,
    update: ContextUpdate,
    now: DateTime<Utc>,
) -> (Option<ClientContext>, UpdateOutcome) {
    let hash = content_hash(&update);

    if let Some(previous) = existing {
        let within_window = now - previous.updated_at < Duration::milliseconds(DEDUPE_WINDOW_MS);
        if previous.last_hash == hash && within_window {
            return (None, UpdateOutcome::Skipped);
        }
    }

    let question = update
        .question
        .or_else(|| existing.and_then(|previous| previous.question.clone()));

    let context = ClientContext {
        code: update.code,
        language: update.language,
        question,
        last_hash: hash.clone(),
        updated_at: now,
    };
    (Some(context), UpdateOutcome::Stored { hash })
}

/// In-process cache, capped and time-boxed
pub struct MemoryContextStore {
    entries: RwLock<HashMap<String, ClientContext>>,
    capacity: usize,
    ttl: Duration,
}

impl MemoryContextStore {
    pub fn new(capacity: usize, ttl_secs: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    pub fn get(&self, client_id: &str) -> Option<ClientContext> {
        self.get_at(client_id, Utc::now())
    }

    pub fn update(&self, client_id: &str, update: ContextUpdate) -> UpdateOutcome {
        self.update_at(client_id, update, Utc::now())
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_live(&self, context: &ClientContext, now: DateTime<Utc>) -> bool {
        now - context.updated_at < self.ttl
    }

    fn get_at(&self, client_id: &str, now: DateTime<Utc>) -> Option<ClientContext> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(client_id)
            .filter(|context| self.is_live(context, now))
            .cloned()
    }

    fn update_at(&self, client_id: &str, update: ContextUpdate, now: DateTime<Utc>) -> UpdateOutcome {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());

        entries.retain(|_, context| now - context.updated_at < self.ttl);

        let (context, outcome) = apply_update(entries.get(client_id), update, now);
        if let Some(context) = context {
            entries.insert(client_id.to_string(), context);
        }

        while entries.len() > self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, context)| context.updated_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    entries.remove(&key);
                }
                None => break,
            }
        }

        outcome
    }
}

/// Context cache backend selected at startup
pub enum ContextStore {
    Memory(MemoryContextStore),
    Redis(RedisContextStore),
}

impl ContextStore {
    pub async fn get(&self, client_id: &str) -> Result<Option<ClientContext>, ContextError> {
        match self {
            ContextStore::Memory(store) => Ok(store.get(client_id)),
            ContextStore::Redis(store) => store.get(client_id).await,
        }
    }

    pub async fn update(
        &self,
        client_id: &str,
        update: ContextUpdate,
    ) -> Result<UpdateOutcome, ContextError> {
        match self {
            ContextStore::Memory(store) => Ok(store.update(client_id, update)),
            ContextStore::Redis(store) => store.update(client_id, update).await,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            ContextStore::Memory(_) => "memory",
            ContextStore::Redis(_) => "redis",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(code: &str) -> ContextUpdate {
        ContextUpdate {
            code: code.to_string(),
            language: "python".to_string(),
            question: None,
        }
    }

    #[test]
    fn test_content_hash_shape() {
        let hash = content_hash(&update("abc"));
        assert!(hash.starts_with("3|python|None|"));
    }

    #[test]
    fn test_content_hash_djb2() {
        // djb2 of "a": 5381 * 33 + 97
        assert_eq!(content_hash(&update("a")), "1|python|None|177670");
    }

    #[test]
    fn test_content_hash_question_identity() {
        let mut with_id = update("x");
        with_id.question = Some(json!({"id": "two-sum", "title": "Two Sum"}));
        assert!(content_hash(&with_id).contains("|two-sum|"));

        let mut without_id = update("x");
        without_id.question = Some(json!({"title": "Two Sum", "function": "twoSum", "args": ["nums", "target"]}));
        assert!(content_hash(&without_id).contains("|Two Sum|twoSum|nums,target|"));
    }

    #[test]
    fn test_content_hash_only_samples_tail() {
        let long_a = format!("{}{}", "a".repeat(10), "z".repeat(HASH_SAMPLE_CHARS));
        let long_b = format!("{}{}", "b".repeat(10), "z".repeat(HASH_SAMPLE_CHARS));
        let hash_a = content_hash(&update(&long_a));
        let hash_b = content_hash(&update(&long_b));
        assert_eq!(hash_a, hash_b);
    }

    #[test]
    fn test_repeat_inside_window_is_skipped() {
        let store = MemoryContextStore::new(8, 60);
        let now = Utc::now();
        assert!(matches!(
            store.update_at("c1", update("print(1)"), now),
            UpdateOutcome::Stored { .. }
        ));
        assert_eq!(
            store.update_at("c1", update("print(1)"), now + Duration::milliseconds(200)),
            UpdateOutcome::Skipped
        );
        assert!(matches!(
            store.update_at("c1", update("print(1)"), now + Duration::milliseconds(1500)),
            UpdateOutcome::Stored { .. }
        ));
    }

    #[test]
    fn test_question_is_kept_across_updates() {
        let store = MemoryContextStore::new(8, 60);
        let now = Utc::now();
        let mut first = update("a");
        first.question = Some(json!({"title": "Two Sum"}));
        store.update_at("c1", first, now);
        store.update_at("c1", update("b"), now + Duration::seconds(2));

        let context = store.get_at("c1", now + Duration::seconds(2)).unwrap();
        assert_eq!(context.code, "b");
        assert_eq!(context.question, Some(json!({"title": "Two Sum"})));
    }

    #[test]
    fn test_entries_expire() {
        let store = MemoryContextStore::new(8, 10);
        let now = Utc::now();
        store.update_at("c1", update("a"), now);
        assert!(store.get_at("c1", now + Duration::seconds(5)).is_some());
        assert!(store.get_at("c1", now + Duration::seconds(11)).is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let store = MemoryContextStore::new(2, 60);
        let now = Utc::now();
        store.update_at("c1", update("a"), now);
        store.update_at("c2", update("b"), now + Duration::seconds(1));
        store.update_at("c3", update("c"), now + Duration::seconds(2));

        assert_eq!(store.len(), 2);
        assert!(store.get_at("c1", now + Duration::seconds(2)).is_none());
        assert!(store.get_at("c3", now + Duration::seconds(2)).is_some());
    }

    #[tokio::test]
    async fn test_memory_backend_through_store_enum() {
        let store = ContextStore::Memory(MemoryContextStore::new(4, 60));
        assert_eq!(store.backend_name(), "memory");
        assert!(store.get("missing").await.unwrap().is_none());
        store.update("c1", update("def f(): pass")).await.unwrap();
        let context = store.get("c1").await.unwrap().unwrap();
        assert_eq!(context.language, "python");
    }
}
