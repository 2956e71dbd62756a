use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store i/o: {0}")]
    Io(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Per-user document store. Every document carries a monotonic version;
/// concurrent writers resolve by last-writer-wins-by-version, so a write
/// carrying a stale version is dropped instead of clobbering a newer one.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, user_id: Uuid, key: &str) -> StoreResult<Option<Value>>;

    /// Write `doc` at an explicit version. Returns false when the stored
    /// version is already >= `version` and the write was dropped.
    async fn put(&self, user_id: Uuid, key: &str, doc: Value, version: i64) -> StoreResult<bool>;

    /// Write `doc` on top of whatever is stored, bumping the version
    /// atomically. Returns the new version.
    async fn put_latest(&self, user_id: Uuid, key: &str, doc: Value) -> StoreResult<i64>;

    async fn delete(&self, user_id: Uuid, key: &str) -> StoreResult<()>;

    /// All documents whose key starts with `prefix`, ordered by key.
    async fn list(&self, user_id: Uuid, prefix: &str) -> StoreResult<Vec<(String, Value)>>;
}

/// Decode a stored document, treating a malformed payload the same as an
/// absent one: log and fall back to defaults rather than failing the screen.
pub fn decode_or_default<T: DeserializeOwned + Default>(doc: Option<Value>, key: &str) -> T {
    match doc {
        None => T::default(),
        Some(value) => match serde_json::from_value(value) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(error = %e, key, "malformed stored document, using defaults");
                T::default()
            }
        },
    }
}

pub struct PgDocumentStore {
    db: PgPool,
}

impl PgDocumentStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, user_id: Uuid, key: &str) -> StoreResult<Option<Value>> {
        let doc = sqlx::query_scalar::<_, Value>(
            r#"
            SELECT doc FROM documents
            WHERE user_id = $1 AND key = $2
            "#,
        )
        .bind(user_id)
        .bind(key)
        .fetch_optional(&self.db)
        .await?;
        Ok(doc)
    }

    async fn put(&self, user_id: Uuid, key: &str, doc: Value, version: i64) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO documents (user_id, key, doc, version)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, key) DO UPDATE
            SET doc = EXCLUDED.doc, version = EXCLUDED.version, updated_at = now()
            WHERE documents.version < EXCLUDED.version
            "#,
        )
        .bind(user_id)
        .bind(key)
        .bind(doc)
        .bind(version)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn put_latest(&self, user_id: Uuid, key: &str, doc: Value) -> StoreResult<i64> {
        let version = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO documents (user_id, key, doc, version)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (user_id, key) DO UPDATE
            SET doc = EXCLUDED.doc, version = documents.version + 1, updated_at = now()
            RETURNING version
            "#,
        )
        .bind(user_id)
        .bind(key)
        .bind(doc)
        .fetch_one(&self.db)
        .await?;
        Ok(version)
    }

    async fn delete(&self, user_id: Uuid, key: &str) -> StoreResult<()> {
        sqlx::query(r#"DELETE FROM documents WHERE user_id = $1 AND key = $2"#)
            .bind(user_id)
            .bind(key)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn list(&self, user_id: Uuid, prefix: &str) -> StoreResult<Vec<(String, Value)>> {
        let rows = sqlx::query_as::<_, (String, Value)>(
            r#"
            SELECT key, doc FROM documents
            WHERE user_id = $1 AND key LIKE $2
            ORDER BY key
            "#,
        )
        .bind(user_id)
        .bind(format!("{prefix}%"))
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}

/// In-memory store with the same version semantics, for unit tests.
#[derive(Default)]
pub struct MemoryStore {
    docs: std::sync::Mutex<std::collections::BTreeMap<(Uuid, String), (i64, Value)>>,
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, user_id: Uuid, key: &str) -> StoreResult<Option<Value>> {
        let docs = self.docs.lock().unwrap();
        Ok(docs.get(&(user_id, key.to_string())).map(|(_, v)| v.clone()))
    }

    async fn put(&self, user_id: Uuid, key: &str, doc: Value, version: i64) -> StoreResult<bool> {
        let mut docs = self.docs.lock().unwrap();
        let slot = (user_id, key.to_string());
        match docs.get(&slot) {
            Some((stored, _)) if *stored >= version => Ok(false),
            _ => {
                docs.insert(slot, (version, doc));
                Ok(true)
            }
        }
    }

    async fn put_latest(&self, user_id: Uuid, key: &str, doc: Value) -> StoreResult<i64> {
        let mut docs = self.docs.lock().unwrap();
        let slot = (user_id, key.to_string());
        let next = docs.get(&slot).map(|(v, _)| v + 1).unwrap_or(1);
        docs.insert(slot, (next, doc));
        Ok(next)
    }

    async fn delete(&self, user_id: Uuid, key: &str) -> StoreResult<()> {
        let mut docs = self.docs.lock().unwrap();
        docs.remove(&(user_id, key.to_string()));
        Ok(())
    }

    async fn list(&self, user_id: Uuid, prefix: &str) -> StoreResult<Vec<(String, Value)>> {
        let docs = self.docs.lock().unwrap();
        Ok(docs
            .iter()
            .filter(|((uid, key), _)| *uid == user_id && key.starts_with(prefix))
            .map(|((_, key), (_, doc))| (key.clone(), doc.clone()))
            .collect())
    }
}
