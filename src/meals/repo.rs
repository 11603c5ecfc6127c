#[cfg(test)]
use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool};
#[cfg(test)]
use tokio::sync::RwLock;
use tracing::warn;

use crate::nutrition::payload::decode_or_default;

/// Read/append access to a subject's stored meal-log container.
///
/// The container comes back exactly as stored: usually a JSON array, but
/// older rows may hold a JSON-encoded string.
#[async_trait]
pub trait MealLogStore: Send + Sync {
    async fn fetch_meal_records(&self, subject_id: i64) -> anyhow::Result<Option<Value>>;
    async fn append_meal_record(&self, subject_id: i64, record: Value) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgMealLogStore {
    db: PgPool,
}

impl PgMealLogStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MealLogStore for PgMealLogStore {
    async fn fetch_meal_records(&self, subject_id: i64) -> anyhow::Result<Option<Value>> {
        let row = sqlx::query_as::<_, (Value,)>(
            r#"
            SELECT entries
              FROM meal_logs
             WHERE subject_id = $1
            "#,
        )
        .bind(subject_id)
        .fetch_optional(&self.db)
        .await
        .context("fetch meal logs")?;
        Ok(row.map(|(entries,)| entries))
    }

    async fn append_meal_record(&self, subject_id: i64, record: Value) -> anyhow::Result<()> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        // make sure there is a row to lock, even for a subject's first meal
        sqlx::query(
            r#"
            INSERT INTO meal_logs (subject_id)
            VALUES ($1)
            ON CONFLICT (subject_id) DO NOTHING
            "#,
        )
        .bind(subject_id)
        .execute(&mut *tx)
        .await
        .context("ensure meal log row")?;

        let (current,) = sqlx::query_as::<_, (Value,)>(
            r#"
            SELECT entries
              FROM meal_logs
             WHERE subject_id = $1
               FOR UPDATE
            "#,
        )
        .bind(subject_id)
        .fetch_one(&mut *tx)
        .await
        .context("lock meal logs")?;

        let mut entries = into_entries(subject_id, Some(current));
        entries.push(record);

        sqlx::query(
            r#"
            UPDATE meal_logs
               SET entries = $2,
                   updated_at = now()
             WHERE subject_id = $1
            "#,
        )
        .bind(subject_id)
        .bind(Json(Value::Array(entries)))
        .execute(&mut *tx)
        .await
        .context("store meal logs")?;
        tx.commit().await.context("commit tx")?;
        Ok(())
    }
}

/// Existing entries as a list, decoding a string-encoded container.
/// A container that cannot be read as a list starts over empty.
fn into_entries(subject_id: i64, container: Option<Value>) -> Vec<Value> {
    match decode_or_default(container.as_ref()) {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        _ => {
            warn!(subject_id, "unreadable meal log container replaced");
            Vec::new()
        }
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct InMemoryMealLogStore {
    logs: RwLock<HashMap<i64, Value>>,
}

#[cfg(test)]
impl InMemoryMealLogStore {
    /// Seeds a subject's container verbatim, whatever shape it has.
    pub async fn put_raw(&self, subject_id: i64, container: Value) {
        self.logs.write().await.insert(subject_id, container);
    }
}

#[cfg(test)]
#[async_trait]
impl MealLogStore for InMemoryMealLogStore {
    async fn fetch_meal_records(&self, subject_id: i64) -> anyhow::Result<Option<Value>> {
        Ok(self.logs.read().await.get(&subject_id).cloned())
    }

    async fn append_meal_record(&self, subject_id: i64, record: Value) -> anyhow::Result<()> {
        let mut logs = self.logs.write().await;
        let mut entries = into_entries(subject_id, logs.remove(&subject_id));
        entries.push(record);
        logs.insert(subject_id, Value::Array(entries));
        Ok(())
    }
}
