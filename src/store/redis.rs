use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{cmd, RedisError};

use super::{Row, RowStore, StoreError, Table};
use crate::core::redis::RedisHandle;

/// Row store backed by one Redis list per table. Each element is the row
/// encoded as a JSON array of strings; list position is the row index.
#[derive(Clone)]
pub(crate) struct RedisRowStore {
    redis: RedisHandle,
    prefix: String,
}

impl RedisRowStore {
    pub(crate) fn new(redis: RedisHandle, prefix: impl Into<String>) -> Self {
        Self { redis, prefix: prefix.into() }
    }

    fn key(&self, table: Table) -> String {
        format!("{}:{}", self.prefix, table.as_str())
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        self.redis
            .manager()
            .await
            .ok_or_else(|| StoreError::Unavailable("redis is not connected".to_string()))
    }
}

fn unavailable(err: RedisError) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn encode(row: &Row) -> Result<String, StoreError> {
    serde_json::to_string(row).map_err(|err| StoreError::Corrupt(err.to_string()))
}

/// Unparseable elements stay in place as empty rows so positions keep
/// matching list indices.
fn decode_rows(table: Table, raw: &[String]) -> Vec<Row> {
    raw.iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_str::<Row>(item).unwrap_or_else(|err| {
                tracing::warn!(table = table.as_str(), index, error = %err, "Skipping unparseable row");
                Row::new()
            })
        })
        .collect()
}

fn ensure_in_range(table: Table, index: usize, len: i64) -> Result<(), StoreError> {
    match i64::try_from(index) {
        Ok(position) if position < len => Ok(()),
        _ => Err(StoreError::RowOutOfRange { table: table.as_str(), index }),
    }
}

#[async_trait]
impl RowStore for RedisRowStore {
    async fn read_all(&self, table: Table) -> Result<Vec<Row>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Vec<String> = cmd("LRANGE")
            .arg(self.key(table))
            .arg(0)
            .arg(-1)
            .query_async::<_, Vec<String>>(&mut conn)
            .await
            .map_err(unavailable)?;

        Ok(decode_rows(table, &raw))
    }

    async fn append(&self, table: Table, row: Row) -> Result<(), StoreError> {
        let payload = encode(&row)?;
        let mut conn = self.connection().await?;
        cmd("RPUSH")
            .arg(self.key(table))
            .arg(payload)
            .query_async::<_, i64>(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn update_at(&self, table: Table, index: usize, row: Row) -> Result<(), StoreError> {
        let payload = encode(&row)?;
        let mut conn = self.connection().await?;
        let len: i64 = cmd("LLEN")
            .arg(self.key(table))
            .query_async::<_, i64>(&mut conn)
            .await
            .map_err(unavailable)?;

        ensure_in_range(table, index, len)?;

        cmd("LSET")
            .arg(self.key(table))
            .arg(index as i64)
            .arg(payload)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
