use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BlobStore, Row, RowStore, StoreError, Table};

/// Process-local row store. Used for development and tests; nothing survives
/// a restart.
#[derive(Debug, Default)]
pub struct MemoryRowStore {
    tables: RwLock<HashMap<Table, Vec<Row>>>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn read_all(&self, table: Table) -> Result<Vec<Row>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.get(&table).cloned().unwrap_or_default())
    }

    async fn append(&self, table: Table, row: Row) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.entry(table).or_default().push(row);
        Ok(())
    }

    async fn update_at(&self, table: Table, index: usize, row: Row) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .get_mut(&table)
            .and_then(|rows| rows.get_mut(index))
            .ok_or(StoreError::RowOutOfRange { table: table.as_str(), index })?;
        *slot = row;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Blob store that keeps files in memory and hands out `memory://` links.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.files.read().await.get(key).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put_file(
        &self,
        folder_key: &str,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StoreError> {
        let key = format!("{folder_key}/{name}");
        self.files.write().await.insert(key.clone(), bytes);
        Ok(format!("memory://{key}"))
    }
}
