//! Row and blob persistence boundary.
//!
//! The row store is a flat, append-oriented table service: it can hand out a
//! snapshot of every row in a table, append one row, and overwrite a row by
//! position. It offers no transactions, no uniqueness constraints and no
//! compare-and-swap, so anything that needs those guarantees has to build
//! them on top (see `services::submission_guard`).

pub mod memory;
pub(crate) mod redis;
pub mod retry;

use async_trait::async_trait;
use thiserror::Error;

/// One flat row. Column meaning is owned by the repository that encodes it.
pub type Row = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Exams,
    Submissions,
    Supports,
}

impl Table {
    pub fn as_str(self) -> &'static str {
        match self {
            Table::Exams => "exams",
            Table::Submissions => "submissions",
            Table::Supports => "supports",
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Transient I/O failure; the operation may be retried.
    #[error("row store unavailable: {0}")]
    Unavailable(String),
    #[error("row {index} does not exist in table {table}")]
    RowOutOfRange { table: &'static str, index: usize },
    #[error("corrupt stored data: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

#[async_trait]
pub trait RowStore: Send + Sync {
    /// Snapshot of every row in `table`, in append order. Eventually
    /// consistent with concurrent appends.
    async fn read_all(&self, table: Table) -> Result<Vec<Row>, StoreError>;

    async fn append(&self, table: Table, row: Row) -> Result<(), StoreError>;

    async fn update_at(&self, table: Table, index: usize, row: Row) -> Result<(), StoreError>;

    /// Short backend label for health reporting.
    fn backend(&self) -> &'static str;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `folder_key/name` and returns a link to it. The
    /// caller records only the link.
    async fn put_file(
        &self,
        folder_key: &str,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StoreError>;
}
