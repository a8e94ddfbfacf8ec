use crate::core::time::{format_offset, parse_rfc3339};
use crate::models::SupportFile;
use crate::store::retry::RetryPolicy;
use crate::store::{Row, RowStore, StoreError, Table};

pub(crate) const COLUMNS: usize = 6;

pub(crate) fn encode(file: &SupportFile) -> Row {
    vec![
        file.exam_id.clone(),
        file.file_name.clone(),
        file.link.clone(),
        format_offset(file.uploaded_at),
        file.sha256.clone(),
        file.size_bytes.to_string(),
    ]
}

pub(crate) fn decode(row: &Row) -> Result<SupportFile, StoreError> {
    let [exam_id, file_name, link, uploaded_at, sha256, size_bytes] = row.as_slice() else {
        return Err(StoreError::Corrupt(format!(
            "support row has {} columns, expected {COLUMNS}",
            row.len()
        )));
    };

    Ok(SupportFile {
        exam_id: exam_id.trim().to_string(),
        file_name: file_name.clone(),
        link: link.clone(),
        uploaded_at: parse_rfc3339(uploaded_at)
            .ok_or_else(|| StoreError::Corrupt(format!("bad uploaded_at '{uploaded_at}'")))?,
        sha256: sha256.clone(),
        size_bytes: size_bytes
            .trim()
            .parse()
            .map_err(|_| StoreError::Corrupt(format!("bad size_bytes '{size_bytes}'")))?,
    })
}

pub(crate) async fn insert(
    store: &dyn RowStore,
    retry: &RetryPolicy,
    file: &SupportFile,
) -> Result<(), StoreError> {
    let row = encode(file);
    let expected = row.clone();
    retry.append_once(store, Table::Supports, row, |existing| *existing == expected).await
}

pub(crate) async fn list_for_exam(
    store: &dyn RowStore,
    retry: &RetryPolicy,
    exam_id: &str,
) -> Result<Vec<SupportFile>, StoreError> {
    let rows = retry.run("read_supports", move || store.read_all(Table::Supports)).await?;
    Ok(rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.first().map(|v| v.trim()) == Some(exam_id))
        .filter_map(|(index, row)| match decode(row) {
            Ok(file) => Some(file),
            Err(err) => {
                tracing::warn!(index, exam_id, error = %err, "Skipping undecodable support row");
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryRowStore;
    use time::macros::datetime;

    fn file(exam_id: &str, name: &str) -> SupportFile {
        SupportFile {
            exam_id: exam_id.into(),
            file_name: name.into(),
            link: format!("memory://{exam_id}/{name}"),
            uploaded_at: datetime!(2025-04-01 08:00:00 UTC),
            sha256: "ab".repeat(32),
            size_bytes: 2048,
        }
    }

    #[tokio::test]
    async fn lists_only_the_requested_exam() {
        let store = MemoryRowStore::default();
        let retry = RetryPolicy::no_delay(1);
        insert(&store, &retry, &file("e1", "guide.pdf")).await.unwrap();
        insert(&store, &retry, &file("e2", "other.pdf")).await.unwrap();
        store.append(Table::Supports, vec!["e1".into(), "broken".into()]).await.unwrap();

        let listed = list_for_exam(&store, &retry, "e1").await.unwrap();
        assert_eq!(listed, vec![file("e1", "guide.pdf")]);
    }
}
