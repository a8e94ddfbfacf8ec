use std::future::Future;
use std::time::Duration;

use rand::Rng;

use super::{Row, RowStore, StoreError, Table};

/// Bounded exponential backoff for transient row-store failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn no_delay(max_attempts: u32) -> Self {
        Self { max_attempts, base_delay: Duration::ZERO, max_delay: Duration::ZERO }
    }

    /// Delay before attempt `attempt + 1` (attempts count from 1), with up to
    /// 50% jitter added on top of the capped exponential step.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.saturating_mul(1u32 << attempt.saturating_sub(1).min(16));
        let capped = exp.min(self.max_delay);
        let jitter_ms = capped.as_millis() as u64 / 2;
        if jitter_ms == 0 {
            return capped;
        }
        let jitter = rand::thread_rng().gen_range(0..=jitter_ms);
        capped + Duration::from_millis(jitter)
    }

    /// Runs `op` until it succeeds, fails with a non-transient error, or the
    /// attempt budget is spent.
    pub async fn run<T, F, Fut>(&self, label: &'static str, mut op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_attempts.max(1) => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        op = label,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Row store call failed; retrying"
                    );
                    metrics::counter!("row_store_retries_total", "op" => label).increment(1);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Appends `row` at most once. A failed append can still have landed, so
    /// before every retry the table is re-read and the append is treated as
    /// done if a row matching `is_same` is already there.
    pub async fn append_once<F>(
        &self,
        store: &dyn RowStore,
        table: Table,
        row: Row,
        is_same: F,
    ) -> Result<(), StoreError>
    where
        F: Fn(&Row) -> bool,
    {
        let mut attempt = 1;
        loop {
            match store.append(table, row.clone()).await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_transient() && attempt < self.max_attempts.max(1) => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        table = table.as_str(),
                        attempt,
                        error = %err,
                        "Append failed; checking whether it landed before retrying"
                    );
                    metrics::counter!("row_store_retries_total", "op" => "append").increment(1);
                    tokio::time::sleep(delay).await;

                    let rows = self.run("read_all", move || store.read_all(table)).await?;
                    if rows.iter().any(|existing| is_same(existing)) {
                        tracing::info!(table = table.as_str(), "Append had landed despite the error");
                        return Ok(());
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::no_delay(3);

        let result = policy
            .run("read", move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(StoreError::Unavailable("flaky".into()))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_budget() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::no_delay(2);

        let result: Result<(), _> = policy
            .run("read", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::Unavailable("down".into()))
            })
            .await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::no_delay(5);

        let result: Result<(), _> = policy
            .run("update", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::RowOutOfRange { table: "exams", index: 9 })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(400),
        };
        assert!(policy.backoff(1) >= Duration::from_millis(100));
        assert!(policy.backoff(8) <= Duration::from_millis(600));
    }
}
