//! Durable job queue backed by a Postgres table. Leasing uses
//! `SELECT ... FOR UPDATE SKIP LOCKED` so multiple worker processes can
//! poll the same queue without two of them ever observing the same job.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

pub const PAYMENT_PROCESSING: &str = "payment-processing";
pub const REFUND_PROCESSING: &str = "refund-processing";
pub const WEBHOOK_DELIVERY: &str = "webhook-delivery";

/// Per-queue retry policy applied by `fail()` when a worker raises an
/// exception instead of reporting an application-level outcome.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: i32,
    pub base_backoff_ms: i64,
}

impl RetryPolicy {
    /// `payment-processing` / `refund-processing`: the initial attempt
    /// plus 3 retries, exponential backoff starting at 1s (1s, 2s, 4s).
    /// `max_attempts` counts retries, not the initial attempt, so it sits
    /// one above the number of backoff delays consumed.
    pub const JOB_QUEUE: RetryPolicy = RetryPolicy {
        max_attempts: 4,
        base_backoff_ms: 1000,
    };

    /// `webhook-delivery`: the queue itself never retries. The worker
    /// manages its own retry schedule and always calls `complete()`, even
    /// on a failed delivery; a queue-level retry only fires on a genuine
    /// exception before the worker could record an outcome, and in that
    /// case the job is dead-lettered immediately rather than retried.
    pub const WEBHOOK_QUEUE: RetryPolicy = RetryPolicy {
        max_attempts: 1,
        base_backoff_ms: 0,
    };

    fn delay_ms(&self, attempts: i32) -> i64 {
        self.base_backoff_ms * (1i64 << (attempts - 1).max(0))
    }
}

pub fn retry_policy_for(queue: &str) -> RetryPolicy {
    if queue == WEBHOOK_DELIVERY {
        RetryPolicy::WEBHOOK_QUEUE
    } else {
        RetryPolicy::JOB_QUEUE
    }
}

/// A leased job: the worker owns it exclusively until `complete` or `fail`.
#[derive(Debug, Clone)]
pub struct Lease {
    pub job_id: Uuid,
    pub lease_token: Uuid,
    pub queue: String,
    pub attempts: i32,
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueCounts {
    pub waiting: i64,
    pub active: i64,
    pub completed: i64,
    pub failed: i64,
}

#[derive(Clone)]
pub struct Queue {
    pool: PgPool,
}

impl Queue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends `payload` to `queue_name`, visible after `delay` (or
    /// immediately if `None`).
    pub async fn enqueue(
        &self,
        queue_name: &str,
        payload: &Value,
        delay: Option<chrono::Duration>,
    ) -> Result<Uuid, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let id = Self::enqueue_in_tx(&mut tx, queue_name, payload, delay).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Same as `enqueue`, but participates in a caller-supplied
    /// transaction: the transactional-outbox path used by payment and
    /// refund creation so the job row and the business row either both
    /// commit or both roll back.
    pub async fn enqueue_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        queue_name: &str,
        payload: &Value,
        delay: Option<chrono::Duration>,
    ) -> Result<Uuid, sqlx::Error> {
        let available_at = Utc::now() + delay.unwrap_or_else(chrono::Duration::zero);
        let max_attempts = retry_policy_for(queue_name).max_attempts;

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO jobs (queue, payload, status, max_attempts, available_at)
            VALUES ($1, $2, 'waiting', $3, $4)
            RETURNING id
            "#,
        )
        .bind(queue_name)
        .bind(payload)
        .bind(max_attempts)
        .bind(available_at)
        .fetch_one(&mut **tx)
        .await?;

        Ok(id)
    }

    /// Atomically claims the oldest available job on `queue_name`, if any.
    pub async fn pull_and_lease(&self, queue_name: &str) -> Result<Option<Lease>, sqlx::Error> {
        let lease_token = Uuid::new_v4();
        let now = Utc::now();

        let row = sqlx::query_as::<_, (Uuid, i32, Value)>(
            r#"
            UPDATE jobs
            SET status = 'active', locked_at = $1, lease_token = $2, updated_at = $1
            WHERE id = (
                SELECT id FROM jobs
                WHERE queue = $3 AND status = 'waiting' AND available_at <= $1
                ORDER BY available_at ASC
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            RETURNING id, attempts, payload
            "#,
        )
        .bind(now)
        .bind(lease_token)
        .bind(queue_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(job_id, attempts, payload)| Lease {
            job_id,
            lease_token,
            queue: queue_name.to_string(),
            attempts,
            payload,
        }))
    }

    pub async fn complete(&self, lease: &Lease) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE jobs SET status = 'completed', updated_at = now()
            WHERE id = $1 AND lease_token = $2
            "#,
        )
        .bind(lease.job_id)
        .bind(lease.lease_token)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Returns the job to `waiting` with a backoff delay, or marks it
    /// `failed` once the queue's retry policy is exhausted.
    pub async fn fail(&self, lease: &Lease) -> Result<(), sqlx::Error> {
        let policy = retry_policy_for(&lease.queue);
        let attempts = lease.attempts + 1;

        if attempts >= policy.max_attempts {
            sqlx::query(
                r#"
                UPDATE jobs SET status = 'failed', attempts = $1, updated_at = now()
                WHERE id = $2 AND lease_token = $3
                "#,
            )
            .bind(attempts)
            .bind(lease.job_id)
            .bind(lease.lease_token)
            .execute(&self.pool)
            .await?;
        } else {
            let available_at = Utc::now() + chrono::Duration::milliseconds(policy.delay_ms(attempts));
            sqlx::query(
                r#"
                UPDATE jobs
                SET status = 'waiting', attempts = $1, available_at = $2, updated_at = now()
                WHERE id = $3 AND lease_token = $4
                "#,
            )
            .bind(attempts)
            .bind(available_at)
            .bind(lease.job_id)
            .bind(lease.lease_token)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    pub async fn counts(&self, queue_name: &str) -> Result<QueueCounts, sqlx::Error> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM jobs WHERE queue = $1 GROUP BY status",
        )
        .bind(queue_name)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = QueueCounts {
            waiting: 0,
            active: 0,
            completed: 0,
            failed: 0,
        };
        for (status, count) in rows {
            match status.as_str() {
                "waiting" => counts.waiting = count,
                "active" => counts.active = count,
                "completed" => counts.completed = count,
                "failed" => counts.failed = count,
                _ => {}
            }
        }
        Ok(counts)
    }
}

/// Indexed by "attempt number about to be tried" (1-based), per spec's
/// backoff table. Index 0 (attempt 1) is always immediate.
const PROD_BACKOFF_MS: [i64; 5] = [0, 60_000, 300_000, 1_800_000, 7_200_000];
const TEST_BACKOFF_MS: [i64; 5] = [0, 5_000, 10_000, 15_000, 20_000];

pub fn webhook_backoff_ms(use_test_table: bool, next_attempt: i32) -> i64 {
    let table = if use_test_table {
        &TEST_BACKOFF_MS
    } else {
        &PROD_BACKOFF_MS
    };
    let idx = (next_attempt - 1).clamp(0, table.len() as i32 - 1) as usize;
    table[idx]
}

pub fn next_retry_at(use_test_table: bool, next_attempt: i32) -> DateTime<Utc> {
    Utc::now() + chrono::Duration::milliseconds(webhook_backoff_ms(use_test_table, next_attempt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_queue_backoff_is_1_2_4_seconds() {
        let policy = RetryPolicy::JOB_QUEUE;
        assert_eq!(policy.delay_ms(1), 1000);
        assert_eq!(policy.delay_ms(2), 2000);
        assert_eq!(policy.delay_ms(3), 4000);
    }

    #[test]
    fn webhook_queue_never_retries() {
        assert_eq!(RetryPolicy::WEBHOOK_QUEUE.max_attempts, 1);
    }

    #[test]
    fn production_backoff_table_matches_spec() {
        assert_eq!(webhook_backoff_ms(false, 1), 0);
        assert_eq!(webhook_backoff_ms(false, 2), 60_000);
        assert_eq!(webhook_backoff_ms(false, 3), 300_000);
        assert_eq!(webhook_backoff_ms(false, 4), 1_800_000);
        assert_eq!(webhook_backoff_ms(false, 5), 7_200_000);
    }

    #[test]
    fn test_backoff_table_matches_spec() {
        assert_eq!(webhook_backoff_ms(true, 1), 0);
        assert_eq!(webhook_backoff_ms(true, 2), 5_000);
        assert_eq!(webhook_backoff_ms(true, 3), 10_000);
        assert_eq!(webhook_backoff_ms(true, 4), 15_000);
        assert_eq!(webhook_backoff_ms(true, 5), 20_000);
    }

    #[test]
    fn backoff_indices_beyond_five_are_never_consulted_but_clamp_safely() {
        assert_eq!(webhook_backoff_ms(false, 9), 7_200_000);
    }
}
