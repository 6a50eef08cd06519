/// Usage ledger for stateless sessions
///
/// Individual session tokens carry their own quota, but a token is just
/// bytes: replaying an old token would otherwise reset the count. The ledger
/// keeps one counter per session id and is the authority on how many uses a
/// stateless session has consumed.
///
/// ## Atomicity
///
/// `consume` is a single conditional increment. The Redis implementation runs
/// it as a Lua script (one round trip, executed atomically by the server); the
/// in-memory implementation runs it under the `DashMap` entry lock.
///
/// ## Expiry
///
/// Counters expire with the session plus a short grace period, so the ledger
/// never grows beyond the set of live sessions.
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use redis::Script;
use redis_utils::SharedConnectionManager;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::debug;
use uuid::Uuid;

const USAGE_KEY_PREFIX: &str = "tryon:usage:";

/// Extra lifetime given to a counter past the session's own expiry
const LEDGER_GRACE_SECS: i64 = 60;

/// Purge expired in-memory counters once the map grows past this size
const MEMORY_PURGE_THRESHOLD: usize = 10_000;

/// Minimum spacing between two in-memory purges
const MEMORY_PURGE_INTERVAL_SECS: i64 = 30;

/// KEYS[1] = counter key, ARGV[1] = limit, ARGV[2] = ttl seconds
/// Returns the new count, or -1 when the limit was already reached
const CONSUME_SCRIPT: &str = r#"
local used = tonumber(redis.call('GET', KEYS[1]) or '0')
if used >= tonumber(ARGV[1]) then
  return -1
end
used = redis.call('INCR', KEYS[1])
if used == 1 then
  redis.call('EXPIRE', KEYS[1], ARGV[2])
end
return used
"#;

#[async_trait]
pub trait UsageLedger: Send + Sync {
    /// Consume one use of `session_id` if fewer than `limit` were consumed
    ///
    /// Returns the new consumed count, or `None` when the limit was reached.
    async fn consume(
        &self,
        session_id: Uuid,
        limit: u32,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<u32>>;

    /// Uses consumed so far, without changing anything
    async fn consumed(&self, session_id: Uuid) -> Result<u32>;
}

fn ledger_key(session_id: Uuid) -> String {
    format!("{USAGE_KEY_PREFIX}{session_id}")
}

fn ledger_ttl_secs(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (expires_at - now).num_seconds().max(0) + LEDGER_GRACE_SECS
}

/// Redis-backed ledger
pub struct RedisUsageLedger {
    redis: SharedConnectionManager,
    script: Script,
}

impl RedisUsageLedger {
    pub fn new(redis: SharedConnectionManager) -> Self {
        Self {
            redis,
            script: Script::new(CONSUME_SCRIPT),
        }
    }
}

#[async_trait]
impl UsageLedger for RedisUsageLedger {
    async fn consume(
        &self,
        session_id: Uuid,
        limit: u32,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<u32>> {
        let key = ledger_key(session_id);
        let ttl = ledger_ttl_secs(expires_at, Utc::now());
        let mut conn = self.redis.lock().await.clone();

        let used: i64 = redis_utils::with_timeout(
            self.script
                .key(&key)
                .arg(limit)
                .arg(ttl)
                .invoke_async(&mut conn),
        )
        .await?;

        debug!(session_id = %session_id, used, limit, "Usage ledger consume");

        if used < 0 {
            Ok(None)
        } else {
            Ok(Some(used as u32))
        }
    }

    async fn consumed(&self, session_id: Uuid) -> Result<u32> {
        let key = ledger_key(session_id);
        let mut conn = self.redis.lock().await.clone();

        let used: Option<u32> =
            redis_utils::with_timeout(redis::cmd("GET").arg(&key).query_async(&mut conn))
                .await?;
        Ok(used.unwrap_or(0))
    }
}

struct LedgerEntry {
    used: u32,
    purge_after: DateTime<Utc>,
}

/// Process-local ledger for tests and single-instance development
#[derive(Default)]
pub struct MemoryUsageLedger {
    entries: DashMap<Uuid, LedgerEntry>,
    /// Unix seconds of the last purge
    last_purge: AtomicI64,
}

impl MemoryUsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn used(&self, session_id: Uuid) -> u32 {
        self.entries.get(&session_id).map_or(0, |e| e.used)
    }

    /// Drop expired counters, at most once per purge interval
    fn maybe_purge(&self, now: DateTime<Utc>) {
        if self.entries.len() <= MEMORY_PURGE_THRESHOLD {
            return;
        }

        let last = self.last_purge.load(Ordering::Relaxed);
        let now_secs = now.timestamp();
        if now_secs - last < MEMORY_PURGE_INTERVAL_SECS {
            return;
        }
        // Only the caller that wins the swap purges
        if self
            .last_purge
            .compare_exchange(last, now_secs, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.purge_after > now);
        debug!(
            purged = before.saturating_sub(self.entries.len()),
            "Usage ledger purge"
        );
    }
}

#[async_trait]
impl UsageLedger for MemoryUsageLedger {
    async fn consume(
        &self,
        session_id: Uuid,
        limit: u32,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<u32>> {
        let now = Utc::now();
        self.maybe_purge(now);

        let mut entry = self.entries.entry(session_id).or_insert_with(|| LedgerEntry {
            used: 0,
            purge_after: now + Duration::seconds(ledger_ttl_secs(expires_at, now)),
        });

        if entry.used >= limit {
            return Ok(None);
        }

        entry.used += 1;
        Ok(Some(entry.used))
    }

    async fn consumed(&self, session_id: Uuid) -> Result<u32> {
        Ok(self.used(session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_ledger_key_and_ttl() {
        let id = Uuid::new_v4();
        assert_eq!(ledger_key(id), format!("tryon:usage:{id}"));

        let now = Utc::now();
        assert_eq!(ledger_ttl_secs(now + Duration::seconds(100), now), 160);
        assert_eq!(ledger_ttl_secs(now - Duration::seconds(100), now), 60);
    }

    #[tokio::test]
    async fn test_memory_ledger_counts_up_to_limit() {
        let ledger = MemoryUsageLedger::new();
        let id = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::minutes(15);

        assert_eq!(ledger.consume(id, 2, expires_at).await.unwrap(), Some(1));
        assert_eq!(ledger.consume(id, 2, expires_at).await.unwrap(), Some(2));
        assert_eq!(ledger.consume(id, 2, expires_at).await.unwrap(), None);
        assert_eq!(ledger.used(id), 2);
    }

    #[tokio::test]
    async fn test_consumed_reads_without_consuming() {
        let ledger = MemoryUsageLedger::new();
        let id = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::minutes(15);

        assert_eq!(ledger.consumed(id).await.unwrap(), 0);
        ledger.consume(id, 3, expires_at).await.unwrap();
        assert_eq!(ledger.consumed(id).await.unwrap(), 1);
        assert_eq!(ledger.consumed(id).await.unwrap(), 1);
    }

    #[test]
    fn test_purge_runs_at_most_once_per_interval() {
        let ledger = MemoryUsageLedger::new();
        let now = Utc::now();
        for _ in 0..=MEMORY_PURGE_THRESHOLD {
            ledger.entries.insert(
                Uuid::new_v4(),
                LedgerEntry {
                    used: 1,
                    purge_after: now - Duration::seconds(1),
                },
            );
        }

        ledger.maybe_purge(now);
        assert_eq!(ledger.entries.len(), 0);
        assert_eq!(ledger.last_purge.load(Ordering::Relaxed), now.timestamp());

        for _ in 0..=MEMORY_PURGE_THRESHOLD {
            ledger.entries.insert(
                Uuid::new_v4(),
                LedgerEntry {
                    used: 1,
                    purge_after: now - Duration::seconds(1),
                },
            );
        }
        ledger.maybe_purge(now + Duration::seconds(5));
        assert_eq!(ledger.entries.len(), MEMORY_PURGE_THRESHOLD + 1);

        ledger.maybe_purge(now + Duration::seconds(MEMORY_PURGE_INTERVAL_SECS));
        assert_eq!(ledger.entries.len(), 0);
    }

    #[tokio::test]
    async fn test_memory_ledger_concurrent_consumers() {
        let ledger = Arc::new(MemoryUsageLedger::new());
        let id = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::minutes(15);

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.consume(id, 3, expires_at).await.unwrap() })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                successes += 1;
            }
        }

        assert_eq!(successes, 3);
        assert_eq!(ledger.used(id), 3);
    }
}
