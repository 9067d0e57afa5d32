//! Transaction ledger of short-lived authorization transactions.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::AuthError;
use crate::models::auth::{Application, TransactionToken};
use crate::store::AcessoStore;

/// Interval between purges of expired transactions.
pub const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Record a new transaction.
pub async fn record(store: &dyn AcessoStore, token: &TransactionToken) -> Result<(), AuthError> {
    store.insert_transaction(token).await?;
    debug!(
        hashcode = %token.hashcode,
        username = %token.username,
        expire_at = %token.expire_at,
        "transaction recorded"
    );
    Ok(())
}

/// Fetch the live transaction for `(app, hashcode)`.
///
/// With `consume` set the match is deleted in the same step, so only one
/// caller can ever receive it.
pub async fn fetch_live(
    store: &dyn AcessoStore,
    app: &Application,
    hashcode: &str,
    now: DateTime<Utc>,
    consume: bool,
) -> Result<TransactionToken, AuthError> {
    let found = if consume {
        store.take_live_transaction(app.id, hashcode, now).await?
    } else {
        store.find_live_transaction(app.id, hashcode, now).await?
    };
    found.ok_or(AuthError::TransactionNotFoundOrExpired)
}

/// Delete every transaction that expired at or before `now`.
pub async fn purge_expired(store: &dyn AcessoStore, now: DateTime<Utc>) -> Result<u64, AuthError> {
    let removed = store.purge_expired_transactions(now).await?;
    if removed > 0 {
        info!(removed, "purged expired transactions");
    }
    Ok(removed)
}

/// Spawn a periodic purge task that stops when `cancel` fires.
pub fn spawn_purge_task(
    store: Arc<dyn AcessoStore>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = purge_expired(store.as_ref(), Utc::now()).await {
                        warn!(error = %e, "transaction purge failed");
                    }
                }
            }
        }
        debug!("transaction purge task stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    use crate::store::memory::MemoryStore;
    use crate::test_support::{seed_app, transaction_for};

    #[tokio::test]
    async fn fetch_live_respects_expiry() {
        let store = MemoryStore::new();
        let app = seed_app(&store).await;
        let now = Utc::now();
        let token = transaction_for(&app, "u1", now + ChronoDuration::minutes(10));
        record(&store, &token).await.unwrap();

        assert!(fetch_live(&store, &app, &token.hashcode, now, false).await.is_ok());
        assert!(matches!(
            fetch_live(&store, &app, &token.hashcode, token.expire_at, false).await,
            Err(AuthError::TransactionNotFoundOrExpired)
        ));
    }

    #[tokio::test]
    async fn consuming_fetch_succeeds_once() {
        let store = MemoryStore::new();
        let app = seed_app(&store).await;
        let now = Utc::now();
        let token = transaction_for(&app, "u1", now + ChronoDuration::minutes(10));
        record(&store, &token).await.unwrap();

        assert!(fetch_live(&store, &app, &token.hashcode, now, true).await.is_ok());
        assert!(fetch_live(&store, &app, &token.hashcode, now, true).await.is_err());
    }

    #[tokio::test]
    async fn purge_removes_only_expired() {
        let store = MemoryStore::new();
        let app = seed_app(&store).await;
        let now = Utc::now();
        let live = transaction_for(&app, "u1", now + ChronoDuration::minutes(10));
        let dead = transaction_for(&app, "u1", now - ChronoDuration::seconds(1));
        record(&store, &live).await.unwrap();
        record(&store, &dead).await.unwrap();

        assert_eq!(purge_expired(&store, now).await.unwrap(), 1);
        assert_eq!(store.transaction_count(), 1);
    }

    #[tokio::test]
    async fn purge_task_stops_on_cancel() {
        let store: Arc<dyn AcessoStore> = Arc::new(MemoryStore::new());
        let cancel = CancellationToken::new();
        let handle = spawn_purge_task(store, cancel.clone());
        cancel.cancel();
        handle.await.unwrap();
    }
}
