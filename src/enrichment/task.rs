//! Background enrichment: resolve an attribute, then upsert it.
//!
//! Enrichment is best-effort: failures are logged and dropped, never
//! surfaced to the dialog.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::resolver::Resolver;
use crate::error::ResolutionError;
use crate::store::{UserRecord, UserRecordStore};

/// Name stored when the user has no display name.
pub const UNKNOWN_DISPLAY_NAME: &str = "Unknown";

/// Retry budget for a single resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Upper bound on a single attempt.
    pub attempt_timeout: Duration,
    /// Fixed wait between a failed attempt and the next one.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            attempt_timeout: Duration::from_secs(10),
            backoff: Duration::from_secs(1),
        }
    }
}

/// Something that can start enrichment for a user without waiting on it.
pub trait EnrichmentScheduler: Send + Sync {
    /// Start enrichment in the background. Must not block.
    fn schedule(&self, user_id: &str, display_name: Option<&str>);
}

/// Resolves an attribute and writes it to the record store.
///
/// Cheap to clone; clones share the resolver and the store.
#[derive(Clone)]
pub struct Enricher {
    resolver: Arc<dyn Resolver>,
    store: Arc<UserRecordStore>,
    policy: RetryPolicy,
}

impl Enricher {
    pub fn new(
        resolver: Arc<dyn Resolver>,
        store: Arc<UserRecordStore>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            resolver,
            store,
            policy,
        }
    }

    /// Resolve the attribute, retrying within the policy budget.
    ///
    /// Returns `None` once every attempt has failed.
    pub async fn resolve_attribute(&self) -> Option<String> {
        let attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=attempts {
            let attempt_result =
                tokio::time::timeout(self.policy.attempt_timeout, self.resolver.resolve()).await;
            let result = match attempt_result {
                Ok(result) => result,
                Err(_) => Err(ResolutionError::Timeout(self.policy.attempt_timeout)),
            };

            match result {
                Ok(value) => {
                    tracing::debug!(resolver = self.resolver.name(), attempt, "Attribute resolved");
                    return Some(value);
                }
                Err(e) => {
                    tracing::warn!(
                        resolver = self.resolver.name(),
                        attempt,
                        max_attempts = attempts,
                        "Attribute resolution failed: {e}"
                    );
                    if attempt < attempts {
                        tokio::time::sleep(self.policy.backoff).await;
                    }
                }
            }
        }

        tracing::warn!(resolver = self.resolver.name(), "Giving up on attribute resolution");
        None
    }

    /// Run one enrichment to completion: resolve, then upsert.
    ///
    /// Returns the stored record, or `None` if nothing was written.
    pub async fn run(&self, user_id: &str, display_name: Option<&str>) -> Option<UserRecord> {
        let value = self.resolve_attribute().await?;
        let name = display_name.unwrap_or(UNKNOWN_DISPLAY_NAME);

        match self.store.upsert(user_id, Some(name), Some(&value)).await {
            Ok(record) => {
                tracing::info!(user_id = %user_id, "User record enriched");
                Some(record)
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, "Failed to save enriched user record: {e}");
                None
            }
        }
    }

    /// Spawn [`Enricher::run`] as an independent task.
    ///
    /// The handle may be dropped; the task keeps running either way.
    pub fn spawn(
        &self,
        user_id: &str,
        display_name: Option<&str>,
    ) -> JoinHandle<Option<UserRecord>> {
        let this = self.clone();
        let user_id = user_id.to_string();
        let display_name = display_name.map(String::from);
        tokio::spawn(async move { this.run(&user_id, display_name.as_deref()).await })
    }
}

impl EnrichmentScheduler for Enricher {
    fn schedule(&self, user_id: &str, display_name: Option<&str>) {
        let _ = self.spawn(user_id, display_name);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;

    /// Fails the first `failures` calls, then returns `value`.
    struct FlakyResolver {
        failures: u32,
        value: String,
        calls: AtomicU32,
    }

    impl FlakyResolver {
        fn new(failures: u32, value: &str) -> Self {
            Self {
                failures,
                value: value.to_string(),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Resolver for FlakyResolver {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn resolve(&self) -> Result<String, ResolutionError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(ResolutionError::Request("connection reset".into()))
            } else {
                Ok(self.value.clone())
            }
        }
    }

    /// Never answers.
    struct HangingResolver {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Resolver for HangingResolver {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn resolve(&self) -> Result<String, ResolutionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            attempt_timeout: Duration::from_millis(50),
            backoff: Duration::from_millis(5),
        }
    }

    fn test_store() -> (Arc<UserRecordStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(UserRecordStore::new(dir.path().join("user_data.json")));
        (store, dir)
    }

    #[tokio::test]
    async fn first_attempt_success_writes_record() {
        let (store, _dir) = test_store();
        let resolver = Arc::new(FlakyResolver::new(0, "198.51.100.1"));
        let enricher = Enricher::new(resolver.clone(), store.clone(), fast_policy());

        let record = enricher.run("42", Some("alice")).await.unwrap();
        assert_eq!(record.resolved_attribute.as_deref(), Some("198.51.100.1"));
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.records().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn retries_once_after_transient_failure() {
        let (store, _dir) = test_store();
        let resolver = Arc::new(FlakyResolver::new(1, "198.51.100.2"));
        let enricher = Enricher::new(resolver.clone(), store, fast_policy());

        assert_eq!(enricher.resolve_attribute().await.as_deref(), Some("198.51.100.2"));
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_budget_and_writes_nothing() {
        let (store, _dir) = test_store();
        let resolver = Arc::new(FlakyResolver::new(u32::MAX, "never"));
        let enricher = Enricher::new(resolver.clone(), store.clone(), fast_policy());

        assert!(enricher.run("42", Some("alice")).await.is_none());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
        assert!(store.records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn timeout_counts_as_failed_attempt() {
        let (store, _dir) = test_store();
        let resolver = Arc::new(HangingResolver {
            calls: AtomicU32::new(0),
        });
        let enricher = Enricher::new(resolver.clone(), store, fast_policy());

        assert!(enricher.resolve_attribute().await.is_none());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn missing_display_name_is_stored_as_unknown() {
        let (store, _dir) = test_store();
        let resolver = Arc::new(FlakyResolver::new(0, "198.51.100.3"));
        let enricher = Enricher::new(resolver, store.clone(), fast_policy());

        enricher.run("9", None).await.unwrap();
        let record = store.get("9").await.unwrap().unwrap();
        assert_eq!(record.display_name.as_deref(), Some(UNKNOWN_DISPLAY_NAME));
    }

    #[tokio::test]
    async fn store_failure_is_logged_not_returned() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("user_data.json");
        std::fs::create_dir(&path).unwrap();
        let store = Arc::new(UserRecordStore::new(path));
        let resolver = Arc::new(FlakyResolver::new(0, "198.51.100.5"));
        let enricher = Enricher::new(resolver.clone(), store, fast_policy());

        assert!(enricher.run("42", Some("alice")).await.is_none());
        assert!(enricher.spawn("43", None).await.unwrap().is_none());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn spawned_enrichments_for_two_users_both_persist() {
        let (store, _dir) = test_store();
        let resolver = Arc::new(FlakyResolver::new(0, "198.51.100.4"));
        let enricher = Enricher::new(resolver, store.clone(), fast_policy());

        let a = enricher.spawn("1", Some("alice"));
        let b = enricher.spawn("2", Some("bob"));
        assert!(a.await.unwrap().is_some());
        assert!(b.await.unwrap().is_some());

        let mut ids: Vec<String> = store
            .records()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.user_id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
