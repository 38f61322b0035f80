use crate::application::binder::TransactionBinder;
use crate::config::EngineConfig;
use crate::domain::action::{Action, Actor};
use crate::domain::audit::AuditEntry;
use crate::domain::engine::{Effect, TransitionEngine};
use crate::domain::item::{Amount, Item, ItemId};
use crate::domain::ports::{Commit, CommitOutcome, LedgerStoreBox};
use crate::domain::transaction::Transaction;
use crate::error::{LedgerError, Rejection, Result};
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How hard the service tries after losing a compare-and-swap race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts made after the first one.
    pub max_retries: u32,
    /// Pause between attempts; zero yields to the scheduler instead.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_RETRIES: u32 = 8;
    pub const DEFAULT_BACKOFF_MS: u64 = 0;
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            backoff: Duration::from_millis(Self::DEFAULT_BACKOFF_MS),
        }
    }
}

/// Applies lifecycle actions to items atomically.
///
/// `LifecycleService` owns the write path to the ledger. Each action is computed
/// by the [`TransitionEngine`] against a freshly loaded item and committed with a
/// version-conditioned write together with its audit entry. Losing a race to
/// another writer reloads and recomputes, so concurrent actions on one item
/// serialize into a single order.
pub struct LifecycleService {
    store: LedgerStoreBox,
    engine: TransitionEngine,
    binder: TransactionBinder,
    retry: RetryPolicy,
    timeout: Option<Duration>,
}

impl LifecycleService {
    /// Creates a new `LifecycleService` with the default retry policy and no timeout.
    ///
    /// # Arguments
    ///
    /// * `store` - The ledger holding items, transactions and audit entries.
    /// * `engine` - The transition engine configured with the pipeline length.
    pub fn new(store: LedgerStoreBox, engine: TransitionEngine) -> Self {
        Self {
            store,
            engine,
            binder: TransactionBinder::new(),
            retry: RetryPolicy::default(),
            timeout: None,
        }
    }

    pub fn from_config(store: LedgerStoreBox, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(store, TransitionEngine::new(config.pipeline()?))
            .with_retry_policy(config.retry_policy())
            .with_timeout(config.timeout()))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn engine(&self) -> &TransitionEngine {
        &self.engine
    }

    /// Registers a new item in `CREATED` at version 0. Creation is not audited.
    pub async fn create_item(&self, amount: Amount) -> Result<Item> {
        let item = Item::new(amount);
        self.store.insert_item(item.clone()).await?;
        info!(item_id = %item.id, amount = %item.amount, "item created");
        Ok(item)
    }

    /// Applies `action` to the item on behalf of `actor`.
    ///
    /// Returns the item after the transition. On refusal the [`Rejection`] carries
    /// the item as it currently stands. Honors the configured timeout, if any.
    pub async fn apply_action(
        &self,
        item_id: ItemId,
        action: Action,
        actor: &Actor,
    ) -> std::result::Result<Item, Rejection> {
        match self.timeout {
            Some(timeout) => self.apply_action_within(item_id, action, actor, timeout).await,
            None => self.run_action(item_id, action, actor).await,
        }
    }

    /// Like [`apply_action`](Self::apply_action), but gives up after `timeout`.
    ///
    /// An expired attempt is dropped before its commit lands, so nothing is written.
    pub async fn apply_action_within(
        &self,
        item_id: ItemId,
        action: Action,
        actor: &Actor,
        timeout: Duration,
    ) -> std::result::Result<Item, Rejection> {
        match tokio::time::timeout(timeout, self.run_action(item_id, action, actor)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(item_id = %item_id, action = %action, ?timeout, "action timed out");
                let current = self.store.load_item(item_id).await.ok().flatten();
                Err(Rejection::new(
                    LedgerError::Timeout {
                        item: item_id,
                        after: timeout,
                    },
                    current,
                ))
            }
        }
    }

    async fn run_action(
        &self,
        item_id: ItemId,
        action: Action,
        actor: &Actor,
    ) -> std::result::Result<Item, Rejection> {
        let attempts = self.retry.max_retries.saturating_add(1);
        let mut last_seen = None;

        for attempt in 1..=attempts {
            let item = self
                .store
                .load_item(item_id)
                .await?
                .ok_or(LedgerError::ItemNotFound(item_id))?;

            // A bound item reports the duplicate rather than an illegal state.
            let prepared = if action == Action::CreateTransaction {
                match self.binder.prepare(self.store.as_ref(), item_id).await {
                    Ok(tx) => Some(tx),
                    Err(e) => return Err(self.reject(e, item, action)),
                }
            } else {
                None
            };

            let transition = match self.engine.apply(&item, action, actor.role) {
                Ok(transition) => transition,
                Err(e) => return Err(self.reject(e, item, action)),
            };

            let mut next = transition.next;
            next.updated_at = Utc::now();
            let transaction: Option<Transaction> = match transition.effect {
                Effect::BindTransaction => prepared,
                Effect::None => None,
            };

            let commit = Commit {
                expected_version: item.version,
                audit: AuditEntry::record(&item, &next, action, actor),
                transaction,
                item: next.clone(),
            };

            match self.store.commit(commit).await? {
                CommitOutcome::Committed => {
                    info!(
                        item_id = %item_id,
                        action = %action,
                        actor = %actor.name,
                        from = %item.state_label(),
                        to = %next.state_label(),
                        version = next.version,
                        "transition committed"
                    );
                    return Ok(next);
                }
                CommitOutcome::Conflict => {
                    debug!(
                        item_id = %item_id,
                        action = %action,
                        attempt,
                        version = item.version,
                        "version conflict, retrying"
                    );
                    last_seen = Some(item);
                    self.backoff().await;
                }
                CommitOutcome::TransactionExists => {
                    let current = self.store.load_item(item_id).await?;
                    warn!(item_id = %item_id, "transaction bound concurrently");
                    return Err(Rejection::new(
                        LedgerError::TransactionAlreadyExists(item_id),
                        current,
                    ));
                }
            }
        }

        warn!(item_id = %item_id, action = %action, attempts, "retries exhausted");
        let current = self.store.load_item(item_id).await?.or(last_seen);
        Err(Rejection::new(
            LedgerError::ConcurrentModification {
                item: item_id,
                attempts,
            },
            current,
        ))
    }

    fn reject(&self, error: LedgerError, item: Item, action: Action) -> Rejection {
        warn!(
            item_id = %item.id,
            action = %action,
            state = %item.state_label(),
            error = %error,
            "action rejected"
        );
        Rejection::new(error, Some(item))
    }

    async fn backoff(&self) {
        if self.retry.backoff.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.retry.backoff).await;
        }
    }

    pub async fn item(&self, id: ItemId) -> Result<Item> {
        self.store
            .load_item(id)
            .await?
            .ok_or(LedgerError::ItemNotFound(id))
    }

    /// All items in creation order.
    pub async fn items(&self) -> Result<Vec<Item>> {
        self.store.all_items().await
    }

    pub async fn transaction_for(&self, item_id: ItemId) -> Result<Option<Transaction>> {
        self.store.transaction_for(item_id).await
    }

    pub async fn audit_log(&self, item_id: ItemId) -> Result<Vec<AuditEntry>> {
        self.store.audit_log(item_id).await
    }
}
