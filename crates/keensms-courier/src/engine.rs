//! One polling cycle: fetch, filter, act, reconcile.

use crate::action::MessageAction;
use crate::error::{CourierError, CourierResult};
use crate::filter::AccessList;
use crate::skip_cache::{MessageKey, SkipCache};
use keenetic_client::{InterfaceName, Message, MessageId, RouterGateway};
use keensms_config::ReconcilePolicy;
use tracing::{debug, info, warn};

/// Consecutive fully unreachable cycles tolerated before giving up.
pub const DEFAULT_OUTAGE_LIMIT: usize = 3;

/// Counters for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Messages returned by the router, read or not.
    pub fetched: usize,
    pub already_read: usize,
    pub cache_hits: usize,
    pub rejected: usize,
    pub accepted: usize,
    pub action_failures: usize,
    /// Interfaces whose fetch failed this cycle.
    pub failed_interfaces: Vec<InterfaceName>,
    /// Ids successfully marked read or deleted.
    pub reconciled: usize,
    /// Interfaces whose batched state call failed.
    pub reconcile_failures: usize,
}

impl CycleReport {
    /// Whether anything beyond fetching happened.
    pub fn is_idle(&self) -> bool {
        self.rejected == 0
            && self.accepted == 0
            && self.action_failures == 0
            && self.failed_interfaces.is_empty()
            && self.reconcile_failures == 0
    }

    pub fn log(&self) {
        if self.is_idle() {
            debug!(
                fetched = self.fetched,
                cache_hits = self.cache_hits,
                "Cycle finished, nothing to do"
            );
            return;
        }

        info!(
            fetched = self.fetched,
            already_read = self.already_read,
            cache_hits = self.cache_hits,
            rejected = self.rejected,
            accepted = self.accepted,
            action_failures = self.action_failures,
            failed_interfaces = self.failed_interfaces.len(),
            reconciled = self.reconciled,
            reconcile_failures = self.reconcile_failures,
            "Cycle finished"
        );
    }
}

/// Ids accepted this cycle, grouped by interface in first-seen order.
#[derive(Debug, Default)]
struct ReconciliationBatch {
    groups: Vec<(InterfaceName, Vec<MessageId>)>,
}

impl ReconciliationBatch {
    fn push(&mut self, interface: &str, id: MessageId) {
        match self.groups.iter_mut().find(|(name, _)| name == interface) {
            Some((_, ids)) => ids.push(id),
            None => self.groups.push((interface.to_string(), vec![id])),
        }
    }
}

/// Drives the router and the accept action for the known interfaces.
///
/// Owns the skip cache, so a rejected message costs one set lookup on every
/// later cycle and nothing else.
pub struct ReconciliationEngine<R, A> {
    router: R,
    action: A,
    interfaces: Vec<InterfaceName>,
    access: AccessList,
    policy: ReconcilePolicy,
    skip_cache: SkipCache,
    outage_limit: usize,
    outages: usize,
}

impl<R: RouterGateway, A: MessageAction> ReconciliationEngine<R, A> {
    pub fn new(
        router: R,
        action: A,
        interfaces: Vec<InterfaceName>,
        access: AccessList,
        policy: ReconcilePolicy,
    ) -> Self {
        Self {
            router,
            action,
            interfaces,
            access,
            policy,
            skip_cache: SkipCache::new(),
            outage_limit: DEFAULT_OUTAGE_LIMIT,
            outages: 0,
        }
    }

    /// Give up after `limit` consecutive cycles in which every interface
    /// was unreachable. Zero is treated as one.
    pub fn with_outage_limit(mut self, limit: usize) -> Self {
        self.outage_limit = limit.max(1);
        self
    }

    pub fn interfaces(&self) -> &[InterfaceName] {
        &self.interfaces
    }

    pub fn skip_cache(&self) -> &SkipCache {
        &self.skip_cache
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    pub fn action(&self) -> &A {
        &self.action
    }

    /// Run one cycle.
    ///
    /// Fails only when the router rejects the session or when every
    /// interface fetch failed with a connectivity error for `outage_limit`
    /// cycles in a row. Everything else is logged and counted in the report.
    pub async fn run_cycle(&mut self) -> CourierResult<CycleReport> {
        let mut report = CycleReport::default();

        let pending = self.fetch_unread(&mut report).await?;
        let batch = self.process(pending, &mut report).await;
        self.reconcile(batch, &mut report).await?;

        Ok(report)
    }

    async fn fetch_unread(&mut self, report: &mut CycleReport) -> CourierResult<Vec<Message>> {
        let mut pending = Vec::new();
        let mut unreachable = 0;

        for interface in &self.interfaces {
            match self.router.list_unread(interface).await {
                Ok(messages) => {
                    report.fetched += messages.len();
                    for message in messages {
                        if message.read {
                            report.already_read += 1;
                        } else {
                            pending.push(message);
                        }
                    }
                }
                Err(e) if e.is_auth() => return Err(e.into()),
                Err(e) => {
                    if e.is_connectivity() {
                        unreachable += 1;
                    }
                    warn!(interface = %interface, error = %e, "Failed to fetch messages, skipping interface this cycle");
                    report.failed_interfaces.push(interface.clone());
                }
            }
        }

        if self.interfaces.is_empty() || unreachable < self.interfaces.len() {
            self.outages = 0;
            return Ok(pending);
        }

        self.outages += 1;
        if self.outages >= self.outage_limit {
            return Err(CourierError::RouterUnreachable {
                interfaces: unreachable,
                cycles: self.outages,
            });
        }
        warn!(
            cycles = self.outages,
            limit = self.outage_limit,
            "Router unreachable on every interface"
        );

        Ok(pending)
    }

    async fn process(
        &mut self,
        pending: Vec<Message>,
        report: &mut CycleReport,
    ) -> ReconciliationBatch {
        let mut batch = ReconciliationBatch::default();

        for message in pending {
            let key = MessageKey::of(&message);
            if self.skip_cache.contains(&key) {
                report.cache_hits += 1;
                continue;
            }

            if !self.access.accepts(&message) {
                info!(
                    interface = %message.interface,
                    message_id = %message.id,
                    sender = %message.sender,
                    "Sender not authorized, message will be left untouched"
                );
                self.skip_cache.add(key);
                report.rejected += 1;
                continue;
            }

            match self.action.accept(&message).await {
                Ok(()) => {
                    batch.push(&message.interface, message.id);
                    report.accepted += 1;
                }
                Err(e) => {
                    warn!(
                        interface = %message.interface,
                        message_id = %message.id,
                        error = %e,
                        "Failed to handle message, will retry next cycle"
                    );
                    report.action_failures += 1;
                }
            }
        }

        batch
    }

    async fn reconcile(
        &self,
        batch: ReconciliationBatch,
        report: &mut CycleReport,
    ) -> CourierResult<()> {
        for (interface, ids) in batch.groups {
            let result = match self.policy {
                ReconcilePolicy::Delete => self.router.delete(&interface, &ids).await,
                ReconcilePolicy::MarkRead => self.router.mark_as_read(&interface, &ids).await,
                ReconcilePolicy::Leave => {
                    debug!(interface = %interface, count = ids.len(), "Leaving accepted messages unread");
                    continue;
                }
            };

            match result {
                Ok(()) => {
                    debug!(interface = %interface, count = ids.len(), policy = ?self.policy, "Messages reconciled");
                    report.reconciled += ids.len();
                }
                Err(e) if e.is_auth() => return Err(e.into()),
                Err(e) => {
                    warn!(
                        interface = %interface,
                        count = ids.len(),
                        error = %e,
                        "Failed to update message state, messages may be handled again"
                    );
                    report.reconcile_failures += 1;
                }
            }
        }

        Ok(())
    }
}

impl<R, A> std::fmt::Debug for ReconciliationEngine<R, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationEngine")
            .field("interfaces", &self.interfaces)
            .field("policy", &self.policy)
            .field("skipped", &self.skip_cache.len())
            .field("outages", &self.outages)
            .finish_non_exhaustive()
    }
}
