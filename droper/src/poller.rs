use crate::http::jitter;
use crate::market::Marketplace;
use crate::notifier::Notify;
use crate::repricer::{Outcome, PriceState, Repricer};
use crate::state::{PersistedPrice, Snapshot, StateStore};
use crate::{ProductId, Result, TrackedItem};
use log::{error, info, warn};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug)]
pub struct ItemReport {
    pub product_id: ProductId,
    pub name: String,
    pub outcome: Outcome,
}

/// Per-item outcomes of one pass over all tracked items.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub items: Vec<ItemReport>,
}

impl CycleReport {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.items.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn repriced(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Repriced(_)))
    }

    pub fn held(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Hold))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }
}

/// Drives the tracked items one after another and owns their price state.
pub struct Poller<M, N> {
    repricer: Repricer<M>,
    notifier: N,
    items: Vec<TrackedItem>,
    states: HashMap<ProductId, PriceState>,
    store: StateStore,
    item_delay: RangeInclusive<Duration>,
}

impl<M: Marketplace, N: Notify> Poller<M, N> {
    pub fn new(
        repricer: Repricer<M>,
        notifier: N,
        items: Vec<TrackedItem>,
        store: StateStore,
        item_delay: RangeInclusive<Duration>,
    ) -> Self {
        Self {
            repricer,
            notifier,
            items,
            states: HashMap::new(),
            store,
            item_delay,
        }
    }

    pub fn state(&self, product_id: ProductId) -> Option<&PriceState> {
        self.states.get(&product_id)
    }

    /// Seeds every item with its live price (floor price when unavailable) and
    /// the last update time remembered in the state file, then saves.
    pub async fn initialize(&mut self) -> Result<()> {
        info!("Fetching the initial price of every listing");
        let snapshot = self.store.load();

        for item in &self.items {
            let last_update = snapshot
                .get(&item.product_id)
                .map(|p| p.last_update)
                .unwrap_or_default();

            let current_price = match self.repricer.live_price(item).await {
                Ok(Some(price)) => price,
                Ok(None) => {
                    warn!("[{}] own offer not listed, using floor price", item.name);
                    item.floor_price
                }
                Err(e) => {
                    warn!("[{}] failed to get initial price ({e}), using floor price", item.name);
                    item.floor_price
                }
            };

            if item.is_below_floor(current_price) {
                warn!(
                    "[{}] listed at {current_price}, below floor {}",
                    item.name, item.floor_price
                );
            }
            info!("[{}] initial price = {current_price}", item.name);

            self.states.insert(
                item.product_id,
                PriceState {
                    current_price,
                    last_update,
                },
            );
        }

        self.persist()
    }

    /// One pass over all items, in configured order.
    pub async fn run_cycle(&mut self) -> CycleReport {
        info!("=== Starting cycle ===");
        let mut report = CycleReport::default();

        for item in &self.items {
            let Some(state) = self.states.get(&item.product_id).copied() else {
                warn!("[{}] not initialized, skipping", item.name);
                continue;
            };

            let outcome = self.repricer.process(item, &state).await;

            match &outcome {
                Outcome::Repriced(change) => {
                    self.states.insert(item.product_id, change.state);
                    if let Err(e) = self.persist() {
                        error!("[{}] failed to save state: {e}", item.name);
                    }
                    if let Err(e) = self.notifier.notify(change).await {
                        warn!("[{}] notification failed: {e}", item.name);
                    }
                }
                Outcome::Failed { stage, error } => {
                    error!("[{}] {stage} failed: {error}", item.name);
                }
                Outcome::Hold | Outcome::Skipped(_) => {}
            }

            report.items.push(ItemReport {
                product_id: item.product_id,
                name: item.name.clone(),
                outcome,
            });

            sleep(self.item_delay()).await;
        }

        info!(
            "Cycle finished: {} repriced, {} held, {} skipped, {} failed",
            report.repriced(),
            report.held(),
            report.skipped(),
            report.failed()
        );
        report
    }

    fn item_delay(&self) -> Duration {
        let (min, max) = (*self.item_delay.start(), *self.item_delay.end());
        min + jitter(max.saturating_sub(min))
    }

    fn snapshot(&self) -> Snapshot {
        self.states
            .iter()
            .map(|(id, state)| {
                (
                    *id,
                    PersistedPrice {
                        current_price: state.current_price,
                        last_update: state.last_update,
                    },
                )
            })
            .collect()
    }

    fn persist(&self) -> Result<()> {
        self.store.save(&self.snapshot())
    }
}
