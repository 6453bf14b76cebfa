//! Repricing rules and the driver that applies them to one item.
//!
//! [`evaluate`] is pure: it looks at a listing snapshot and decides which rule
//! (if any) fires. [`Repricer::process`] performs the remote side of the
//! decision (refresh, write) and hands back the new [`PriceState`] instead of
//! mutating anything, so the caller decides when to persist it.

use crate::market::{Marketplace, Offer};
use crate::{epoch_millis, Error, Price, ProductId, Result, TrackedItem};
use log::{info, warn};
use std::time::Duration;
use strum_macros::Display;

/// One cent below the competitor.
const UNDERCUT_STEP: i64 = 1;
/// Moves smaller than this are replaced by [`FORCED_STEP`].
const MIN_DECREMENT: i64 = 10;
const FORCED_STEP: i64 = 11;

/// Mutable price state of a tracked item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceState {
    pub current_price: Price,
    /// Epoch millis of the last confirmed change, 0 if never changed.
    pub last_update: i64,
}

impl PriceState {
    pub fn since_last_update(&self, now_ms: i64) -> Duration {
        Duration::from_millis(now_ms.saturating_sub(self.last_update).max(0) as u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Rule {
    #[strum(to_string = "undercut")]
    Undercut,
    #[strum(to_string = "verified tie")]
    VerifiedTie,
    #[strum(to_string = "elevate")]
    Elevate,
}

/// What [`evaluate`] saw in a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// A competitor is cheaper than us; the target is computed from a fresh listing.
    Undercut,
    VerifiedTie { offer: ProductId },
    Elevate { second: Price },
    Hold,
}

/// Decides which rule fires. Precedence: undercut, verified tie, elevate.
/// Nothing fires while the item is cooling down.
pub fn evaluate(
    item: &TrackedItem,
    state: &PriceState,
    listing: &[Offer],
    since_last_update: Duration,
    min_interval: Duration,
) -> Signal {
    if since_last_update < min_interval {
        return Signal::Hold;
    }

    let current = state.current_price;
    let mut competitors = listing.iter().filter(|o| o.id != item.product_id);

    if competitors.clone().any(|o| o.price < current) {
        return Signal::Undercut;
    }

    if let Some(tie) = competitors.find(|o| o.price == current && o.verified) {
        return Signal::VerifiedTie { offer: tie.id };
    }

    if listing.first().is_some_and(|o| o.id == item.product_id) {
        if let Some(second) = listing.get(1).filter(|o| o.price > current) {
            return Signal::Elevate {
                second: second.price,
            };
        }
    }

    Signal::Hold
}

/// Cheapest competitor strictly below `current`.
pub fn cheapest_below(item: &TrackedItem, current: Price, listing: &[Offer]) -> Option<Price> {
    listing
        .iter()
        .filter(|o| o.id != item.product_id && o.price < current)
        .map(|o| o.price)
        .min()
}

/// One cent under `competitor`, but at least [`FORCED_STEP`] below `current`
/// when the plain undercut would move less than [`MIN_DECREMENT`]. Never below `floor`.
pub fn candidate_price(current: Price, competitor: Price, floor: Price) -> Price {
    let mut candidate = competitor.cents() - UNDERCUT_STEP;
    if current.cents() - candidate < MIN_DECREMENT {
        candidate = current.cents() - FORCED_STEP;
    }
    Price::from_cents(candidate).max(floor)
}

/// Log wording for a move. Undercut and tie targets end up above `from` when
/// the floor clamp lifts a price that started out below it.
fn direction(from: Price, to: Price) -> &'static str {
    if to > from {
        "raising"
    } else {
        "lowering"
    }
}

/// Just under the second offer.
pub fn elevate_price(second: Price, floor: Price) -> Price {
    Price::from_cents(second.cents() - UNDERCUT_STEP).max(floor)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stage {
    #[strum(to_string = "fetch")]
    Fetch,
    #[strum(to_string = "refresh")]
    Refresh,
    #[strum(to_string = "update")]
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SkipReason {
    /// The refreshed listing no longer shows a cheaper competitor.
    #[strum(to_string = "cheaper offer gone on refresh")]
    StaleListing,
    /// The rule's target equals our price, typically because we sit at the floor.
    #[strum(to_string = "target equals current price")]
    Unchanged,
}

/// A confirmed price change.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceChange {
    pub item_name: String,
    pub product_id: ProductId,
    pub rule: Rule,
    pub previous: Price,
    pub requested: Price,
    /// The competitor price (undercut), the tied price (verified tie) or the
    /// second place price (elevate).
    pub reference: Price,
    pub state: PriceState,
}

#[derive(Debug)]
pub enum Outcome {
    Repriced(PriceChange),
    Hold,
    Skipped(SkipReason),
    Failed { stage: Stage, error: Error },
}

impl Outcome {
    fn failed(stage: Stage, error: Error) -> Self {
        Self::Failed { stage, error }
    }
}

pub struct Repricer<M> {
    market: M,
    min_interval: Duration,
    fee_rate: f64,
}

impl<M: Marketplace> Repricer<M> {
    pub fn new(market: M, min_interval: Duration, fee_rate: f64) -> Self {
        Self {
            market,
            min_interval,
            fee_rate,
        }
    }

    /// Our own price as currently listed, `None` if our offer is not shown.
    pub async fn live_price(&self, item: &TrackedItem) -> Result<Option<Price>> {
        Ok(self
            .market
            .fetch_listing(item)
            .await?
            .into_iter()
            .find(|o| o.id == item.product_id)
            .map(|o| o.price))
    }

    /// Runs one decision round for `item`.
    pub async fn process(&self, item: &TrackedItem, state: &PriceState) -> Outcome {
        let listing = match self.market.fetch_listing(item).await {
            Ok(listing) => listing,
            Err(e) => return Outcome::failed(Stage::Fetch, e),
        };

        match listing.first() {
            Some(first) => info!(
                "[{}] own: {} | first shown: #{} @ {}",
                item.name, state.current_price, first.id, first.price
            ),
            None => info!("[{}] own: {} | listing is empty", item.name, state.current_price),
        }

        let since = state.since_last_update(epoch_millis());
        match evaluate(item, state, &listing, since, self.min_interval) {
            Signal::Undercut => self.undercut(item, state).await,
            Signal::VerifiedTie { offer } => self.break_tie(item, state, offer).await,
            Signal::Elevate { second } => {
                let target = elevate_price(second, item.floor_price);
                info!("[{}] -> raising to {target} (second place: {second})", item.name);
                self.apply(item, state, Rule::Elevate, target, second).await
            }
            Signal::Hold => {
                info!("[{}] -> no action", item.name);
                Outcome::Hold
            }
        }
    }

    async fn undercut(&self, item: &TrackedItem, state: &PriceState) -> Outcome {
        let fresh = match self.market.fetch_listing(item).await {
            Ok(listing) => listing,
            Err(e) => return Outcome::failed(Stage::Refresh, e),
        };

        let Some(competitor) = cheapest_below(item, state.current_price, &fresh) else {
            info!("[{}] -> cheaper offer no longer listed, skipping", item.name);
            return Outcome::Skipped(SkipReason::StaleListing);
        };

        let target = candidate_price(state.current_price, competitor, item.floor_price);
        info!(
            "[{}] -> {} to {target} (competitor: {competitor})",
            item.name,
            direction(state.current_price, target)
        );
        self.apply(item, state, Rule::Undercut, target, competitor)
            .await
    }

    async fn break_tie(&self, item: &TrackedItem, state: &PriceState, offer: ProductId) -> Outcome {
        // Refresh before writing. The tie price is our own price, so the
        // refreshed listing does not enter the computation.
        if let Err(e) = self.market.fetch_listing(item).await {
            return Outcome::failed(Stage::Refresh, e);
        }

        let current = state.current_price;
        let target = candidate_price(current, current, item.floor_price);
        info!(
            "[{}] -> verified tie with #{offer}, {} to {target}",
            item.name,
            direction(current, target)
        );
        self.apply(item, state, Rule::VerifiedTie, target, current)
            .await
    }

    async fn apply(
        &self,
        item: &TrackedItem,
        state: &PriceState,
        rule: Rule,
        target: Price,
        reference: Price,
    ) -> Outcome {
        if target == state.current_price {
            info!("[{}] -> already at {target}, nothing to write", item.name);
            return Outcome::Skipped(SkipReason::Unchanged);
        }

        let confirmed = match self.market.update_price(item, target).await {
            Ok(price) => price,
            Err(e) => return Outcome::failed(Stage::Update, e),
        };

        if confirmed != target {
            warn!(
                "[{}] requested {target} but marketplace committed {confirmed}",
                item.name
            );
        }
        if item.is_below_floor(confirmed) {
            warn!(
                "[{}] committed price {confirmed} is below the floor of {}",
                item.name, item.floor_price
            );
        }
        info!(
            "[{}] new price: {confirmed} | receivable: {}",
            item.name,
            confirmed.net_of_fee(self.fee_rate)
        );

        Outcome::Repriced(PriceChange {
            item_name: item.name.clone(),
            product_id: item.product_id,
            rule,
            previous: state.current_price,
            requested: target,
            reference,
            state: PriceState {
                current_price: confirmed,
                last_update: epoch_millis(),
            },
        })
    }
}
