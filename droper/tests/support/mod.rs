//! In-memory marketplace and notifier for driving the repricer in tests.
#![allow(dead_code)]

use async_trait::async_trait;
use droper::{Error, Marketplace, Notify, Offer, Price, PriceChange, ProductId, Result, TrackedItem};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const OWN: u64 = 100;

pub fn cents(c: i64) -> Price {
    Price::from_cents(c)
}

pub fn item(name: &str, product_id: u64, floor_cents: i64) -> TrackedItem {
    TrackedItem {
        name: name.to_string(),
        drop_id: 1,
        listing_id: product_id,
        product_id: ProductId::from(product_id),
        floor_price: cents(floor_cents),
    }
}

pub fn offer(id: u64, price_cents: i64, verified: bool) -> Offer {
    Offer {
        id: ProductId::from(id),
        price: cents(price_cents),
        verified,
    }
}

/// A scripted listing response.
pub enum Listing {
    Offers(Vec<Offer>),
    Unavailable,
}

/// Scripted marketplace. Each product has a queue of listing responses; the
/// last one repeats once the queue runs dry.
#[derive(Clone, Default)]
pub struct FakeMarket {
    listings: Arc<Mutex<HashMap<ProductId, VecDeque<Listing>>>>,
    fetches: Arc<Mutex<Vec<ProductId>>>,
    updates: Arc<Mutex<Vec<(ProductId, Price)>>>,
    /// Price committed by the marketplace instead of the requested one.
    committed_override: Arc<Mutex<Option<Price>>>,
    reject_updates: Arc<Mutex<bool>>,
}

impl FakeMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_listing(&self, product_id: u64, offers: Vec<Offer>) {
        self.push(product_id, Listing::Offers(offers));
    }

    pub fn push_unavailable(&self, product_id: u64) {
        self.push(product_id, Listing::Unavailable);
    }

    fn push(&self, product_id: u64, listing: Listing) {
        self.listings
            .lock()
            .unwrap()
            .entry(ProductId::from(product_id))
            .or_default()
            .push_back(listing);
    }

    pub fn commit_instead(&self, price: Price) {
        *self.committed_override.lock().unwrap() = Some(price);
    }

    pub fn reject_updates(&self) {
        *self.reject_updates.lock().unwrap() = true;
    }

    pub fn fetch_count(&self, product_id: u64) -> usize {
        let id = ProductId::from(product_id);
        self.fetches.lock().unwrap().iter().filter(|p| **p == id).count()
    }

    pub fn updates(&self) -> Vec<(ProductId, Price)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl Marketplace for FakeMarket {
    async fn fetch_listing(&self, item: &TrackedItem) -> Result<Vec<Offer>> {
        self.fetches.lock().unwrap().push(item.product_id);

        let mut listings = self.listings.lock().unwrap();
        let queue = listings
            .get_mut(&item.product_id)
            .ok_or_else(|| Error::Deserialize(format!("no listing for {}", item.product_id)))?;

        let listing = if queue.len() > 1 {
            queue.pop_front()
        } else {
            None
        };
        let current = listing.as_ref().or(queue.front());

        match current {
            Some(Listing::Offers(offers)) => Ok(offers.clone()),
            Some(Listing::Unavailable) | None => Err(Error::Response(
                reqwest::StatusCode::SERVICE_UNAVAILABLE,
                "unavailable".into(),
            )),
        }
    }

    async fn update_price(&self, item: &TrackedItem, price: Price) -> Result<Price> {
        if *self.reject_updates.lock().unwrap() {
            return Err(Error::Response(
                reqwest::StatusCode::FORBIDDEN,
                "forbidden".into(),
            ));
        }
        self.updates.lock().unwrap().push((item.product_id, price));
        Ok(self.committed_override.lock().unwrap().unwrap_or(price))
    }
}

/// Records every change it is asked to announce.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<PriceChange>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<PriceChange> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notify for RecordingNotifier {
    async fn notify(&self, change: &PriceChange) -> Result<()> {
        self.sent.lock().unwrap().push(change.clone());
        if self.fail {
            return Err(Error::Response(
                reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                "webhook down".into(),
            ));
        }
        Ok(())
    }
}
