use crate::{Price, ProductId, Result, TrackedItem};
use async_trait::async_trait;

/// One entry of a listing as the marketplace displays it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    pub id: ProductId,
    pub price: Price,
    pub verified: bool,
}

/// The two remote operations the repricer needs.
#[async_trait]
pub trait Marketplace: Send + Sync {
    /// All offers shown for the item's listing, in display order
    /// (first = most prominent).
    async fn fetch_listing(&self, item: &TrackedItem) -> Result<Vec<Offer>>;

    /// Submits `price` for our own offer and returns the price the
    /// marketplace actually committed.
    async fn update_price(&self, item: &TrackedItem, price: Price) -> Result<Price>;
}
