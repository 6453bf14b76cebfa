//! Repricing agent for Droper marketplace listings.
//! It includes modules for talking to the marketplace over HTTP, deciding on
//! price moves, persisting price state and announcing changes.
mod config;
mod conversion;
mod endpoint;
mod error;
mod http;
mod market;
mod notifier;
mod poller;
mod price;
pub mod repricer;
mod schema;
mod state;

pub use config::{Config, Credentials, ItemConfig, ScheduleConfig, TrackedItem};
pub use error::Error;
pub use http::HttpClient;
pub use market::{Marketplace, Offer};
pub use notifier::{DiscordNotifier, Notify};
pub use poller::{CycleReport, ItemReport, Poller};
pub use price::{Price, ProductId};
pub use repricer::{Outcome, PriceChange, PriceState, Repricer, Rule, SkipReason, Stage};
pub use state::{PersistedPrice, Snapshot, StateStore};

pub type Result<T> = std::result::Result<T, Error>;

/// Milliseconds since the Unix epoch for the current wall-clock time.
pub fn epoch_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
