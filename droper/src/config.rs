//! Configuration loading from TOML plus secrets from the environment.
//!
//! The tracked items and the polling knobs live in `config.toml`. The
//! authorization token and the webhook URL are read from the environment
//! (a `.env` file is loaded by `common::setup_env`).

use crate::{Error, Price, ProductId, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const DEFAULT_BASE_URL: &str = "https://service.cataloko.com";
const DEFAULT_FEE_RATE: f64 = 0.13;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    /// Browser cookie export (`[{"name": .., "value": ..}, ..]`).
    #[serde(default)]
    pub cookie_file: Option<PathBuf>,
    #[serde(default = "default_fee_rate")]
    pub fee_rate: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    pub items: Vec<ItemConfig>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScheduleConfig {
    pub check_interval_secs: u64,
    /// Cooldown between two price changes of the same item.
    pub min_interval_secs: u64,
    pub jitter_max_ms: u64,
    pub item_delay_min_ms: u64,
    pub item_delay_max_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 60,
            min_interval_secs: 120,
            jitter_max_ms: 3000,
            item_delay_min_ms: 200,
            item_delay_max_ms: 800,
            request_timeout_secs: 30,
        }
    }
}

impl ScheduleConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_secs(self.min_interval_secs)
    }

    pub fn jitter_max(&self) -> Duration {
        Duration::from_millis(self.jitter_max_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ItemConfig {
    pub name: String,
    pub drop_id: u64,
    pub listing_id: u64,
    pub product_id: u64,
    pub floor_price: f64,
}

/// A listing we manage the price of. Fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedItem {
    pub name: String,
    pub drop_id: u64,
    pub listing_id: u64,
    pub product_id: ProductId,
    pub floor_price: Price,
}

impl TrackedItem {
    pub fn is_below_floor(&self, price: Price) -> bool {
        price < self.floor_price
    }
}

impl TryFrom<&ItemConfig> for TrackedItem {
    type Error = Error;

    fn try_from(item: &ItemConfig) -> Result<Self> {
        let floor_price = Price::from_decimal(item.floor_price)?;
        if floor_price.cents() <= 0 {
            return Err(Error::Config(format!(
                "floor_price of item {} must be positive",
                item.name
            )));
        }
        Ok(Self {
            name: item.name.clone(),
            drop_id: item.drop_id,
            listing_id: item.listing_id,
            product_id: item.product_id.into(),
            floor_price,
        })
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_state_file() -> PathBuf {
    PathBuf::from("state.json")
}

fn default_fee_rate() -> f64 {
    DEFAULT_FEE_RATE
}

fn default_currency() -> String {
    "R$".to_string()
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        contents.parse()
    }

    pub fn tracked_items(&self) -> Result<Vec<TrackedItem>> {
        self.items.iter().map(TrackedItem::try_from).collect()
    }

    fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(Error::Config("no items configured".into()));
        }

        let mut seen = HashSet::new();
        for item in &self.items {
            if !seen.insert(item.product_id) {
                return Err(Error::Config(format!(
                    "duplicate product_id {}",
                    item.product_id
                )));
            }
        }
        self.tracked_items()?;

        if !(0.0..1.0).contains(&self.fee_rate) {
            return Err(Error::Config(format!(
                "fee_rate must be in [0, 1), got {}",
                self.fee_rate
            )));
        }
        if self.schedule.check_interval_secs == 0 {
            return Err(Error::Config("check_interval_secs must be positive".into()));
        }
        if self.schedule.item_delay_min_ms > self.schedule.item_delay_max_ms {
            return Err(Error::Config(
                "item_delay_min_ms must not exceed item_delay_max_ms".into(),
            ));
        }
        Url::parse(&self.base_url)?;
        Ok(())
    }
}

impl std::str::FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Deserialize)]
struct Cookie {
    name: String,
    value: String,
}

/// Secrets and session material used by the HTTP clients.
#[derive(Clone)]
pub struct Credentials {
    pub auth_token: String,
    pub cookie_header: Option<String>,
    pub webhook_url: Option<String>,
}

impl Credentials {
    pub fn from_env(config: &Config) -> Result<Self> {
        let auth_token = env::var("AUTH_TOKEN")
            .map_err(|_| Error::Config("AUTH_TOKEN not found in environment".into()))?;

        let cookie_header = config
            .cookie_file
            .as_deref()
            .map(load_cookie_header)
            .transpose()?;

        let webhook_url = env::var("DISCORD_WEBHOOK")
            .ok()
            .filter(|url| !url.trim().is_empty());

        Ok(Self {
            auth_token,
            cookie_header,
            webhook_url,
        })
    }
}

fn load_cookie_header(path: &Path) -> Result<String> {
    let contents = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read cookie file {}: {e}", path.display()))
    })?;
    cookie_header(&contents)
}

fn cookie_header(contents: &str) -> Result<String> {
    let cookies: Vec<Cookie> = serde_json::from_str(contents)
        .map_err(|e| Error::Config(format!("cookie file must be an array of cookies: {e}")))?;

    Ok(cookies
        .iter()
        .map(|c| format!("{}={}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("; "))
}
