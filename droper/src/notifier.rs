//! Discord webhook notifications for confirmed price changes.

use crate::repricer::{PriceChange, Rule};
use crate::{Error, Price, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

const COLOR_LOWERED: u32 = 0xE74C3C;
const COLOR_TIE: u32 = 0xF1C40F;
const COLOR_RAISED: u32 = 0x2ECC71;

/// Best-effort announcement of a price change.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn notify(&self, change: &PriceChange) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct WebhookPayload {
    embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
struct Embed {
    title: String,
    color: u32,
    timestamp: String,
    fields: Vec<EmbedField>,
}

#[derive(Debug, Serialize)]
struct EmbedField {
    name: String,
    value: String,
    inline: bool,
}

impl EmbedField {
    fn inline(name: &str, value: String) -> Self {
        Self {
            name: name.to_string(),
            value,
            inline: true,
        }
    }
}

pub struct DiscordNotifier {
    client: reqwest::Client,
    /// Notifications are disabled when unset
    webhook_url: Option<String>,
    fee_rate: f64,
    currency: String,
}

impl DiscordNotifier {
    /// `timeout` bounds every webhook call so a silent endpoint cannot stall a cycle.
    pub fn new(
        webhook_url: Option<String>,
        fee_rate: f64,
        currency: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            webhook_url,
            fee_rate,
            currency: currency.into(),
        })
    }

    fn money(&self, price: Price) -> String {
        format!("{} {price}", self.currency)
    }

    fn build_payload(
        &self,
        change: &PriceChange,
        timestamp: OffsetDateTime,
    ) -> Result<WebhookPayload> {
        let price = change.state.current_price;
        let receivable =
            EmbedField::inline("Receivable", self.money(price.net_of_fee(self.fee_rate)));
        let name = &change.item_name;

        let (title, color, fields) = match change.rule {
            // Only when we started out below the floor: the floor clamp moves the price up.
            Rule::Undercut | Rule::VerifiedTie if price > change.previous => (
                format!("[{name}] Raised to floor"),
                COLOR_RAISED,
                vec![
                    EmbedField::inline("New price", self.money(price)),
                    receivable,
                    EmbedField::inline("Competitor", self.money(change.reference)),
                ],
            ),
            Rule::Undercut => (
                format!("[{name}] Price lowered"),
                COLOR_LOWERED,
                vec![
                    EmbedField::inline("New price", self.money(price)),
                    receivable,
                    EmbedField::inline("Competitor", self.money(change.reference)),
                ],
            ),
            Rule::VerifiedTie => (
                format!("[{name}] Verified tie"),
                COLOR_TIE,
                vec![EmbedField::inline("Adjusted price", self.money(price)), receivable],
            ),
            Rule::Elevate => (
                format!("[{name}] Price raised"),
                COLOR_RAISED,
                vec![
                    EmbedField::inline("New price", self.money(price)),
                    receivable,
                    EmbedField::inline("Second place", self.money(change.reference)),
                ],
            ),
        };

        Ok(WebhookPayload {
            embeds: vec![Embed {
                title,
                color,
                timestamp: timestamp.format(&Rfc3339)?,
                fields,
            }],
        })
    }
}

#[async_trait]
impl Notify for DiscordNotifier {
    async fn notify(&self, change: &PriceChange) -> Result<()> {
        let Some(url) = &self.webhook_url else {
            log::debug!("Discord webhook not configured, skipping notification");
            return Ok(());
        };

        let payload = self.build_payload(change, OffsetDateTime::now_utc())?;
        let response = self.client.post(url).json(&payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(Error::Response(status, response.text().await?));
        }
        Ok(())
    }
}
