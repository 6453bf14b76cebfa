use crate::endpoint::Endpoint;
use crate::market::{Marketplace, Offer};
use crate::schema::{ListingResponse, PriceUpdate, PriceUpdateResponse};
use crate::{Config, Credentials, Error, Price, Result, TrackedItem};
use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, COOKIE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

const ACCEPT_VALUE: &str = "application/json, text/plain, */*";

#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: Url,
    /// Upper bound of the random pause taken before every price write
    jitter_max: Duration,
}

impl HttpClient {
    pub fn new(config: &Config, credentials: &Credentials) -> Result<Self> {
        let client = reqwest::Client::builder()
            .default_headers(default_headers(credentials)?)
            .timeout(config.schedule.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(&config.base_url)?,
            jitter_max: config.schedule.jitter_max(),
        })
    }

    fn url(&self, endpoint: Endpoint) -> Result<Url> {
        Ok(self.base_url.join(&endpoint.to_string())?)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        endpoint: Endpoint,
    ) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            log::debug!("{endpoint} answered {status}");
            return Err(Error::Response(status, text));
        }

        serde_json::from_str(&text).map_err(|_| Error::Deserialize(text))
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T> {
        let builder = self.client.request(Method::GET, self.url(endpoint)?);
        self.request(builder, endpoint).await
    }

    async fn patch<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        body: &impl serde::Serialize,
    ) -> Result<T> {
        let builder = self
            .client
            .request(Method::PATCH, self.url(endpoint)?)
            .json(body);
        self.request(builder, endpoint).await
    }
}

#[async_trait]
impl Marketplace for HttpClient {
    async fn fetch_listing(&self, item: &TrackedItem) -> Result<Vec<Offer>> {
        let response: ListingResponse = self
            .get(Endpoint::Listing {
                drop_id: item.drop_id,
                listing_id: item.listing_id,
            })
            .await?;
        response.try_into()
    }

    async fn update_price(&self, item: &TrackedItem, price: Price) -> Result<Price> {
        sleep(jitter(self.jitter_max)).await;

        let response: PriceUpdateResponse = self
            .patch(
                Endpoint::UpdatePrice {
                    product_id: item.product_id,
                },
                &PriceUpdate {
                    price: price.to_string(),
                },
            )
            .await?;
        response.price.parse()
    }
}

fn default_headers(credentials: &Credentials) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&credentials.auth_token)?);
    if let Some(cookie) = &credentials.cookie_header {
        headers.insert(COOKIE, HeaderValue::from_str(cookie)?);
    }
    Ok(headers)
}

/// Uniformly random duration in `0..=max`, at millisecond resolution.
pub(crate) fn jitter(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
}
