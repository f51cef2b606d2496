//! Auction backend client.
//!
//! The controller talks to the auction backend through the [`AuctionBackend`]
//! trait so the dialogue logic can be tested without a network. The real
//! implementation, [`HttpAuctionBackend`], maps the trait onto the backend's
//! HTTP surface with `reqwest`. A request timeout surfaces as an ordinary
//! [`BackendError`], which the controller treats like any other failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Failures a backend call can produce. None of them are fatal to a
/// dialogue session.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("resource not found")]
    NotFound,
    #[error("auction backend returned status {0}")]
    Status(u16),
    #[error("request to auction backend failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// A product listed for auction. Read-only from the controller's
/// perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
}

/// A bid submission. Write-only: never mutated after it is sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BidRequest {
    pub product_name: String,
    pub bid_amount: f64,
    pub user_id: String,
}

/// The backend's acknowledgement of a placed bid.
#[derive(Debug, Clone, Deserialize)]
pub struct BidReceipt {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HighestBid {
    pub highest_bid: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct TimeLeftResponse {
    seconds_left: u64,
}

/// The auction backend HTTP surface the controller consumes.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AuctionBackend: Send + Sync {
    /// `POST /bid`
    async fn place_bid(&self, bid: BidRequest) -> Result<BidReceipt, BackendError>;

    /// `GET /product/highest-bid?product_key={name}`
    async fn highest_bid(&self, product_key: &str) -> Result<HighestBid, BackendError>;

    /// `GET /product/time-left?product_key={name}` — seconds remaining.
    async fn time_left(&self, product_key: &str) -> Result<u64, BackendError>;

    /// `GET /products`
    async fn list_products(&self) -> Result<Vec<Product>, BackendError>;
}

/// `reqwest`-based implementation of [`AuctionBackend`].
pub struct HttpAuctionBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuctionBackend {
    /// Creates a client for the backend at `base_url`, with `timeout`
    /// applied to every request.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Maps a non-2xx response to the matching error; 404 gets its own variant
/// because "not found" has a dedicated spoken reply.
fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        Err(BackendError::NotFound)
    } else if !status.is_success() {
        Err(BackendError::Status(status.as_u16()))
    } else {
        Ok(response)
    }
}

#[async_trait]
impl AuctionBackend for HttpAuctionBackend {
    async fn place_bid(&self, bid: BidRequest) -> Result<BidReceipt, BackendError> {
        debug!(product = %bid.product_name, amount = bid.bid_amount, "Submitting bid");
        let response = self
            .client
            .post(self.url("/bid"))
            .json(&bid)
            .send()
            .await?;
        let receipt = check_status(response)?.json::<BidReceipt>().await?;
        Ok(receipt)
    }

    async fn highest_bid(&self, product_key: &str) -> Result<HighestBid, BackendError> {
        debug!(product = %product_key, "Fetching highest bid");
        let response = self
            .client
            .get(self.url("/product/highest-bid"))
            .query(&[("product_key", product_key)])
            .send()
            .await?;
        let highest = check_status(response)?.json::<HighestBid>().await?;
        Ok(highest)
    }

    async fn time_left(&self, product_key: &str) -> Result<u64, BackendError> {
        debug!(product = %product_key, "Fetching time left");
        let response = self
            .client
            .get(self.url("/product/time-left"))
            .query(&[("product_key", product_key)])
            .send()
            .await?;
        let body = check_status(response)?.json::<TimeLeftResponse>().await?;
        Ok(body.seconds_left)
    }

    async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        debug!("Fetching product list");
        let response = self.client.get(self.url("/products")).send().await?;
        let products = check_status(response)?.json::<Vec<Product>>().await?;
        Ok(products)
    }
}
