use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::model::*;
use crate::core::{Error, OrderId, Result, Side, Symbol, Trader};

/// Network-backed trader for an HTTP/JSON venue with bearer-token auth.
pub struct RestTrader {
    client: Client,
    api_key: String,
    base_url: String,
}

impl RestTrader {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("venue API key is empty".to_string()));
        }
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send and unwrap the response envelope.
    ///
    /// HTTP 404 is reported as `OrderNotFound` when `order_id` is given.
    async fn send<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        order_id: Option<&OrderId>,
    ) -> Result<Option<T>> {
        let resp = req.bearer_auth(&self.api_key).send().await?;
        let status = resp.status();

        if status == StatusCode::NOT_FOUND {
            if let Some(id) = order_id {
                return Err(Error::OrderNotFound(id.clone()));
            }
        }

        let text = resp.text().await?;
        debug!(%status, body = %text, "venue response");

        if is_transient_status(status) {
            return Err(Error::Unavailable(format!("HTTP {}: {}", status, text)));
        }

        let body: ApiResponse<T> = serde_json::from_str(&text).map_err(|e| {
            if status.is_success() {
                Error::Serialization(e)
            } else {
                Error::Exchange(format!("HTTP {}: {}", status, text))
            }
        })?;

        if let Some(err) = body.error {
            return Err(Error::Exchange(format!("{} (code {})", err.message, err.code)));
        }
        if !status.is_success() {
            return Err(Error::Exchange(format!("HTTP {}", status)));
        }
        Ok(body.payload)
    }

    /// Active orders for a symbol
    pub async fn active_orders(&self, symbol: &Symbol) -> Result<Vec<ActiveOrder>> {
        let req = self
            .client
            .get(self.url("/api/orders"))
            .query(&[("assetPairId", symbol.as_str())]);
        Ok(self.send(req, None).await?.unwrap_or_default())
    }

    /// Most recent trades for a symbol, newest first
    pub async fn trades(&self, symbol: &Symbol, take: usize) -> Result<Vec<TradeRecord>> {
        let take = take.to_string();
        let req = self
            .client
            .get(self.url("/api/trades"))
            .query(&[("assetPairId", symbol.as_str()), ("take", take.as_str())]);
        Ok(self.send(req, None).await?.unwrap_or_default())
    }
}

/// Server-side and rate-limit statuses; the request may succeed later
fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

#[async_trait]
impl Trader for RestTrader {
    async fn place_order(
        &self,
        symbol: &Symbol,
        price: Decimal,
        size: Decimal,
        side: Side,
    ) -> Result<OrderId> {
        let body = LimitOrderRequest {
            asset_pair_id: symbol.to_string(),
            side: side.into(),
            volume: size,
            price,
        };
        let req = self.client.post(self.url("/api/orders/limit")).json(&body);
        let resp: Option<LimitOrderResponse> = self.send(req, None).await?;
        resp.map(|r| OrderId::new(r.order_id))
            .ok_or_else(|| Error::Exchange("limit order response without payload".to_string()))
    }

    async fn is_order_open(&self, order_id: &OrderId, symbol: &Symbol) -> Result<bool> {
        let orders = self.active_orders(symbol).await?;
        Ok(orders.iter().any(|o| o.id == order_id.as_str()))
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<()> {
        let req = self
            .client
            .delete(self.url(&format!("/api/orders/{}", order_id)));
        self.send::<serde_json::Value>(req, Some(order_id)).await?;
        Ok(())
    }

    async fn cancel_all_orders(&self, symbol: &Symbol) -> Result<()> {
        let req = self
            .client
            .delete(self.url("/api/orders"))
            .query(&[("assetPairId", symbol.as_str())]);
        self.send::<serde_json::Value>(req, None).await?;
        Ok(())
    }

    async fn remaining_size(
        &self,
        order_id: &OrderId,
        symbol: &Symbol,
    ) -> Result<Option<Decimal>> {
        let orders = self.active_orders(symbol).await?;
        Ok(orders
            .iter()
            .find(|o| o.id == order_id.as_str())
            .map(|o| o.remaining_volume))
    }

    async fn replace_order(
        &self,
        order_id: &OrderId,
        symbol: &Symbol,
        price: Decimal,
        size: Decimal,
        side: Side,
    ) -> Result<OrderId> {
        let body = BulkLimitOrderRequest {
            asset_pair_id: symbol.to_string(),
            cancel_previous_orders: false,
            orders: vec![BulkOrder {
                old_id: Some(order_id.to_string()),
                side: side.into(),
                price,
                volume: size,
            }],
        };
        let req = self.client.post(self.url("/api/orders/bulk")).json(&body);
        let resp: Option<BulkLimitOrderResponse> = self.send(req, Some(order_id)).await?;

        let status = resp
            .and_then(|r| r.statuses.into_iter().next())
            .ok_or_else(|| Error::Exchange(format!("replace of {} returned no status", order_id)))?;
        if !status.is_success() {
            return Err(Error::Exchange(format!(
                "replace of {} failed: {}",
                order_id,
                status.error.unwrap_or_default()
            )));
        }
        status
            .id
            .map(OrderId::new)
            .ok_or_else(|| Error::Exchange(format!("replace of {} returned no id", order_id)))
    }

    fn name(&self) -> &str {
        "rest"
    }
}
