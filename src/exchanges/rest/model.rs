use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::Side;

/// Envelope wrapping every venue response
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub payload: Option<T>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: serde_json::Value,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueSide {
    Buy,
    Sell,
}

impl From<Side> for VenueSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Long => VenueSide::Buy,
            Side::Short => VenueSide::Sell,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitOrderRequest {
    pub asset_pair_id: String,
    pub side: VenueSide,
    pub volume: Decimal,
    pub price: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitOrderResponse {
    pub order_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveOrder {
    pub id: String,
    pub asset_pair_id: String,
    pub side: VenueSide,
    pub price: Decimal,
    pub volume: Decimal,
    pub remaining_volume: Decimal,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkLimitOrderRequest {
    pub asset_pair_id: String,
    pub cancel_previous_orders: bool,
    pub orders: Vec<BulkOrder>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOrder {
    pub old_id: Option<String>,
    pub side: VenueSide,
    pub price: Decimal,
    pub volume: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkLimitOrderResponse {
    #[serde(default)]
    pub statuses: Vec<BulkOrderStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOrderStatus {
    pub id: Option<String>,
    /// "Success" or a venue error code
    pub error: Option<String>,
}

impl BulkOrderStatus {
    pub fn is_success(&self) -> bool {
        self.error.as_deref().is_none_or(|e| e.eq_ignore_ascii_case("success"))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub id: String,
    pub order_id: String,
    pub asset_pair_id: String,
    pub base_volume: Decimal,
    pub price: Decimal,
    #[serde(default)]
    pub side: Option<VenueSide>,
    #[serde(default)]
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_active_orders_envelope() {
        let body = r#"{
            "payload": [
                {"id": "o-1", "assetPairId": "ETHUSD", "side": "buy",
                 "price": "349.9", "volume": "0.001", "remainingVolume": "0.0004",
                 "status": "Placed"}
            ],
            "error": null
        }"#;
        let resp: ApiResponse<Vec<ActiveOrder>> = serde_json::from_str(body).unwrap();
        assert!(resp.error.is_none());
        let orders = resp.payload.unwrap();
        assert_eq!(orders[0].side, VenueSide::Buy);
        assert_eq!(orders[0].remaining_volume, "0.0004".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_parse_error_envelope() {
        let body = r#"{"payload": null, "error": {"code": 1100, "message": "Not enough funds"}}"#;
        let resp: ApiResponse<LimitOrderResponse> = serde_json::from_str(body).unwrap();
        assert!(resp.payload.is_none());
        assert_eq!(resp.error.unwrap().message, "Not enough funds");
    }

    #[test]
    fn test_bulk_request_wire_shape() {
        let req = BulkLimitOrderRequest {
            asset_pair_id: "ETHUSD".to_string(),
            cancel_previous_orders: false,
            orders: vec![BulkOrder {
                old_id: Some("o-1".to_string()),
                side: Side::Short.into(),
                price: "351.1".parse().unwrap(),
                volume: "0.001".parse().unwrap(),
            }],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["assetPairId"], "ETHUSD");
        assert_eq!(json["cancelPreviousOrders"], false);
        assert_eq!(json["orders"][0]["oldId"], "o-1");
        assert_eq!(json["orders"][0]["side"], "sell");
        assert_eq!(json["orders"][0]["price"], "351.1");
    }

    #[test]
    fn test_bulk_status_success() {
        let ok = BulkOrderStatus { id: Some("n".into()), error: Some("Success".into()) };
        let none = BulkOrderStatus { id: Some("n".into()), error: None };
        let bad = BulkOrderStatus { id: None, error: Some("NotEnoughFunds".into()) };
        assert!(ok.is_success());
        assert!(none.is_success());
        assert!(!bad.is_success());
    }
}
