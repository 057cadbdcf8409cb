//! Core types - Strong typing for the level grid

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tradeable symbol (e.g., "ETHUSD")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Venue order identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Side a level quotes: Long buys at `price_buy`, Short sells at `price_sell`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

/// Whether an order currently represents a level.
///
/// The order id only exists while the level is placed, so an empty level
/// can never carry a stale id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelStatus {
    Empty,
    Placed { order_id: OrderId, order_side: Side },
}

impl LevelStatus {
    pub fn is_placed(&self) -> bool {
        matches!(self, LevelStatus::Placed { .. })
    }

    pub fn order_id(&self) -> Option<&OrderId> {
        match self {
            LevelStatus::Placed { order_id, .. } => Some(order_id),
            LevelStatus::Empty => None,
        }
    }
}

/// Fill notification from the trade feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillEvent {
    pub order_id: OrderId,
    /// Informational; the engine treats a fill as "no longer open"
    pub size: Decimal,
    pub trade_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl FillEvent {
    pub fn new(order_id: OrderId, size: Decimal) -> Self {
        Self {
            order_id,
            size,
            trade_id: None,
            timestamp: Utc::now(),
        }
    }
}
