//! Trade entity and settlement derivation.
//!
//! A trade is open until an exit price is recorded; P&L and status are
//! derived fields, recomputed by [`settle`] after every create and update.
//! Callers never supply them.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};

// Fractional digits carried by each fixed-point field.
pub const PRICE_SCALE: u32 = 5;
pub const SIZE_SCALE: u32 = 4;
pub const PNL_SCALE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeKind {
    Buy,
    Sell,
}

impl TradeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TradeKind::Buy => "buy",
            TradeKind::Sell => "sell",
        }
    }

    pub fn parse(s: &str) -> Option<TradeKind> {
        match s {
            "buy" => Some(TradeKind::Buy),
            "sell" => Some(TradeKind::Sell),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Closed,
}

impl TradeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TradeStatus::Open => "open",
            TradeStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<TradeStatus> {
        match s {
            "open" => Some(TradeStatus::Open),
            "closed" => Some(TradeStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: i64,
    pub instrument: String,
    #[serde(rename = "type")]
    pub kind: TradeKind,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub size: Decimal,
    pub pnl: Option<Decimal>,
    pub status: TradeStatus,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Fields accepted when creating a trade. Server-assigned fields (id, pnl,
/// status) are absent; unknown keys are rejected.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewTrade {
    pub instrument: String,
    #[serde(rename = "type")]
    pub kind: TradeKind,
    pub entry_price: Decimal,
    #[serde(default)]
    pub exit_price: Option<Decimal>,
    pub size: Decimal,
    pub entry_time: DateTime<Utc>,
    #[serde(default)]
    pub exit_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Explicit partial update. Nullable fields use a double `Option` so that an
/// absent key and an explicit `null` are distinguishable: `None` leaves the
/// field untouched, `Some(None)` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TradePatch {
    #[serde(default)]
    pub instrument: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<TradeKind>,
    #[serde(default)]
    pub entry_price: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    pub exit_price: Option<Option<Decimal>>,
    #[serde(default)]
    pub size: Option<Decimal>,
    #[serde(default)]
    pub entry_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    pub exit_time: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Result of the P&L/status derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub pnl: Option<Decimal>,
    pub status: TradeStatus,
}

/// Derive P&L and status from the trade's current fields.
///
/// Closed trades settle `(exit - entry) * size` for buys and
/// `(entry - exit) * size` for sells, rounded to two places half-away-from
/// zero. Without an exit price the trade is open and carries no P&L.
pub fn settle(
    kind: TradeKind,
    entry_price: Decimal,
    exit_price: Option<Decimal>,
    size: Decimal,
) -> Settlement {
    match exit_price {
        Some(exit) => {
            let gross = match kind {
                TradeKind::Buy => (exit - entry_price) * size,
                TradeKind::Sell => (entry_price - exit) * size,
            };
            Settlement {
                pnl: Some(
                    gross.round_dp_with_strategy(PNL_SCALE, RoundingStrategy::MidpointAwayFromZero),
                ),
                status: TradeStatus::Closed,
            }
        }
        None => Settlement {
            pnl: None,
            status: TradeStatus::Open,
        },
    }
}

impl Trade {
    /// Assemble a trade from a creation payload and a store-assigned id.
    pub fn from_new(id: i64, new: NewTrade) -> Trade {
        let mut trade = Trade {
            id,
            instrument: new.instrument,
            kind: new.kind,
            entry_price: new.entry_price,
            exit_price: new.exit_price,
            size: new.size,
            pnl: None,
            status: TradeStatus::Open,
            entry_time: new.entry_time,
            exit_time: new.exit_time,
            notes: new.notes,
        };
        trade.normalize();
        trade
    }

    /// Merge a patch, then re-derive P&L and status. Clearing the exit price
    /// reopens the trade.
    pub fn apply_patch(&mut self, patch: TradePatch) {
        if let Some(instrument) = patch.instrument {
            self.instrument = instrument;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(entry_price) = patch.entry_price {
            self.entry_price = entry_price;
        }
        if let Some(exit_price) = patch.exit_price {
            self.exit_price = exit_price;
        }
        if let Some(size) = patch.size {
            self.size = size;
        }
        if let Some(entry_time) = patch.entry_time {
            self.entry_time = entry_time;
        }
        if let Some(exit_time) = patch.exit_time {
            self.exit_time = exit_time;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        self.normalize();
    }

    /// Clamp fixed-point fields to their declared scales and re-derive.
    fn normalize(&mut self) {
        self.entry_price = self.entry_price.round_dp(PRICE_SCALE);
        self.exit_price = self.exit_price.map(|p| p.round_dp(PRICE_SCALE));
        self.size = self.size.round_dp(SIZE_SCALE);
        let settlement = settle(self.kind, self.entry_price, self.exit_price, self.size);
        self.pnl = settlement.pnl;
        self.status = settlement.status;
    }
}
