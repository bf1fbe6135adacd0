//! Aggregate statistics over the trade log.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::domain::trade::{Trade, TradeStatus};

/// Headline numbers for the dashboard. These serialize as JSON numbers, not
/// decimal strings, matching the stats endpoint's wire shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_trades: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub win_rate: Decimal,
    #[serde(rename = "totalPnL", with = "rust_decimal::serde::float")]
    pub total_pnl: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub current_capital: Decimal,
}

impl DashboardStats {
    /// One pass over the trade set. Win rate is winners over closed trades
    /// as a percentage with one decimal place, zero when nothing is closed.
    pub fn compute(trades: &[Trade], starting_capital: Decimal) -> DashboardStats {
        let mut closed = 0usize;
        let mut winners = 0usize;
        let mut total_pnl = Decimal::ZERO;

        for trade in trades {
            if trade.status != TradeStatus::Closed {
                continue;
            }
            closed += 1;
            let pnl = trade.pnl.unwrap_or(Decimal::ZERO);
            if pnl > Decimal::ZERO {
                winners += 1;
            }
            total_pnl += pnl;
        }

        let win_rate = if closed > 0 {
            (Decimal::from(winners) * Decimal::ONE_HUNDRED / Decimal::from(closed))
                .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        } else {
            Decimal::ZERO
        };

        DashboardStats {
            total_trades: trades.len(),
            win_rate,
            total_pnl: total_pnl.round_dp(2),
            current_capital: starting_capital + total_pnl.round_dp(2),
        }
    }
}

/// Per-instrument slice of the breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentStats {
    pub instrument: String,
    pub trades: usize,
    #[serde(rename = "totalPnL", with = "rust_decimal::serde::float")]
    pub total_pnl: Decimal,
}

/// Detailed read-only statistics: win/loss counts, average win and loss,
/// best and worst trade, profit factor, and per-instrument totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsBreakdown {
    pub wins: usize,
    pub losses: usize,
    pub open_trades: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_win: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_loss: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub profit_factor: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub best_trade: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub worst_trade: Option<Decimal>,
    pub instruments: Vec<InstrumentStats>,
}

impl StatsBreakdown {
    pub fn compute(trades: &[Trade]) -> StatsBreakdown {
        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut open_trades = 0usize;
        let mut total_wins = Decimal::ZERO;
        let mut total_losses = Decimal::ZERO;
        let mut best_trade: Option<Decimal> = None;
        let mut worst_trade: Option<Decimal> = None;
        let mut instruments: Vec<InstrumentStats> = Vec::new();

        for trade in trades {
            let slot = match instruments
                .iter()
                .position(|i| i.instrument == trade.instrument)
            {
                Some(idx) => idx,
                None => {
                    instruments.push(InstrumentStats {
                        instrument: trade.instrument.clone(),
                        trades: 0,
                        total_pnl: Decimal::ZERO,
                    });
                    instruments.len() - 1
                }
            };
            instruments[slot].trades += 1;

            if trade.status != TradeStatus::Closed {
                open_trades += 1;
                continue;
            }

            let pnl = trade.pnl.unwrap_or(Decimal::ZERO);
            instruments[slot].total_pnl += pnl;

            if pnl > Decimal::ZERO {
                wins += 1;
                total_wins += pnl;
            } else if pnl < Decimal::ZERO {
                losses += 1;
                total_losses += pnl.abs();
            }

            best_trade = Some(best_trade.map_or(pnl, |b| b.max(pnl)));
            worst_trade = Some(worst_trade.map_or(pnl, |w| w.min(pnl)));
        }

        let avg_win = if wins > 0 {
            (total_wins / Decimal::from(wins)).round_dp(2)
        } else {
            Decimal::ZERO
        };
        let avg_loss = if losses > 0 {
            (total_losses / Decimal::from(losses)).round_dp(2)
        } else {
            Decimal::ZERO
        };
        let profit_factor = if avg_loss > Decimal::ZERO {
            Some((avg_win / avg_loss).round_dp(2))
        } else {
            None
        };

        instruments.sort_by(|a, b| {
            b.trades
                .cmp(&a.trades)
                .then_with(|| a.instrument.cmp(&b.instrument))
        });

        StatsBreakdown {
            wins,
            losses,
            open_trades,
            avg_win,
            avg_loss,
            profit_factor,
            best_trade,
            worst_trade,
            instruments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::{NewTrade, TradeKind};
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn entry_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    fn closed_trade(id: i64, instrument: &str, entry: Decimal, exit: Decimal, size: Decimal) -> Trade {
        Trade::from_new(
            id,
            NewTrade {
                instrument: instrument.into(),
                kind: TradeKind::Buy,
                entry_price: entry,
                exit_price: Some(exit),
                size,
                entry_time: entry_time(),
                exit_time: None,
                notes: None,
            },
        )
    }

    fn open_trade(id: i64, instrument: &str) -> Trade {
        Trade::from_new(
            id,
            NewTrade {
                instrument: instrument.into(),
                kind: TradeKind::Buy,
                entry_price: dec!(1.1000),
                exit_price: None,
                size: dec!(1000),
                entry_time: entry_time(),
                exit_time: None,
                notes: None,
            },
        )
    }

    // pnl +10.00 closed, pnl -4.00 closed, one open
    fn scenario_trades() -> Vec<Trade> {
        vec![
            closed_trade(1, "EUR/USD", dec!(1.1000), dec!(1.1100), dec!(1000)),
            closed_trade(2, "EUR/USD", dec!(1.1000), dec!(1.0960), dec!(1000)),
            open_trade(3, "GBP/USD"),
        ]
    }

    #[test]
    fn dashboard_scenario() {
        let stats = DashboardStats::compute(&scenario_trades(), dec!(50000));
        assert_eq!(stats.total_trades, 3);
        assert_eq!(stats.win_rate, dec!(50.0));
        assert_eq!(stats.total_pnl, dec!(6.00));
        assert_eq!(stats.current_capital, dec!(50006.00));
    }

    #[test]
    fn empty_trade_set_yields_zeroes() {
        let stats = DashboardStats::compute(&[], dec!(50000));
        assert_eq!(stats.total_trades, 0);
        assert_eq!(stats.win_rate, Decimal::ZERO);
        assert_eq!(stats.total_pnl, Decimal::ZERO);
        assert_eq!(stats.current_capital, dec!(50000));
    }

    #[test]
    fn win_rate_zero_with_only_open_trades() {
        let trades = vec![open_trade(1, "EUR/USD"), open_trade(2, "EUR/USD")];
        let stats = DashboardStats::compute(&trades, dec!(50000));
        assert_eq!(stats.total_trades, 2);
        assert_eq!(stats.win_rate, Decimal::ZERO);
    }

    #[test]
    fn win_rate_rounds_to_one_decimal() {
        // 1 winner of 3 closed -> 33.3
        let trades = vec![
            closed_trade(1, "A", dec!(1.0000), dec!(1.0100), dec!(100)),
            closed_trade(2, "A", dec!(1.0000), dec!(0.9900), dec!(100)),
            closed_trade(3, "A", dec!(1.0000), dec!(0.9900), dec!(100)),
        ];
        let stats = DashboardStats::compute(&trades, dec!(50000));
        assert_eq!(stats.win_rate, dec!(33.3));
    }

    #[test]
    fn stats_serialize_as_numbers() {
        let stats = DashboardStats::compute(&scenario_trades(), dec!(50000));
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["winRate"], 50.0);
        assert_eq!(json["totalPnL"], serde_json::Value::from(6.0));
        assert_eq!(json["currentCapital"], serde_json::Value::from(50006.0));
    }

    #[test]
    fn breakdown_scenario() {
        let breakdown = StatsBreakdown::compute(&scenario_trades());
        assert_eq!(breakdown.wins, 1);
        assert_eq!(breakdown.losses, 1);
        assert_eq!(breakdown.open_trades, 1);
        assert_eq!(breakdown.avg_win, dec!(10.00));
        assert_eq!(breakdown.avg_loss, dec!(4.00));
        assert_eq!(breakdown.profit_factor, Some(dec!(2.50)));
        assert_eq!(breakdown.best_trade, Some(dec!(10.00)));
        assert_eq!(breakdown.worst_trade, Some(dec!(-4.00)));
    }

    #[test]
    fn breakdown_profit_factor_undefined_without_losses() {
        let trades = vec![closed_trade(1, "A", dec!(1.0000), dec!(1.0100), dec!(100))];
        let breakdown = StatsBreakdown::compute(&trades);
        assert_eq!(breakdown.profit_factor, None);
    }

    #[test]
    fn breakdown_groups_instruments() {
        let breakdown = StatsBreakdown::compute(&scenario_trades());
        assert_eq!(breakdown.instruments.len(), 2);
        // EUR/USD has two trades, so it sorts first
        assert_eq!(breakdown.instruments[0].instrument, "EUR/USD");
        assert_eq!(breakdown.instruments[0].trades, 2);
        assert_eq!(breakdown.instruments[0].total_pnl, dec!(6.00));
        assert_eq!(breakdown.instruments[1].instrument, "GBP/USD");
        assert_eq!(breakdown.instruments[1].trades, 1);
        assert_eq!(breakdown.instruments[1].total_pnl, Decimal::ZERO);
    }

    #[test]
    fn breakdown_empty_set() {
        let breakdown = StatsBreakdown::compute(&[]);
        assert_eq!(breakdown.wins, 0);
        assert_eq!(breakdown.best_trade, None);
        assert_eq!(breakdown.worst_trade, None);
        assert!(breakdown.instruments.is_empty());
    }

    proptest! {
        // total P&L is a plain sum, so shuffling the trade set never changes it
        #[test]
        fn total_pnl_is_order_independent(cents in proptest::collection::vec(-100_000i64..100_000, 1..40)) {
            let mut trades: Vec<Trade> = cents
                .iter()
                .enumerate()
                .map(|(i, &c)| {
                    let delta = Decimal::new(c, 2) / dec!(1000);
                    closed_trade(i as i64, "EUR/USD", dec!(2.0000), dec!(2.0000) + delta, dec!(1000))
                })
                .collect();

            let forward = DashboardStats::compute(&trades, dec!(50000));
            trades.reverse();
            let reversed = DashboardStats::compute(&trades, dec!(50000));

            prop_assert_eq!(forward.total_pnl, reversed.total_pnl);
            prop_assert_eq!(forward.win_rate, reversed.win_rate);
        }
    }
}
