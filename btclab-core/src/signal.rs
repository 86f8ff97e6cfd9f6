//! Signal classification over predicted forward returns.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strong conviction above one percent predicted move.
pub const STRONG_THRESHOLD: f64 = 0.01;

/// Plain conviction above ten basis points.
pub const WEAK_THRESHOLD: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradingSignal {
    StrongBuy,
    Buy,
    NeutralHold,
    Sell,
    StrongSell,
}

impl fmt::Display for TradingSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TradingSignal::StrongBuy => "STRONG BUY",
            TradingSignal::Buy => "BUY",
            TradingSignal::NeutralHold => "NEUTRAL / HOLD",
            TradingSignal::Sell => "SELL",
            TradingSignal::StrongSell => "STRONG SELL",
        };
        f.write_str(label)
    }
}

/// Map a predicted log return to a signal.
///
/// Comparisons are strict: a prediction sitting exactly on the weak
/// threshold stays neutral, one exactly on the strong threshold stays
/// a plain buy or sell.
pub fn classify(predicted_return: f64) -> TradingSignal {
    if predicted_return > STRONG_THRESHOLD {
        TradingSignal::StrongBuy
    } else if predicted_return > WEAK_THRESHOLD {
        TradingSignal::Buy
    } else if predicted_return < -STRONG_THRESHOLD {
        TradingSignal::StrongSell
    } else if predicted_return < -WEAK_THRESHOLD {
        TradingSignal::Sell
    } else {
        TradingSignal::NeutralHold
    }
}
