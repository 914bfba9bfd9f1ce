use chrono::{DateTime, Utc};
use crate::api::types::{Direction, TradeSide, TradeSignal, WhaleActivity};

/// Summary of the signal history
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStats {
    pub total: usize,
    pub yes_count: usize,
    pub no_count: usize,
    /// Share of YES calls in percent, 0 for an empty history
    pub yes_rate_pct: f64,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}

impl HistoryStats {
    pub fn from_history(history: &[TradeSignal]) -> Self {
        let total = history.len();
        let yes_count = history.iter().filter(|s| s.direction == Direction::Yes).count();
        let no_count = total - yes_count;

        let yes_rate_pct = if total == 0 {
            0.0
        } else {
            yes_count as f64 / total as f64 * 100.0
        };

        let timestamps = history.iter().filter_map(|s| s.timestamp);

        Self {
            total,
            yes_count,
            no_count,
            yes_rate_pct,
            earliest: timestamps.clone().min(),
            latest: timestamps.max(),
        }
    }
}

/// Totals over a whale trade feed
#[derive(Debug, Clone, PartialEq)]
pub struct WhaleFeedSummary {
    pub total_volume: f64,
    pub buy_count: usize,
    pub sell_count: usize,
}

impl WhaleFeedSummary {
    pub fn from_feed(feed: &[WhaleActivity]) -> Self {
        Self {
            total_volume: feed.iter().map(|a| a.amount).sum(),
            buy_count: feed.iter().filter(|a| a.direction == TradeSide::Buy).count(),
            sell_count: feed.iter().filter(|a| a.direction == TradeSide::Sell).count(),
        }
    }
}

/// Keep trades on one side, or all of them for `None`
pub fn filter_by_side(feed: &[WhaleActivity], side: Option<TradeSide>) -> Vec<&WhaleActivity> {
    feed.iter()
        .filter(|a| side.map_or(true, |side| a.direction == side))
        .collect()
}
