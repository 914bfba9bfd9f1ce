use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "YES")]
    Yes,
    #[serde(rename = "NO")]
    No,
}

/// One analysis outcome for a market. Confidence is expected in [0, 1] but
/// is never clamped here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub market_id: String,
    pub strategy: String,
    pub confidence: f64,
    pub direction: Direction,
    pub reasoning: String,
    pub proof_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisState {
    pub market_slug: String,
    pub current_odds: f64,
    pub narrative_score: f64,
    pub fundamental_truth: String,
    pub decision: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reality_odds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalResponse {
    pub state: AnalysisState,
    pub card: TradeSignal,
    #[serde(default)]
    pub upload: serde_json::Value,
    #[serde(default)]
    pub audio_file: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub name: String,
    pub odds: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketData {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub current_odds: Option<f64>,
    #[serde(default)]
    pub volume_24h: Option<f64>,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
}

/// Market summary shaped from the trending/list endpoints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendingMarket {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub current_odds: f64,
    pub volume_24h: f64,
    pub outcomes: Vec<Outcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WhaleActivity {
    pub market_id: String,
    pub trader: String,
    pub amount: f64,
    pub direction: TradeSide,
    pub timestamp: String,
    pub odds_before: f64,
    pub odds_after: f64,
    pub impact: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhaleProfile {
    pub address: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub position_value: f64,
    #[serde(default)]
    pub active_markets: u32,
    #[serde(default)]
    pub trades_24h: u32,
    #[serde(default)]
    pub pnl_24h: f64,
    #[serde(default)]
    pub pnl_percentage: f64,
    #[serde(default)]
    pub reputation: Option<String>,
}

/// Aggregate whale statistics
#[derive(Debug, Clone, Deserialize)]
pub struct WhaleStats {
    #[serde(default)]
    pub largest_position: f64,
    #[serde(default)]
    pub whale_activity: u64,
    #[serde(default)]
    pub top_whales: Vec<WhaleProfile>,
    #[serde(default)]
    pub market_concentration: f64,
    #[serde(default)]
    pub total_whale_volume: f64,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskState {
    pub market_slug: String,
    pub risk_level: String,
    #[serde(default)]
    pub overall_score: Option<f64>,
    #[serde(default)]
    pub liquidity: String,
    #[serde(default)]
    pub volatility: f64,
    #[serde(default)]
    pub spread: f64,
    #[serde(default)]
    pub warning: Option<String>,
}

/// Scores in 0-100
#[derive(Debug, Clone, Deserialize)]
pub struct RiskScores {
    pub liquidity: f64,
    pub trader_diversity: f64,
    pub volume_consistency: f64,
    #[serde(default)]
    pub price_stability: Option<f64>,
    #[serde(default)]
    pub manipulation_resistance: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskAnalysis {
    pub state: RiskState,
    #[serde(default)]
    pub risk_indicators: Vec<String>,
    #[serde(default)]
    pub scores: Option<RiskScores>,
    #[serde(default)]
    pub factors: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatbotReply {
    pub response: String,
    #[serde(default)]
    pub audio_url: Option<String>,
}

/// Optional inputs for the sentiment-driven analysis
#[derive(Debug, Clone, Default)]
pub struct PolycasterOptions {
    pub query: Option<String>,
    pub category: Option<String>,
    pub use_manus: bool,
}

/// Optional filters for the market list
#[derive(Debug, Clone, Default)]
pub struct MarketQuery {
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_signal_wire_format() {
        let signal: TradeSignal = serde_json::from_value(json!({
            "market_id": "btc-100k",
            "strategy": "PolyCaster",
            "confidence": 0.8,
            "direction": "YES",
            "reasoning": "momentum",
            "proof_link": "https://example.com/proof",
            "timestamp": "2026-01-05T12:00:00Z"
        }))
        .unwrap();

        assert_eq!(signal.direction, Direction::Yes);
        assert!(signal.timestamp.is_some());

        let untimed = TradeSignal { timestamp: None, ..signal };
        let value = serde_json::to_value(&untimed).unwrap();
        assert_eq!(value["direction"], "YES");
        assert!(value.get("timestamp").is_none());
    }

    #[test]
    fn test_risk_analysis_with_partial_state() {
        let analysis: RiskAnalysis = serde_json::from_value(json!({
            "state": {
                "market_slug": "eth-etf",
                "risk_level": "MODERATE",
                "liquidity": "$0",
                "volatility": 50.0,
                "spread": 0.0,
                "warning": "Market data not available, showing estimated values"
            }
        }))
        .unwrap();

        assert_eq!(analysis.state.risk_level, "MODERATE");
        assert!(analysis.risk_indicators.is_empty());
        assert!(analysis.scores.is_none());
    }
}
