use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use crate::api::types::{Outcome, TrendingMarket};

const DEFAULT_ODDS: f64 = 0.5;

/// Shape the `{ status, count, data: [...] }` envelope returned by the
/// trending and list endpoints into at most `limit` market summaries.
pub fn normalize_trending(body: &Value, limit: usize) -> Vec<TrendingMarket> {
    let Some(items) = body.get("data").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .take(limit)
        .enumerate()
        .map(|(idx, item)| convert_market(item, idx))
        .collect()
}

fn convert_market(item: &Value, idx: usize) -> TrendingMarket {
    let placeholder = format!("market-{}", idx);

    let title_field = non_empty_str(item, "title");
    let title = title_field
        .or_else(|| non_empty_str(item, "question"))
        .unwrap_or("Unknown Market")
        .to_string();

    let id = non_empty_str(item, "id")
        .or_else(|| non_empty_str(item, "slug"))
        .map(str::to_string)
        .unwrap_or_else(|| placeholder.clone());

    // Slug falls back on the title field only, not on the question
    let slug = non_empty_str(item, "slug")
        .map(str::to_string)
        .or_else(|| title_field.map(slugify))
        .unwrap_or(placeholder);

    let prices = outcome_prices(item);

    let volume_24h = ["volume24hr", "volume24h"]
        .iter()
        .find_map(|key| item.get(*key).and_then(as_number))
        .unwrap_or(0.0);

    TrendingMarket {
        id,
        slug,
        title,
        description: non_empty_str(item, "description").unwrap_or_default().to_string(),
        image_url: non_empty_str(item, "image")
            .or_else(|| non_empty_str(item, "image_url"))
            .map(str::to_string),
        current_odds: prices.first().copied().unwrap_or(DEFAULT_ODDS),
        volume_24h,
        outcomes: prices
            .iter()
            .enumerate()
            .map(|(i, odds)| Outcome {
                name: if i == 0 { "YES" } else { "NO" }.to_string(),
                odds: *odds,
            })
            .collect(),
    }
}

/// Lowercase and collapse whitespace runs into `-`
pub fn slugify(title: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let re = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"));
    re.replace_all(&title.to_lowercase(), "-").into_owned()
}

/// `outcomePrices` shows up as a number array, a numeric-string array, or a
/// JSON-encoded string of either.
fn outcome_prices(item: &Value) -> Vec<f64> {
    let parsed;
    let array = match item.get("outcomePrices") {
        Some(Value::Array(values)) => values,
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Array(values)) => {
                parsed = values;
                &parsed
            }
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    array.iter().filter_map(as_number).collect()
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn non_empty_str<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
