use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use crate::api::trending::normalize_trending;
use crate::api::types::{
    AnalysisState, ChatbotReply, MarketData, MarketQuery, PolycasterOptions, RiskAnalysis,
    SignalResponse, TrendingMarket, WhaleActivity, WhaleStats,
};
use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_CATEGORY: &str = "crypto";
pub const DEFAULT_WHALE_FEED_LIMIT: u32 = 20;
/// The list endpoint returns everything the backend sent when no limit is given
const UNBOUNDED: usize = usize::MAX;

/// Typed gateway to the analysis backend. One request per call, no retries,
/// no caching.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct MarketSlugRequest<'a> {
    market_slug: &'a str,
}

#[derive(Debug, Serialize)]
struct PolycasterRequest<'a> {
    market_slug: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<&'a str>,
    category: &'a str,
    use_manus: bool,
}

#[derive(Debug, Serialize)]
struct PodcastRequest<'a> {
    market_slug: &'a str,
    analysis: &'a AnalysisState,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a Value>,
}

#[derive(Debug, Serialize)]
struct ChatbotRequest<'a> {
    question: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a Value>,
    use_voice: bool,
}

#[derive(Debug, Serialize)]
struct VoiceInputRequest<'a> {
    audio_data: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a Value>,
}

#[derive(Debug, Deserialize)]
struct PodcastResponse {
    audio_url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(ApiError::ClientBuild)?;

        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // Trade analysis

    /// Multi-factor analysis for a market slug
    pub async fn analyze_with_spoon(&self, market_slug: &str) -> Result<SignalResponse, ApiError> {
        self.post("/spoon/trade", &MarketSlugRequest { market_slug }).await
    }

    /// Sentiment-driven signal for a market slug
    pub async fn analyze_with_polycaster(
        &self,
        market_slug: &str,
        options: &PolycasterOptions,
    ) -> Result<SignalResponse, ApiError> {
        let body = PolycasterRequest {
            market_slug,
            query: options.query.as_deref(),
            category: options
                .category
                .as_deref()
                .filter(|c| !c.is_empty())
                .unwrap_or(DEFAULT_CATEGORY),
            use_manus: options.use_manus,
        };
        self.post("/polycaster/signal", &body).await
    }

    // Market data

    pub async fn get_markets(&self, query: &MarketQuery) -> Result<Vec<TrendingMarket>, ApiError> {
        let mut request = self.client.get(self.url("/polymarket/list"));
        if let Some(limit) = query.limit {
            request = request.query(&[("limit", limit)]);
        }
        let body: Value = self.send("/polymarket/list", request).await?;
        Ok(normalize_trending(&body, UNBOUNDED))
    }

    pub async fn get_market_details(&self, market_slug: &str) -> Result<MarketData, ApiError> {
        let path = format!("/polymarket/{}", market_slug);
        self.get(&path).await
    }

    /// Trending markets, at most `limit`
    pub async fn get_trending(&self, limit: u32) -> Result<Vec<TrendingMarket>, ApiError> {
        let request = self
            .client
            .get(self.url("/polymarket/trending"))
            .query(&[("limit", limit)]);
        let body: Value = self.send("/polymarket/trending", request).await?;
        Ok(normalize_trending(&body, limit as usize))
    }

    // Sentiment, risk and manipulation

    pub async fn analyze_sentiment(&self, market_slug: &str) -> Result<Value, ApiError> {
        let request = self
            .client
            .get(self.url("/polycaster/sentiment"))
            .query(&[("market_slug", market_slug)]);
        self.send("/polycaster/sentiment", request).await
    }

    pub async fn inspect_manipulation(&self, market_data: &Value) -> Result<Value, ApiError> {
        self.post("/polycop/inspect", market_data).await
    }

    pub async fn risk_analysis(&self, market_slug: &str) -> Result<RiskAnalysis, ApiError> {
        self.post("/polycop/risk-analysis", &MarketSlugRequest { market_slug }).await
    }

    // Audio and chat

    /// Generate an audio briefing, returns its URL
    pub async fn generate_podcast(
        &self,
        market_slug: &str,
        analysis: &AnalysisState,
    ) -> Result<String, ApiError> {
        let response: PodcastResponse = self
            .post("/polycaster/podcast", &PodcastRequest { market_slug, analysis })
            .await?;
        Ok(response.audio_url)
    }

    pub async fn chat_with_ai(&self, query: &str, context: Option<&Value>) -> Result<String, ApiError> {
        let response: ChatResponse = self.post("/sudo/chat", &ChatRequest { query, context }).await?;
        Ok(response.response)
    }

    /// Text question to the dashboard chatbot. A spoken reply is always requested.
    pub async fn ask_chatbot(
        &self,
        question: &str,
        context: Option<&Value>,
    ) -> Result<ChatbotReply, ApiError> {
        let body = ChatbotRequest {
            question,
            context,
            use_voice: true,
        };
        self.post("/chatbot/ask", &body).await
    }

    /// Voice question. `audio_base64` is the recorded clip, already base64-encoded.
    pub async fn ask_chatbot_voice(
        &self,
        audio_base64: &str,
        context: Option<&Value>,
    ) -> Result<ChatbotReply, ApiError> {
        let body = VoiceInputRequest {
            audio_data: audio_base64,
            context,
        };
        self.post("/chatbot/voice-input", &body).await
    }

    // Whales

    pub async fn get_whale_activity(&self, limit: Option<u32>) -> Result<Vec<WhaleActivity>, ApiError> {
        let limit = limit.unwrap_or(DEFAULT_WHALE_FEED_LIMIT);
        let request = self
            .client
            .get(self.url("/polywhaler/feeds"))
            .query(&[("limit", limit)]);
        self.send("/polywhaler/feeds", request).await
    }

    pub async fn get_whale_stats(&self) -> Result<WhaleStats, ApiError> {
        self.get("/polywhaler/whales").await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.client.get(self.url(path));
        self.send(path, request).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.client.post(self.url(path)).json(body);
        self.send(path, request).await
    }

    async fn send<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> Result<T, ApiError> {
        debug!(path, "backend request");

        let response = request.send().await.map_err(|e| {
            warn!(path, error = %e, "backend request failed");
            ApiError::Transport(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<Value>(&bytes)
                .ok()
                .and_then(|body| body.get("detail").cloned());
            warn!(path, status = status.as_u16(), "backend returned error status");
            return Err(ApiError::Status { status, detail });
        }

        serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode {
            endpoint: path.to_string(),
            source,
        })
    }
}
