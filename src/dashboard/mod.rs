pub mod sequencer;
pub mod stats;

pub use sequencer::{RequestSequencer, RequestTicket};
pub use stats::{filter_by_side, HistoryStats, WhaleFeedSummary};

use anyhow::{Context, Result};
use serde_json::Value;
use std::cell::{Ref, RefCell};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use crate::api::types::{
    ChatbotReply, PolycasterOptions, SignalResponse, TrendingMarket, WhaleActivity, WhaleStats,
};
use crate::api::ApiClient;
use crate::error::{error_message, ApiError};
use crate::monitoring::logger::SignalLog;
use crate::storage::KeyValueStore;
use crate::store::notice::DEFAULT_NOTICE_TTL;
use crate::store::{Settings, SignalStore};

/// Reply shown when the chatbot cannot be reached
pub const CHATBOT_APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

/// Which backend engine produces the signal
#[derive(Debug, Clone)]
pub enum AnalysisEngine {
    Spoon,
    Polycaster(PolycasterOptions),
}

/// Everything a refresh pulls from the backend. Sections that failed are empty.
#[derive(Debug, Default)]
pub struct DashboardSnapshot {
    pub trending: Vec<TrendingMarket>,
    pub whale_feed: Vec<WhaleActivity>,
    pub whale_stats: Option<WhaleStats>,
}

/// Application context: owns the backend client and the client-side state.
/// Created once at startup and dropped on shutdown. Single-threaded; store
/// borrows never span an `.await`.
pub struct Dashboard {
    client: ApiClient,
    storage: Arc<dyn KeyValueStore>,
    store: RefCell<SignalStore>,
    settings: RefCell<Settings>,
    sequencer: RequestSequencer,
    signal_log: Option<SignalLog>,
    notice_ttl: Duration,
}

impl Dashboard {
    pub fn new(
        client: ApiClient,
        storage: Arc<dyn KeyValueStore>,
        signal_log: Option<SignalLog>,
    ) -> Result<Self> {
        let store = SignalStore::load(storage.clone()).context("Failed to load signal store")?;
        let settings = Settings::load(storage.as_ref()).context("Failed to load settings")?;

        Ok(Self {
            client,
            storage,
            store: RefCell::new(store),
            settings: RefCell::new(settings),
            sequencer: RequestSequencer::new(),
            signal_log,
            notice_ttl: DEFAULT_NOTICE_TTL,
        })
    }

    pub fn with_notice_ttl(mut self, ttl: Duration) -> Self {
        self.notice_ttl = ttl;
        self
    }

    pub fn store(&self) -> Ref<'_, SignalStore> {
        self.store.borrow()
    }

    pub fn settings(&self) -> Ref<'_, Settings> {
        self.settings.borrow()
    }

    /// Run an analysis and record its card. Backend failures become the
    /// store's error notice and yield `None`, as does a response that was
    /// superseded by a newer request for the same market.
    pub async fn analyze(
        &self,
        market_slug: &str,
        engine: &AnalysisEngine,
    ) -> Result<Option<SignalResponse>> {
        let ticket = self.sequencer.issue(market_slug);
        {
            let mut store = self.store.borrow_mut();
            store.set_loading(true);
            store.set_error(None);
        }

        let result = match engine {
            AnalysisEngine::Spoon => self.client.analyze_with_spoon(market_slug).await,
            AnalysisEngine::Polycaster(options) => {
                self.client.analyze_with_polycaster(market_slug, options).await
            }
        };

        if !self.sequencer.is_current(&ticket) {
            debug!(market = ticket.key(), seq = ticket.seq(), "discarding superseded analysis response");
            return Ok(None);
        }

        let mut store = self.store.borrow_mut();
        store.set_loading(false);

        match result {
            Ok(response) => {
                store
                    .record(response.card.clone())
                    .with_context(|| format!("Failed to record signal for {}", market_slug))?;

                info!(
                    market_slug,
                    strategy = %response.card.strategy,
                    direction = ?response.card.direction,
                    confidence = response.card.confidence,
                    "signal recorded"
                );

                if let (Some(log), Some(stamped)) = (&self.signal_log, store.history().first()) {
                    if let Err(e) = log.log_signal(stamped) {
                        warn!(error = %e, "failed to append signal to CSV log");
                    }
                }

                Ok(Some(response))
            }
            Err(e) => {
                Self::report(&mut store, "analysis", &e);
                Ok(None)
            }
        }
    }

    /// Fetch trending markets and whale data concurrently
    pub async fn refresh(&self, trending_limit: u32, whale_feed_limit: u32) -> DashboardSnapshot {
        self.store.borrow_mut().set_loading(true);

        let (trending, whale_feed, whale_stats) = futures::join!(
            self.client.get_trending(trending_limit),
            self.client.get_whale_activity(Some(whale_feed_limit)),
            self.client.get_whale_stats()
        );

        let mut store = self.store.borrow_mut();
        store.set_loading(false);

        let snapshot = DashboardSnapshot {
            trending: trending.unwrap_or_else(|e| {
                Self::report(&mut store, "trending markets", &e);
                Vec::new()
            }),
            whale_feed: whale_feed.unwrap_or_else(|e| {
                Self::report(&mut store, "whale feed", &e);
                Vec::new()
            }),
            whale_stats: whale_stats
                .map_err(|e| Self::report(&mut store, "whale stats", &e))
                .ok(),
        };

        debug!(
            trending = snapshot.trending.len(),
            whale_feed = snapshot.whale_feed.len(),
            "dashboard refreshed"
        );
        snapshot
    }

    /// Ask the chatbot. Blank questions are not sent; failures produce an
    /// apology reply instead of an error.
    pub async fn ask(&self, question: &str, context: Option<&Value>) -> Option<ChatbotReply> {
        if question.trim().is_empty() {
            return None;
        }

        match self.client.ask_chatbot(question, context).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                warn!(error = %error_message(&e), "chatbot request failed");
                Some(ChatbotReply {
                    response: CHATBOT_APOLOGY.to_string(),
                    audio_url: None,
                })
            }
        }
    }

    pub fn toggle_favorite(&self, market_id: &str) -> Result<bool> {
        self.store
            .borrow_mut()
            .toggle_favorite(market_id)
            .context("Failed to update favorites")
    }

    pub fn clear_history(&self) -> Result<()> {
        self.store
            .borrow_mut()
            .clear_history()
            .context("Failed to clear history")
    }

    pub fn history_stats(&self) -> HistoryStats {
        HistoryStats::from_history(self.store.borrow().history())
    }

    /// Persist new preferences
    pub fn update_settings(&self, settings: Settings) -> Result<()> {
        settings
            .save(self.storage.as_ref())
            .context("Failed to save settings")?;
        *self.settings.borrow_mut() = settings;
        Ok(())
    }

    /// Dismiss an error notice that has been visible long enough
    pub fn expire_notices(&self) {
        if self.store.borrow_mut().expire_error(self.notice_ttl) {
            debug!("error notice dismissed");
        }
    }

    fn report(store: &mut SignalStore, what: &str, error: &ApiError) {
        let message = error_message(error);
        warn!(what, error = %message, "backend call failed");
        store.set_error(Some(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::store::Theme;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn signal_response(slug: &str, strategy: &str) -> Value {
        json!({
            "state": {
                "market_slug": slug,
                "current_odds": 0.42,
                "narrative_score": 61.0,
                "fundamental_truth": "neutral",
                "decision": "BUY YES"
            },
            "card": {
                "market_id": slug,
                "strategy": strategy,
                "confidence": 0.7,
                "direction": "NO",
                "reasoning": "odds look rich",
                "proof_link": "https://example.com/proof"
            },
            "upload": null
        })
    }

    fn dashboard(server: &MockServer, storage: Arc<MemoryStorage>) -> Dashboard {
        let client = ApiClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        Dashboard::new(client, storage, None).unwrap()
    }

    #[tokio::test]
    async fn test_analyze_records_signal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/spoon/trade"))
            .respond_with(ResponseTemplate::new(200).set_body_json(signal_response("btc-100k", "SPOON")))
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryStorage::new());
        let dash = dashboard(&server, storage.clone());
        let response = dash.analyze("btc-100k", &AnalysisEngine::Spoon).await.unwrap();

        assert!(response.is_some());
        let store = dash.store();
        assert_eq!(store.signals().len(), 1);
        assert_eq!(store.history().len(), 1);
        assert!(!store.is_loading());
        assert!(store.error().is_none());
        drop(store);

        // Reopening over the same storage keeps history only
        let reopened = dashboard(&server, storage);
        assert_eq!(reopened.store().history().len(), 1);
        assert!(reopened.store().signals().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_failure_sets_notice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/polycaster/signal"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "detail": "Analysis error: upstream" })))
            .mount(&server)
            .await;

        let dash = dashboard(&server, Arc::new(MemoryStorage::new())).with_notice_ttl(Duration::ZERO);
        let engine = AnalysisEngine::Polycaster(PolycasterOptions::default());
        let response = dash.analyze("btc-100k", &engine).await.unwrap();

        assert!(response.is_none());
        assert_eq!(dash.store().error(), Some("Analysis error: upstream"));
        assert!(dash.store().history().is_empty());
        assert!(!dash.store().is_loading());

        dash.expire_notices();
        assert!(dash.store().error().is_none());
    }

    #[tokio::test]
    async fn test_superseded_response_discarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/spoon/trade"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(signal_response("btc-100k", "SPOON"))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/polycaster/signal"))
            .respond_with(ResponseTemplate::new(200).set_body_json(signal_response("btc-100k", "PolyCaster")))
            .mount(&server)
            .await;

        let dash = dashboard(&server, Arc::new(MemoryStorage::new()));
        let polycaster = AnalysisEngine::Polycaster(PolycasterOptions::default());

        let (stale, fresh) = futures::join!(
            dash.analyze("btc-100k", &AnalysisEngine::Spoon),
            dash.analyze("btc-100k", &polycaster)
        );

        assert!(stale.unwrap().is_none());
        assert!(fresh.unwrap().is_some());

        let store = dash.store();
        assert_eq!(store.history().len(), 1);
        assert_eq!(store.history()[0].strategy, "PolyCaster");
    }

    #[tokio::test]
    async fn test_refresh_keeps_successful_sections() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/polymarket/trending"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "slug": "btc-100k", "title": "Bitcoin above 100k?" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/polywhaler/feeds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/polywhaler/whales"))
            .respond_with(ResponseTemplate::new(502).set_body_json(json!({ "detail": "Unable to fetch whale data" })))
            .mount(&server)
            .await;

        let dash = dashboard(&server, Arc::new(MemoryStorage::new()));
        let snapshot = dash.refresh(8, 20).await;

        assert_eq!(snapshot.trending.len(), 1);
        assert!(snapshot.whale_feed.is_empty());
        assert!(snapshot.whale_stats.is_none());
        assert_eq!(dash.store().error(), Some("Unable to fetch whale data"));
    }

    #[tokio::test]
    async fn test_chatbot_fallback_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chatbot/ask"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dash = dashboard(&server, Arc::new(MemoryStorage::new()));
        assert!(dash.ask("   ", None).await.is_none());

        let reply = dash.ask("what's trending?", None).await.unwrap();
        assert_eq!(reply.response, CHATBOT_APOLOGY);
    }

    #[tokio::test]
    async fn test_favorites_settings_and_stats() {
        let server = MockServer::start().await;
        let storage = Arc::new(MemoryStorage::new());
        let dash = dashboard(&server, storage.clone());

        assert!(dash.toggle_favorite("eth-etf").unwrap());
        assert!(dash.store().is_favorite("eth-etf"));

        let settings = Settings { theme: Theme::Light, ..Settings::default() };
        dash.update_settings(settings.clone()).unwrap();
        assert_eq!(*dash.settings(), settings);
        assert_eq!(Settings::load(&*storage).unwrap().theme, Theme::Light);

        assert_eq!(dash.history_stats().total, 0);
        dash.clear_history().unwrap();
    }
}
