//! Headless client for the PolyIntel prediction-market analysis backend.
//!
//! The [`dashboard::Dashboard`] ties together the typed backend client
//! ([`api::ApiClient`]), the signal store with its durable history and
//! favorites ([`store::SignalStore`]), and the local key-value storage they
//! persist to ([`storage`]).

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod monitoring;
pub mod storage;
pub mod store;
