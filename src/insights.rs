//! The question-answering pipeline: classify, resolve, shape.

mod classifier;
mod entities;
pub(crate) mod error;
mod resolver;
mod shaper;
pub(crate) mod suggestions;
#[cfg(test)]
pub(crate) mod testing;
pub(crate) mod types;

use std::{sync::Arc, time::Instant};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use self::{
    error::QueryError,
    resolver::DataResolver,
    types::{payload::DisplayPayload, query::QueryType},
};
use crate::{
    cache::{CachePolicy, TtlCache},
    outbound::DatasetStore,
};

/// A shaped answer together with how it was produced.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    #[serde(flatten)]
    pub payload: DisplayPayload,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub processed_at: String,
    pub from_cache: bool,
    /// Seconds the answer had been cached, on cache hits only.
    pub cached_at: Option<u64>,
    pub query_type: QueryType,
    pub processing_time_ms: u64,
    pub normalized_query: String,
}

/// Answers free-text questions about campaign engagement.
pub struct InsightsSystem {
    resolver: DataResolver,
    cache: Mutex<TtlCache<String, DisplayPayload>>,
}

impl InsightsSystem {
    pub(crate) fn new(store: Arc<dyn DatasetStore>, policy: CachePolicy) -> Self {
        Self {
            resolver: DataResolver::new(store, policy),
            cache: Mutex::new(TtlCache::new(policy)),
        }
    }

    /// Answers `text`. Failures are reported as an error payload, never as
    /// an `Err`.
    #[instrument(skip(self))]
    pub async fn process_query(&self, text: &str) -> QueryResponse {
        let started = Instant::now();
        let normalized = normalize(text);

        let cached = self
            .cache
            .lock()
            .await
            .get(&normalized)
            .map(|entry| (entry.value.clone(), entry.age()));
        if let Some((payload, age)) = cached {
            debug!(query = %normalized, "Answer cache hit");
            let query_type = payload.response_type();
            return respond(
                payload,
                query_type,
                normalized,
                started,
                Some(age.as_secs()),
            );
        }

        let (payload, query_type) = self.answer(text, &normalized).await;
        if payload.is_error() {
            info!(%query_type, "Question could not be answered");
        } else {
            self.cache
                .lock()
                .await
                .insert(normalized.clone(), payload.clone());
        }
        respond(payload, query_type, normalized, started, None)
    }

    async fn answer(&self, original: &str, normalized: &str) -> (DisplayPayload, QueryType) {
        if normalized.is_empty() {
            let payload = shaper::error_payload(&QueryError::EmptyQuery, None, original);
            return (payload, QueryType::Error);
        }
        let info = classifier::classify(normalized);
        info!(query_type = %info.query_type, "Classified question");
        let payload = match self.resolver.resolve(info.query_type, &info.entities).await {
            Ok(raw) => shaper::shape(raw, &info, original),
            Err(e) => {
                info!(query_type = %info.query_type, "Resolution failed: {e}");
                shaper::error_payload(&e, Some(info.query_type), original)
            }
        };
        (payload, info.query_type)
    }
}

/// The cache key of a question.
fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn respond(
    payload: DisplayPayload,
    query_type: QueryType,
    normalized_query: String,
    started: Instant,
    cached_at: Option<u64>,
) -> QueryResponse {
    QueryResponse {
        payload,
        metadata: ResponseMetadata {
            processed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            from_cache: cached_at.is_some(),
            cached_at,
            query_type,
            processing_time_ms: u64::try_from(started.elapsed().as_millis())
                .unwrap_or(u64::MAX),
            normalized_query,
        },
    }
}
