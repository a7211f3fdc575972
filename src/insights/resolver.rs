//! Turns a classified question into aggregated data.
//!
//! Each query type has its own handler which loads only the datasets it needs.
//! Documents are cached per path so repeated questions within the TTL window
//! do not hit the object store again.

mod datasets;
mod engagement;
pub(crate) mod metrics;
mod segments;
mod users;

use std::{collections::BTreeSet, sync::Arc};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::{
    error::QueryError,
    types::{
        query::{EntitySet, QueryType},
        result::RawResult,
    },
};
use crate::{
    cache::{CachePolicy, TtlCache},
    outbound::{Dataset, DatasetStore},
};

pub(crate) struct DataResolver {
    store: Arc<dyn DatasetStore>,
    cache: Mutex<TtlCache<String, Arc<Value>>>,
}

impl DataResolver {
    pub(crate) fn new(store: Arc<dyn DatasetStore>, policy: CachePolicy) -> Self {
        Self {
            store,
            cache: Mutex::new(TtlCache::new(policy)),
        }
    }

    /// Dispatches to the handler of `query_type`.
    ///
    /// # Errors
    ///
    /// Returns `DataUnavailable` when a required dataset cannot be loaded,
    /// `MissingRequiredEntity` or `EntityNotFound` when the question lacks or
    /// misnames what the handler needs, and `UnsupportedQueryType` for
    /// `error`.
    #[instrument(skip(self, entities))]
    pub(crate) async fn resolve(
        &self,
        query_type: QueryType,
        entities: &EntitySet,
    ) -> Result<RawResult, QueryError> {
        match query_type {
            QueryType::TopUsers => self.top_users(entities).await,
            QueryType::ContentPerformance => self.content_performance(entities).await,
            QueryType::TimingInsights => self.timing_insights(entities).await,
            QueryType::AudienceOverview => self.audience_overview().await,
            QueryType::UserProfile => self.user_profile(entities).await,
            QueryType::SpecialtyEngagement => self.specialty_engagement(entities).await,
            QueryType::SpecialtyComparison => self.specialty_comparison(entities).await,
            QueryType::UserCount => self.user_count(entities).await,
            QueryType::Error => Err(QueryError::UnsupportedQueryType(query_type)),
        }
    }

    async fn load<T: DeserializeOwned>(&self, dataset: Dataset) -> Result<T, QueryError> {
        let document = self.load_raw(dataset).await?;
        T::deserialize(&*document).map_err(|e| QueryError::DataUnavailable {
            dataset: dataset.to_string(),
            reason: format!("unexpected document shape: {e}"),
        })
    }

    async fn load_raw(&self, dataset: Dataset) -> Result<Arc<Value>, QueryError> {
        let path = dataset.path().to_string();
        let cached = self
            .cache
            .lock()
            .await
            .get(&path)
            .map(|entry| Arc::clone(&entry.value));
        if let Some(document) = cached {
            debug!(%dataset, "Dataset cache hit");
            return Ok(document);
        }

        let document = self
            .store
            .fetch(&path)
            .await
            .map_err(|e| QueryError::DataUnavailable {
                dataset: dataset.to_string(),
                reason: format!("{e:#}"),
            })?;
        if is_empty(&document) {
            return Err(QueryError::DataUnavailable {
                dataset: dataset.to_string(),
                reason: "document is empty".to_string(),
            });
        }

        let document = Arc::new(document);
        let mut cache = self.cache.lock().await;
        cache.insert(path, Arc::clone(&document));
        debug!(%dataset, cached = cache.len(), "Dataset loaded");
        Ok(document)
    }
}

fn is_empty(document: &Value) -> bool {
    match document {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Keeps an optional source when it loaded, recording it as a contributor.
fn contribute<T>(
    loaded: Result<T, QueryError>,
    dataset: Dataset,
    sources: &mut Vec<String>,
) -> Option<T> {
    match loaded {
        Ok(value) => {
            sources.push(dataset.to_string());
            Some(value)
        }
        Err(e) => {
            warn!(%dataset, "Continuing without optional dataset: {e}");
            None
        }
    }
}

/// The error reported when every source of a multi-source query failed.
fn all_unavailable(datasets: &[Dataset], errors: Vec<QueryError>) -> QueryError {
    let reason = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    QueryError::DataUnavailable {
        dataset: datasets
            .iter()
            .map(|d| d.name())
            .collect::<Vec<_>>()
            .join(", "),
        reason,
    }
}

/// Distinct, ordered values of one field across records.
fn distinct<'a, I>(values: I) -> BTreeSet<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    values.into_iter().filter(|v| !v.is_empty()).collect()
}
