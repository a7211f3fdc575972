use std::fmt;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::settings::StoreSettings;

const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// The precomputed analysis documents kept in the object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Dataset {
    UnifiedUserProfiles,
    TopicAffinity,
    TimePatterns,
    AudienceInsights,
    EngagementMetrics,
    UserProfilesSummary,
}

impl Dataset {
    pub(crate) fn path(self) -> &'static str {
        match self {
            Self::UnifiedUserProfiles => "analysis/unified_user_profiles.json",
            Self::TopicAffinity => "analysis/topic_affinity.json",
            Self::TimePatterns => "analysis/time_patterns.json",
            Self::AudienceInsights => "analysis/audience_insights.json",
            Self::EngagementMetrics => "analysis/engagement_metrics.json",
            Self::UserProfilesSummary => "analysis/user_profiles_summary.json",
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::UnifiedUserProfiles => "unified_user_profiles",
            Self::TopicAffinity => "topic_affinity",
            Self::TimePatterns => "time_patterns",
            Self::AudienceInsights => "audience_insights",
            Self::EngagementMetrics => "engagement_metrics",
            Self::UserProfilesSummary => "user_profiles_summary",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only access to dataset documents by path.
#[async_trait]
pub(crate) trait DatasetStore: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Value>;
}

#[derive(Debug, Deserialize)]
struct SignedUrl {
    url: String,
}

/// Fetches datasets through signed, time-limited URLs.
///
/// Every fetch first asks the signer for a URL for the path, then downloads
/// the document from that URL. Both requests share the configured timeout.
pub(crate) struct HttpDatasetStore {
    client: Client,
    signer_url: String,
    api_key: Option<String>,
}

impl HttpDatasetStore {
    pub(crate) fn new(settings: &StoreSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(settings.timeout())
            .build()?;
        Ok(Self {
            client,
            signer_url: settings.signer_url.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    async fn signed_url(&self, path: &str) -> Result<String> {
        let mut request = self.client.get(&self.signer_url).query(&[("path", path)]);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }
        let signed: SignedUrl = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("Signer returned an unexpected body")?;
        Ok(signed.url)
    }
}

#[async_trait]
impl DatasetStore for HttpDatasetStore {
    async fn fetch(&self, path: &str) -> Result<Value> {
        let url = self
            .signed_url(path)
            .await
            .with_context(|| format!("Failed to sign {path}"))?;
        debug!(path, "Fetching dataset");
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
            .with_context(|| format!("{path} is not a JSON document"))?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        net::SocketAddr,
        time::{Duration, Instant},
    };

    use serde_json::json;
    use warp::{http::StatusCode, path::Tail, Filter};

    use super::*;

    fn spawn_object_store() -> SocketAddr {
        let sign = warp::path("sign")
            .and(warp::query::<HashMap<String, String>>())
            .and(warp::header::<String>("host"))
            .map(|query: HashMap<String, String>, host: String| {
                let path = query.get("path").cloned().unwrap_or_default();
                warp::reply::json(&json!({ "url": format!("http://{host}/files/{path}?sig=abc") }))
            });
        let files = warp::path("files")
            .and(warp::path::tail())
            .and(warp::query::<HashMap<String, String>>())
            .map(|tail: Tail, query: HashMap<String, String>| {
                if query.get("sig").map(String::as_str) != Some("abc") {
                    return warp::reply::with_status(
                        warp::reply::json(&json!({})),
                        StatusCode::FORBIDDEN,
                    );
                }
                if tail.as_str() == "analysis/missing.json" {
                    return warp::reply::with_status(
                        warp::reply::json(&json!({})),
                        StatusCode::NOT_FOUND,
                    );
                }
                warp::reply::with_status(
                    warp::reply::json(&json!({ "served": tail.as_str() })),
                    StatusCode::OK,
                )
            });
        let (addr, server) = warp::serve(sign.or(files)).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        addr
    }

    fn store_for(addr: SocketAddr) -> HttpDatasetStore {
        HttpDatasetStore::new(&StoreSettings {
            signer_url: format!("http://{addr}/sign"),
            api_key: Some("token".to_string()),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn fetches_through_signed_url() {
        let store = store_for(spawn_object_store());
        let body = store.fetch(Dataset::TimePatterns.path()).await.unwrap();
        assert_eq!(body, json!({ "served": "analysis/time_patterns.json" }));
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let store = store_for(spawn_object_store());
        assert!(store.fetch("analysis/missing.json").await.is_err());
    }

    #[tokio::test]
    async fn stalled_signer_is_cut_off_by_the_timeout() {
        let stalled = warp::path("sign").then(|| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            warp::reply::json(&json!({ "url": "http://127.0.0.1:9/never" }))
        });
        let (addr, server) = warp::serve(stalled).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        let store = HttpDatasetStore::new(&StoreSettings {
            signer_url: format!("http://{addr}/sign"),
            api_key: None,
            timeout_secs: 1,
        })
        .unwrap();

        let started = Instant::now();
        let result = store.fetch(Dataset::TopicAffinity.path()).await;
        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn dataset_paths_live_under_analysis() {
        for dataset in [
            Dataset::UnifiedUserProfiles,
            Dataset::TopicAffinity,
            Dataset::TimePatterns,
            Dataset::AudienceInsights,
            Dataset::EngagementMetrics,
            Dataset::UserProfilesSummary,
        ] {
            assert_eq!(dataset.path(), format!("analysis/{}.json", dataset.name()));
        }
    }
}
