//! An in-memory dataset store with a small, fixed campaign history.

use std::{collections::HashMap, sync::Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::outbound::{Dataset, DatasetStore};

const ALL_DATASETS: [Dataset; 6] = [
    Dataset::UnifiedUserProfiles,
    Dataset::TopicAffinity,
    Dataset::TimePatterns,
    Dataset::AudienceInsights,
    Dataset::EngagementMetrics,
    Dataset::UserProfilesSummary,
];

#[derive(Default)]
pub(crate) struct MemoryStore {
    documents: HashMap<String, Value>,
    calls: Mutex<HashMap<String, usize>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A store holding every dataset.
    pub(crate) fn sample() -> Self {
        ALL_DATASETS
            .into_iter()
            .fold(Self::new(), |store, dataset| {
                store.with(dataset, sample_document(dataset))
            })
    }

    pub(crate) fn with(mut self, dataset: Dataset, document: Value) -> Self {
        self.documents.insert(dataset.path().to_string(), document);
        self
    }

    pub(crate) fn without(mut self, dataset: Dataset) -> Self {
        self.documents.remove(dataset.path());
        self
    }

    pub(crate) fn calls(&self, dataset: Dataset) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(dataset.path())
            .copied()
            .unwrap_or_default()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl DatasetStore for MemoryStore {
    async fn fetch(&self, path: &str) -> Result<Value> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default() += 1;
        self.documents
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("404 Not Found: {path}"))
    }
}

fn sample_document(dataset: Dataset) -> Value {
    match dataset {
        Dataset::UnifiedUserProfiles => json!({
            "ann.lee@derm.example.com": {
                "email": "ann.lee@derm.example.com",
                "specialty": "Dermatology",
                "profession": "Physician",
                "npi": "1000000001",
                "total_delivered": 40, "total_opens": 30, "total_clicks": 12,
                "open_rate": 0.75, "click_rate": 0.3, "engagement_score": 88.0,
                "campaigns": ["Monthly Newsletter", "Product Launch"],
                "topics": ["Clinical Trials"],
                "preferred_hour": 9,
                "last_engaged": "2024-05-02"
            },
            "bob@cardio.example.com": {
                "email": "bob@cardio.example.com",
                "specialty": "Cardiology",
                "profession": "Physician",
                "total_delivered": 50, "total_opens": 20, "total_clicks": 5,
                "open_rate": 0.4, "click_rate": 0.1, "engagement_score": 61.0,
                "campaigns": ["Monthly Newsletter"],
                "topics": ["Drug Approvals"],
                "preferred_hour": 14
            },
            "carla@derm.example.com": {
                "email": "carla@derm.example.com",
                "specialty": "Dermatology",
                "profession": "Nurse Practitioner",
                "total_delivered": 30, "total_opens": 12, "total_clicks": 3,
                "open_rate": 0.4, "click_rate": 0.1, "engagement_score": 55.0,
                "campaigns": ["Webinar Invitation"],
                "preferred_hour": 7
            },
            "dan@onc.example.com": {
                "email": "dan@onc.example.com",
                "specialty": "Oncology",
                "profession": "Physician Assistant",
                "total_delivered": 20, "total_opens": 15, "total_clicks": 9,
                "open_rate": 0.75, "click_rate": 0.45, "engagement_score": 92.5,
                "campaigns": ["Product Launch"]
            },
            "jane.doe@derm.example.com": {
                "email": "jane.doe@derm.example.com",
                "specialty": "Dermatology",
                "profession": "Physician",
                "total_delivered": 60, "total_opens": 36, "total_clicks": 6,
                "open_rate": 0.6, "click_rate": 0.1, "engagement_score": 74.0
            }
        }),
        Dataset::TopicAffinity => json!({
            "topics": {
                "Case Studies": {
                    "delivered": 200, "opens": 60, "clicks": 10,
                    "open_rate": 0.3, "click_rate": 0.05, "unique_users": 80
                },
                "Clinical Trials": {
                    "delivered": 300, "opens": 150, "clicks": 45,
                    "open_rate": 0.5, "click_rate": 0.15, "unique_users": 120
                },
                "Drug Approvals": {
                    "delivered": 100, "opens": 40, "clicks": 20,
                    "open_rate": 0.4, "click_rate": 0.2, "unique_users": 50
                }
            },
            "by_specialty": {
                "Cardiology": {
                    "Drug Approvals": {
                        "delivered": 40, "opens": 20, "clicks": 8,
                        "open_rate": 0.5, "click_rate": 0.2, "unique_users": 15
                    }
                },
                "Dermatology": {
                    "Case Studies": {
                        "delivered": 60, "opens": 12, "clicks": 6,
                        "open_rate": 0.2, "click_rate": 0.1, "unique_users": 20
                    },
                    "Clinical Trials": {
                        "delivered": 90, "opens": 54, "clicks": 9,
                        "open_rate": 0.6, "click_rate": 0.1, "unique_users": 30
                    }
                }
            }
        }),
        Dataset::TimePatterns => json!({
            "hourly": {
                "7": { "delivered": 100, "opens": 20, "clicks": 2 },
                "9": { "delivered": 200, "opens": 90, "clicks": 20 },
                "14": { "delivered": 150, "opens": 45, "clicks": 15 },
                "20": { "delivered": 50, "opens": 5, "clicks": 1 }
            },
            "daily": {
                "Monday": { "delivered": 200, "opens": 60, "clicks": 10 },
                "Tuesday": { "delivered": 300, "opens": 120, "clicks": 30 }
            },
            "by_specialty": {
                "Dermatology": {
                    "hourly": {
                        "7": { "delivered": 50, "opens": 30, "clicks": 5 },
                        "9": { "delivered": 50, "opens": 10, "clicks": 2 }
                    },
                    "daily": {
                        "Tuesday": { "delivered": 100, "opens": 40, "clicks": 8 }
                    }
                }
            }
        }),
        Dataset::AudienceInsights => json!({
            "specialties": {
                "Cardiology": {
                    "user_count": 120, "avg_open_rate": 0.4,
                    "avg_click_rate": 0.1, "avg_engagement_score": 61.0
                },
                "Dermatology": {
                    "user_count": 300, "avg_open_rate": 0.55,
                    "avg_click_rate": 0.15, "avg_engagement_score": 70.0
                },
                "Oncology": {
                    "user_count": 80, "avg_open_rate": 0.7,
                    "avg_click_rate": 0.4, "avg_engagement_score": 90.0
                }
            },
            "professions": {
                "Nurse Practitioner": { "user_count": 90, "avg_open_rate": 0.45 },
                "Physician": { "user_count": 400, "avg_open_rate": 0.5 }
            }
        }),
        Dataset::EngagementMetrics => json!({
            "overall": {
                "total_users": 500, "total_delivered": 1000, "total_opens": 450,
                "total_clicks": 90, "open_rate": 0.45, "click_rate": 0.09
            },
            "campaigns": {
                "Monthly Newsletter": {
                    "delivered": 400, "opens": 200, "clicks": 40,
                    "open_rate": 0.5, "click_rate": 0.1, "month": 3, "year": 2024,
                    "deployments": {
                        "1": { "delivered": 250, "opens": 150, "clicks": 30 },
                        "2": { "delivered": 150, "opens": 50, "clicks": 10 }
                    }
                },
                "Product Launch": {
                    "delivered": 300, "opens": 90, "clicks": 30,
                    "open_rate": 0.3, "click_rate": 0.1, "month": 6, "year": 2024
                },
                "Webinar Invitation": {
                    "delivered": 300, "opens": 160, "clicks": 20,
                    "open_rate": 0.5333, "click_rate": 0.0667, "month": 3, "year": 2023
                }
            }
        }),
        Dataset::UserProfilesSummary => json!({
            "total_users": 500,
            "by_specialty": { "Cardiology": 120, "Dermatology": 300, "Oncology": 80 },
            "by_profession": {
                "Nurse Practitioner": 90, "Physician": 400, "Physician Assistant": 10
            },
            "engagement_tiers": { "high": 150, "low": 100, "medium": 250 }
        }),
    }
}
