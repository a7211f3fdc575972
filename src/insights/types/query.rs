use std::fmt;

use serde::{Deserialize, Serialize};

/// The analytical intent a question is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    TopUsers,
    ContentPerformance,
    TimingInsights,
    AudienceOverview,
    UserProfile,
    SpecialtyEngagement,
    SpecialtyComparison,
    UserCount,
    Error,
}

impl QueryType {
    pub const ALL: [QueryType; 9] = [
        QueryType::TopUsers,
        QueryType::ContentPerformance,
        QueryType::TimingInsights,
        QueryType::AudienceOverview,
        QueryType::UserProfile,
        QueryType::SpecialtyEngagement,
        QueryType::SpecialtyComparison,
        QueryType::UserCount,
        QueryType::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::TopUsers => "top_users",
            QueryType::ContentPerformance => "content_performance",
            QueryType::TimingInsights => "timing_insights",
            QueryType::AudienceOverview => "audience_overview",
            QueryType::UserProfile => "user_profile",
            QueryType::SpecialtyEngagement => "specialty_engagement",
            QueryType::SpecialtyComparison => "specialty_comparison",
            QueryType::UserCount => "user_count",
            QueryType::Error => "error",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|query_type| query_type.as_str().eq_ignore_ascii_case(name))
    }

    /// Metrics assumed when the question names none.
    pub fn default_metrics(&self) -> &'static [&'static str] {
        match self {
            QueryType::TopUsers | QueryType::UserProfile => {
                &["engagement_score", "open_rate", "click_rate"]
            }
            QueryType::ContentPerformance => &["open_rate", "click_rate", "total_opens"],
            QueryType::TimingInsights => &["open_rate", "click_rate"],
            QueryType::AudienceOverview => &["total_users", "open_rate", "click_rate"],
            QueryType::SpecialtyEngagement | QueryType::SpecialtyComparison => {
                &["open_rate", "click_rate", "engagement_score"]
            }
            QueryType::UserCount => &["total_users"],
            QueryType::Error => &[],
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time window mentioned in a question.
///
/// `year` is always set: it falls back to the current year when the question
/// names a month or quarter without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeframe {
    pub month: Option<u32>,
    pub year: i32,
    pub quarter: Option<u32>,
    pub start_month: Option<u32>,
    pub end_month: Option<u32>,
}

impl Timeframe {
    /// Whether a calendar month falls inside this window.
    pub fn contains(&self, month: u32, year: i32) -> bool {
        if year != self.year {
            return false;
        }
        if let (Some(start), Some(end)) = (self.start_month, self.end_month) {
            return if start <= end {
                (start..=end).contains(&month)
            } else {
                month >= start || month <= end
            };
        }
        if let Some(quarter) = self.quarter {
            return (month + 2) / 3 == quarter;
        }
        self.month.is_none_or(|m| m == month)
    }
}

/// Structured facts extracted from a question. Lists never hold duplicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySet {
    pub specialties: Vec<String>,
    pub professions: Vec<String>,
    pub campaigns: Vec<String>,
    pub metrics: Vec<String>,
    pub timeframe: Option<Timeframe>,
    pub email: Option<String>,
    pub topics: Vec<String>,
    pub deployment: Option<u32>,
    pub specific_campaigns: Vec<String>,
}

/// Appends `value` unless an equal value (ignoring case) is already present.
pub(crate) fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        list.push(value.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryInfo {
    pub query_type: QueryType,
    pub entities: EntitySet,
}
