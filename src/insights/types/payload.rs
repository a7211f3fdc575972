use serde::Serialize;

use super::{
    query::QueryType,
    result::{
        CampaignPerformance, CountBreakdown, OverallEngagement, SegmentBreakdown, SegmentType,
        SpecialtyMetrics, StatisticalValidity, TimeSlotPerformance, TopicPerformance, UserDetail,
        UserSummary,
    },
};

/// The caller-facing result of a question.
///
/// Every field is always present in the serialized form; absent values are
/// `null`, empty lists or zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "responseType", rename_all = "snake_case")]
pub enum DisplayPayload {
    TopUsers(TopUsersPayload),
    ContentPerformance(ContentPayload),
    TimingInsights(TimingPayload),
    AudienceOverview(AudiencePayload),
    UserProfile(UserProfilePayload),
    SpecialtyEngagement(SpecialtyEngagementPayload),
    SpecialtyComparison(SpecialtyComparisonPayload),
    UserCount(UserCountPayload),
    Error(ErrorPayload),
}

impl DisplayPayload {
    pub fn response_type(&self) -> QueryType {
        match self {
            DisplayPayload::TopUsers(_) => QueryType::TopUsers,
            DisplayPayload::ContentPerformance(_) => QueryType::ContentPerformance,
            DisplayPayload::TimingInsights(_) => QueryType::TimingInsights,
            DisplayPayload::AudienceOverview(_) => QueryType::AudienceOverview,
            DisplayPayload::UserProfile(_) => QueryType::UserProfile,
            DisplayPayload::SpecialtyEngagement(_) => QueryType::SpecialtyEngagement,
            DisplayPayload::SpecialtyComparison(_) => QueryType::SpecialtyComparison,
            DisplayPayload::UserCount(_) => QueryType::UserCount,
            DisplayPayload::Error(_) => QueryType::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, DisplayPayload::Error(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUsersPayload {
    pub title: String,
    pub users: Vec<UserSummary>,
    pub total_matching: usize,
    pub displayed_count: usize,
    pub segment: Option<String>,
    pub segment_type: Option<SegmentType>,
    pub sorted_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPayload {
    pub title: String,
    pub topics: Vec<TopicPerformance>,
    pub total_topics: usize,
    pub top_topic: Option<String>,
    pub campaigns: Vec<CampaignPerformance>,
    pub segment: Option<String>,
    pub sorted_by: String,
    pub statistical_validity: StatisticalValidity,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingPayload {
    pub title: String,
    pub top_hours: Vec<TimeSlotPerformance>,
    pub days: Vec<TimeSlotPerformance>,
    pub best_hour: Option<String>,
    pub best_day: Option<String>,
    pub segment: Option<String>,
    pub sorted_by: String,
    pub total_delivered: u64,
    pub statistical_validity: StatisticalValidity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudiencePayload {
    pub title: String,
    pub total_users: u64,
    pub specialties: Vec<SegmentBreakdown>,
    pub professions: Vec<SegmentBreakdown>,
    pub engagement: Option<OverallEngagement>,
    pub engagement_tiers: Vec<CountBreakdown>,
    pub sources: Vec<String>,
    /// False when some of the overview datasets could not be loaded.
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfilePayload {
    pub title: String,
    pub profile: UserDetail,
    pub exact_match: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialtyEngagementPayload {
    pub title: String,
    pub specialty: String,
    pub user_count: u64,
    pub avg_open_rate: f64,
    pub avg_click_rate: f64,
    pub avg_engagement_score: f64,
    pub avg_opens: f64,
    pub avg_clicks: f64,
    pub avg_delivered: f64,
    pub top_topics: Vec<TopicPerformance>,
    pub top_hours: Vec<TimeSlotPerformance>,
    pub statistical_validity: StatisticalValidity,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialtyComparisonPayload {
    pub title: String,
    pub specialties: Vec<SpecialtyMetrics>,
    pub leader: Option<String>,
    pub unmatched: Vec<String>,
    pub sorted_by: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCountPayload {
    pub title: String,
    pub count: u64,
    pub total_users: u64,
    /// `count` as a percentage of `total_users`.
    pub share_of_total: f64,
    pub breakdown: Vec<CountBreakdown>,
    pub filters: Vec<String>,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub message: String,
    pub technical_details: String,
    pub suggestions: Vec<String>,
    pub original_query: String,
}
