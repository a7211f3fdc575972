//! Resolver output, one variant per query type.
//!
//! Row types are shared with the display payloads. Rates are percentages.

use serde::{Deserialize, Serialize};

use super::query::QueryType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticalValidity {
    pub sample_size: usize,
    pub confidence_level: ConfidenceLevel,
    pub is_adequate: bool,
    /// `None` for an empty sample.
    pub margin_of_error: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentType {
    Specialty,
    Profession,
    Campaign,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub email: String,
    pub specialty: String,
    pub profession: String,
    pub engagement_score: f64,
    pub open_rate: f64,
    pub click_rate: f64,
    pub total_opens: u64,
    pub total_clicks: u64,
    pub total_delivered: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    pub email: String,
    pub specialty: String,
    pub profession: String,
    pub npi: Option<String>,
    pub engagement_score: f64,
    pub open_rate: f64,
    pub click_rate: f64,
    pub total_opens: u64,
    pub total_clicks: u64,
    pub total_delivered: u64,
    pub campaigns: Vec<String>,
    pub topics: Vec<String>,
    pub preferred_hour: Option<u32>,
    pub last_engaged: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicPerformance {
    pub topic: String,
    pub open_rate: f64,
    pub click_rate: f64,
    pub total_opens: u64,
    pub total_clicks: u64,
    pub total_delivered: u64,
    pub unique_users: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignPerformance {
    pub campaign: String,
    pub deployment: Option<u32>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub open_rate: f64,
    pub click_rate: f64,
    pub total_opens: u64,
    pub total_clicks: u64,
    pub total_delivered: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotPerformance {
    /// Hour of day (`"0"`..`"23"`) or weekday name.
    pub slot: String,
    pub label: String,
    pub open_rate: f64,
    pub click_rate: f64,
    pub total_opens: u64,
    pub total_clicks: u64,
    pub total_delivered: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentBreakdown {
    pub name: String,
    pub user_count: u64,
    pub avg_open_rate: Option<f64>,
    pub avg_click_rate: Option<f64>,
    pub avg_engagement_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallEngagement {
    pub total_delivered: u64,
    pub total_opens: u64,
    pub total_clicks: u64,
    pub open_rate: f64,
    pub click_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialtyMetrics {
    pub specialty: String,
    pub user_count: u64,
    pub avg_open_rate: f64,
    pub avg_click_rate: f64,
    pub avg_engagement_score: f64,
    pub statistical_validity: StatisticalValidity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountBreakdown {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopUsersResult {
    pub users: Vec<UserSummary>,
    pub total_matching: usize,
    pub segment: Option<String>,
    pub segment_type: Option<SegmentType>,
    pub sorted_by: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentResult {
    pub topics: Vec<TopicPerformance>,
    pub total_topics: usize,
    pub campaigns: Vec<CampaignPerformance>,
    pub segment: Option<String>,
    pub sorted_by: String,
    pub statistical_validity: StatisticalValidity,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimingResult {
    pub top_hours: Vec<TimeSlotPerformance>,
    pub days: Vec<TimeSlotPerformance>,
    pub segment: Option<String>,
    pub sorted_by: String,
    pub total_delivered: u64,
    pub statistical_validity: StatisticalValidity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudienceResult {
    pub total_users: Option<u64>,
    pub specialties: Vec<SegmentBreakdown>,
    pub professions: Vec<SegmentBreakdown>,
    pub engagement: Option<OverallEngagement>,
    pub engagement_tiers: Vec<CountBreakdown>,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileResult {
    pub profile: UserDetail,
    pub exact_match: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpecialtyEngagementResult {
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

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub specialties: Vec<SpecialtyMetrics>,
    pub unmatched: Vec<String>,
    pub sorted_by: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserCountResult {
    pub count: u64,
    pub total_users: u64,
    pub breakdown: Vec<CountBreakdown>,
    pub filters: Vec<String>,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    TopUsers(TopUsersResult),
    ContentPerformance(ContentResult),
    TimingInsights(TimingResult),
    AudienceOverview(AudienceResult),
    UserProfile(ProfileResult),
    SpecialtyEngagement(SpecialtyEngagementResult),
    SpecialtyComparison(ComparisonResult),
    UserCount(UserCountResult),
}

impl RawResult {
    pub fn query_type(&self) -> QueryType {
        match self {
            RawResult::TopUsers(_) => QueryType::TopUsers,
            RawResult::ContentPerformance(_) => QueryType::ContentPerformance,
            RawResult::TimingInsights(_) => QueryType::TimingInsights,
            RawResult::AudienceOverview(_) => QueryType::AudienceOverview,
            RawResult::UserProfile(_) => QueryType::UserProfile,
            RawResult::SpecialtyEngagement(_) => QueryType::SpecialtyEngagement,
            RawResult::SpecialtyComparison(_) => QueryType::SpecialtyComparison,
            RawResult::UserCount(_) => QueryType::UserCount,
        }
    }
}
