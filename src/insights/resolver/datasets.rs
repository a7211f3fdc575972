//! Shapes of the analysis documents.
//!
//! Every field defaults so a partially populated document still loads, and a
//! `null` field reads as its default. Counts written as floats are accepted.
//! Maps are ordered so that "first matching key" is deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

/// `unified_user_profiles.json`, keyed by email.
pub(crate) type UserProfiles = BTreeMap<String, UserProfileRecord>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct UserProfileRecord {
    #[serde(deserialize_with = "or_default")]
    pub(crate) email: String,
    #[serde(deserialize_with = "or_default")]
    pub(crate) specialty: String,
    #[serde(deserialize_with = "or_default")]
    pub(crate) profession: String,
    pub(crate) npi: Option<String>,
    #[serde(deserialize_with = "count")]
    pub(crate) total_delivered: u64,
    #[serde(deserialize_with = "count")]
    pub(crate) total_opens: u64,
    #[serde(deserialize_with = "count")]
    pub(crate) total_clicks: u64,
    /// Fraction in `0..=1`.
    #[serde(deserialize_with = "or_default")]
    pub(crate) open_rate: f64,
    /// Fraction in `0..=1`.
    #[serde(deserialize_with = "or_default")]
    pub(crate) click_rate: f64,
    #[serde(deserialize_with = "or_default")]
    pub(crate) engagement_score: f64,
    #[serde(deserialize_with = "or_default")]
    pub(crate) campaigns: Vec<String>,
    #[serde(deserialize_with = "or_default")]
    pub(crate) topics: Vec<String>,
    #[serde(deserialize_with = "whole_number")]
    pub(crate) preferred_hour: Option<u32>,
    pub(crate) last_engaged: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TopicAffinity {
    #[serde(deserialize_with = "or_default")]
    pub(crate) topics: BTreeMap<String, TopicStats>,
    #[serde(deserialize_with = "or_default")]
    pub(crate) by_specialty: BTreeMap<String, BTreeMap<String, TopicStats>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TopicStats {
    #[serde(deserialize_with = "count")]
    pub(crate) delivered: u64,
    #[serde(deserialize_with = "count")]
    pub(crate) opens: u64,
    #[serde(deserialize_with = "count")]
    pub(crate) clicks: u64,
    #[serde(deserialize_with = "or_default")]
    pub(crate) open_rate: f64,
    #[serde(deserialize_with = "or_default")]
    pub(crate) click_rate: f64,
    #[serde(deserialize_with = "count")]
    pub(crate) unique_users: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TimePatterns {
    #[serde(deserialize_with = "or_default")]
    pub(crate) hourly: BTreeMap<String, SlotStats>,
    #[serde(deserialize_with = "or_default")]
    pub(crate) daily: BTreeMap<String, SlotStats>,
    #[serde(deserialize_with = "or_default")]
    pub(crate) by_specialty: BTreeMap<String, SlotPatterns>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SlotPatterns {
    #[serde(deserialize_with = "or_default")]
    pub(crate) hourly: BTreeMap<String, SlotStats>,
    #[serde(deserialize_with = "or_default")]
    pub(crate) daily: BTreeMap<String, SlotStats>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SlotStats {
    #[serde(deserialize_with = "count")]
    pub(crate) delivered: u64,
    #[serde(deserialize_with = "count")]
    pub(crate) opens: u64,
    #[serde(deserialize_with = "count")]
    pub(crate) clicks: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AudienceInsights {
    #[serde(deserialize_with = "or_default")]
    pub(crate) specialties: BTreeMap<String, SegmentStats>,
    #[serde(deserialize_with = "or_default")]
    pub(crate) professions: BTreeMap<String, SegmentStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SegmentStats {
    #[serde(deserialize_with = "count")]
    pub(crate) user_count: u64,
    /// Fraction in `0..=1`.
    pub(crate) avg_open_rate: Option<f64>,
    /// Fraction in `0..=1`.
    pub(crate) avg_click_rate: Option<f64>,
    pub(crate) avg_engagement_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct EngagementMetrics {
    #[serde(deserialize_with = "or_default")]
    pub(crate) overall: OverallStats,
    #[serde(deserialize_with = "or_default")]
    pub(crate) campaigns: BTreeMap<String, CampaignStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct OverallStats {
    #[serde(deserialize_with = "count")]
    pub(crate) total_users: u64,
    #[serde(deserialize_with = "count")]
    pub(crate) total_delivered: u64,
    #[serde(deserialize_with = "count")]
    pub(crate) total_opens: u64,
    #[serde(deserialize_with = "count")]
    pub(crate) total_clicks: u64,
    #[serde(deserialize_with = "or_default")]
    pub(crate) open_rate: f64,
    #[serde(deserialize_with = "or_default")]
    pub(crate) click_rate: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CampaignStats {
    #[serde(deserialize_with = "count")]
    pub(crate) delivered: u64,
    #[serde(deserialize_with = "count")]
    pub(crate) opens: u64,
    #[serde(deserialize_with = "count")]
    pub(crate) clicks: u64,
    #[serde(deserialize_with = "or_default")]
    pub(crate) open_rate: f64,
    #[serde(deserialize_with = "or_default")]
    pub(crate) click_rate: f64,
    #[serde(deserialize_with = "whole_number")]
    pub(crate) month: Option<u32>,
    #[serde(deserialize_with = "whole_number")]
    pub(crate) year: Option<i32>,
    #[serde(deserialize_with = "or_default")]
    pub(crate) deployments: BTreeMap<String, SlotStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct UserProfilesSummary {
    #[serde(deserialize_with = "count")]
    pub(crate) total_users: u64,
    #[serde(deserialize_with = "counts")]
    pub(crate) by_specialty: BTreeMap<String, u64>,
    #[serde(deserialize_with = "counts")]
    pub(crate) by_profession: BTreeMap<String, u64>,
    #[serde(deserialize_with = "counts")]
    pub(crate) engagement_tiers: BTreeMap<String, u64>,
}

/// Reads `null` as the type's default.
fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A count, written as an integer or a float. Fractions round to the nearest
/// whole number; negative and non-finite values read as zero.
fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.map_or(0, to_count))
}

fn counts<'de, D>(deserializer: D) -> Result<BTreeMap<String, u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Option<f64>>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, value.map_or(0, to_count)))
        .collect())
}

/// An optional whole number such as a month or an hour. Values that are not
/// whole or do not fit read as absent.
#[allow(clippy::cast_possible_truncation)]
fn whole_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value
        .filter(|v| v.is_finite() && v.fract() == 0.0)
        .and_then(|v| T::try_from(v as i64).ok()))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}
