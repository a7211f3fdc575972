use std::collections::BTreeMap;

use super::{
    contribute,
    datasets::{
        CampaignStats, EngagementMetrics, SlotStats, TimePatterns, TopicAffinity, TopicStats,
    },
    metrics::{
        best_match, percent, rank, ratio_percent, sort_metric, statistical_validity, CONTENT_LIMIT,
        CONTENT_METRICS, HIGHLIGHT_LIMIT, TIMING_METRICS,
    },
    DataResolver,
};
use crate::{
    insights::{
        error::QueryError,
        types::{
            query::EntitySet,
            result::{
                CampaignPerformance, ContentResult, RawResult, TimeSlotPerformance, TimingResult,
                TopicPerformance,
            },
        },
    },
    outbound::Dataset,
};

pub(super) fn topic_rows(topics: &BTreeMap<String, TopicStats>) -> Vec<TopicPerformance> {
    topics
        .iter()
        .map(|(topic, stats)| TopicPerformance {
            topic: topic.clone(),
            open_rate: percent(stats.open_rate),
            click_rate: percent(stats.click_rate),
            total_opens: stats.opens,
            total_clicks: stats.clicks,
            total_delivered: stats.delivered,
            unique_users: stats.unique_users,
        })
        .collect()
}

/// Rows for hour-of-day slots, labelled as a 12-hour clock.
pub(super) fn hour_rows(slots: &BTreeMap<String, SlotStats>) -> Vec<TimeSlotPerformance> {
    slots
        .iter()
        .map(|(slot, stats)| slot_row(slot, hour_label(slot), stats))
        .collect()
}

fn day_rows(slots: &BTreeMap<String, SlotStats>) -> Vec<TimeSlotPerformance> {
    slots
        .iter()
        .map(|(slot, stats)| slot_row(slot, slot.clone(), stats))
        .collect()
}

fn slot_row(slot: &str, label: String, stats: &SlotStats) -> TimeSlotPerformance {
    TimeSlotPerformance {
        slot: slot.to_string(),
        label,
        open_rate: ratio_percent(stats.opens, stats.delivered),
        click_rate: ratio_percent(stats.clicks, stats.delivered),
        total_opens: stats.opens,
        total_clicks: stats.clicks,
        total_delivered: stats.delivered,
    }
}

/// `"9"` becomes `"9:00 AM"`; keys that are not hours are kept as they are.
fn hour_label(slot: &str) -> String {
    match slot.trim().parse::<u32>() {
        Ok(hour) if hour < 24 => {
            let suffix = if hour < 12 { "AM" } else { "PM" };
            let display = match hour % 12 {
                0 => 12,
                h => h,
            };
            format!("{display}:00 {suffix}")
        }
        _ => slot.to_string(),
    }
}

/// Whether the question narrows the campaign breakdown.
fn wants_campaigns(entities: &EntitySet) -> bool {
    !entities.campaigns.is_empty()
        || !entities.specific_campaigns.is_empty()
        || entities.timeframe.is_some()
        || entities.deployment.is_some()
}

fn campaign_rows(metrics: &EngagementMetrics, entities: &EntitySet) -> Vec<CampaignPerformance> {
    let names: Vec<&str> = entities
        .campaigns
        .iter()
        .chain(&entities.specific_campaigns)
        .filter_map(|term| best_match(term, metrics.campaigns.keys().map(String::as_str)))
        .collect();
    let named = !entities.campaigns.is_empty() || !entities.specific_campaigns.is_empty();

    metrics
        .campaigns
        .iter()
        .filter(|(name, _)| !named || names.contains(&name.as_str()))
        .filter(|(_, stats)| match &entities.timeframe {
            Some(timeframe) => match (stats.month, stats.year) {
                (Some(month), Some(year)) => timeframe.contains(month, year),
                (None, Some(year)) => year == timeframe.year,
                _ => false,
            },
            None => true,
        })
        .filter_map(|(name, stats)| campaign_row(name, stats, entities.deployment))
        .collect()
}

fn campaign_row(
    name: &str,
    stats: &CampaignStats,
    deployment: Option<u32>,
) -> Option<CampaignPerformance> {
    let row = |delivered, opens, clicks, open_rate, click_rate| CampaignPerformance {
        campaign: name.to_string(),
        deployment,
        month: stats.month,
        year: stats.year,
        open_rate,
        click_rate,
        total_opens: opens,
        total_clicks: clicks,
        total_delivered: delivered,
    };
    match deployment {
        Some(n) => {
            let wave = stats.deployments.get(&n.to_string())?;
            Some(row(
                wave.delivered,
                wave.opens,
                wave.clicks,
                ratio_percent(wave.opens, wave.delivered),
                ratio_percent(wave.clicks, wave.delivered),
            ))
        }
        None => Some(row(
            stats.delivered,
            stats.opens,
            stats.clicks,
            percent(stats.open_rate),
            percent(stats.click_rate),
        )),
    }
}

impl DataResolver {
    pub(super) async fn content_performance(
        &self,
        entities: &EntitySet,
    ) -> Result<RawResult, QueryError> {
        let affinity: TopicAffinity = self.load(Dataset::TopicAffinity).await?;
        let mut sources = vec![Dataset::TopicAffinity.to_string()];

        let (segment, topics) = match entities.specialties.first() {
            Some(term) => {
                let name = best_match(term, affinity.by_specialty.keys().map(String::as_str))
                    .ok_or_else(|| QueryError::EntityNotFound {
                        entity: "specialty",
                        value: term.clone(),
                    })?;
                (Some(name.to_string()), &affinity.by_specialty[name])
            }
            None => (None, &affinity.topics),
        };

        let mut rows = topic_rows(topics);
        if !entities.topics.is_empty() {
            let wanted: Vec<String> = entities.topics.iter().map(|t| t.to_lowercase()).collect();
            rows.retain(|row| {
                let topic = row.topic.to_lowercase();
                wanted.iter().any(|w| topic.contains(w.as_str()))
            });
        }
        let total_topics = rows.len();
        let sample_size = rows.iter().map(|row| row.total_delivered).sum::<u64>();
        let sorted_by = sort_metric(entities, CONTENT_METRICS);

        let campaigns = if wants_campaigns(entities) {
            let loaded = self
                .load::<EngagementMetrics>(Dataset::EngagementMetrics)
                .await;
            contribute(loaded, Dataset::EngagementMetrics, &mut sources)
                .map(|metrics| rank(campaign_rows(&metrics, entities), &sorted_by, CONTENT_LIMIT))
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        Ok(RawResult::ContentPerformance(ContentResult {
            topics: rank(rows, &sorted_by, CONTENT_LIMIT),
            total_topics,
            campaigns,
            segment,
            sorted_by,
            statistical_validity: statistical_validity(
                usize::try_from(sample_size).unwrap_or(usize::MAX),
            ),
            sources,
        }))
    }

    pub(super) async fn timing_insights(
        &self,
        entities: &EntitySet,
    ) -> Result<RawResult, QueryError> {
        let patterns: TimePatterns = self.load(Dataset::TimePatterns).await?;

        let (segment, hourly, daily) = match entities.specialties.first() {
            Some(term) => {
                let name = best_match(term, patterns.by_specialty.keys().map(String::as_str))
                    .ok_or_else(|| QueryError::EntityNotFound {
                        entity: "specialty",
                        value: term.clone(),
                    })?;
                let slots = &patterns.by_specialty[name];
                (Some(name.to_string()), &slots.hourly, &slots.daily)
            }
            None => (None, &patterns.hourly, &patterns.daily),
        };

        let total_delivered = hourly.values().map(|slot| slot.delivered).sum::<u64>();
        let sorted_by = sort_metric(entities, TIMING_METRICS);
        let days = day_rows(daily);
        let day_count = days.len();

        Ok(RawResult::TimingInsights(TimingResult {
            top_hours: rank(hour_rows(hourly), &sorted_by, HIGHLIGHT_LIMIT),
            days: rank(days, &sorted_by, day_count),
            segment,
            sorted_by,
            total_delivered,
            statistical_validity: statistical_validity(
                usize::try_from(total_delivered).unwrap_or(usize::MAX),
            ),
        }))
    }
}
