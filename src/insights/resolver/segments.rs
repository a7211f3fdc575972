use std::collections::BTreeMap;

use super::{
    all_unavailable, contribute,
    datasets::{
        AudienceInsights, EngagementMetrics, SegmentStats, TimePatterns, TopicAffinity,
        UserProfileRecord, UserProfiles, UserProfilesSummary,
    },
    distinct,
    engagement::{hour_rows, topic_rows},
    metrics::{
        average, best_match, percent, rank, round2, sort_metric, statistical_validity,
        CONTENT_METRICS, HIGHLIGHT_LIMIT, SPECIALTY_METRICS, TIMING_METRICS,
    },
    DataResolver,
};
use crate::{
    insights::{
        error::QueryError,
        types::{
            query::{EntitySet, QueryType},
            result::{
                AudienceResult, ComparisonResult, CountBreakdown, OverallEngagement, RawResult,
                SegmentBreakdown, SpecialtyEngagementResult, SpecialtyMetrics,
            },
        },
    },
    outbound::Dataset,
};

fn segment_rows(segments: &BTreeMap<String, SegmentStats>) -> Vec<SegmentBreakdown> {
    let mut rows: Vec<_> = segments
        .iter()
        .map(|(name, stats)| SegmentBreakdown {
            name: name.clone(),
            user_count: stats.user_count,
            avg_open_rate: stats.avg_open_rate.map(percent),
            avg_click_rate: stats.avg_click_rate.map(percent),
            avg_engagement_score: stats.avg_engagement_score.map(round2),
        })
        .collect();
    rows.sort_by(|a, b| b.user_count.cmp(&a.user_count));
    rows
}

fn count_rows(counts: &BTreeMap<String, u64>) -> Vec<SegmentBreakdown> {
    let mut rows: Vec<_> = counts
        .iter()
        .map(|(name, count)| SegmentBreakdown {
            name: name.clone(),
            user_count: *count,
            avg_open_rate: None,
            avg_click_rate: None,
            avg_engagement_score: None,
        })
        .collect();
    rows.sort_by(|a, b| b.user_count.cmp(&a.user_count));
    rows
}

/// Averages over the profiles of one specialty.
struct ProfileAggregate {
    user_count: u64,
    open_rate: f64,
    click_rate: f64,
    engagement_score: f64,
    opens: f64,
    clicks: f64,
    delivered: f64,
}

impl ProfileAggregate {
    fn of(records: &[&UserProfileRecord]) -> Self {
        let mean = |f: fn(&UserProfileRecord) -> f64| average(records.iter().map(|r| f(r)));
        Self {
            user_count: records.len() as u64,
            open_rate: percent(mean(|r| r.open_rate)),
            click_rate: percent(mean(|r| r.click_rate)),
            engagement_score: round2(mean(|r| r.engagement_score)),
            opens: round2(mean(|r| r.total_opens as f64)),
            clicks: round2(mean(|r| r.total_clicks as f64)),
            delivered: round2(mean(|r| r.total_delivered as f64)),
        }
    }
}

fn records_of<'a>(profiles: &'a UserProfiles, specialty: &str) -> Vec<&'a UserProfileRecord> {
    profiles
        .values()
        .filter(|record| record.specialty == specialty)
        .collect()
}

fn specialty_metrics(
    specialty: &str,
    user_count: u64,
    open_rate: f64,
    click_rate: f64,
    engagement_score: f64,
) -> SpecialtyMetrics {
    SpecialtyMetrics {
        specialty: specialty.to_string(),
        user_count,
        avg_open_rate: open_rate,
        avg_click_rate: click_rate,
        avg_engagement_score: engagement_score,
        statistical_validity: statistical_validity(
            usize::try_from(user_count).unwrap_or(usize::MAX),
        ),
    }
}

impl DataResolver {
    pub(super) async fn audience_overview(&self) -> Result<RawResult, QueryError> {
        let (insights, summary, engagement) = tokio::join!(
            self.load::<AudienceInsights>(Dataset::AudienceInsights),
            self.load::<UserProfilesSummary>(Dataset::UserProfilesSummary),
            self.load::<EngagementMetrics>(Dataset::EngagementMetrics),
        );
        let (insights, summary, engagement) = match (insights, summary, engagement) {
            (Err(a), Err(b), Err(c)) => {
                return Err(all_unavailable(
                    &[
                        Dataset::AudienceInsights,
                        Dataset::UserProfilesSummary,
                        Dataset::EngagementMetrics,
                    ],
                    vec![a, b, c],
                ))
            }
            loaded => loaded,
        };

        let mut sources = Vec::new();
        let insights = contribute(insights, Dataset::AudienceInsights, &mut sources);
        let summary = contribute(summary, Dataset::UserProfilesSummary, &mut sources);
        let engagement = contribute(engagement, Dataset::EngagementMetrics, &mut sources);

        let (specialties, professions) = match (&insights, &summary) {
            (Some(insights), _) => (
                segment_rows(&insights.specialties),
                segment_rows(&insights.professions),
            ),
            (None, Some(summary)) => (
                count_rows(&summary.by_specialty),
                count_rows(&summary.by_profession),
            ),
            (None, None) => (Vec::new(), Vec::new()),
        };

        let total_users = summary
            .as_ref()
            .map(|s| s.total_users)
            .or_else(|| {
                engagement
                    .as_ref()
                    .map(|e| e.overall.total_users)
                    .filter(|n| *n > 0)
            })
            .or_else(|| {
                insights
                    .as_ref()
                    .map(|i| i.specialties.values().map(|s| s.user_count).sum())
            });

        let mut engagement_tiers: Vec<CountBreakdown> = summary
            .as_ref()
            .map(|s| {
                s.engagement_tiers
                    .iter()
                    .map(|(label, count)| CountBreakdown {
                        label: label.clone(),
                        count: *count,
                    })
                    .collect()
            })
            .unwrap_or_default();
        engagement_tiers.sort_by(|a, b| b.count.cmp(&a.count));

        Ok(RawResult::AudienceOverview(AudienceResult {
            total_users,
            specialties,
            professions,
            engagement: engagement.map(|e| OverallEngagement {
                total_delivered: e.overall.total_delivered,
                total_opens: e.overall.total_opens,
                total_clicks: e.overall.total_clicks,
                open_rate: percent(e.overall.open_rate),
                click_rate: percent(e.overall.click_rate),
            }),
            engagement_tiers,
            sources,
        }))
    }

    pub(super) async fn specialty_engagement(
        &self,
        entities: &EntitySet,
    ) -> Result<RawResult, QueryError> {
        let term = entities
            .specialties
            .first()
            .ok_or(QueryError::MissingRequiredEntity {
                query_type: QueryType::SpecialtyEngagement,
                entity: "a specialty",
            })?;
        let (profiles, affinity, patterns) = tokio::join!(
            self.load::<UserProfiles>(Dataset::UnifiedUserProfiles),
            self.load::<TopicAffinity>(Dataset::TopicAffinity),
            self.load::<TimePatterns>(Dataset::TimePatterns),
        );
        let profiles = profiles?;
        let mut sources = vec![Dataset::UnifiedUserProfiles.to_string()];

        let specialty = best_match(
            term,
            distinct(profiles.values().map(|p| p.specialty.as_str())),
        )
        .ok_or_else(|| QueryError::EntityNotFound {
            entity: "specialty",
            value: term.clone(),
        })?;
        let aggregate = ProfileAggregate::of(&records_of(&profiles, specialty));

        let top_topics = contribute(affinity, Dataset::TopicAffinity, &mut sources)
            .and_then(|affinity| {
                let name = best_match(specialty, affinity.by_specialty.keys().map(String::as_str))?;
                let metric = sort_metric(entities, CONTENT_METRICS);
                Some(rank(
                    topic_rows(&affinity.by_specialty[name]),
                    &metric,
                    HIGHLIGHT_LIMIT,
                ))
            })
            .unwrap_or_default();
        let top_hours = contribute(patterns, Dataset::TimePatterns, &mut sources)
            .and_then(|patterns| {
                let name = best_match(specialty, patterns.by_specialty.keys().map(String::as_str))?;
                let metric = sort_metric(entities, TIMING_METRICS);
                Some(rank(
                    hour_rows(&patterns.by_specialty[name].hourly),
                    &metric,
                    HIGHLIGHT_LIMIT,
                ))
            })
            .unwrap_or_default();

        Ok(RawResult::SpecialtyEngagement(SpecialtyEngagementResult {
            specialty: specialty.to_string(),
            user_count: aggregate.user_count,
            avg_open_rate: aggregate.open_rate,
            avg_click_rate: aggregate.click_rate,
            avg_engagement_score: aggregate.engagement_score,
            avg_opens: aggregate.opens,
            avg_clicks: aggregate.clicks,
            avg_delivered: aggregate.delivered,
            top_topics,
            top_hours,
            statistical_validity: statistical_validity(
                usize::try_from(aggregate.user_count).unwrap_or(usize::MAX),
            ),
            sources,
        }))
    }

    /// Compares specialties using profiles where possible and the audience
    /// segments otherwise.
    pub(super) async fn specialty_comparison(
        &self,
        entities: &EntitySet,
    ) -> Result<RawResult, QueryError> {
        if entities.specialties.len() < 2 {
            return Err(QueryError::MissingRequiredEntity {
                query_type: QueryType::SpecialtyComparison,
                entity: "at least two specialties",
            });
        }
        let (profiles, insights) = match tokio::join!(
            self.load::<UserProfiles>(Dataset::UnifiedUserProfiles),
            self.load::<AudienceInsights>(Dataset::AudienceInsights),
        ) {
            (Err(a), Err(b)) => {
                return Err(all_unavailable(
                    &[Dataset::UnifiedUserProfiles, Dataset::AudienceInsights],
                    vec![a, b],
                ))
            }
            loaded => loaded,
        };
        let mut sources = Vec::new();
        let profiles = contribute(profiles, Dataset::UnifiedUserProfiles, &mut sources);
        let insights = contribute(insights, Dataset::AudienceInsights, &mut sources);
        let profile_specialties = profiles
            .as_ref()
            .map(|p| distinct(p.values().map(|r| r.specialty.as_str())))
            .unwrap_or_default();

        let mut rows: Vec<SpecialtyMetrics> = Vec::new();
        let mut unmatched = Vec::new();
        for term in &entities.specialties {
            let from_profiles = profiles.as_ref().and_then(|profiles| {
                let name = best_match(term, profile_specialties.iter().copied())?;
                let aggregate = ProfileAggregate::of(&records_of(profiles, name));
                Some(specialty_metrics(
                    name,
                    aggregate.user_count,
                    aggregate.open_rate,
                    aggregate.click_rate,
                    aggregate.engagement_score,
                ))
            });
            let row = from_profiles.or_else(|| {
                let insights = insights.as_ref()?;
                let name = best_match(term, insights.specialties.keys().map(String::as_str))?;
                let stats = &insights.specialties[name];
                Some(specialty_metrics(
                    name,
                    stats.user_count,
                    stats.avg_open_rate.map_or(0.0, percent),
                    stats.avg_click_rate.map_or(0.0, percent),
                    stats.avg_engagement_score.map_or(0.0, round2),
                ))
            });
            match row {
                Some(row) if rows.iter().all(|r| r.specialty != row.specialty) => rows.push(row),
                Some(_) => {}
                None => unmatched.push(term.clone()),
            }
        }
        if rows.is_empty() {
            return Err(QueryError::EntityNotFound {
                entity: "specialty",
                value: entities.specialties.join(", "),
            });
        }

        let sorted_by = sort_metric(entities, SPECIALTY_METRICS);
        let limit = rows.len();
        Ok(RawResult::SpecialtyComparison(ComparisonResult {
            specialties: rank(rows, &sorted_by, limit),
            unmatched,
            sorted_by,
            sources,
        }))
    }
}
