use std::collections::BTreeMap;

use super::{
    all_unavailable,
    datasets::{UserProfileRecord, UserProfiles, UserProfilesSummary},
    distinct,
    metrics::{best_email_match, best_match, percent, rank, sort_metric, USER_LIMIT, USER_METRICS},
    DataResolver,
};
use crate::{
    insights::{
        error::QueryError,
        types::{
            query::{EntitySet, QueryType},
            result::{
                CountBreakdown, ProfileResult, RawResult, SegmentType, TopUsersResult,
                UserCountResult, UserDetail, UserSummary,
            },
        },
    },
    outbound::Dataset,
};

/// A segment filter resolved against the values present in the profiles.
struct ProfileFilter<'a> {
    segment_type: SegmentType,
    value: &'a str,
}

impl ProfileFilter<'_> {
    fn accepts(&self, record: &UserProfileRecord) -> bool {
        match self.segment_type {
            SegmentType::Specialty => record.specialty == self.value,
            SegmentType::Profession => record.profession == self.value,
            SegmentType::Campaign => record.campaigns.iter().any(|c| c == self.value),
        }
    }

    fn describe(&self) -> String {
        let kind = match self.segment_type {
            SegmentType::Specialty => "specialty",
            SegmentType::Profession => "profession",
            SegmentType::Campaign => "campaign",
        };
        format!("{kind}: {}", self.value)
    }
}

/// Resolves the first requested term of a kind against the profile values.
fn profile_filter<'a>(
    profiles: &'a UserProfiles,
    segment_type: SegmentType,
    terms: &[String],
) -> Result<Option<ProfileFilter<'a>>, QueryError> {
    let Some(term) = terms.first() else {
        return Ok(None);
    };
    let (entity, values) = match segment_type {
        SegmentType::Specialty => (
            "specialty",
            distinct(profiles.values().map(|p| p.specialty.as_str())),
        ),
        SegmentType::Profession => (
            "profession",
            distinct(profiles.values().map(|p| p.profession.as_str())),
        ),
        SegmentType::Campaign => (
            "campaign",
            distinct(
                profiles
                    .values()
                    .flat_map(|p| p.campaigns.iter().map(String::as_str)),
            ),
        ),
    };
    let value = best_match(term, values).ok_or_else(|| QueryError::EntityNotFound {
        entity,
        value: term.clone(),
    })?;
    Ok(Some(ProfileFilter {
        segment_type,
        value,
    }))
}

fn filters<'a>(
    profiles: &'a UserProfiles,
    entities: &EntitySet,
) -> Result<Vec<ProfileFilter<'a>>, QueryError> {
    let campaigns: Vec<String> = entities
        .campaigns
        .iter()
        .chain(&entities.specific_campaigns)
        .cloned()
        .collect();
    let requested = [
        (SegmentType::Specialty, entities.specialties.as_slice()),
        (SegmentType::Profession, entities.professions.as_slice()),
        (SegmentType::Campaign, campaigns.as_slice()),
    ];
    let mut resolved = Vec::new();
    for (segment_type, terms) in requested {
        if let Some(filter) = profile_filter(profiles, segment_type, terms)? {
            resolved.push(filter);
        }
    }
    Ok(resolved)
}

fn summary(key: &str, record: &UserProfileRecord) -> UserSummary {
    UserSummary {
        email: email_of(key, record),
        specialty: record.specialty.clone(),
        profession: record.profession.clone(),
        engagement_score: record.engagement_score,
        open_rate: percent(record.open_rate),
        click_rate: percent(record.click_rate),
        total_opens: record.total_opens,
        total_clicks: record.total_clicks,
        total_delivered: record.total_delivered,
    }
}

fn detail(key: &str, record: &UserProfileRecord) -> UserDetail {
    UserDetail {
        email: email_of(key, record),
        specialty: record.specialty.clone(),
        profession: record.profession.clone(),
        npi: record.npi.clone(),
        engagement_score: record.engagement_score,
        open_rate: percent(record.open_rate),
        click_rate: percent(record.click_rate),
        total_opens: record.total_opens,
        total_clicks: record.total_clicks,
        total_delivered: record.total_delivered,
        campaigns: record.campaigns.clone(),
        topics: record.topics.clone(),
        preferred_hour: record.preferred_hour,
        last_engaged: record.last_engaged.clone(),
    }
}

fn email_of(key: &str, record: &UserProfileRecord) -> String {
    if record.email.is_empty() {
        key.to_string()
    } else {
        record.email.clone()
    }
}

/// Counts per label, largest first.
fn breakdown<'a, I>(labels: I) -> Vec<CountBreakdown>
where
    I: IntoIterator<Item = (&'a str, u64)>,
{
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for (label, count) in labels {
        if !label.is_empty() {
            *counts.entry(label).or_default() += count;
        }
    }
    let mut rows: Vec<_> = counts
        .into_iter()
        .map(|(label, count)| CountBreakdown {
            label: label.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

impl DataResolver {
    pub(super) async fn top_users(&self, entities: &EntitySet) -> Result<RawResult, QueryError> {
        let profiles: UserProfiles = self.load(Dataset::UnifiedUserProfiles).await?;
        let filters = filters(&profiles, entities)?;

        let matching: Vec<UserSummary> = profiles
            .iter()
            .filter(|(_, record)| filters.iter().all(|f| f.accepts(record)))
            .map(|(key, record)| summary(key, record))
            .collect();
        let total_matching = matching.len();
        let sorted_by = sort_metric(entities, USER_METRICS);
        let users = rank(matching, &sorted_by, USER_LIMIT);

        let first = filters.first();
        Ok(RawResult::TopUsers(TopUsersResult {
            users,
            total_matching,
            segment: first.map(|f| f.value.to_string()),
            segment_type: first.map(|f| f.segment_type),
            sorted_by,
        }))
    }

    pub(super) async fn user_profile(&self, entities: &EntitySet) -> Result<RawResult, QueryError> {
        let email = entities
            .email
            .as_deref()
            .ok_or(QueryError::MissingRequiredEntity {
                query_type: QueryType::UserProfile,
                entity: "an email address",
            })?;
        let profiles: UserProfiles = self.load(Dataset::UnifiedUserProfiles).await?;
        let (key, exact_match) = best_email_match(email, profiles.keys().map(String::as_str))
            .ok_or_else(|| QueryError::EntityNotFound {
                entity: "user",
                value: email.to_string(),
            })?;
        let profile = profiles
            .get(key)
            .map(|record| detail(key, record))
            .ok_or_else(|| QueryError::EntityNotFound {
                entity: "user",
                value: email.to_string(),
            })?;
        Ok(RawResult::UserProfile(ProfileResult {
            profile,
            exact_match,
        }))
    }

    /// Counts users, from the summary when a single segment (or none) is
    /// asked for, otherwise by counting matching profiles.
    pub(super) async fn user_count(&self, entities: &EntitySet) -> Result<RawResult, QueryError> {
        let (summary, profiles) = match tokio::join!(
            self.load::<UserProfilesSummary>(Dataset::UserProfilesSummary),
            self.load::<UserProfiles>(Dataset::UnifiedUserProfiles),
        ) {
            (Err(a), Err(b)) => {
                return Err(all_unavailable(
                    &[Dataset::UserProfilesSummary, Dataset::UnifiedUserProfiles],
                    vec![a, b],
                ))
            }
            loaded => loaded,
        };

        if let Ok(summary) = &summary {
            if let Some(result) = count_from_summary(summary, entities) {
                return Ok(RawResult::UserCount(result));
            }
        }

        // The summary either failed to load or could not answer on its own.
        let profiles = match profiles {
            Ok(profiles) => profiles,
            Err(e) if !entities.specialties.is_empty() && !entities.professions.is_empty() => {
                return Err(e)
            }
            Err(_) => {
                let term = entities
                    .specialties
                    .first()
                    .or(entities.professions.first())
                    .cloned()
                    .unwrap_or_default();
                return Err(QueryError::EntityNotFound {
                    entity: "segment",
                    value: term,
                });
            }
        };

        let filters = filters(
            &profiles,
            &EntitySet {
                specialties: entities.specialties.clone(),
                professions: entities.professions.clone(),
                ..EntitySet::default()
            },
        )?;
        let matching: Vec<&UserProfileRecord> = profiles
            .values()
            .filter(|record| filters.iter().all(|f| f.accepts(record)))
            .collect();
        let by_specialty = !filters
            .iter()
            .any(|f| f.segment_type == SegmentType::Specialty);
        let breakdown = breakdown(matching.iter().map(|record| {
            let label = if by_specialty {
                record.specialty.as_str()
            } else {
                record.profession.as_str()
            };
            (label, 1)
        }));
        let total_users = match &summary {
            Ok(summary) if summary.total_users > 0 => summary.total_users,
            _ => profiles.len() as u64,
        };

        Ok(RawResult::UserCount(UserCountResult {
            count: matching.len() as u64,
            total_users,
            breakdown,
            filters: filters.iter().map(ProfileFilter::describe).collect(),
            sources: vec![Dataset::UnifiedUserProfiles.to_string()],
        }))
    }
}

/// Answers from the summary alone, or `None` when it cannot.
fn count_from_summary(
    summary: &UserProfilesSummary,
    entities: &EntitySet,
) -> Option<UserCountResult> {
    let sources = vec![Dataset::UserProfilesSummary.to_string()];
    match (entities.specialties.first(), entities.professions.first()) {
        (None, None) => Some(UserCountResult {
            count: summary.total_users,
            total_users: summary.total_users,
            breakdown: breakdown(
                summary
                    .by_specialty
                    .iter()
                    .map(|(name, count)| (name.as_str(), *count)),
            ),
            filters: Vec::new(),
            sources,
        }),
        (Some(term), None) => {
            let name = best_match(term, summary.by_specialty.keys().map(String::as_str))?;
            Some(UserCountResult {
                count: summary.by_specialty[name],
                total_users: summary.total_users,
                breakdown: Vec::new(),
                filters: vec![format!("specialty: {name}")],
                sources,
            })
        }
        (None, Some(term)) => {
            let name = best_match(term, summary.by_profession.keys().map(String::as_str))?;
            Some(UserCountResult {
                count: summary.by_profession[name],
                total_users: summary.total_users,
                breakdown: Vec::new(),
                filters: vec![format!("profession: {name}")],
                sources,
            })
        }
        (Some(_), Some(_)) => None,
    }
}
