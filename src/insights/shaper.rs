//! Converts resolver output into the caller-facing payloads.

use tracing::warn;

use super::{
    error::QueryError,
    suggestions,
    types::{
        payload::{
            AudiencePayload, ContentPayload, DisplayPayload, ErrorPayload,
            SpecialtyComparisonPayload, SpecialtyEngagementPayload, TimingPayload, TopUsersPayload,
            UserCountPayload, UserProfilePayload,
        },
        query::{QueryInfo, QueryType},
        result::{
            AudienceResult, ComparisonResult, ContentResult, ProfileResult, RawResult,
            SpecialtyEngagementResult, TimingResult, TopUsersResult, UserCountResult,
        },
    },
};
use crate::insights::resolver::metrics::ratio_percent;

/// Shapes `raw` for display. Never fails: a result that does not fit the
/// contract of the classified query type becomes an error payload.
pub fn shape(raw: RawResult, info: &QueryInfo, original_query: &str) -> DisplayPayload {
    match try_shape(raw, info) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(query_type = %info.query_type, "Discarding result: {e}");
            error_payload(&e, Some(info.query_type), original_query)
        }
    }
}

/// The uniform failure payload.
pub fn error_payload(
    error: &QueryError,
    query_type: Option<QueryType>,
    original_query: &str,
) -> DisplayPayload {
    DisplayPayload::Error(ErrorPayload {
        message: error.user_message(),
        technical_details: error.to_string(),
        suggestions: suggestions::for_query_type(query_type),
        original_query: original_query.to_string(),
    })
}

fn try_shape(raw: RawResult, info: &QueryInfo) -> Result<DisplayPayload, QueryError> {
    let produced = raw.query_type();
    if produced != info.query_type {
        return Err(invalid(
            info.query_type,
            format!("resolver produced a `{produced}` result"),
        ));
    }
    match raw {
        RawResult::TopUsers(result) => Ok(top_users(result)),
        RawResult::ContentPerformance(result) => Ok(content(result)),
        RawResult::TimingInsights(result) => timing(result),
        RawResult::AudienceOverview(result) => audience(result),
        RawResult::UserProfile(result) => profile(result),
        RawResult::SpecialtyEngagement(result) => specialty_engagement(result),
        RawResult::SpecialtyComparison(result) => comparison(result),
        RawResult::UserCount(result) => Ok(user_count(result)),
    }
}

fn invalid(query_type: QueryType, reason: impl Into<String>) -> QueryError {
    QueryError::ShapingValidationFailed {
        query_type,
        reason: reason.into(),
    }
}

fn metric_label(metric: &str) -> String {
    metric.replace('_', " ")
}

fn top_users(result: TopUsersResult) -> DisplayPayload {
    let title = match &result.segment {
        Some(segment) => format!("Top {segment} users by {}", metric_label(&result.sorted_by)),
        None => format!("Top users by {}", metric_label(&result.sorted_by)),
    };
    DisplayPayload::TopUsers(TopUsersPayload {
        title,
        displayed_count: result.users.len(),
        users: result.users,
        total_matching: result.total_matching,
        segment: result.segment,
        segment_type: result.segment_type,
        sorted_by: result.sorted_by,
    })
}

fn content(result: ContentResult) -> DisplayPayload {
    let title = match &result.segment {
        Some(segment) => format!("Content performance for {segment}"),
        None => "Content performance".to_string(),
    };
    DisplayPayload::ContentPerformance(ContentPayload {
        title,
        top_topic: result.topics.first().map(|t| t.topic.clone()),
        topics: result.topics,
        total_topics: result.total_topics,
        campaigns: result.campaigns,
        segment: result.segment,
        sorted_by: result.sorted_by,
        statistical_validity: result.statistical_validity,
        sources: result.sources,
    })
}

fn timing(result: TimingResult) -> Result<DisplayPayload, QueryError> {
    if result.top_hours.is_empty() && result.days.is_empty() {
        return Err(invalid(QueryType::TimingInsights, "no hourly or daily send data"));
    }
    let title = match &result.segment {
        Some(segment) => format!("Best send times for {segment}"),
        None => "Best send times".to_string(),
    };
    Ok(DisplayPayload::TimingInsights(TimingPayload {
        title,
        best_hour: result.top_hours.first().map(|h| h.label.clone()),
        best_day: result.days.first().map(|d| d.label.clone()),
        top_hours: result.top_hours,
        days: result.days,
        segment: result.segment,
        sorted_by: result.sorted_by,
        total_delivered: result.total_delivered,
        statistical_validity: result.statistical_validity,
    }))
}

fn audience(result: AudienceResult) -> Result<DisplayPayload, QueryError> {
    if result.sources.is_empty() {
        return Err(invalid(QueryType::AudienceOverview, "no contributing datasets"));
    }
    Ok(DisplayPayload::AudienceOverview(AudiencePayload {
        title: "Audience overview".to_string(),
        total_users: result.total_users.unwrap_or_default(),
        complete: result.sources.len() == 3,
        specialties: result.specialties,
        professions: result.professions,
        engagement: result.engagement,
        engagement_tiers: result.engagement_tiers,
        sources: result.sources,
    }))
}

fn profile(result: ProfileResult) -> Result<DisplayPayload, QueryError> {
    if result.profile.email.trim().is_empty() {
        return Err(invalid(QueryType::UserProfile, "profile has no email"));
    }
    Ok(DisplayPayload::UserProfile(UserProfilePayload {
        title: format!("User profile: {}", result.profile.email),
        profile: result.profile,
        exact_match: result.exact_match,
    }))
}

fn specialty_engagement(result: SpecialtyEngagementResult) -> Result<DisplayPayload, QueryError> {
    if result.specialty.trim().is_empty() {
        return Err(invalid(QueryType::SpecialtyEngagement, "result names no specialty"));
    }
    Ok(DisplayPayload::SpecialtyEngagement(SpecialtyEngagementPayload {
        title: format!("{} engagement", result.specialty),
        specialty: result.specialty,
        user_count: result.user_count,
        avg_open_rate: result.avg_open_rate,
        avg_click_rate: result.avg_click_rate,
        avg_engagement_score: result.avg_engagement_score,
        avg_opens: result.avg_opens,
        avg_clicks: result.avg_clicks,
        avg_delivered: result.avg_delivered,
        top_topics: result.top_topics,
        top_hours: result.top_hours,
        statistical_validity: result.statistical_validity,
        sources: result.sources,
    }))
}

fn comparison(result: ComparisonResult) -> Result<DisplayPayload, QueryError> {
    if result.specialties.is_empty() {
        return Err(invalid(QueryType::SpecialtyComparison, "no specialties to compare"));
    }
    let names: Vec<_> = result
        .specialties
        .iter()
        .map(|s| s.specialty.as_str())
        .collect();
    Ok(DisplayPayload::SpecialtyComparison(SpecialtyComparisonPayload {
        title: format!("Specialty comparison: {}", names.join(" vs ")),
        leader: result.specialties.first().map(|s| s.specialty.clone()),
        specialties: result.specialties,
        unmatched: result.unmatched,
        sorted_by: result.sorted_by,
        sources: result.sources,
    }))
}

fn user_count(result: UserCountResult) -> DisplayPayload {
    let title = if result.filters.is_empty() {
        "User count".to_string()
    } else {
        format!("User count ({})", result.filters.join(", "))
    };
    DisplayPayload::UserCount(UserCountPayload {
        title,
        share_of_total: ratio_percent(result.count, result.total_users),
        count: result.count,
        total_users: result.total_users,
        breakdown: result.breakdown,
        filters: result.filters,
        sources: result.sources,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::insights::{
        resolver::metrics::statistical_validity,
        types::{
            query::EntitySet,
            result::{SpecialtyMetrics, TimeSlotPerformance, UserDetail},
        },
    };

    fn info(query_type: QueryType) -> QueryInfo {
        QueryInfo {
            query_type,
            entities: EntitySet::default(),
        }
    }

    fn slot(slot: &str, label: &str) -> TimeSlotPerformance {
        TimeSlotPerformance {
            slot: slot.to_string(),
            label: label.to_string(),
            open_rate: 40.0,
            click_rate: 10.0,
            total_opens: 4,
            total_clicks: 1,
            total_delivered: 10,
        }
    }

    fn empty_users() -> RawResult {
        RawResult::TopUsers(TopUsersResult {
            users: Vec::new(),
            total_matching: 0,
            segment: None,
            segment_type: None,
            sorted_by: "engagement_score".to_string(),
        })
    }

    #[test]
    fn empty_lists_are_still_present() {
        let payload = shape(empty_users(), &info(QueryType::TopUsers), "top users");
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["responseType"], "top_users");
        assert_eq!(value["users"], json!([]));
        assert_eq!(value["displayedCount"], 0);
        assert_eq!(value["segment"], json!(null));
        assert_eq!(value["title"], "Top users by engagement score");
    }

    #[test]
    fn mismatched_result_becomes_error_payload() {
        let payload = shape(empty_users(), &info(QueryType::UserCount), "how many users");
        let DisplayPayload::Error(error) = payload else {
            panic!("expected an error payload");
        };
        assert_eq!(error.original_query, "how many users");
        assert!(error.technical_details.contains("top_users"));
        assert_eq!(
            error.suggestions,
            suggestions::for_query_type(Some(QueryType::UserCount))
        );
    }

    #[test]
    fn timing_without_slots_fails_validation() {
        let raw = RawResult::TimingInsights(TimingResult {
            top_hours: Vec::new(),
            days: Vec::new(),
            segment: None,
            sorted_by: "open_rate".to_string(),
            total_delivered: 0,
            statistical_validity: statistical_validity(0),
        });
        let payload = shape(raw, &info(QueryType::TimingInsights), "when");
        assert!(payload.is_error());
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["responseType"], "error");
        assert!(value["technicalDetails"]
            .as_str()
            .unwrap()
            .contains("no hourly or daily send data"));
    }

    #[test]
    fn timing_highlights_best_slots() {
        let raw = RawResult::TimingInsights(TimingResult {
            top_hours: vec![slot("9", "9:00 AM"), slot("14", "2:00 PM")],
            days: vec![slot("Tuesday", "Tuesday")],
            segment: Some("Dermatology".to_string()),
            sorted_by: "open_rate".to_string(),
            total_delivered: 20,
            statistical_validity: statistical_validity(20),
        });
        let DisplayPayload::TimingInsights(payload) =
            shape(raw, &info(QueryType::TimingInsights), "when")
        else {
            panic!("expected timing insights");
        };
        assert_eq!(payload.best_hour.as_deref(), Some("9:00 AM"));
        assert_eq!(payload.best_day.as_deref(), Some("Tuesday"));
        assert_eq!(payload.title, "Best send times for Dermatology");
    }

    #[test]
    fn profile_without_email_fails_validation() {
        let raw = RawResult::UserProfile(ProfileResult {
            profile: UserDetail {
                email: String::new(),
                specialty: "Oncology".to_string(),
                profession: "Physician".to_string(),
                npi: None,
                engagement_score: 0.0,
                open_rate: 0.0,
                click_rate: 0.0,
                total_opens: 0,
                total_clicks: 0,
                total_delivered: 0,
                campaigns: Vec::new(),
                topics: Vec::new(),
                preferred_hour: None,
                last_engaged: None,
            },
            exact_match: true,
        });
        assert!(shape(raw, &info(QueryType::UserProfile), "profile").is_error());
    }

    #[test]
    fn comparison_names_the_leader() {
        let row = |name: &str, open_rate: f64| SpecialtyMetrics {
            specialty: name.to_string(),
            user_count: 10,
            avg_open_rate: open_rate,
            avg_click_rate: 0.0,
            avg_engagement_score: 0.0,
            statistical_validity: statistical_validity(10),
        };
        let raw = RawResult::SpecialtyComparison(ComparisonResult {
            specialties: vec![row("Oncology", 75.0), row("Dermatology", 58.33)],
            unmatched: Vec::new(),
            sorted_by: "open_rate".to_string(),
            sources: vec!["unified_user_profiles".to_string()],
        });
        let DisplayPayload::SpecialtyComparison(payload) =
            shape(raw, &info(QueryType::SpecialtyComparison), "compare")
        else {
            panic!("expected a comparison");
        };
        assert_eq!(payload.leader.as_deref(), Some("Oncology"));
        assert_eq!(
            payload.title,
            "Specialty comparison: Oncology vs Dermatology"
        );

        let empty = RawResult::SpecialtyComparison(ComparisonResult {
            specialties: Vec::new(),
            unmatched: vec!["Urology".to_string()],
            sorted_by: "open_rate".to_string(),
            sources: Vec::new(),
        });
        assert!(shape(empty, &info(QueryType::SpecialtyComparison), "compare").is_error());
    }

    #[test]
    fn audience_without_sources_fails_and_partial_is_flagged() {
        let result = |sources: &[&str]| {
            RawResult::AudienceOverview(AudienceResult {
                total_users: None,
                specialties: Vec::new(),
                professions: Vec::new(),
                engagement: None,
                engagement_tiers: Vec::new(),
                sources: sources.iter().map(ToString::to_string).collect(),
            })
        };
        assert!(shape(result(&[]), &info(QueryType::AudienceOverview), "overview").is_error());

        let DisplayPayload::AudienceOverview(payload) = shape(
            result(&["user_profiles_summary"]),
            &info(QueryType::AudienceOverview),
            "overview",
        ) else {
            panic!("expected an audience overview");
        };
        assert!(!payload.complete);
        assert_eq!(payload.total_users, 0);
    }

    #[test]
    fn share_of_total_is_a_percentage() {
        let raw = RawResult::UserCount(UserCountResult {
            count: 90,
            total_users: 500,
            breakdown: Vec::new(),
            filters: vec!["profession: Nurse Practitioner".to_string()],
            sources: vec!["user_profiles_summary".to_string()],
        });
        let DisplayPayload::UserCount(payload) =
            shape(raw, &info(QueryType::UserCount), "how many nps")
        else {
            panic!("expected a count");
        };
        assert_eq!(payload.share_of_total, 18.0);
        assert_eq!(payload.title, "User count (profession: Nurse Practitioner)");
    }

    #[test]
    fn error_payload_is_uniform() {
        let payload = error_payload(&QueryError::EmptyQuery, None, "");
        let value = serde_json::to_value(&payload).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            [
                "message",
                "originalQuery",
                "responseType",
                "suggestions",
                "technicalDetails"
            ]
        );
        assert_eq!(value["suggestions"].as_array().unwrap().len(), 5);
    }
}
