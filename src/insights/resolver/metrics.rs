//! Matching, aggregation and ranking helpers shared by the resolver.

use std::cmp::Ordering;

use crate::insights::types::{
    query::EntitySet,
    result::{
        CampaignPerformance, ConfidenceLevel, SpecialtyMetrics, StatisticalValidity,
        TimeSlotPerformance, TopicPerformance, UserSummary,
    },
};

pub(crate) const FALLBACK_SORT_METRIC: &str = "engagement_score";
pub(crate) const USER_LIMIT: usize = 20;
pub(crate) const CONTENT_LIMIT: usize = 10;
pub(crate) const HIGHLIGHT_LIMIT: usize = 5;

/// Resolves a free-text term against a dataset's own names.
///
/// Returns the first key whose lower-cased form contains the lower-cased
/// term. Partial names match ("dermat" finds "Dermatology"), which also means
/// a short term can match an unintended key.
pub(crate) fn best_match<'a, I>(term: &str, keys: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    keys.into_iter()
        .find(|key| key.to_lowercase().contains(&needle))
}

/// Resolves an email against known profile keys: an exact key first, then
/// the first key that contains the email or is contained by it.
pub(crate) fn best_email_match<'a, I>(email: &str, keys: I) -> Option<(&'a str, bool)>
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    let needle = email.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    if let Some(key) = keys
        .clone()
        .into_iter()
        .find(|key| key.to_lowercase() == needle)
    {
        return Some((key, true));
    }
    keys.into_iter()
        .find(|key| {
            let key = key.to_lowercase();
            key.contains(&needle) || needle.contains(&key)
        })
        .map(|key| (key, false))
}

pub(crate) fn statistical_validity(sample_size: usize) -> StatisticalValidity {
    let confidence_level = match sample_size {
        0..=99 => ConfidenceLevel::Low,
        100..=384 => ConfidenceLevel::Medium,
        _ => ConfidenceLevel::High,
    };
    let margin_of_error = (sample_size > 0).then(|| 1.0 / (sample_size as f64).sqrt());
    StatisticalValidity {
        sample_size,
        confidence_level,
        is_adequate: sample_size >= 30,
        margin_of_error,
    }
}

/// Rescales a fraction to a percentage with two decimals.
pub(crate) fn percent(fraction: f64) -> f64 {
    round2(fraction * 100.0)
}

/// `part / whole` as a percentage; zero when `whole` is zero.
pub(crate) fn ratio_percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    percent(part as f64 / whole as f64)
}

pub(crate) fn average<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A row that can be ordered by a named metric.
pub(crate) trait Rankable {
    fn metric(&self, name: &str) -> Option<f64>;
}

/// Picks the first declared metric the rows support, then
/// `engagement_score` if they support it, then their first metric.
pub(crate) fn sort_metric(entities: &EntitySet, supported: &[&str]) -> String {
    entities
        .metrics
        .iter()
        .find(|m| supported.contains(&m.as_str()))
        .map(String::as_str)
        .or_else(|| {
            supported
                .contains(&FALLBACK_SORT_METRIC)
                .then_some(FALLBACK_SORT_METRIC)
        })
        .or_else(|| supported.first().copied())
        .unwrap_or(FALLBACK_SORT_METRIC)
        .to_string()
}

/// Stable descending sort by `metric`, truncated to `limit`.
pub(crate) fn rank<T: Rankable>(mut rows: Vec<T>, metric: &str, limit: usize) -> Vec<T> {
    rows.sort_by(|a, b| compare_desc(a.metric(metric), b.metric(metric)));
    rows.truncate(limit);
    rows
}

fn compare_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    let a = a.unwrap_or(f64::NEG_INFINITY);
    let b = b.unwrap_or(f64::NEG_INFINITY);
    b.total_cmp(&a)
}

pub(crate) const USER_METRICS: &[&str] = &[
    "engagement_score",
    "open_rate",
    "click_rate",
    "total_opens",
    "total_clicks",
    "total_delivered",
];

impl Rankable for UserSummary {
    fn metric(&self, name: &str) -> Option<f64> {
        match name {
            "engagement_score" => Some(self.engagement_score),
            "open_rate" => Some(self.open_rate),
            "click_rate" => Some(self.click_rate),
            "total_opens" => Some(self.total_opens as f64),
            "total_clicks" => Some(self.total_clicks as f64),
            "total_delivered" => Some(self.total_delivered as f64),
            _ => None,
        }
    }
}

pub(crate) const CONTENT_METRICS: &[&str] = &[
    "open_rate",
    "click_rate",
    "total_opens",
    "total_clicks",
    "total_delivered",
    "unique_users",
];

impl Rankable for TopicPerformance {
    fn metric(&self, name: &str) -> Option<f64> {
        match name {
            "open_rate" => Some(self.open_rate),
            "click_rate" => Some(self.click_rate),
            "total_opens" => Some(self.total_opens as f64),
            "total_clicks" => Some(self.total_clicks as f64),
            "total_delivered" => Some(self.total_delivered as f64),
            "unique_users" => Some(self.unique_users as f64),
            _ => None,
        }
    }
}

impl Rankable for CampaignPerformance {
    fn metric(&self, name: &str) -> Option<f64> {
        match name {
            "open_rate" => Some(self.open_rate),
            "click_rate" => Some(self.click_rate),
            "total_opens" => Some(self.total_opens as f64),
            "total_clicks" => Some(self.total_clicks as f64),
            "total_delivered" => Some(self.total_delivered as f64),
            _ => None,
        }
    }
}

pub(crate) const TIMING_METRICS: &[&str] =
    &["open_rate", "click_rate", "total_opens", "total_clicks"];

impl Rankable for TimeSlotPerformance {
    fn metric(&self, name: &str) -> Option<f64> {
        match name {
            "open_rate" => Some(self.open_rate),
            "click_rate" => Some(self.click_rate),
            "total_opens" => Some(self.total_opens as f64),
            "total_clicks" => Some(self.total_clicks as f64),
            _ => None,
        }
    }
}

pub(crate) const SPECIALTY_METRICS: &[&str] =
    &["open_rate", "click_rate", "engagement_score", "user_count"];

impl Rankable for SpecialtyMetrics {
    fn metric(&self, name: &str) -> Option<f64> {
        match name {
            "open_rate" => Some(self.avg_open_rate),
            "click_rate" => Some(self.avg_click_rate),
            "engagement_score" => Some(self.avg_engagement_score),
            "user_count" => Some(self.user_count as f64),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str, score: f64, open_rate: f64) -> UserSummary {
        UserSummary {
            email: email.to_string(),
            specialty: "Dermatology".to_string(),
            profession: "Physician".to_string(),
            engagement_score: score,
            open_rate,
            click_rate: 0.0,
            total_opens: 0,
            total_clicks: 0,
            total_delivered: 0,
        }
    }

    #[test]
    fn best_match_is_case_insensitive_containment() {
        let keys = ["Cardiology", "Dermatology", "Pediatric Dermatology"];
        assert_eq!(best_match("dermat", keys), Some("Dermatology"));
        assert_eq!(best_match("DERMATOLOGY", keys), Some("Dermatology"));
        assert_eq!(best_match("logy", keys), Some("Cardiology"));
        assert_eq!(best_match("urology", keys), None);
        assert_eq!(best_match("  ", keys), None);
    }

    #[test]
    fn email_match_prefers_exact_key() {
        let keys = [
            "ann@clinic.org",
            "jane.doe@derm.example.com",
            "jane@derm.example.com",
        ];
        assert_eq!(
            best_email_match("JANE@derm.example.com", keys),
            Some(("jane@derm.example.com", true))
        );
        assert_eq!(
            best_email_match("doe@derm.example.com", keys),
            Some(("jane.doe@derm.example.com", false))
        );
        assert_eq!(
            best_email_match("mary.ann@clinic.org", keys),
            Some(("ann@clinic.org", false))
        );
        assert_eq!(best_email_match("someone@else.org", keys), None);
        assert_eq!(best_email_match(" ", keys), None);
    }

    #[test]
    fn statistical_validity_thresholds() {
        let empty = statistical_validity(0);
        assert_eq!(empty.confidence_level, ConfidenceLevel::Low);
        assert!(!empty.is_adequate);
        assert_eq!(empty.margin_of_error, None);

        let small = statistical_validity(30);
        assert_eq!(small.confidence_level, ConfidenceLevel::Low);
        assert!(small.is_adequate);

        assert_eq!(
            statistical_validity(99).confidence_level,
            ConfidenceLevel::Low
        );
        assert_eq!(
            statistical_validity(100).confidence_level,
            ConfidenceLevel::Medium
        );
        assert_eq!(
            statistical_validity(384).confidence_level,
            ConfidenceLevel::Medium
        );
        assert_eq!(
            statistical_validity(385).confidence_level,
            ConfidenceLevel::High
        );
        assert_eq!(
            statistical_validity(10_000).confidence_level,
            ConfidenceLevel::High
        );

        for n in [1usize, 4, 100, 385, 2500] {
            let expected = 1.0 / (n as f64).sqrt();
            assert_eq!(statistical_validity(n).margin_of_error, Some(expected));
        }
    }

    #[test]
    fn sort_metric_prefers_declared_supported_metric() {
        let mut entities = EntitySet {
            metrics: vec!["unique_users".to_string(), "click_rate".to_string()],
            ..EntitySet::default()
        };
        assert_eq!(sort_metric(&entities, USER_METRICS), "click_rate");

        entities.metrics = vec!["unique_users".to_string()];
        assert_eq!(sort_metric(&entities, USER_METRICS), "engagement_score");
        assert_eq!(sort_metric(&entities, TIMING_METRICS), "open_rate");
    }

    #[test]
    fn ranking_is_descending_stable_and_truncated() {
        let users = vec![
            user("a@x.org", 50.0, 10.0),
            user("b@x.org", 90.0, 10.0),
            user("c@x.org", 50.0, 30.0),
            user("d@x.org", 70.0, 20.0),
        ];
        let by_score = rank(users.clone(), "engagement_score", 3);
        let emails: Vec<_> = by_score.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, ["b@x.org", "d@x.org", "a@x.org"]);

        let again = rank(by_score.clone(), "engagement_score", 3);
        assert_eq!(again, by_score);

        let by_open = rank(users, "open_rate", 10);
        let emails: Vec<_> = by_open.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, ["c@x.org", "d@x.org", "a@x.org", "b@x.org"]);
    }

    #[test]
    fn rates_and_averages() {
        assert_eq!(percent(0.2345), 23.45);
        assert_eq!(ratio_percent(1, 3), 33.33);
        assert_eq!(ratio_percent(5, 0), 0.0);
        assert_eq!(average([1.0, 2.0, 6.0]), 3.0);
        assert_eq!(average(std::iter::empty()), 0.0);
    }
}
