//! Keyword classification of questions into query types.
//!
//! Rules are evaluated in table order and the first one that holds wins, so
//! reordering [`QUERY_RULES`] changes the outcome for questions that mix
//! vocabularies.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{
    entities,
    types::query::{QueryInfo, QueryType},
};

const SUPERLATIVE: &str = r"\btop\b|\bmost engaged\b|\bhighest (?:open|click|engagement)";
const PERSON: &str = r"\b(?:users?|who|which)\b";
const CONTENT: &str = r"\bcontent|\btopics?\b|\bperform|\bbest\b";
const USER: &str = r"\busers?\b";
const TIME: &str =
    r"\b(?:when|time|times|timing|hours?|hourly|days?|daily|morning|mornings|afternoons?)\b";
const SUMMARY: &str = r"\b(?:overview|summary|summarize|breakdown|demographics?)\b";
const AUDIENCE: &str =
    r"\b(?:audiences?|users?|people|recipients?|subscribers?|readers?|hcps?|physicians|doctors)\b";
const PROFILE: &str = r"\b(?:profile|details)\b";
const IDENTITY: &str = r"@|\b(?:email|e-mail|users?|npi)\b";
const COMPARE: &str = r"\bcompar(?:e|ed|es|ing|ison)\b";
const COMPARISON: &str = r"\bcompar(?:e|ed|es|ing|ison)\b|\bvs\b|\bversus\b|\bdifferences?\b";
const COUNTING: &str = r"\bhow many\b|\bcount\b|\bnumber of\b";

/// A single condition of a rule.
enum Condition {
    Pattern(Regex),
    MentionsSpecialty,
}

impl Condition {
    fn pattern(pattern: &str) -> Self {
        Condition::Pattern(Regex::new(&format!("(?i){pattern}")).expect("rule pattern is valid"))
    }

    fn holds(&self, text: &str) -> bool {
        match self {
            Condition::Pattern(regex) => regex.is_match(text),
            Condition::MentionsSpecialty => entities::mentions_specialty(text),
        }
    }
}

struct QueryRule {
    query_type: QueryType,
    /// Every condition must hold.
    all: Vec<Condition>,
    /// No condition may hold.
    none: Vec<Condition>,
}

impl QueryRule {
    fn matches(&self, text: &str) -> bool {
        self.all.iter().all(|c| c.holds(text)) && !self.none.iter().any(|c| c.holds(text))
    }
}

static QUERY_RULES: LazyLock<Vec<QueryRule>> = LazyLock::new(|| {
    use Condition::MentionsSpecialty;

    let p = Condition::pattern;
    vec![
        QueryRule {
            query_type: QueryType::TopUsers,
            all: vec![p(SUPERLATIVE), p(PERSON)],
            none: vec![],
        },
        QueryRule {
            query_type: QueryType::ContentPerformance,
            all: vec![p(CONTENT)],
            none: vec![p(USER), p(TIME)],
        },
        QueryRule {
            query_type: QueryType::TimingInsights,
            all: vec![p(TIME)],
            none: vec![],
        },
        QueryRule {
            query_type: QueryType::AudienceOverview,
            all: vec![p(SUMMARY), p(AUDIENCE)],
            none: vec![],
        },
        QueryRule {
            query_type: QueryType::UserProfile,
            all: vec![p(PROFILE), p(IDENTITY)],
            none: vec![],
        },
        QueryRule {
            query_type: QueryType::SpecialtyEngagement,
            all: vec![MentionsSpecialty],
            none: vec![p(COMPARE)],
        },
        QueryRule {
            query_type: QueryType::SpecialtyComparison,
            all: vec![p(COMPARISON), MentionsSpecialty],
            none: vec![],
        },
        QueryRule {
            query_type: QueryType::UserCount,
            all: vec![p(COUNTING), p(AUDIENCE)],
            none: vec![],
        },
    ]
});

/// Classifies a normalized question. Never fails: questions no rule
/// recognizes are treated as an audience overview.
pub fn classify(text: &str) -> QueryInfo {
    let query_type = determine_query_type(text);
    let entities = entities::extract(text, query_type);
    debug!(%query_type, ?entities, "Classified question");
    QueryInfo {
        query_type,
        entities,
    }
}

fn determine_query_type(text: &str) -> QueryType {
    QUERY_RULES
        .iter()
        .find(|rule| rule.matches(text))
        .map_or(QueryType::AudienceOverview, |rule| rule.query_type)
}
