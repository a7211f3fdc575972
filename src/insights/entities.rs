//! Heuristic entity extraction.
//!
//! Each entity kind is an ordered table of `(pattern, canonical values)`.
//! Rules run top to bottom against a working copy of the question; the text a
//! rule matches is blanked out so later, more general rules cannot claim the
//! same words again ("physician assistant" never also yields "Physician").

use std::sync::LazyLock;

use chrono::{Datelike, Utc};
use regex::Regex;

use super::types::query::{push_unique, EntitySet, QueryType, Timeframe};

type RuleTable = &'static [(&'static str, &'static [&'static str])];

const SPECIALTIES: RuleTable = &[
    (r"\bdermatolog", &["Dermatology"]),
    (r"\boncolog", &["Oncology"]),
    (r"\bcardiolog", &["Cardiology"]),
    (r"\bneurolog", &["Neurology"]),
    (r"\bp(?:a)?ediatric", &["Pediatrics"]),
    (r"\bpsychiatr", &["Psychiatry"]),
    (r"\brheumatolog", &["Rheumatology"]),
    (r"\bendocrinolog", &["Endocrinology"]),
    (r"\bgastroenterolog|\bgi\b", &["Gastroenterology"]),
    (r"\bhematolog", &["Hematology"]),
    (
        r"\bfamily (?:medicine|practice|physicians?|doctors?)",
        &["Family Medicine"],
    ),
    (
        r"\binternal medicine|\binternists?\b",
        &["Internal Medicine"],
    ),
    (r"\bophthalmolog", &["Ophthalmology"]),
    (r"\ballerg|\bimmunolog", &["Allergy & Immunology"]),
    (r"\bpulmonolog|\bpulmonary", &["Pulmonology"]),
    (r"\burolog", &["Urology"]),
    (r"\bnephrolog", &["Nephrology"]),
];

const PROFESSIONS: RuleTable = &[
    (
        r"\bnp/pa\b|\bnps?\s*(?:and|&|or|/)\s*pas?\b|\badvanced practice (?:providers?|clinicians?)|\bapps\b",
        &["Nurse Practitioner", "Physician Assistant"],
    ),
    (
        r"\bnurse practitioners?\b|\bnps?\b",
        &["Nurse Practitioner"],
    ),
    (
        r"\bphysician assistants?\b|\bpas?\b",
        &["Physician Assistant"],
    ),
    (
        r"\bphysicians?\b|\bdoctors?\b|\bmds?\b|\bdos\b",
        &["Physician"],
    ),
    (r"\bpharmacists?\b|\bpharmds?\b", &["Pharmacist"]),
    (
        r"\bregistered nurses?\b|\brns?\b|\bnurses\b",
        &["Registered Nurse"],
    ),
    (r"\bresidents?\b|\bfellows?\b", &["Resident"]),
];

const CAMPAIGNS: RuleTable = &[
    (r"\bnewsletters?\b", &["Monthly Newsletter"]),
    (
        r"\bproduct launch(?:es)?\b|\blaunch (?:campaigns?|emails?)\b",
        &["Product Launch"],
    ),
    (r"\bwebinars?\b", &["Webinar Invitation"]),
    (
        r"\bcme\b|\bcontinuing medical education\b",
        &["CME Program"],
    ),
    (r"\bclinical updates?\b", &["Clinical Update"]),
    (r"\bsurveys?\b", &["Survey Invitation"]),
];

const METRICS: RuleTable = &[
    (r"\bengagement(?:[ _]scores?)?\b", &["engagement_score"]),
    (r"\bopen[ _]?rates?\b", &["open_rate"]),
    (
        r"\bclick[ _-]?(?:through[ _-]?)?rates?\b|\bctr\b",
        &["click_rate"],
    ),
    (r"\btotal[ _]opens\b|\bopens\b", &["total_opens"]),
    (r"\btotal[ _]clicks\b|\bclicks\b", &["total_clicks"]),
    (
        r"\btotal[ _]delivered\b|\bdeliver(?:ed|y|ies|ability)\b",
        &["total_delivered"],
    ),
    (r"\bunique[ _]users\b|\breach\b", &["unique_users"]),
];

const TOPICS: RuleTable = &[
    (r"\bclinical trials?\b", &["Clinical Trials"]),
    (r"\bcase stud(?:y|ies)\b", &["Case Studies"]),
    (r"\b(?:treatment )?guidelines?\b", &["Treatment Guidelines"]),
    (
        r"\bdrug approvals?\b|\bfda\b|\bapprovals?\b",
        &["Drug Approvals"],
    ),
    (r"\bconferences?\b|\bcongress\b", &["Conference Coverage"]),
    (
        r"\bpatient education\b|\bpatient resources?\b",
        &["Patient Education"],
    ),
    (
        r"\bpractice management\b|\bbilling\b|\breimbursement\b",
        &["Practice Management"],
    ),
    (r"\bresearch\b|\bstud(?:y|ies)\b", &["Research Updates"]),
    (
        r"\bsafety\b|\bside effects?\b|\badverse events?\b",
        &["Drug Safety"],
    ),
];

const MONTHS: &str = "january|february|march|april|may|june|july|august|september|october|november|december|sept|jan|feb|mar|apr|jun|jul|aug|sep|oct|nov|dec";
/// Month names that are also ordinary words ("may", "mar") only count next to
/// a year or after "in"/"during".
const PLAIN_MONTHS: &str = "january|february|march|april|june|july|august|september|october|november|december|sept|jan|feb|apr|jun|jul|aug|sep|oct|nov|dec";

struct EntityRule {
    pattern: Regex,
    values: &'static [&'static str],
}

fn compile(table: RuleTable) -> Vec<EntityRule> {
    table
        .iter()
        .map(|&(pattern, values)| EntityRule {
            pattern: Regex::new(&format!("(?i){pattern}")).expect("entity pattern is valid"),
            values,
        })
        .collect()
}

static SPECIALTY_RULES: LazyLock<Vec<EntityRule>> = LazyLock::new(|| compile(SPECIALTIES));
static PROFESSION_RULES: LazyLock<Vec<EntityRule>> = LazyLock::new(|| compile(PROFESSIONS));
static CAMPAIGN_RULES: LazyLock<Vec<EntityRule>> = LazyLock::new(|| compile(CAMPAIGNS));
static METRIC_RULES: LazyLock<Vec<EntityRule>> = LazyLock::new(|| compile(METRICS));
static TOPIC_RULES: LazyLock<Vec<EntityRule>> = LazyLock::new(|| compile(TOPICS));

static SPECIALTY_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    let names = SPECIALTIES
        .iter()
        .map(|(pattern, _)| format!("(?:{pattern})"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\bspecialt(?:y|ies)\b|\bspecialists?\b|{names}"))
        .expect("specialty reference pattern is valid")
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b").expect("email regex is valid")
});
static MONTH_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({MONTHS})\s*(?:-|–|to|through|thru|until)\s*({MONTHS})\b"))
        .expect("month range regex is valid")
});
static MONTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({PLAIN_MONTHS})\b|\b(?:in|during)\s+(may|mar)\b|\b(may|mar)\s+(?:19|20)\d{{2}}\b"
    ))
    .expect("month regex is valid")
});
static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b((?:19|20)\d{2})\b").expect("year regex is valid"));
static QUARTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bq([1-4])\b").expect("quarter regex is valid"));
static DEPLOYMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bdeployment\s*#?\s*(\d+)\b|\b(\d+)(?:st|nd|rd|th)\s+deployment\b")
        .expect("deployment regex is valid")
});
static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)"|“([^”]+)”"#).expect("quote regex is valid"));

/// Extracts every entity kind from `text`.
///
/// Extraction does not depend on the query type; the type only selects the
/// default metrics used when the question names none.
pub fn extract(text: &str, query_type: QueryType) -> EntitySet {
    let email = extract_email(text);
    let without_email = EMAIL_RE.replace_all(text, " ");

    let mut entities = EntitySet {
        specialties: match_rules(&SPECIALTY_RULES, &without_email),
        professions: match_rules(&PROFESSION_RULES, &without_email),
        campaigns: match_rules(&CAMPAIGN_RULES, &without_email),
        metrics: match_rules(&METRIC_RULES, &without_email),
        timeframe: extract_timeframe(&without_email),
        email,
        topics: match_rules(&TOPIC_RULES, &without_email),
        deployment: extract_deployment(&without_email),
        specific_campaigns: extract_quoted(&without_email),
    };
    if entities.metrics.is_empty() {
        entities.metrics = query_type
            .default_metrics()
            .iter()
            .map(ToString::to_string)
            .collect();
    }
    entities
}

/// Whether the text refers to specialties at all, generically or by name.
pub(crate) fn mentions_specialty(text: &str) -> bool {
    SPECIALTY_REFERENCE.is_match(text)
}

fn match_rules(rules: &[EntityRule], text: &str) -> Vec<String> {
    let mut remaining = text.to_string();
    let mut found = Vec::new();
    for rule in rules {
        let spans: Vec<_> = rule
            .pattern
            .find_iter(&remaining)
            .map(|m| m.range())
            .collect();
        if spans.is_empty() {
            continue;
        }
        for value in rule.values {
            push_unique(&mut found, value);
        }
        for span in spans {
            let blank = " ".repeat(span.len());
            remaining.replace_range(span, &blank);
        }
    }
    found
}

fn extract_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_lowercase())
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn extract_timeframe(text: &str) -> Option<Timeframe> {
    let range = MONTH_RANGE_RE
        .captures(text)
        .and_then(|caps| Some((month_number(&caps[1])?, month_number(&caps[2])?)));
    let month = if range.is_none() {
        MONTH_RE.captures(text).and_then(|caps| {
            let name = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
            month_number(name.as_str())
        })
    } else {
        None
    };
    let year = YEAR_RE
        .captures(text)
        .and_then(|caps| caps[1].parse::<i32>().ok());
    let quarter = QUARTER_RE
        .captures(text)
        .and_then(|caps| caps[1].parse::<u32>().ok());

    if range.is_none() && month.is_none() && year.is_none() && quarter.is_none() {
        return None;
    }
    Some(Timeframe {
        month,
        year: year.unwrap_or_else(|| Utc::now().year()),
        quarter,
        start_month: range.map(|(start, _)| start),
        end_month: range.map(|(_, end)| end),
    })
}

fn extract_deployment(text: &str) -> Option<u32> {
    let caps = DEPLOYMENT_RE.captures(text)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .and_then(|m| m.as_str().parse().ok())
}

fn extract_quoted(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    for caps in QUOTED_RE.captures_iter(text) {
        if let Some(m) = caps.get(1).or_else(|| caps.get(2)) {
            let name = m.as_str().trim();
            if !name.is_empty() {
                push_unique(&mut found, name);
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities(text: &str) -> EntitySet {
        extract(&text.to_lowercase(), QueryType::AudienceOverview)
    }

    #[test]
    fn specialties_are_canonical_and_ordered() {
        let found = entities("Compare dermatology vs oncology engagement");
        assert_eq!(found.specialties, ["Dermatology", "Oncology"]);
        assert_eq!(found.metrics, ["engagement_score"]);

        let found = entities("hematology/oncology and dermatologists, dermatology");
        assert_eq!(found.specialties, ["Dermatology", "Oncology", "Hematology"]);
    }

    #[test]
    fn combined_profession_expands_to_two_values() {
        let found = entities("open rate for NP/PA audiences");
        assert_eq!(
            found.professions,
            ["Nurse Practitioner", "Physician Assistant"]
        );
    }

    #[test]
    fn specific_profession_is_not_reclaimed_by_general_rule() {
        let found = entities("physician assistants in cardiology");
        assert_eq!(found.professions, ["Physician Assistant"]);

        let found = entities("physicians and physician assistants");
        assert_eq!(found.professions, ["Physician Assistant", "Physician"]);
    }

    #[test]
    fn missing_metrics_fall_back_to_query_type_defaults() {
        let found = extract(
            "who are our top engaged dermatologists?",
            QueryType::TopUsers,
        );
        assert_eq!(
            found.metrics,
            ["engagement_score", "open_rate", "click_rate"]
        );

        let found = extract("top users by click rate", QueryType::TopUsers);
        assert_eq!(found.metrics, ["click_rate"]);
    }

    #[test]
    fn extraction_is_idempotent_on_canonical_values() {
        let questions = [
            "NP/PA and pharmacists, residents, registered nurses",
            "physician assistants and nurse practitioners",
            "dermatology, allergy and family medicine, internists and GI doctors",
            "newsletter, webinar, CME and survey campaigns plus product launch emails",
            "case studies, research, clinical trials, FDA approvals, guidelines",
            "open rate, click-through rate, opens, clicks, engagement score, delivered",
        ];
        let extract_all = |text: &str| extract(&text.to_lowercase(), QueryType::Error);
        for question in questions {
            let first = extract_all(question);
            let again = |values: &[String]| extract_all(&values.join(", "));
            assert_eq!(again(&first.specialties).specialties, first.specialties);
            assert_eq!(again(&first.professions).professions, first.professions);
            assert_eq!(again(&first.campaigns).campaigns, first.campaigns);
            assert_eq!(again(&first.topics).topics, first.topics);
            assert_eq!(again(&first.metrics).metrics, first.metrics);
        }
    }

    #[test]
    fn timeframe_collects_present_components() {
        let found = entities("open rates in March 2024");
        assert_eq!(
            found.timeframe,
            Some(Timeframe {
                month: Some(3),
                year: 2024,
                quarter: None,
                start_month: None,
                end_month: None,
            })
        );

        let found = entities("Q3 performance");
        let timeframe = found.timeframe.unwrap();
        assert_eq!(timeframe.quarter, Some(3));
        assert_eq!(timeframe.year, Utc::now().year());

        let found = entities("campaigns from january to april 2023");
        let timeframe = found.timeframe.unwrap();
        assert_eq!(timeframe.start_month, Some(1));
        assert_eq!(timeframe.end_month, Some(4));
        assert_eq!(timeframe.month, None);
        assert_eq!(timeframe.year, 2023);

        assert_eq!(entities("top users by click rate").timeframe, None);
    }

    #[test]
    fn may_is_a_month_only_in_date_context() {
        assert_eq!(entities("Which content may perform best?").timeframe, None);
        assert_eq!(entities("Is the mar campaign working?").timeframe, None);
        assert_eq!(
            entities("How did the newsletter do in May?")
                .timeframe
                .and_then(|t| t.month),
            Some(5)
        );
        let timeframe = entities("open rates for may 2024").timeframe.unwrap();
        assert_eq!(timeframe.month, Some(5));
        assert_eq!(timeframe.year, 2024);
        assert_eq!(
            entities("webinar results during mar")
                .timeframe
                .and_then(|t| t.month),
            Some(3)
        );
    }

    #[test]
    fn email_is_lowercased_and_kept_out_of_other_entities() {
        let found = entities("Profile for Jane.Doe@Oncology-Partners.com");
        assert_eq!(
            found.email.as_deref(),
            Some("jane.doe@oncology-partners.com")
        );
        assert!(found.specialties.is_empty());
    }

    #[test]
    fn deployment_and_quoted_campaigns() {
        let found = entities(r#"how did deployment #2 of "Spring Derm Update" do?"#);
        assert_eq!(found.deployment, Some(2));
        assert_eq!(found.specific_campaigns, ["spring derm update"]);

        assert_eq!(entities("the 3rd deployment").deployment, Some(3));
    }

    #[test]
    fn specialty_reference_detects_names_and_generic_words() {
        assert!(mentions_specialty("engagement by specialty"));
        assert!(mentions_specialty("how are cardiologists doing"));
        assert!(!mentions_specialty("how many users opened"));
    }
}
