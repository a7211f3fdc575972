use super::types::query::QueryType;

const GENERIC: &[&str] = &[
    "Who are our top engaged users?",
    "Which topics perform best?",
    "What's the best time to send emails?",
    "Give me an audience overview",
    "How many users do we have?",
];

/// Example questions to offer after a failure, tailored to the kind of
/// question that was asked. Unknown or `error` types get a generic list.
pub fn for_query_type(query_type: Option<QueryType>) -> Vec<String> {
    let examples: &[&str] = match query_type {
        Some(QueryType::TopUsers) => &[
            "Who are our top engaged dermatologists?",
            "Which users have the highest open rates?",
            "Top users by click rate for the monthly newsletter",
        ],
        Some(QueryType::ContentPerformance) => &[
            "Which topics perform best?",
            "What content performs best for cardiology?",
            "How did the product launch perform in Q2?",
        ],
        Some(QueryType::TimingInsights) => &[
            "What's the best time to send to physicians?",
            "Which hours get the most opens?",
            "What day of the week has the highest click rate?",
        ],
        Some(QueryType::AudienceOverview) => &[
            "Give me an audience overview",
            "Show a breakdown of our users by specialty",
            "Summarize our audience demographics",
        ],
        Some(QueryType::UserProfile) => &[
            "Show profile details for jane.doe@example.com",
            "User details for the email someone@clinic.org",
        ],
        Some(QueryType::SpecialtyEngagement) => &[
            "How engaged are dermatologists?",
            "Show oncology engagement",
            "What's the open rate for cardiology?",
        ],
        Some(QueryType::SpecialtyComparison) => &[
            "Compare dermatology vs oncology engagement",
            "Compare cardiology and neurology open rates",
        ],
        Some(QueryType::UserCount) => &[
            "How many users do we have?",
            "How many nurse practitioners are in our audience?",
            "Count the users in our audience",
        ],
        Some(QueryType::Error) | None => GENERIC,
    };
    examples.iter().map(ToString::to_string).collect()
}
