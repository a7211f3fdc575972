use thiserror::Error;

use super::types::query::QueryType;

/// Failures of the query pipeline. All of them end up as an error payload.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("question is empty")]
    EmptyQuery,
    #[error("dataset `{dataset}` is unavailable: {reason}")]
    DataUnavailable { dataset: String, reason: String },
    #[error("`{query_type}` queries require {entity}")]
    MissingRequiredEntity {
        query_type: QueryType,
        entity: &'static str,
    },
    #[error("no {entity} matching `{value}` was found")]
    EntityNotFound { entity: &'static str, value: String },
    #[error("`{query_type}` result failed validation: {reason}")]
    ShapingValidationFailed {
        query_type: QueryType,
        reason: String,
    },
    #[error("`{0}` queries cannot be resolved")]
    UnsupportedQueryType(QueryType),
}

impl QueryError {
    /// A sentence suitable for showing to the person who asked.
    pub fn user_message(&self) -> String {
        match self {
            QueryError::EmptyQuery => "Please enter a question about your campaigns.".to_string(),
            QueryError::DataUnavailable { .. } => {
                "The data needed to answer this question is temporarily unavailable. Please try again shortly."
                    .to_string()
            }
            QueryError::MissingRequiredEntity { entity, .. } => {
                format!("This question needs {entity}. Please add it and ask again.")
            }
            QueryError::EntityNotFound { entity, value } => {
                format!("No {entity} matching \"{value}\" was found in the data.")
            }
            QueryError::ShapingValidationFailed { .. } => {
                "The results for this question could not be displayed.".to_string()
            }
            QueryError::UnsupportedQueryType(_) => {
                "This kind of question is not supported yet.".to_string()
            }
        }
    }
}
