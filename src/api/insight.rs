use std::sync::Arc;

use async_graphql::{Context, Json, Object, Result};

use crate::insights::{suggestions, types::query::QueryType, InsightsSystem, QueryResponse};

#[derive(Default)]
pub(super) struct InsightQuery;

#[Object]
impl InsightQuery {
    /// Answers a free-text question about campaign engagement.
    ///
    /// The answer is a JSON object discriminated by `responseType`, with a
    /// `metadata` object describing how it was produced.
    async fn process_query(&self, ctx: &Context<'_>, text: String) -> Result<Json<QueryResponse>> {
        let system = ctx.data::<Arc<InsightsSystem>>()?;
        Ok(Json(system.process_query(&text).await))
    }

    /// Answers several questions, one after another.
    async fn process_queries(
        &self,
        ctx: &Context<'_>,
        texts: Vec<String>,
    ) -> Result<Json<Vec<QueryResponse>>> {
        let system = ctx.data::<Arc<InsightsSystem>>()?;
        let mut responses = Vec::with_capacity(texts.len());
        for text in &texts {
            responses.push(system.process_query(text).await);
        }
        Ok(Json(responses))
    }

    /// Example questions, for one query type or in general.
    async fn suggestions(&self, query_type: Option<String>) -> Vec<String> {
        suggestions::for_query_type(query_type.as_deref().and_then(QueryType::from_name))
    }
}
