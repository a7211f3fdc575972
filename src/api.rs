mod insight;

use std::sync::Arc;

use async_graphql::{EmptyMutation, EmptySubscription, MergedObject};

use crate::insights::InsightsSystem;

/// A set of queries defined in the schema.
///
/// This is exposed only for [`Schema`], and not used directly.
#[derive(Default, MergedObject)]
pub(crate) struct Query(insight::InsightQuery);

pub(crate) type Schema = async_graphql::Schema<Query, EmptyMutation, EmptySubscription>;

pub(crate) fn schema(system: Arc<InsightsSystem>) -> Schema {
    Schema::build(Query::default(), EmptyMutation, EmptySubscription)
        .data(system)
        .finish()
}

#[cfg(test)]
struct TestSchema {
    store: Arc<crate::insights::testing::MemoryStore>,
    schema: Schema,
}

#[cfg(test)]
impl TestSchema {
    fn new(store: crate::insights::testing::MemoryStore) -> Self {
        let store = Arc::new(store);
        let system = InsightsSystem::new(store.clone(), crate::cache::CachePolicy::default());
        Self {
            store,
            schema: schema(Arc::new(system)),
        }
    }

    async fn execute(&self, query: &str) -> async_graphql::Response {
        let request: async_graphql::Request = query.into();
        self.schema.execute(request).await
    }
}
