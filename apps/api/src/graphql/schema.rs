//! GraphQL schema builder for the social graph API

use async_graphql::{EmptySubscription, Schema};
use std::sync::Arc;

use crate::store::Store;

use super::mutation::Mutation;
use super::query::Query;

/// The social graph GraphQL schema type
pub type SocialGraphSchema = Schema<Query, Mutation, EmptySubscription>;

/// Create the schema with the store as shared data
///
/// Per-request loaders are not part of the schema; the
/// [`GraphqlExecutor`](super::GraphqlExecutor) adds them to each request.
pub fn build_schema(store: Arc<dyn Store>) -> SocialGraphSchema {
    Schema::build(Query::default(), Mutation::default(), EmptySubscription)
        .data(store)
        .finish()
}
