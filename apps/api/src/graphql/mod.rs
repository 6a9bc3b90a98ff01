//! GraphQL schema and resolution layer
//!
//! This module contains:
//! - Query and mutation resolvers plus object types
//! - Request-scoped batch loaders
//! - Selection analysis used by the root `users` prefetch
//! - The depth guard and the executor that runs it before the schema

pub mod execution;
pub mod guards;
pub mod loaders;
pub mod mutation;
pub mod query;
pub mod schema;
pub mod selection;
pub mod types;

pub use execution::GraphqlExecutor;
pub use schema::{build_schema, SocialGraphSchema};

use async_graphql::{Context, Result};
use std::sync::Arc;

use crate::store::Store;
use loaders::LoaderRegistry;

/// The current request's loaders
pub(crate) fn loaders_from<'a>(ctx: &Context<'a>) -> Result<&'a LoaderRegistry> {
    ctx.data::<Arc<LoaderRegistry>>().map(Arc::as_ref)
}

/// The store shared by all requests
pub(crate) fn store_from<'a>(ctx: &Context<'a>) -> Result<&'a Arc<dyn Store>> {
    ctx.data::<Arc<dyn Store>>()
}
