//! User queries
//!
//! The root `users` list is the one place where the requested shape is
//! inspected before resolving: when subscription edges are selected below
//! it, the users are fetched once with edges embedded and the relation
//! loaders are primed from that result.

use async_graphql::{Context, Object, Result, ResultExt};
use uuid::Uuid;

use crate::error::ApiError;
use crate::graphql::selection::{prefetch_users, SelectionShape, SubscriptionPrefetch};
use crate::graphql::types::User;
use crate::graphql::{loaders_from, store_from};

#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    /// Every user
    async fn users(&self, ctx: &Context<'_>) -> Result<Option<Vec<User>>> {
        let field = ctx.field();
        let response_key = field.alias().unwrap_or_else(|| field.name());
        let plan = ctx
            .data_opt::<SelectionShape>()
            .and_then(|shape| shape.root(response_key))
            .map(SubscriptionPrefetch::from_tree)
            .unwrap_or_default();

        let store = store_from(ctx)?;
        let users = prefetch_users(store.as_ref(), loaders_from(ctx)?, plan)
            .await
            .map_err(ApiError::from)
            .extend()?;

        Ok(Some(users.into_iter().map(User::from).collect()))
    }

    /// Look up one user by id
    async fn user(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<User>> {
        let user = loaders_from(ctx)?
            .users_by_id
            .load(id)
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(user.map(User::from))
    }
}
