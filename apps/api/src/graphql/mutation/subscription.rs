//! Subscription edge mutations
//!
//! A user may subscribe to themselves; no self-loop check is made.

use async_graphql::{Context, Object, Result, ResultExt};
use uuid::Uuid;

use crate::error::ApiError;
use crate::graphql::store_from;

#[derive(Default)]
pub struct SubscriptionMutation;

#[Object]
impl SubscriptionMutation {
    /// Make `user_id` a subscriber of `author_id`
    ///
    /// # Errors
    /// `CONFLICT` when the subscription already exists, `INVALID_REFERENCE`
    /// when either user is missing
    async fn subscribe_to(
        &self,
        ctx: &Context<'_>,
        user_id: Uuid,
        author_id: Uuid,
    ) -> Result<Option<String>> {
        store_from(ctx)?
            .subscribe(user_id, author_id)
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(Some(format!("User id: {user_id} is subscribed to {author_id}")))
    }

    /// Remove the subscription of `user_id` to `author_id`
    ///
    /// # Errors
    /// `NOT_FOUND` when there is no such subscription
    async fn unsubscribe_from(
        &self,
        ctx: &Context<'_>,
        user_id: Uuid,
        author_id: Uuid,
    ) -> Result<Option<String>> {
        store_from(ctx)?
            .unsubscribe(user_id, author_id)
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(Some(format!("User id: {user_id} is unsubscribed from {author_id}")))
    }
}
