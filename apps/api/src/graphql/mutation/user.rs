use async_graphql::{Context, Object, Result, ResultExt};
use uuid::Uuid;

use crate::error::ApiError;
use crate::graphql::store_from;
use crate::graphql::types::{ChangeUserInput, CreateUserInput, User};

#[derive(Default)]
pub struct UserMutation;

#[Object]
impl UserMutation {
    async fn create_user(
        &self,
        ctx: &Context<'_>,
        dto: CreateUserInput,
    ) -> Result<Option<User>> {
        let user = store_from(ctx)?
            .create_user(dto.into())
            .await
            .map_err(ApiError::from)
            .extend()?;

        tracing::info!(user_id = %user.id, "User created");
        Ok(Some(User::from(user)))
    }

    /// Update the given fields of a user
    ///
    /// # Errors
    /// `NOT_FOUND` when no user has this id
    async fn change_user(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        dto: ChangeUserInput,
    ) -> Result<Option<User>> {
        let user = store_from(ctx)?
            .update_user(id, dto.into())
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(Some(User::from(user)))
    }

    /// Delete a user with their profile, posts and subscriptions
    ///
    /// # Errors
    /// `NOT_FOUND` when no user has this id
    async fn delete_user(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<String>> {
        store_from(ctx)?
            .delete_user(id)
            .await
            .map_err(ApiError::from)
            .extend()?;

        tracing::info!(user_id = %id, "User deleted");
        Ok(Some(format!("User id: {id} is deleted")))
    }
}
