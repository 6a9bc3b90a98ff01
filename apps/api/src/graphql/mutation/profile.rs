use async_graphql::{Context, Object, Result, ResultExt};
use uuid::Uuid;

use crate::error::ApiError;
use crate::graphql::store_from;
use crate::graphql::types::{ChangeProfileInput, CreateProfileInput, Profile};

#[derive(Default)]
pub struct ProfileMutation;

#[Object]
impl ProfileMutation {
    /// Create the profile of a user
    ///
    /// # Errors
    /// `CONFLICT` when the user already has a profile
    async fn create_profile(
        &self,
        ctx: &Context<'_>,
        dto: CreateProfileInput,
    ) -> Result<Option<Profile>> {
        let profile = store_from(ctx)?
            .create_profile(dto.into())
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(Some(Profile::from(profile)))
    }

    async fn change_profile(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        dto: ChangeProfileInput,
    ) -> Result<Option<Profile>> {
        let profile = store_from(ctx)?
            .update_profile(id, dto.into())
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(Some(Profile::from(profile)))
    }

    async fn delete_profile(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<String>> {
        store_from(ctx)?
            .delete_profile(id)
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(Some(format!("Profile id: {id} is deleted")))
    }
}
