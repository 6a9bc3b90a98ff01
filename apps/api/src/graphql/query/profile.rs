use async_graphql::{Context, Object, Result, ResultExt};
use uuid::Uuid;

use crate::error::ApiError;
use crate::graphql::types::Profile;
use crate::graphql::{loaders_from, store_from};
use crate::store::ProfileFilter;

#[derive(Default)]
pub struct ProfileQuery;

#[Object]
impl ProfileQuery {
    async fn profiles(&self, ctx: &Context<'_>) -> Result<Option<Vec<Profile>>> {
        let profiles = store_from(ctx)?
            .find_profiles(&ProfileFilter::All)
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(Some(profiles.into_iter().map(Profile::from).collect()))
    }

    async fn profile(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<Profile>> {
        let profile = loaders_from(ctx)?
            .profiles_by_id
            .load(id)
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(profile.map(Profile::from))
    }
}
