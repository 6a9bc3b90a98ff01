use async_graphql::{Context, Object, Result, ResultExt};

use crate::error::ApiError;
use crate::graphql::types::{MemberType, MemberTypeId};
use crate::graphql::{loaders_from, store_from};
use crate::store::MemberTypeFilter;

#[derive(Default)]
pub struct MemberTypeQuery;

#[Object]
impl MemberTypeQuery {
    /// All membership tiers
    async fn member_types(&self, ctx: &Context<'_>) -> Result<Option<Vec<MemberType>>> {
        let member_types = store_from(ctx)?
            .find_member_types(&MemberTypeFilter::All)
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(Some(member_types.into_iter().map(MemberType::from).collect()))
    }

    async fn member_type(
        &self,
        ctx: &Context<'_>,
        id: MemberTypeId,
    ) -> Result<Option<MemberType>> {
        let member_type = loaders_from(ctx)?
            .member_types_by_id
            .load(id.into())
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(member_type.map(MemberType::from))
    }
}
