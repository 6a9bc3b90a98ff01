//! Profile GraphQL type

use async_graphql::{Context, Object, Result, ResultExt};
use uuid::Uuid;

use crate::error::ApiError;
use crate::graphql::loaders_from;
use crate::models::Profile as DbProfile;

use super::member_type::{MemberType, MemberTypeId};
use super::user::User;

/// Personal details of a user
pub struct Profile {
    inner: DbProfile,
}

impl From<DbProfile> for Profile {
    fn from(profile: DbProfile) -> Self {
        Self { inner: profile }
    }
}

#[Object]
impl Profile {
    async fn id(&self) -> Uuid {
        self.inner.id
    }

    async fn is_male(&self) -> bool {
        self.inner.is_male
    }

    async fn year_of_birth(&self) -> i32 {
        self.inner.year_of_birth
    }

    /// Owning user
    async fn user(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let user = loaders_from(ctx)?
            .users_by_id
            .load(self.inner.user_id)
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(user.map(User::from))
    }

    async fn user_id(&self) -> Uuid {
        self.inner.user_id
    }

    async fn member_type(&self, ctx: &Context<'_>) -> Result<Option<MemberType>> {
        let member_type = loaders_from(ctx)?
            .member_types_by_id
            .load(self.inner.member_type_id)
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(member_type.map(MemberType::from))
    }

    async fn member_type_id(&self) -> MemberTypeId {
        self.inner.member_type_id.into()
    }
}
