use async_graphql::{Context, Object, Result, ResultExt};
use uuid::Uuid;

use crate::error::ApiError;
use crate::graphql::store_from;
use crate::graphql::types::{ChangePostInput, CreatePostInput, Post};

#[derive(Default)]
pub struct PostMutation;

#[Object]
impl PostMutation {
    /// Publish a post for an existing author
    async fn create_post(
        &self,
        ctx: &Context<'_>,
        dto: CreatePostInput,
    ) -> Result<Option<Post>> {
        let post = store_from(ctx)?
            .create_post(dto.into())
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(Some(Post::from(post)))
    }

    async fn change_post(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        dto: ChangePostInput,
    ) -> Result<Option<Post>> {
        let post = store_from(ctx)?
            .update_post(id, dto.into())
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(Some(Post::from(post)))
    }

    async fn delete_post(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<String>> {
        store_from(ctx)?
            .delete_post(id)
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(Some(format!("Post id: {id} is deleted")))
    }
}
