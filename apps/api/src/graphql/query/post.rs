use async_graphql::{Context, Object, Result, ResultExt};
use uuid::Uuid;

use crate::error::ApiError;
use crate::graphql::types::Post;
use crate::graphql::{loaders_from, store_from};
use crate::store::PostFilter;

#[derive(Default)]
pub struct PostQuery;

#[Object]
impl PostQuery {
    async fn posts(&self, ctx: &Context<'_>) -> Result<Option<Vec<Post>>> {
        let posts = store_from(ctx)?
            .find_posts(&PostFilter::All)
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(Some(posts.into_iter().map(Post::from).collect()))
    }

    async fn post(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<Post>> {
        let post = loaders_from(ctx)?
            .posts_by_id
            .load(id)
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(post.map(Post::from))
    }
}
