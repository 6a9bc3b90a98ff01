use async_graphql::{Context, Object, Result, ResultExt};
use uuid::Uuid;

use crate::error::ApiError;
use crate::graphql::loaders_from;
use crate::models::Post as DbPost;

use super::user::User;

pub struct Post {
    inner: DbPost,
}

impl From<DbPost> for Post {
    fn from(post: DbPost) -> Self {
        Self { inner: post }
    }
}

#[Object]
impl Post {
    async fn id(&self) -> Uuid {
        self.inner.id
    }

    async fn title(&self) -> &str {
        &self.inner.title
    }

    async fn content(&self) -> &str {
        &self.inner.content
    }

    async fn author(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let author = loaders_from(ctx)?
            .users_by_id
            .load(self.inner.author_id)
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(author.map(User::from))
    }

    async fn author_id(&self) -> Uuid {
        self.inner.author_id
    }
}
