//! User GraphQL type
//!
//! `userSubscribedTo` lists the authors a user follows and
//! `subscribedToUser` lists the user's followers. Both may already be
//! primed by the root `users` prefetch, in which case they resolve without
//! a store call.

use async_graphql::{Context, Object, Result, ResultExt};
use uuid::Uuid;

use crate::error::ApiError;
use crate::graphql::loaders_from;
use crate::models::User as DbUser;

use super::post::Post;
use super::profile::Profile;

/// User account exposed via GraphQL
pub struct User {
    inner: DbUser,
}

impl User {
    pub fn new(user: DbUser) -> Self {
        Self { inner: user }
    }
}

impl From<DbUser> for User {
    fn from(user: DbUser) -> Self {
        Self::new(user)
    }
}

fn users(users: Vec<DbUser>) -> Vec<User> {
    users.into_iter().map(User::from).collect()
}

#[Object]
impl User {
    async fn id(&self) -> Uuid {
        self.inner.id
    }

    async fn name(&self) -> &str {
        &self.inner.name
    }

    async fn balance(&self) -> f64 {
        self.inner.balance
    }

    // Relationship resolvers

    async fn profile(&self, ctx: &Context<'_>) -> Result<Option<Profile>> {
        let profile = loaders_from(ctx)?
            .profile_by_user
            .load(self.inner.id)
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(profile.map(Profile::from))
    }

    async fn posts(&self, ctx: &Context<'_>) -> Result<Option<Vec<Post>>> {
        let posts = loaders_from(ctx)?
            .posts_by_author
            .load(self.inner.id)
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(Some(posts.into_iter().map(Post::from).collect()))
    }

    /// Users this user is subscribed to
    async fn user_subscribed_to(&self, ctx: &Context<'_>) -> Result<Option<Vec<User>>> {
        let authors = loaders_from(ctx)?
            .authors_followed_by
            .load(self.inner.id)
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(Some(users(authors)))
    }

    /// Users subscribed to this user
    async fn subscribed_to_user(&self, ctx: &Context<'_>) -> Result<Option<Vec<User>>> {
        let subscribers = loaders_from(ctx)?
            .subscribers_of
            .load(self.inner.id)
            .await
            .map_err(ApiError::from)
            .extend()?;
        Ok(Some(users(subscribers)))
    }
}
