//! Persistence contract for the social graph
//!
//! The GraphQL layer never talks to a database directly; every read and
//! write goes through the [`Store`] trait. Reads take structured filters so
//! that loaders can express "id in set" and "related row exists" lookups as
//! a single call. Writes are independent and unbatched.
//!
//! Two implementations are provided:
//! - [`PgStore`]: PostgreSQL via sqlx, one statement per call
//! - [`MemoryStore`]: in-process tables with a call journal, used by tests
//!   and the `memory` backend

pub mod memory;
pub mod postgres;

pub use memory::{MemoryStore, StoreCall};
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ChangePost, ChangeProfile, ChangeUser, CreatePost, CreateProfile, CreateUser, MemberType,
    MemberTypeId, Post, Profile, User, UserRecord,
};

/// Errors raised by a [`Store`] implementation
#[derive(Debug, Error)]
pub enum StoreError {
    /// The targeted row does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness constraint rejected the write
    #[error("{entity} already exists: {detail}")]
    Conflict {
        entity: &'static str,
        detail: String,
    },

    /// A foreign key points at a row that does not exist
    #[error("{entity} references a missing row: {detail}")]
    InvalidReference {
        entity: &'static str,
        detail: String,
    },

    /// The backing store cannot be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Database query failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Predicate over users
#[derive(Debug, Clone, PartialEq)]
pub enum UserFilter {
    All,
    IdIn(Vec<Uuid>),
    /// Users followed by at least one of the given subscribers
    FollowedByAny(Vec<Uuid>),
    /// Users following at least one of the given authors
    FollowingAny(Vec<Uuid>),
}

/// Which subscription edges to embed in each returned [`UserRecord`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserInclude {
    /// Embed `subscriber_ids` (who follows this user)
    pub subscribers: bool,
    /// Embed `author_ids` (whom this user follows)
    pub authors: bool,
}

impl UserInclude {
    pub const NONE: UserInclude = UserInclude {
        subscribers: false,
        authors: false,
    };

    pub fn is_empty(&self) -> bool {
        !self.subscribers && !self.authors
    }
}

/// Predicate over posts
#[derive(Debug, Clone, PartialEq)]
pub enum PostFilter {
    All,
    IdIn(Vec<Uuid>),
    AuthorIn(Vec<Uuid>),
}

/// Predicate over profiles
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileFilter {
    All,
    IdIn(Vec<Uuid>),
    UserIn(Vec<Uuid>),
    MemberTypeIn(Vec<MemberTypeId>),
}

/// Predicate over member types
#[derive(Debug, Clone, PartialEq)]
pub enum MemberTypeFilter {
    All,
    IdIn(Vec<MemberTypeId>),
}

/// The persistence collaborator consumed by loaders, resolvers and mutations
#[async_trait]
pub trait Store: Send + Sync {
    // ==================== Reads ====================

    /// Fetch users matching `filter`, embedding the edges named by `include`
    async fn find_users(
        &self,
        filter: &UserFilter,
        include: UserInclude,
    ) -> StoreResult<Vec<UserRecord>>;

    async fn find_posts(&self, filter: &PostFilter) -> StoreResult<Vec<Post>>;

    async fn find_profiles(&self, filter: &ProfileFilter) -> StoreResult<Vec<Profile>>;

    async fn find_member_types(&self, filter: &MemberTypeFilter) -> StoreResult<Vec<MemberType>>;

    // ==================== Writes ====================

    async fn create_user(&self, input: CreateUser) -> StoreResult<User>;

    async fn update_user(&self, id: Uuid, input: ChangeUser) -> StoreResult<User>;

    /// Delete a user together with their posts, profile and edges
    async fn delete_user(&self, id: Uuid) -> StoreResult<()>;

    async fn create_post(&self, input: CreatePost) -> StoreResult<Post>;

    async fn update_post(&self, id: Uuid, input: ChangePost) -> StoreResult<Post>;

    async fn delete_post(&self, id: Uuid) -> StoreResult<()>;

    async fn create_profile(&self, input: CreateProfile) -> StoreResult<Profile>;

    async fn update_profile(&self, id: Uuid, input: ChangeProfile) -> StoreResult<Profile>;

    async fn delete_profile(&self, id: Uuid) -> StoreResult<()>;

    /// Record that `subscriber_id` follows `author_id`
    async fn subscribe(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<()>;

    async fn unsubscribe(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<()>;

    /// Cheap connectivity check for readiness
    async fn ping(&self) -> StoreResult<()>;
}
