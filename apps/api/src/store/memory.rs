//! In-memory store
//!
//! Holds tables in process behind a lock and mirrors the PostgreSQL
//! constraints (unique profile per user, unique subscription pair, foreign
//! keys, cascading user deletes). Every call is appended to a journal so
//! tests can assert how many round trips a request cost.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use super::{
    MemberTypeFilter, PostFilter, ProfileFilter, Store, StoreError, StoreResult, UserFilter,
    UserInclude,
};
use crate::models::{
    ChangePost, ChangeProfile, ChangeUser, CreatePost, CreateProfile, CreateUser, MemberType,
    Post, Profile, User, UserRecord,
};

/// A single recorded store call
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    FindUsers {
        filter: UserFilter,
        include: UserInclude,
    },
    FindPosts(PostFilter),
    FindProfiles(ProfileFilter),
    FindMemberTypes(MemberTypeFilter),
    Write {
        entity: &'static str,
        action: &'static str,
    },
    Ping,
}

impl StoreCall {
    pub fn is_read(&self) -> bool {
        !matches!(self, Self::Write { .. } | Self::Ping)
    }

    /// Table the call touches; `None` for pings
    pub fn entity(&self) -> Option<&'static str> {
        match self {
            Self::FindUsers { .. } => Some("user"),
            Self::FindPosts(_) => Some("post"),
            Self::FindProfiles(_) => Some("profile"),
            Self::FindMemberTypes(_) => Some("member_type"),
            Self::Write { entity, .. } => Some(*entity),
            Self::Ping => None,
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    profiles: Vec<Profile>,
    member_types: Vec<MemberType>,
    /// `(subscriber_id, author_id)` pairs
    subscriptions: Vec<(Uuid, Uuid)>,
}

impl Tables {
    fn user_exists(&self, id: Uuid) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    fn record(&self, user: &User, include: UserInclude) -> UserRecord {
        let mut record = UserRecord::bare(user.clone());
        if include.subscribers {
            record.subscriber_ids = self
                .subscriptions
                .iter()
                .filter(|(_, author)| *author == user.id)
                .map(|(subscriber, _)| *subscriber)
                .collect();
            record.subscriber_ids.sort();
        }
        if include.authors {
            record.author_ids = self
                .subscriptions
                .iter()
                .filter(|(subscriber, _)| *subscriber == user.id)
                .map(|(_, author)| *author)
                .collect();
            record.author_ids.sort();
        }
        record
    }
}

/// Process-local [`Store`] with a call journal
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    calls: Mutex<Vec<StoreCall>>,
    unavailable: AtomicBool,
    offline_entities: Mutex<HashSet<&'static str>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a store seeded with the member types
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables {
                member_types: MemberType::seed(),
                ..Tables::default()
            }),
            calls: Mutex::new(Vec::new()),
            unavailable: AtomicBool::new(false),
            offline_entities: Mutex::new(HashSet::new()),
        }
    }

    /// Every call recorded since creation or the last [`reset_calls`](Self::reset_calls)
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    /// Recorded read calls only
    pub fn reads(&self) -> Vec<StoreCall> {
        self.calls.lock().iter().filter(|c| c.is_read()).cloned().collect()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().clear();
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make calls touching `entity` fail with [`StoreError::Unavailable`]
    ///
    /// Entities are named as in [`StoreCall::entity`]; other tables keep
    /// answering.
    pub fn set_entity_unavailable(&self, entity: &'static str, unavailable: bool) {
        let mut offline = self.offline_entities.lock();
        if unavailable {
            offline.insert(entity);
        } else {
            offline.remove(entity);
        }
    }

    fn record(&self, call: StoreCall) -> StoreResult<()> {
        let entity = call.entity();
        self.calls.lock().push(call);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        if let Some(entity) = entity.filter(|e| self.offline_entities.lock().contains(e)) {
            return Err(StoreError::Unavailable(format!("{entity} table offline")));
        }
        Ok(())
    }

    fn write(&self, entity: &'static str, action: &'static str) -> StoreResult<()> {
        self.record(StoreCall::Write { entity, action })
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_users(
        &self,
        filter: &UserFilter,
        include: UserInclude,
    ) -> StoreResult<Vec<UserRecord>> {
        self.record(StoreCall::FindUsers {
            filter: filter.clone(),
            include,
        })?;
        let tables = self.tables.read();
        let matches = |user: &User| match filter {
            UserFilter::All => true,
            UserFilter::IdIn(ids) => ids.contains(&user.id),
            UserFilter::FollowedByAny(subscribers) => tables
                .subscriptions
                .iter()
                .any(|(s, a)| *a == user.id && subscribers.contains(s)),
            UserFilter::FollowingAny(authors) => tables
                .subscriptions
                .iter()
                .any(|(s, a)| *s == user.id && authors.contains(a)),
        };
        Ok(tables
            .users
            .iter()
            .filter(|u| matches(u))
            .map(|u| tables.record(u, include))
            .collect())
    }

    async fn find_posts(&self, filter: &PostFilter) -> StoreResult<Vec<Post>> {
        self.record(StoreCall::FindPosts(filter.clone()))?;
        Ok(self
            .tables
            .read()
            .posts
            .iter()
            .filter(|p| match filter {
                PostFilter::All => true,
                PostFilter::IdIn(ids) => ids.contains(&p.id),
                PostFilter::AuthorIn(ids) => ids.contains(&p.author_id),
            })
            .cloned()
            .collect())
    }

    async fn find_profiles(&self, filter: &ProfileFilter) -> StoreResult<Vec<Profile>> {
        self.record(StoreCall::FindProfiles(filter.clone()))?;
        Ok(self
            .tables
            .read()
            .profiles
            .iter()
            .filter(|p| match filter {
                ProfileFilter::All => true,
                ProfileFilter::IdIn(ids) => ids.contains(&p.id),
                ProfileFilter::UserIn(ids) => ids.contains(&p.user_id),
                ProfileFilter::MemberTypeIn(ids) => ids.contains(&p.member_type_id),
            })
            .cloned()
            .collect())
    }

    async fn find_member_types(&self, filter: &MemberTypeFilter) -> StoreResult<Vec<MemberType>> {
        self.record(StoreCall::FindMemberTypes(filter.clone()))?;
        Ok(self
            .tables
            .read()
            .member_types
            .iter()
            .filter(|m| match filter {
                MemberTypeFilter::All => true,
                MemberTypeFilter::IdIn(ids) => ids.contains(&m.id),
            })
            .cloned()
            .collect())
    }

    async fn create_user(&self, input: CreateUser) -> StoreResult<User> {
        self.write("user", "create")?;
        let user = User {
            id: Uuid::new_v4(),
            name: input.name,
            balance: input.balance,
        };
        self.tables.write().users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, input: ChangeUser) -> StoreResult<User> {
        self.write("user", "update")?;
        let mut tables = self.tables.write();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| StoreError::not_found("user", id))?;
        if let Some(name) = input.name {
            user.name = name;
        }
        if let Some(balance) = input.balance {
            user.balance = balance;
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        self.write("user", "delete")?;
        let mut tables = self.tables.write();
        if !tables.user_exists(id) {
            return Err(StoreError::not_found("user", id));
        }
        tables.users.retain(|u| u.id != id);
        tables.posts.retain(|p| p.author_id != id);
        tables.profiles.retain(|p| p.user_id != id);
        tables
            .subscriptions
            .retain(|(subscriber, author)| *subscriber != id && *author != id);
        Ok(())
    }

    async fn create_post(&self, input: CreatePost) -> StoreResult<Post> {
        self.write("post", "create")?;
        let mut tables = self.tables.write();
        if !tables.user_exists(input.author_id) {
            return Err(StoreError::InvalidReference {
                entity: "post",
                detail: format!("author {} does not exist", input.author_id),
            });
        }
        let post = Post {
            id: Uuid::new_v4(),
            title: input.title,
            content: input.content,
            author_id: input.author_id,
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: Uuid, input: ChangePost) -> StoreResult<Post> {
        self.write("post", "update")?;
        let mut tables = self.tables.write();
        let post = tables
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::not_found("post", id))?;
        if let Some(title) = input.title {
            post.title = title;
        }
        if let Some(content) = input.content {
            post.content = content;
        }
        Ok(post.clone())
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<()> {
        self.write("post", "delete")?;
        let mut tables = self.tables.write();
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        if tables.posts.len() == before {
            return Err(StoreError::not_found("post", id));
        }
        Ok(())
    }

    async fn create_profile(&self, input: CreateProfile) -> StoreResult<Profile> {
        self.write("profile", "create")?;
        let mut tables = self.tables.write();
        if !tables.user_exists(input.user_id) {
            return Err(StoreError::InvalidReference {
                entity: "profile",
                detail: format!("user {} does not exist", input.user_id),
            });
        }
        if tables.profiles.iter().any(|p| p.user_id == input.user_id) {
            return Err(StoreError::Conflict {
                entity: "profile",
                detail: format!("user {} already has a profile", input.user_id),
            });
        }
        let profile = Profile {
            id: Uuid::new_v4(),
            is_male: input.is_male,
            year_of_birth: input.year_of_birth,
            user_id: input.user_id,
            member_type_id: input.member_type_id,
        };
        tables.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn update_profile(&self, id: Uuid, input: ChangeProfile) -> StoreResult<Profile> {
        self.write("profile", "update")?;
        let mut tables = self.tables.write();
        let profile = tables
            .profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::not_found("profile", id))?;
        if let Some(is_male) = input.is_male {
            profile.is_male = is_male;
        }
        if let Some(year_of_birth) = input.year_of_birth {
            profile.year_of_birth = year_of_birth;
        }
        if let Some(member_type_id) = input.member_type_id {
            profile.member_type_id = member_type_id;
        }
        Ok(profile.clone())
    }

    async fn delete_profile(&self, id: Uuid) -> StoreResult<()> {
        self.write("profile", "delete")?;
        let mut tables = self.tables.write();
        let before = tables.profiles.len();
        tables.profiles.retain(|p| p.id != id);
        if tables.profiles.len() == before {
            return Err(StoreError::not_found("profile", id));
        }
        Ok(())
    }

    async fn subscribe(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<()> {
        self.write("subscription", "create")?;
        let mut tables = self.tables.write();
        if !tables.user_exists(subscriber_id) || !tables.user_exists(author_id) {
            return Err(StoreError::InvalidReference {
                entity: "subscription",
                detail: format!("{subscriber_id} -> {author_id}"),
            });
        }
        if tables.subscriptions.contains(&(subscriber_id, author_id)) {
            return Err(StoreError::Conflict {
                entity: "subscription",
                detail: format!("{subscriber_id} -> {author_id}"),
            });
        }
        tables.subscriptions.push((subscriber_id, author_id));
        Ok(())
    }

    async fn unsubscribe(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<()> {
        self.write("subscription", "delete")?;
        let mut tables = self.tables.write();
        let before = tables.subscriptions.len();
        tables
            .subscriptions
            .retain(|pair| *pair != (subscriber_id, author_id));
        if tables.subscriptions.len() == before {
            return Err(StoreError::not_found(
                "subscription",
                format!("{subscriber_id} -> {author_id}"),
            ));
        }
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.record(StoreCall::Ping)
    }
}
