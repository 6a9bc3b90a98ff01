//! Request-scoped loaders for the N+1 problem
//!
//! A [`LoaderRegistry`] is built for every incoming request and inserted
//! into the GraphQL context. Each access path through the graph has exactly
//! one loader, so however many nodes a response contains, each path costs at
//! most one store round trip per resolver level. The request future must be
//! driven by [`until_idle`], which seals the open batches whenever the
//! request has nothing else to run.
//!
//! # Usage
//!
//! ```rust,ignore
//! let loaders = Arc::new(LoaderRegistry::new(store));
//! let response = until_idle(schema.execute(request.data(loaders.clone())), &*loaders).await;
//!
//! // in a resolver
//! let loaders = ctx.data::<Arc<LoaderRegistry>>()?;
//! let posts = loaders.posts_by_author.load(user_id).await?;
//! ```

pub mod batch;
mod dispatch;
mod member_types;
mod posts;
mod profiles;
mod subscriptions;
mod users;

pub use batch::{BatchFn, BatchLoader, Load, LoadError};
pub use dispatch::{until_idle, Dispatch};
pub use member_types::MemberTypesById;
pub use posts::{PostsByAuthor, PostsById};
pub use profiles::{ProfileByUser, ProfilesById, ProfilesByMemberType};
pub use subscriptions::{AuthorsFollowedBy, SubscribersOf};
pub use users::UsersById;

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{MemberType, MemberTypeId, Post, Profile, User};
use crate::store::Store;

pub type UsersByIdLoader = BatchLoader<Uuid, Option<User>, UsersById>;
pub type MemberTypesByIdLoader = BatchLoader<MemberTypeId, Option<MemberType>, MemberTypesById>;
pub type PostsByIdLoader = BatchLoader<Uuid, Option<Post>, PostsById>;
pub type ProfilesByIdLoader = BatchLoader<Uuid, Option<Profile>, ProfilesById>;
pub type ProfilesByMemberTypeLoader = BatchLoader<MemberTypeId, Vec<Profile>, ProfilesByMemberType>;
pub type PostsByAuthorLoader = BatchLoader<Uuid, Vec<Post>, PostsByAuthor>;
pub type ProfileByUserLoader = BatchLoader<Uuid, Option<Profile>, ProfileByUser>;
pub type AuthorsFollowedByLoader = BatchLoader<Uuid, Vec<User>, AuthorsFollowedBy>;
pub type SubscribersOfLoader = BatchLoader<Uuid, Vec<User>, SubscribersOf>;

/// All loaders for one request, sharing one store handle
pub struct LoaderRegistry {
    pub users_by_id: UsersByIdLoader,
    pub member_types_by_id: MemberTypesByIdLoader,
    pub posts_by_id: PostsByIdLoader,
    pub profiles_by_id: ProfilesByIdLoader,
    pub profiles_by_member_type: ProfilesByMemberTypeLoader,
    pub posts_by_author: PostsByAuthorLoader,
    pub profile_by_user: ProfileByUserLoader,
    /// Keyed by subscriber: the users they follow
    pub authors_followed_by: AuthorsFollowedByLoader,
    /// Keyed by author: the users following them
    pub subscribers_of: SubscribersOfLoader,
}

impl LoaderRegistry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            users_by_id: BatchLoader::new("users_by_id", UsersById::new(store.clone())),
            member_types_by_id: BatchLoader::new(
                "member_types_by_id",
                MemberTypesById::new(store.clone()),
            ),
            posts_by_id: BatchLoader::new("posts_by_id", PostsById::new(store.clone())),
            profiles_by_id: BatchLoader::new("profiles_by_id", ProfilesById::new(store.clone())),
            profiles_by_member_type: BatchLoader::new(
                "profiles_by_member_type",
                ProfilesByMemberType::new(store.clone()),
            ),
            posts_by_author: BatchLoader::new("posts_by_author", PostsByAuthor::new(store.clone())),
            profile_by_user: BatchLoader::new("profile_by_user", ProfileByUser::new(store.clone())),
            authors_followed_by: BatchLoader::new(
                "authors_followed_by",
                AuthorsFollowedBy::new(store.clone()),
            ),
            subscribers_of: BatchLoader::new("subscribers_of", SubscribersOf::new(store)),
        }
    }
}

impl Dispatch for LoaderRegistry {
    fn dispatch_open(&self) -> usize {
        let sealed = [
            self.users_by_id.dispatch_open(),
            self.member_types_by_id.dispatch_open(),
            self.posts_by_id.dispatch_open(),
            self.profiles_by_id.dispatch_open(),
            self.profiles_by_member_type.dispatch_open(),
            self.posts_by_author.dispatch_open(),
            self.profile_by_user.dispatch_open(),
            self.authors_followed_by.dispatch_open(),
            self.subscribers_of.dispatch_open(),
        ]
        .into_iter()
        .sum::<usize>();
        if sealed > 0 {
            tracing::trace!(batches = sealed, "Request idle, sealed open batches");
        }
        sealed
    }
}

/// Align rows with `keys`, one optional row per key
///
/// Rows whose key was not requested are dropped.
pub(crate) fn one_per_key<K, V>(
    keys: &[K],
    rows: Vec<V>,
    key_of: impl Fn(&V) -> K,
) -> Vec<Option<V>>
where
    K: Eq + Hash,
{
    let mut by_key: HashMap<K, V> = rows.into_iter().map(|row| (key_of(&row), row)).collect();
    keys.iter().map(|key| by_key.remove(key)).collect()
}

/// Bucket rows by foreign key, one (possibly empty) list per key
pub(crate) fn many_per_key<K, V>(
    keys: &[K],
    rows: Vec<V>,
    key_of: impl Fn(&V) -> K,
) -> Vec<Vec<V>>
where
    K: Eq + Hash,
{
    let mut buckets: HashMap<K, Vec<V>> = HashMap::new();
    for row in rows {
        buckets.entry(key_of(&row)).or_default().push(row);
    }
    keys.iter()
        .map(|key| buckets.remove(key).unwrap_or_default())
        .collect()
}
