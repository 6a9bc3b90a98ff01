//! Join fetch for the root `users` field
//!
//! Per-field batching already costs one query per relation per level. When
//! the root shape shows up front that both subscription directions will be
//! resolved for every returned user, a single `find_users` call embedding
//! the edge ids is enough: the related users are all part of the same
//! result set, so the relation loaders can be primed from it.

use std::collections::HashMap;
use uuid::Uuid;

use super::FieldTree;
use crate::graphql::loaders::LoaderRegistry;
use crate::models::User;
use crate::store::{Store, StoreResult, UserFilter, UserInclude};

/// Relation fields of `User` requested under the root field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscriptionPrefetch {
    /// `subscribedToUser` was requested
    pub subscribers: bool,
    /// `userSubscribedTo` was requested
    pub authors: bool,
}

impl SubscriptionPrefetch {
    pub fn from_tree(tree: &FieldTree) -> Self {
        Self {
            subscribers: tree.contains("subscribedToUser"),
            authors: tree.contains("userSubscribedTo"),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.subscribers && !self.authors
    }

    fn include(&self) -> UserInclude {
        UserInclude {
            subscribers: self.subscribers,
            authors: self.authors,
        }
    }
}

/// Fetch every user in one call and prime the requested relation loaders
///
/// A user's edge list is primed only when every id in it belongs to the
/// fetched set; otherwise that key is left to the loader.
pub async fn prefetch_users(
    store: &dyn Store,
    loaders: &LoaderRegistry,
    plan: SubscriptionPrefetch,
) -> StoreResult<Vec<User>> {
    let records = store.find_users(&UserFilter::All, plan.include()).await?;

    if !plan.is_empty() {
        let by_id: HashMap<Uuid, &User> = records.iter().map(|r| (r.user.id, &r.user)).collect();
        let mut primed = 0usize;

        for record in &records {
            let id = record.user.id;
            if plan.subscribers {
                if let Some(users) = resolve(&by_id, &record.subscriber_ids) {
                    primed += usize::from(loaders.subscribers_of.prime(id, users));
                }
            }
            if plan.authors {
                if let Some(users) = resolve(&by_id, &record.author_ids) {
                    primed += usize::from(loaders.authors_followed_by.prime(id, users));
                }
            }
        }

        tracing::debug!(
            users = records.len(),
            subscribers = plan.subscribers,
            authors = plan.authors,
            primed,
            "Prefetched users with subscription edges"
        );
    }

    Ok(records.into_iter().map(User::from).collect())
}

fn resolve(by_id: &HashMap<Uuid, &User>, ids: &[Uuid]) -> Option<Vec<User>> {
    ids.iter()
        .map(|id| by_id.get(id).map(|user| (*user).clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphql::loaders::until_idle;
    use crate::graphql::selection::{SelectionDocument, SelectionShape};
    use crate::models::CreateUser;
    use crate::store::{MemoryStore, StoreCall};
    use async_graphql::parser::parse_query;
    use std::sync::Arc;

    async fn pair(store: &MemoryStore) -> (User, User) {
        let mut users = Vec::new();
        for name in ["ada", "bob"] {
            let input = CreateUser {
                name: name.to_string(),
                balance: 0.0,
            };
            users.push(store.create_user(input).await.unwrap());
        }
        store.subscribe(users[0].id, users[1].id).await.unwrap();
        let bob = users.pop().unwrap();
        (users.pop().unwrap(), bob)
    }

    #[tokio::test]
    async fn test_primed_relations_need_no_further_reads() {
        let store = Arc::new(MemoryStore::new());
        let (ada, bob) = pair(&store).await;
        let loaders = LoaderRegistry::new(store.clone());
        store.reset_calls();

        let plan = SubscriptionPrefetch {
            subscribers: true,
            authors: true,
        };
        let users = prefetch_users(store.as_ref(), &loaders, plan).await.unwrap();
        assert_eq!(users.len(), 2);

        let (followers_of_bob, followed_by_ada, followers_of_ada) = until_idle(
            async {
                tokio::join!(
                    loaders.subscribers_of.load(bob.id),
                    loaders.authors_followed_by.load(ada.id),
                    loaders.subscribers_of.load(ada.id),
                )
            },
            &loaders,
        )
        .await;
        let (followers_of_bob, followed_by_ada, followers_of_ada) = (
            followers_of_bob.unwrap(),
            followed_by_ada.unwrap(),
            followers_of_ada.unwrap(),
        );

        assert_eq!(followers_of_bob, vec![ada.clone()]);
        assert_eq!(followed_by_ada, vec![bob]);
        assert!(followers_of_ada.is_empty());
        assert_eq!(
            store.reads(),
            vec![StoreCall::FindUsers {
                filter: UserFilter::All,
                include: plan.include(),
            }]
        );
    }

    #[tokio::test]
    async fn test_empty_plan_fetches_without_edges() {
        let store = Arc::new(MemoryStore::new());
        pair(&store).await;
        let loaders = LoaderRegistry::new(store.clone());
        store.reset_calls();

        prefetch_users(store.as_ref(), &loaders, SubscriptionPrefetch::default())
            .await
            .unwrap();

        assert_eq!(
            store.reads(),
            vec![StoreCall::FindUsers {
                filter: UserFilter::All,
                include: UserInclude::NONE,
            }]
        );
        assert!(loaders.subscribers_of.prime(Uuid::nil(), Vec::new()));
    }

    #[test]
    fn test_plan_from_tree() {
        let parsed = parse_query("{ users { id userSubscribedTo { id } } }").unwrap();
        let doc = SelectionDocument::from(&parsed);
        let shape = SelectionShape::of(&doc, &doc.operations[0]);

        let plan = SubscriptionPrefetch::from_tree(shape.root("users").unwrap());
        assert!(plan.authors);
        assert!(!plan.subscribers);
    }
}
