//! Loaders over the `subscribers_on_authors` edge table
//!
//! Both directions issue a single relation-exists query that embeds the
//! opposite edge list in each row, then redistribute the rows to every
//! requested key they are connected to. A user followed by several
//! requested subscribers therefore appears in several buckets.

use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::BatchFn;
use crate::models::{User, UserRecord};
use crate::store::{Store, StoreResult, UserFilter, UserInclude};

/// Users followed by each subscriber
pub struct AuthorsFollowedBy {
    store: Arc<dyn Store>,
}

impl AuthorsFollowedBy {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

impl BatchFn<Uuid, Vec<User>> for AuthorsFollowedBy {
    async fn load(&self, keys: &[Uuid]) -> StoreResult<Vec<Vec<User>>> {
        let include = UserInclude {
            subscribers: true,
            authors: false,
        };
        let authors = self
            .store
            .find_users(&UserFilter::FollowedByAny(keys.to_vec()), include)
            .await?;
        Ok(redistribute(keys, authors, |record| &record.subscriber_ids))
    }
}

/// Users following each author
pub struct SubscribersOf {
    store: Arc<dyn Store>,
}

impl SubscribersOf {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

impl BatchFn<Uuid, Vec<User>> for SubscribersOf {
    async fn load(&self, keys: &[Uuid]) -> StoreResult<Vec<Vec<User>>> {
        let include = UserInclude {
            subscribers: false,
            authors: true,
        };
        let subscribers = self
            .store
            .find_users(&UserFilter::FollowingAny(keys.to_vec()), include)
            .await?;
        Ok(redistribute(keys, subscribers, |record| &record.author_ids))
    }
}

/// Put each record in the bucket of every requested key it links to
fn redistribute(
    keys: &[Uuid],
    records: Vec<UserRecord>,
    links: impl Fn(&UserRecord) -> &Vec<Uuid>,
) -> Vec<Vec<User>> {
    let mut buckets: HashMap<Uuid, Vec<User>> =
        keys.iter().map(|key| (*key, Vec::new())).collect();

    for record in &records {
        for linked in links(record) {
            if let Some(bucket) = buckets.get_mut(linked) {
                bucket.push(record.user.clone());
            }
        }
    }

    keys.iter()
        .map(|key| buckets.remove(key).unwrap_or_default())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateUser;
    use crate::store::MemoryStore;

    async fn seed() -> (Arc<MemoryStore>, Vec<User>) {
        let store = Arc::new(MemoryStore::new());
        let mut users = Vec::new();
        for name in ["ada", "bob", "cy"] {
            users.push(
                store
                    .create_user(CreateUser {
                        name: name.to_string(),
                        balance: 1.0,
                    })
                    .await
                    .unwrap(),
            );
        }
        // ada -> bob, ada -> cy, cy -> bob
        store.subscribe(users[0].id, users[1].id).await.unwrap();
        store.subscribe(users[0].id, users[2].id).await.unwrap();
        store.subscribe(users[2].id, users[1].id).await.unwrap();
        (store, users)
    }

    fn ids(users: &[User]) -> Vec<Uuid> {
        let mut ids: Vec<_> = users.iter().map(|u| u.id).collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_authors_followed_by_each_subscriber() {
        let (store, users) = seed().await;
        let (ada, bob, cy) = (&users[0], &users[1], &users[2]);

        let fetched = AuthorsFollowedBy::new(store)
            .load(&[ada.id, bob.id, cy.id])
            .await
            .unwrap();

        let mut expected = vec![bob.id, cy.id];
        expected.sort();
        assert_eq!(ids(&fetched[0]), expected);
        assert!(fetched[1].is_empty());
        assert_eq!(ids(&fetched[2]), vec![bob.id]);
    }

    #[tokio::test]
    async fn test_subscribers_of_each_author() {
        let (store, users) = seed().await;
        let (ada, bob, cy) = (&users[0], &users[1], &users[2]);

        let fetched = SubscribersOf::new(store)
            .load(&[bob.id, ada.id, cy.id])
            .await
            .unwrap();

        let mut expected = vec![ada.id, cy.id];
        expected.sort();
        assert_eq!(ids(&fetched[0]), expected);
        assert!(fetched[1].is_empty());
        assert_eq!(ids(&fetched[2]), vec![ada.id]);
    }

    #[tokio::test]
    async fn test_edges_to_unrequested_keys_are_ignored() {
        let (store, users) = seed().await;

        let fetched = SubscribersOf::new(store).load(&[users[2].id]).await.unwrap();

        assert_eq!(fetched.len(), 1);
        assert_eq!(ids(&fetched[0]), vec![users[0].id]);
    }
}
