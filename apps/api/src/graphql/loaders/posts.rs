use std::sync::Arc;
use uuid::Uuid;

use super::{many_per_key, one_per_key, BatchFn};
use crate::models::Post;
use crate::store::{PostFilter, Store, StoreResult};

/// Posts by primary key
pub struct PostsById {
    store: Arc<dyn Store>,
}

impl PostsById {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

impl BatchFn<Uuid, Option<Post>> for PostsById {
    async fn load(&self, keys: &[Uuid]) -> StoreResult<Vec<Option<Post>>> {
        let rows = self.store.find_posts(&PostFilter::IdIn(keys.to_vec())).await?;
        Ok(one_per_key(keys, rows, |row: &Post| row.id))
    }
}

/// Posts written by each author
pub struct PostsByAuthor {
    store: Arc<dyn Store>,
}

impl PostsByAuthor {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

impl BatchFn<Uuid, Vec<Post>> for PostsByAuthor {
    async fn load(&self, keys: &[Uuid]) -> StoreResult<Vec<Vec<Post>>> {
        let rows = self
            .store
            .find_posts(&PostFilter::AuthorIn(keys.to_vec()))
            .await?;
        Ok(many_per_key(keys, rows, |row: &Post| row.author_id))
    }
}
