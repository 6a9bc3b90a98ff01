use std::sync::Arc;
use uuid::Uuid;

use super::{one_per_key, BatchFn};
use crate::models::User;
use crate::store::{Store, StoreResult, UserFilter, UserInclude};

/// Users by primary key
pub struct UsersById {
    store: Arc<dyn Store>,
}

impl UsersById {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

impl BatchFn<Uuid, Option<User>> for UsersById {
    async fn load(&self, keys: &[Uuid]) -> StoreResult<Vec<Option<User>>> {
        let records = self
            .store
            .find_users(&UserFilter::IdIn(keys.to_vec()), UserInclude::NONE)
            .await?;
        let users = records.into_iter().map(User::from).collect();
        Ok(one_per_key(keys, users, |user: &User| user.id))
    }
}
