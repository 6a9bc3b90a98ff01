use std::sync::Arc;
use uuid::Uuid;

use super::{many_per_key, one_per_key, BatchFn};
use crate::models::{MemberTypeId, Profile};
use crate::store::{ProfileFilter, Store, StoreResult};

/// Profiles by primary key
pub struct ProfilesById {
    store: Arc<dyn Store>,
}

impl ProfilesById {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

impl BatchFn<Uuid, Option<Profile>> for ProfilesById {
    async fn load(&self, keys: &[Uuid]) -> StoreResult<Vec<Option<Profile>>> {
        let rows = self
            .store
            .find_profiles(&ProfileFilter::IdIn(keys.to_vec()))
            .await?;
        Ok(one_per_key(keys, rows, |row: &Profile| row.id))
    }
}

/// Profiles on each membership tier
pub struct ProfilesByMemberType {
    store: Arc<dyn Store>,
}

impl ProfilesByMemberType {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

impl BatchFn<MemberTypeId, Vec<Profile>> for ProfilesByMemberType {
    async fn load(&self, keys: &[MemberTypeId]) -> StoreResult<Vec<Vec<Profile>>> {
        let rows = self
            .store
            .find_profiles(&ProfileFilter::MemberTypeIn(keys.to_vec()))
            .await?;
        Ok(many_per_key(keys, rows, |row: &Profile| row.member_type_id))
    }
}

/// The profile owned by each user
///
/// `profiles.user_id` is unique, so each key matches at most one row.
pub struct ProfileByUser {
    store: Arc<dyn Store>,
}

impl ProfileByUser {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

impl BatchFn<Uuid, Option<Profile>> for ProfileByUser {
    async fn load(&self, keys: &[Uuid]) -> StoreResult<Vec<Option<Profile>>> {
        let rows = self
            .store
            .find_profiles(&ProfileFilter::UserIn(keys.to_vec()))
            .await?;
        Ok(one_per_key(keys, rows, |row: &Profile| row.user_id))
    }
}
