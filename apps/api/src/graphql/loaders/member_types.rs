use std::sync::Arc;

use super::{one_per_key, BatchFn};
use crate::models::{MemberType, MemberTypeId};
use crate::store::{MemberTypeFilter, Store, StoreResult};

/// Member types by their enumerated key
pub struct MemberTypesById {
    store: Arc<dyn Store>,
}

impl MemberTypesById {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

impl BatchFn<MemberTypeId, Option<MemberType>> for MemberTypesById {
    async fn load(&self, keys: &[MemberTypeId]) -> StoreResult<Vec<Option<MemberType>>> {
        let rows = self
            .store
            .find_member_types(&MemberTypeFilter::IdIn(keys.to_vec()))
            .await?;
        Ok(one_per_key(keys, rows, |row: &MemberType| row.id))
    }
}
