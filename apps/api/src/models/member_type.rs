//! Membership tier model
//!
//! Member types are seeded reference data keyed by a small enum rather
//! than a UUID.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Member type key matching PostgreSQL member_type_id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_type_id", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberTypeId {
    Basic,
    Business,
}

impl MemberTypeId {
    /// Every tier, in seed order
    pub const ALL: [MemberTypeId; 2] = [MemberTypeId::Basic, MemberTypeId::Business];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "BASIC",
            Self::Business => "BUSINESS",
        }
    }
}

impl std::fmt::Display for MemberTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Member type record from the member_types table
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct MemberType {
    pub id: MemberTypeId,

    /// Discount percentage granted to the tier
    pub discount: f64,

    pub posts_limit_per_month: i32,
}

impl MemberType {
    /// Seed rows installed by the initial migration
    pub fn seed() -> Vec<MemberType> {
        vec![
            MemberType {
                id: MemberTypeId::Basic,
                discount: 2.3,
                posts_limit_per_month: 20,
            },
            MemberType {
                id: MemberTypeId::Business,
                discount: 7.7,
                posts_limit_per_month: 100,
            },
        ]
    }
}
