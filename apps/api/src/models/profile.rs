//! Profile model
//!
//! A profile belongs to exactly one user (`user_id` is unique) and
//! references a membership tier.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::MemberTypeId;

/// Profile record from the profiles table
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Profile {
    /// Unique profile identifier
    pub id: Uuid,

    pub is_male: bool,

    pub year_of_birth: i32,

    /// Owning user
    pub user_id: Uuid,

    /// Membership tier
    pub member_type_id: MemberTypeId,
}

/// Profile creation input
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProfile {
    pub is_male: bool,
    pub year_of_birth: i32,
    pub user_id: Uuid,
    pub member_type_id: MemberTypeId,
}

/// Partial profile update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeProfile {
    pub is_male: Option<bool>,
    pub year_of_birth: Option<i32>,
    pub member_type_id: Option<MemberTypeId>,
}
