//! Database models for the social graph
//!
//! This module contains SQLx models for:
//! - Users and their subscription edges
//! - Profiles and membership tiers
//! - Posts

pub mod member_type;
pub mod post;
pub mod profile;
pub mod user;

pub use member_type::{MemberType, MemberTypeId};
pub use post::{ChangePost, CreatePost, Post};
pub use profile::{ChangeProfile, CreateProfile, Profile};
pub use user::{ChangeUser, CreateUser, User, UserRecord};
