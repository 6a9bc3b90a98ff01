//! GraphQL mutations for the social graph
//!
//! Mutations call the store directly and immediately; they never read
//! through or prime the request's loaders. Every mutation field is nullable,
//! so a failing field leaves the data of its siblings intact.

mod post;
mod profile;
mod subscription;
mod user;

pub use post::PostMutation;
pub use profile::ProfileMutation;
pub use subscription::SubscriptionMutation;
pub use user::UserMutation;

use async_graphql::MergedObject;

/// Root mutation type combining all mutation domains
#[derive(MergedObject, Default)]
pub struct Mutation(UserMutation, PostMutation, ProfileMutation, SubscriptionMutation);
