//! GraphQL type definitions for the social graph
//!
//! Object types wrap the store models and resolve every relation through
//! the request's [`LoaderRegistry`](crate::graphql::loaders::LoaderRegistry).

mod inputs;
mod member_type;
mod post;
mod profile;
mod user;

pub use inputs::{
    ChangePostInput, ChangeProfileInput, ChangeUserInput, CreatePostInput, CreateProfileInput,
    CreateUserInput,
};
pub use member_type::{MemberType, MemberTypeId};
pub use post::Post;
pub use profile::Profile;
pub use user::User;
