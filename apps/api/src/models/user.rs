//! User model
//!
//! Users reference each other through the `subscribers_on_authors` edge
//! table: a row `(subscriber_id, author_id)` means the subscriber follows
//! the author.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User record from the users table
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Account balance
    pub balance: f64,
}

/// A user row with its subscription edges embedded
///
/// The edge lists are only populated when the query asked for them;
/// otherwise they are empty.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct UserRecord {
    #[sqlx(flatten)]
    pub user: User,

    /// Ids of users subscribed to this user
    pub subscriber_ids: Vec<Uuid>,

    /// Ids of users this user is subscribed to
    pub author_ids: Vec<Uuid>,
}

impl UserRecord {
    /// Wrap a user without any embedded edges
    pub fn bare(user: User) -> Self {
        Self {
            user,
            subscriber_ids: Vec::new(),
            author_ids: Vec::new(),
        }
    }
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        record.user
    }
}

/// User creation input
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub balance: f64,
}

/// Partial user update; `None` leaves the column untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeUser {
    pub name: Option<String>,
    pub balance: Option<f64>,
}
