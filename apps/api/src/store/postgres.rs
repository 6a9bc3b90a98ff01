//! PostgreSQL store
//!
//! Every trait call issues exactly one SQL statement. Relation filters use
//! `EXISTS` subqueries against `subscribers_on_authors`, and embedded edges
//! are collected with correlated `ARRAY(...)` subqueries, so a user fetch
//! with both edge directions is still a single round trip.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    MemberTypeFilter, PostFilter, ProfileFilter, Store, StoreError, StoreResult, UserFilter,
    UserInclude,
};
use crate::models::{
    ChangePost, ChangeProfile, ChangeUser, CreatePost, CreateProfile, CreateUser, MemberType,
    Post, Profile, User, UserRecord,
};

const USER_COLUMNS: &str = "u.id, u.name, u.balance";
const POST_COLUMNS: &str = "id, title, content, author_id";
const PROFILE_COLUMNS: &str = "id, is_male, year_of_birth, user_id, member_type_id";
const MEMBER_TYPE_COLUMNS: &str = "id, discount, posts_limit_per_month";

const SUBSCRIBER_IDS: &str = "ARRAY(SELECT s.subscriber_id FROM subscribers_on_authors s \
                              WHERE s.author_id = u.id ORDER BY s.subscriber_id)";
const AUTHOR_IDS: &str = "ARRAY(SELECT s.author_id FROM subscribers_on_authors s \
                          WHERE s.subscriber_id = u.id ORDER BY s.author_id)";
const NO_IDS: &str = "ARRAY[]::uuid[]";

/// sqlx-backed [`Store`]
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new PgStore instance
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Build the user SELECT for a filter and edge selection
///
/// Returns the SQL and the id list to bind as `$1`, if any.
fn user_query(filter: &UserFilter, include: UserInclude) -> (String, Option<&[Uuid]>) {
    let subscribers = if include.subscribers {
        SUBSCRIBER_IDS
    } else {
        NO_IDS
    };
    let authors = if include.authors { AUTHOR_IDS } else { NO_IDS };

    let (predicate, ids) = match filter {
        UserFilter::All => ("", None),
        UserFilter::IdIn(ids) => ("WHERE u.id = ANY($1)", Some(ids.as_slice())),
        UserFilter::FollowedByAny(ids) => (
            "WHERE EXISTS (SELECT 1 FROM subscribers_on_authors s \
             WHERE s.author_id = u.id AND s.subscriber_id = ANY($1))",
            Some(ids.as_slice()),
        ),
        UserFilter::FollowingAny(ids) => (
            "WHERE EXISTS (SELECT 1 FROM subscribers_on_authors s \
             WHERE s.subscriber_id = u.id AND s.author_id = ANY($1))",
            Some(ids.as_slice()),
        ),
    };

    let sql = format!(
        "SELECT {USER_COLUMNS}, {subscribers} AS subscriber_ids, {authors} AS author_ids \
         FROM users u {predicate} ORDER BY u.id"
    );
    (sql, ids)
}

/// Translate constraint violations into domain errors
fn map_write_error(entity: &'static str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict {
                entity,
                detail: db_err.message().to_string(),
            };
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::InvalidReference {
                entity,
                detail: db_err.message().to_string(),
            };
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl Store for PgStore {
    async fn find_users(
        &self,
        filter: &UserFilter,
        include: UserInclude,
    ) -> StoreResult<Vec<UserRecord>> {
        let (sql, ids) = user_query(filter, include);
        let query = sqlx::query_as::<_, UserRecord>(&sql);
        let query = match ids {
            Some(ids) => query.bind(ids),
            None => query,
        };
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn find_posts(&self, filter: &PostFilter) -> StoreResult<Vec<Post>> {
        let (predicate, ids) = match filter {
            PostFilter::All => ("", None),
            PostFilter::IdIn(ids) => ("WHERE id = ANY($1)", Some(ids.as_slice())),
            PostFilter::AuthorIn(ids) => ("WHERE author_id = ANY($1)", Some(ids.as_slice())),
        };
        let sql = format!("SELECT {POST_COLUMNS} FROM posts {predicate} ORDER BY id");
        let query = sqlx::query_as::<_, Post>(&sql);
        let query = match ids {
            Some(ids) => query.bind(ids),
            None => query,
        };
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn find_profiles(&self, filter: &ProfileFilter) -> StoreResult<Vec<Profile>> {
        let sql = |predicate: &str| {
            format!("SELECT {PROFILE_COLUMNS} FROM profiles {predicate} ORDER BY id")
        };
        let profiles = match filter {
            ProfileFilter::All => {
                sqlx::query_as::<_, Profile>(&sql(""))
                    .fetch_all(&self.pool)
                    .await?
            }
            ProfileFilter::IdIn(ids) => {
                sqlx::query_as::<_, Profile>(&sql("WHERE id = ANY($1)"))
                    .bind(ids.as_slice())
                    .fetch_all(&self.pool)
                    .await?
            }
            ProfileFilter::UserIn(ids) => {
                sqlx::query_as::<_, Profile>(&sql("WHERE user_id = ANY($1)"))
                    .bind(ids.as_slice())
                    .fetch_all(&self.pool)
                    .await?
            }
            ProfileFilter::MemberTypeIn(ids) => {
                sqlx::query_as::<_, Profile>(&sql("WHERE member_type_id = ANY($1)"))
                    .bind(ids.as_slice())
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(profiles)
    }

    async fn find_member_types(&self, filter: &MemberTypeFilter) -> StoreResult<Vec<MemberType>> {
        let member_types = match filter {
            MemberTypeFilter::All => {
                let sql = format!("SELECT {MEMBER_TYPE_COLUMNS} FROM member_types ORDER BY id");
                sqlx::query_as::<_, MemberType>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
            MemberTypeFilter::IdIn(ids) => {
                let sql = format!(
                    "SELECT {MEMBER_TYPE_COLUMNS} FROM member_types WHERE id = ANY($1) ORDER BY id"
                );
                sqlx::query_as::<_, MemberType>(&sql)
                    .bind(ids.as_slice())
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(member_types)
    }

    async fn create_user(&self, input: CreateUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, balance) VALUES ($1, $2, $3) RETURNING id, name, balance",
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(input.balance)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error("user", e))
    }

    async fn update_user(&self, id: Uuid, input: ChangeUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                balance = COALESCE($3, balance)
            WHERE id = $1
            RETURNING id, name, balance
            "#,
        )
        .bind(id)
        .bind(input.name)
        .bind(input.balance)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error("user", e))?
        .ok_or_else(|| StoreError::not_found("user", id))
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("user", id));
        }
        Ok(())
    }

    async fn create_post(&self, input: CreatePost) -> StoreResult<Post> {
        let sql = format!(
            "INSERT INTO posts ({POST_COLUMNS}) VALUES ($1, $2, $3, $4) RETURNING {POST_COLUMNS}"
        );
        sqlx::query_as::<_, Post>(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.title)
            .bind(&input.content)
            .bind(input.author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error("post", e))
    }

    async fn update_post(&self, id: Uuid, input: ChangePost) -> StoreResult<Post> {
        let sql = format!(
            "UPDATE posts SET title = COALESCE($2, title), content = COALESCE($3, content) \
             WHERE id = $1 RETURNING {POST_COLUMNS}"
        );
        sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .bind(input.title)
            .bind(input.content)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error("post", e))?
            .ok_or_else(|| StoreError::not_found("post", id))
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("post", id));
        }
        Ok(())
    }

    async fn create_profile(&self, input: CreateProfile) -> StoreResult<Profile> {
        let sql = format!(
            "INSERT INTO profiles ({PROFILE_COLUMNS}) VALUES ($1, $2, $3, $4, $5) \
             RETURNING {PROFILE_COLUMNS}"
        );
        sqlx::query_as::<_, Profile>(&sql)
            .bind(Uuid::new_v4())
            .bind(input.is_male)
            .bind(input.year_of_birth)
            .bind(input.user_id)
            .bind(input.member_type_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error("profile", e))
    }

    async fn update_profile(&self, id: Uuid, input: ChangeProfile) -> StoreResult<Profile> {
        let sql = format!(
            r#"
            UPDATE profiles
            SET is_male = COALESCE($2, is_male),
                year_of_birth = COALESCE($3, year_of_birth),
                member_type_id = COALESCE($4, member_type_id)
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .bind(input.is_male)
            .bind(input.year_of_birth)
            .bind(input.member_type_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error("profile", e))?
            .ok_or_else(|| StoreError::not_found("profile", id))
    }

    async fn delete_profile(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("profile", id));
        }
        Ok(())
    }

    async fn subscribe(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<()> {
        sqlx::query("INSERT INTO subscribers_on_authors (subscriber_id, author_id) VALUES ($1, $2)")
            .bind(subscriber_id)
            .bind(author_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error("subscription", e))?;
        Ok(())
    }

    async fn unsubscribe(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<()> {
        let result = sqlx::query(
            "DELETE FROM subscribers_on_authors WHERE subscriber_id = $1 AND author_id = $2",
        )
        .bind(subscriber_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(
                "subscription",
                format!("{subscriber_id} -> {author_id}"),
            ));
        }
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
