//! Seeded social graph used by the integration tests
//!
//! ```text
//! ada -> bob, ada -> cy, cy -> bob      (subscriber -> author)
//! ada: 2 posts, BUSINESS profile
//! bob: 1 post,  BASIC profile
//! cy:  no posts, no profile
//! ```
//!
//! [`Crowd`] is a wider graph for counting round trips at realistic fan-out.

use std::sync::Arc;

use async_graphql::{Request, Response, Value, Variables};
use socialgraph_api::config::DEFAULT_MAX_QUERY_DEPTH;
use socialgraph_api::models::{CreatePost, CreateProfile, CreateUser, MemberTypeId, User};
use socialgraph_api::routes::{app_router, AppState};
use socialgraph_api::{GraphqlExecutor, MemoryStore, Store};

pub struct Graph {
    pub store: Arc<MemoryStore>,
    pub ada: User,
    pub bob: User,
    pub cy: User,
}

impl Graph {
    pub async fn seed() -> Self {
        let store = Arc::new(MemoryStore::new());
        let ada = create_user(&store, "Ada", 120.0).await;
        let bob = create_user(&store, "Bob", 40.5).await;
        let cy = create_user(&store, "Cy", 0.0).await;

        store.subscribe(ada.id, bob.id).await.unwrap();
        store.subscribe(ada.id, cy.id).await.unwrap();
        store.subscribe(cy.id, bob.id).await.unwrap();

        for (author, title) in [(&ada, "Engines"), (&ada, "Notes"), (&bob, "Hello")] {
            store
                .create_post(CreatePost {
                    title: title.to_string(),
                    content: format!("{title} by {}", author.name),
                    author_id: author.id,
                })
                .await
                .unwrap();
        }

        for (user, tier, year) in [
            (&ada, MemberTypeId::Business, 1815),
            (&bob, MemberTypeId::Basic, 1990),
        ] {
            store
                .create_profile(CreateProfile {
                    is_male: false,
                    year_of_birth: year,
                    user_id: user.id,
                    member_type_id: tier,
                })
                .await
                .unwrap();
        }

        store.reset_calls();
        Self {
            store,
            ada,
            bob,
            cy,
        }
    }

    pub fn executor(&self) -> GraphqlExecutor {
        GraphqlExecutor::new(self.store.clone(), DEFAULT_MAX_QUERY_DEPTH)
    }

    pub fn router(&self, playground: bool) -> axum::Router {
        let store: Arc<dyn Store> = self.store.clone();
        app_router(AppState::new(store, DEFAULT_MAX_QUERY_DEPTH, playground))
    }

    pub async fn execute(&self, query: &str) -> Response {
        self.executor().execute(query).await
    }

    pub async fn execute_with(&self, query: &str, variables: serde_json::Value) -> Response {
        let request = Request::new(query).variables(Variables::from_json(variables));
        self.executor().execute(request).await
    }

    pub fn name_of(&self, id: &str) -> &str {
        [&self.ada, &self.bob, &self.cy]
            .into_iter()
            .find(|user| user.id.to_string() == id)
            .map(|user| user.name.as_str())
            .unwrap_or("?")
    }
}

/// `size` users in a ring: user `i` follows user `i + 1`, writes one post
/// and has a profile alternating between BASIC and BUSINESS
pub struct Crowd {
    pub store: Arc<MemoryStore>,
    pub users: Vec<User>,
}

impl Crowd {
    pub async fn seed(size: usize) -> Self {
        let store = Arc::new(MemoryStore::new());
        let mut users = Vec::with_capacity(size);
        for i in 0..size {
            users.push(create_user(&store, &format!("user{i:02}"), i as f64).await);
        }

        for (i, user) in users.iter().enumerate() {
            let next = &users[(i + 1) % size];
            store.subscribe(user.id, next.id).await.unwrap();
            store
                .create_post(CreatePost {
                    title: format!("post{i:02}"),
                    content: String::new(),
                    author_id: user.id,
                })
                .await
                .unwrap();
            let tier = if i % 2 == 0 {
                MemberTypeId::Basic
            } else {
                MemberTypeId::Business
            };
            store
                .create_profile(CreateProfile {
                    is_male: i % 3 == 0,
                    year_of_birth: 1950 + i as i32,
                    user_id: user.id,
                    member_type_id: tier,
                })
                .await
                .unwrap();
        }

        store.reset_calls();
        Self { store, users }
    }

    pub async fn execute(&self, query: &str) -> Response {
        GraphqlExecutor::new(self.store.clone(), DEFAULT_MAX_QUERY_DEPTH)
            .execute(query)
            .await
    }
}

async fn create_user(store: &MemoryStore, name: &str, balance: f64) -> User {
    store
        .create_user(CreateUser {
            name: name.to_string(),
            balance,
        })
        .await
        .unwrap()
}

/// The response `data` as JSON
pub fn data(response: &Response) -> serde_json::Value {
    response.data.clone().into_json().unwrap()
}

/// `extensions.code` of every error, in order
pub fn error_codes(response: &Response) -> Vec<String> {
    response
        .errors
        .iter()
        .filter_map(|err| match err.extensions.as_ref()?.get("code")? {
            Value::String(code) => Some(code.clone()),
            _ => None,
        })
        .collect()
}

/// `path` of every error as JSON, in order
pub fn error_paths(response: &Response) -> Vec<serde_json::Value> {
    response
        .errors
        .iter()
        .map(|err| serde_json::to_value(&err.path).unwrap())
        .collect()
}

/// Names under `field` of a user object, sorted
pub fn names(user: &serde_json::Value, field: &str) -> Vec<String> {
    let mut names: Vec<String> = user[field]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["name"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    names
}
