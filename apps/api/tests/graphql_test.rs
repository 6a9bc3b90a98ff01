//! Integration tests for GraphQL execution
//!
//! Runs documents through [`GraphqlExecutor`] against a seeded
//! [`MemoryStore`] and checks both the response and the number of store
//! round trips the request cost.

mod common;

use common::*;
use rstest::rstest;
use serde_json::json;
use socialgraph_api::store::{
    MemberTypeFilter, PostFilter, ProfileFilter, StoreCall, UserFilter, UserInclude,
};

/// Failed nullable fields are either absent from `data` or null
fn is_absent_or_null(data: &serde_json::Value, field: &str) -> bool {
    data.get(field).map_or(true, serde_json::Value::is_null)
}

// ========== Batching ==========

#[test_log::test(tokio::test)]
async fn test_users_with_both_subscription_directions_cost_one_read() {
    let graph = Graph::seed().await;

    let response = graph
        .execute("{ users { id name userSubscribedTo { name } subscribedToUser { name } } }")
        .await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        graph.store.reads(),
        vec![StoreCall::FindUsers {
            filter: UserFilter::All,
            include: UserInclude {
                subscribers: true,
                authors: true,
            },
        }]
    );

    let data = data(&response);
    let users = data["users"].as_array().unwrap();
    assert_eq!(users.len(), 3);
    for user in users {
        let name = graph.name_of(user["id"].as_str().unwrap());
        let (follows, followers): (Vec<&str>, Vec<&str>) = match name {
            "Ada" => (vec!["Bob", "Cy"], vec![]),
            "Bob" => (vec![], vec!["Ada", "Cy"]),
            "Cy" => (vec!["Bob"], vec!["Ada"]),
            other => panic!("unexpected user {other}"),
        };
        assert_eq!(names(user, "userSubscribedTo"), follows, "{name} follows");
        assert_eq!(names(user, "subscribedToUser"), followers, "{name} followers");
    }
}

#[tokio::test]
async fn test_users_without_subscriptions_skip_edges() {
    let graph = Graph::seed().await;

    let response = graph.execute("{ users { posts { id } } }").await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let reads = graph.store.reads();
    assert_eq!(reads.len(), 2);
    assert_eq!(
        reads[0],
        StoreCall::FindUsers {
            filter: UserFilter::All,
            include: UserInclude::NONE,
        }
    );
    assert!(matches!(
        &reads[1],
        StoreCall::FindPosts(PostFilter::AuthorIn(ids)) if ids.len() == 3
    ));

    let data = data(&response);
    let mut counts: Vec<usize> = data["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["posts"].as_array().unwrap().len())
        .collect();
    counts.sort();
    assert_eq!(counts, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_posts_author_profile_is_one_read_per_level() {
    let graph = Graph::seed().await;

    let response = graph
        .execute("{ posts { title author { name profile { yearOfBirth } } } }")
        .await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let reads = graph.store.reads();
    assert_eq!(reads.len(), 3, "{reads:?}");
    assert_eq!(reads[0], StoreCall::FindPosts(PostFilter::All));
    assert!(matches!(
        &reads[1],
        StoreCall::FindUsers { filter: UserFilter::IdIn(ids), .. } if ids.len() == 2
    ));
    assert!(matches!(
        &reads[2],
        StoreCall::FindProfiles(ProfileFilter::UserIn(ids)) if ids.len() == 2
    ));

    let data = data(&response);
    for post in data["posts"].as_array().unwrap() {
        let expected = match post["author"]["name"].as_str().unwrap() {
            "Ada" => 1815,
            "Bob" => 1990,
            other => panic!("unexpected author {other}"),
        };
        assert_eq!(post["author"]["profile"]["yearOfBirth"], json!(expected));
    }
}

#[tokio::test]
async fn test_member_types_resolve_profiles_and_users() {
    let graph = Graph::seed().await;

    let response = graph
        .execute("{ memberTypes { id discount profiles { user { name } } } }")
        .await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(graph.store.reads().len(), 3);

    let data = data(&response);
    let tiers = data["memberTypes"].as_array().unwrap();
    assert_eq!(tiers.len(), 2);
    for tier in tiers {
        let members: Vec<&str> = tier["profiles"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["user"]["name"].as_str().unwrap())
            .collect();
        match tier["id"].as_str().unwrap() {
            "BASIC" => assert_eq!(members, vec!["Bob"]),
            "BUSINESS" => assert_eq!(members, vec!["Ada"]),
            other => panic!("unexpected member type {other}"),
        }
    }
}

#[tokio::test]
async fn test_single_user_lookup_uses_loaders() {
    let graph = Graph::seed().await;

    let response = graph
        .execute_with(
            "query ($id: UUID!) { user(id: $id) { name userSubscribedTo { name } } }",
            json!({ "id": graph.cy.id }),
        )
        .await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(data(&response)["user"]["name"], "Cy");
    assert_eq!(names(&data(&response)["user"], "userSubscribedTo"), vec!["Bob"]);
    assert_eq!(graph.store.reads().len(), 2);
}

#[tokio::test]
async fn test_missing_single_lookup_is_null() {
    let graph = Graph::seed().await;

    let response = graph
        .execute("{ post(id: \"00000000-0000-0000-0000-000000000000\") { id } }")
        .await;

    assert!(response.errors.is_empty());
    assert_eq!(data(&response), json!({ "post": null }));
}

// ========== Batching at fan-out ==========

/// Every batched read the request made, as `(call, key count)`
fn batched(reads: &[StoreCall]) -> Vec<(&'static str, usize)> {
    let mut batched: Vec<_> = reads
        .iter()
        .filter_map(|call| match call {
            StoreCall::FindUsers {
                filter: UserFilter::IdIn(ids),
                ..
            } => Some(("users_by_id", ids.len())),
            StoreCall::FindPosts(PostFilter::AuthorIn(ids)) => Some(("posts_by_author", ids.len())),
            StoreCall::FindProfiles(ProfileFilter::UserIn(ids)) => {
                Some(("profile_by_user", ids.len()))
            }
            StoreCall::FindMemberTypes(MemberTypeFilter::IdIn(ids)) => {
                Some(("member_types_by_id", ids.len()))
            }
            _ => None,
        })
        .collect();
    batched.sort();
    batched
}

#[rstest]
#[case::profile_first("{ users { profile { id } posts { author { id } } } }")]
#[case::posts_first("{ users { posts { author { id } } profile { id } } }")]
#[tokio::test]
async fn test_forty_users_batch_each_relation_once(#[case] query: &str) {
    let crowd = Crowd::seed(40).await;

    let response = crowd.execute(query).await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let reads = crowd.store.reads();
    assert_eq!(reads.len(), 4, "{reads:?}");
    assert_eq!(
        reads[0],
        StoreCall::FindUsers {
            filter: UserFilter::All,
            include: UserInclude::NONE,
        }
    );
    assert_eq!(
        batched(&reads),
        vec![("posts_by_author", 40), ("profile_by_user", 40), ("users_by_id", 40)]
    );

    let data = data(&response);
    let users = data["users"].as_array().unwrap();
    assert_eq!(users.len(), 40);
    assert!(users.iter().all(|u| !u["profile"]["id"].is_null()));
    assert!(users.iter().all(|u| !u["posts"][0]["author"]["id"].is_null()));
}

#[test_log::test(tokio::test)]
async fn test_primed_siblings_do_not_split_pending_batches() {
    let crowd = Crowd::seed(40).await;

    // subscribedToUser resolves from primed cache entries right away
    let response = crowd
        .execute("{ users { posts { author { id } } subscribedToUser { id } } }")
        .await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let reads = crowd.store.reads();
    assert_eq!(reads.len(), 3, "{reads:?}");
    assert_eq!(
        reads[0],
        StoreCall::FindUsers {
            filter: UserFilter::All,
            include: UserInclude {
                subscribers: true,
                authors: false,
            },
        }
    );
    assert_eq!(
        batched(&reads),
        vec![("posts_by_author", 40), ("users_by_id", 40)]
    );

    let data = data(&response);
    for user in data["users"].as_array().unwrap() {
        assert_eq!(user["subscribedToUser"].as_array().unwrap().len(), 1);
    }
}

#[tokio::test]
async fn test_mixed_shape_costs_one_read_per_relation() {
    let crowd = Crowd::seed(60).await;

    let response = crowd
        .execute(
            "{ users { id \
                 subscribedToUser { name } \
                 posts { title author { name profile { memberType { discount } } } } \
                 profile { yearOfBirth } \
                 userSubscribedTo { id } } }",
        )
        .await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let reads = crowd.store.reads();
    assert_eq!(reads.len(), 5, "{reads:?}");
    assert_eq!(
        batched(&reads),
        vec![
            ("member_types_by_id", 2),
            ("posts_by_author", 60),
            ("profile_by_user", 60),
            ("users_by_id", 60),
        ]
    );

    let data = data(&response);
    let users = data["users"].as_array().unwrap();
    assert_eq!(users.len(), 60);
    for user in users {
        let post = &user["posts"][0];
        assert!(post["author"]["profile"]["memberType"]["discount"].is_number());
        assert_eq!(user["userSubscribedTo"].as_array().unwrap().len(), 1);
    }
}

// ========== Depth limit ==========

#[tokio::test]
async fn test_six_levels_are_rejected_before_any_read() {
    let graph = Graph::seed().await;
    let query = "{ users { subscribedToUser { subscribedToUser { subscribedToUser { \
                 subscribedToUser { subscribedToUser { subscribedToUser { id } } } } } } } }";

    let response = graph.execute(query).await;

    assert_eq!(response.data, async_graphql::Value::Null);
    assert_eq!(error_codes(&response), vec!["DEPTH_LIMIT_EXCEEDED"]);
    assert!(response.errors[0].message.contains("exceeds maximum operation depth of 5"));
    assert!(graph.store.calls().is_empty());
}

#[tokio::test]
async fn test_depth_is_checked_for_mutations() {
    let graph = Graph::seed().await;
    let query = format!(
        "mutation {{ createPost(dto: {{ title: \"t\", content: \"c\", authorId: \"{}\" }}) \
         {{ author {{ posts {{ author {{ posts {{ author {{ posts {{ id }} }} }} }} }} }} }} }}",
        graph.ada.id
    );

    let response = graph.execute(query.as_str()).await;

    assert_eq!(error_codes(&response), vec!["DEPTH_LIMIT_EXCEEDED"]);
    assert!(graph.store.calls().is_empty());
}

#[tokio::test]
async fn test_syntax_error_returns_errors_only() {
    let graph = Graph::seed().await;

    let response = graph.execute("{ users { id ").await;

    assert_eq!(response.data, async_graphql::Value::Null);
    assert_eq!(response.errors.len(), 1);
    assert!(graph.store.calls().is_empty());
}

// ========== Mutations ==========

#[tokio::test]
async fn test_failed_mutation_does_not_fail_siblings() {
    let graph = Graph::seed().await;

    let response = graph
        .execute(
            "mutation { \
               deletePost(id: \"00000000-0000-0000-0000-000000000000\") \
               createUser(dto: { name: \"Dee\", balance: 3.5 }) { name balance } \
             }",
        )
        .await;

    let data = data(&response);
    assert!(is_absent_or_null(&data, "deletePost"), "{data}");
    assert_eq!(data["createUser"], json!({ "name": "Dee", "balance": 3.5 }));

    assert_eq!(error_codes(&response), vec!["NOT_FOUND"]);
    assert_eq!(error_paths(&response), vec![json!(["deletePost"])]);
}

#[tokio::test]
async fn test_subscription_mutations_round_trip() {
    let graph = Graph::seed().await;
    let vars = json!({ "user": graph.bob.id, "author": graph.cy.id });

    let response = graph
        .execute_with(
            "mutation ($user: UUID!, $author: UUID!) { \
               subscribeTo(userId: $user, authorId: $author) }",
            vars.clone(),
        )
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);

    let response = graph
        .execute_with(
            "mutation ($user: UUID!, $author: UUID!) { \
               again: subscribeTo(userId: $user, authorId: $author) }",
            vars.clone(),
        )
        .await;
    assert_eq!(error_codes(&response), vec!["CONFLICT"]);

    let response = graph
        .execute_with(
            "mutation ($user: UUID!, $author: UUID!) { \
               unsubscribeFrom(userId: $user, authorId: $author) }",
            vars,
        )
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        data(&response)["unsubscribeFrom"],
        json!(format!(
            "User id: {} is unsubscribed from {}",
            graph.bob.id, graph.cy.id
        ))
    );
}

#[tokio::test]
async fn test_change_and_delete_user() {
    let graph = Graph::seed().await;

    let response = graph
        .execute_with(
            "mutation ($id: UUID!) { \
               changeUser(id: $id, dto: { balance: 99.0 }) { name balance } }",
            json!({ "id": graph.bob.id }),
        )
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(data(&response)["changeUser"], json!({ "name": "Bob", "balance": 99.0 }));

    let response = graph
        .execute_with(
            "mutation ($id: UUID!) { deleteUser(id: $id) }",
            json!({ "id": graph.bob.id }),
        )
        .await;
    assert_eq!(
        data(&response)["deleteUser"],
        json!(format!("User id: {} is deleted", graph.bob.id))
    );

    // cascades to posts, profile and subscriptions
    let response = graph
        .execute("{ users { name subscribedToUser { name } } posts { title } }")
        .await;
    let data = data(&response);
    assert_eq!(data["users"].as_array().unwrap().len(), 2);
    assert_eq!(data["posts"].as_array().unwrap().len(), 2);
}

// ========== Store failures ==========

#[tokio::test]
async fn test_store_outage_fails_every_root_field() {
    let graph = Graph::seed().await;
    graph.store.set_unavailable(true);

    let response = graph.execute("{ users { id } memberTypes { id } }").await;

    // no root field succeeded, so there is no data at all
    assert_eq!(response.data, async_graphql::Value::Null);
    assert_eq!(
        error_codes(&response),
        vec!["STORE_UNAVAILABLE", "STORE_UNAVAILABLE"]
    );
    let mut paths = error_paths(&response);
    paths.sort_by_key(|p| p.to_string());
    assert_eq!(paths, vec![json!(["memberTypes"]), json!(["users"])]);
}

#[tokio::test]
async fn test_partial_outage_keeps_sibling_data() {
    let graph = Graph::seed().await;
    graph.store.set_entity_unavailable("member_type", true);

    let response = graph.execute("{ users { id } memberTypes { id } }").await;

    let data = data(&response);
    assert_eq!(data["users"].as_array().unwrap().len(), 3);
    assert!(is_absent_or_null(&data, "memberTypes"), "{data}");
    assert_eq!(error_codes(&response), vec!["STORE_UNAVAILABLE"]);
    assert_eq!(error_paths(&response), vec![json!(["memberTypes"])]);
}

#[tokio::test]
async fn test_nested_outage_is_reported_at_the_field() {
    let graph = Graph::seed().await;
    graph.store.set_entity_unavailable("profile", true);

    let response = graph
        .execute_with(
            "query ($id: UUID!) { user(id: $id) { name profile { id } } }",
            json!({ "id": graph.ada.id }),
        )
        .await;

    let data = data(&response);
    assert_eq!(data["user"]["name"], "Ada");
    assert!(is_absent_or_null(&data["user"], "profile"), "{data}");
    assert_eq!(error_codes(&response), vec!["STORE_UNAVAILABLE"]);
    assert_eq!(error_paths(&response), vec![json!(["user", "profile"])]);
}
