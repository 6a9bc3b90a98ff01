//! GraphQL HTTP endpoint

use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::{get, post},
    Router,
};

use crate::graphql::GraphqlExecutor;

/// `POST /graphql`, plus the playground when `playground` is set
pub fn graphql_router(executor: GraphqlExecutor, playground: bool) -> Router {
    let router = Router::new().route("/graphql", post(graphql_handler));
    let router = if playground {
        router.route("/graphql/playground", get(graphql_playground))
    } else {
        router
    };
    router.with_state(executor)
}

/// Execute one GraphQL request with a fresh set of loaders
async fn graphql_handler(
    State(executor): State<GraphqlExecutor>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    executor.execute(req.into_inner()).await.into()
}

/// GraphQL Playground handler for development
async fn graphql_playground() -> impl IntoResponse {
    Html(playground_source(GraphQLPlaygroundConfig::new("/graphql")))
}
