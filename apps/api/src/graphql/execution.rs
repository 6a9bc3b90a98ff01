//! Request execution with per-request loaders
//!
//! [`GraphqlExecutor::execute`] is the only way requests reach the schema:
//!
//! 1. parse the document; a syntax error returns errors only
//! 2. run the [`DepthGuard`] over every operation; a violation returns
//!    errors only and no resolver runs
//! 3. derive the [`SelectionShape`] of the executed query operation
//! 4. attach a fresh [`LoaderRegistry`] and the shape to the request
//! 5. execute against the schema under [`until_idle`], which seals the
//!    registry's open batches each time every resolver is waiting on one
//!
//! The registry lives in the request data, so it is dropped with the
//! request and no cached row is ever visible to another request.

use async_graphql::parser::{parse_query, types::OperationType};
use async_graphql::{Request, Response};
use std::sync::Arc;

use super::guards::DepthGuard;
use super::loaders::{until_idle, LoaderRegistry};
use super::schema::{build_schema, SocialGraphSchema};
use super::selection::{SelectionDocument, SelectionShape};
use crate::store::Store;

#[derive(Clone)]
pub struct GraphqlExecutor {
    schema: SocialGraphSchema,
    store: Arc<dyn Store>,
    guard: DepthGuard,
}

impl GraphqlExecutor {
    pub fn new(store: Arc<dyn Store>, max_depth: usize) -> Self {
        Self {
            schema: build_schema(store.clone()),
            store,
            guard: DepthGuard::new(max_depth),
        }
    }

    pub fn schema(&self) -> &SocialGraphSchema {
        &self.schema
    }

    pub fn max_depth(&self) -> usize {
        self.guard.max_depth()
    }

    pub async fn execute(&self, request: impl Into<Request>) -> Response {
        let request = request.into();

        let document = match parse_query(&request.query) {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(error = %err, "Rejected malformed document");
                return Response::from_errors(vec![err.into()]);
            }
        };
        let selection = SelectionDocument::from(&document);

        if let Err(err) = self.guard.check(&selection) {
            tracing::warn!(
                operation = %err.operation,
                max_depth = err.max_depth,
                "Rejected document exceeding depth limit"
            );
            return Response::from_errors(vec![err.into_server_error()]);
        }

        let shape = match selection.operation(request.operation_name.as_deref()) {
            Some(operation) if operation.kind == OperationType::Query => {
                SelectionShape::of(&selection, operation)
            }
            _ => SelectionShape::default(),
        };

        let loaders = Arc::new(LoaderRegistry::new(self.store.clone()));
        let request = request.data(loaders.clone()).data(shape);
        until_idle(self.schema.execute(request), loaders.as_ref()).await
    }
}
