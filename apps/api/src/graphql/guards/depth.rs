//! Maximum operation depth
//!
//! `User` embeds lists of `User` in both subscription directions, so an
//! unbounded document could expand the graph indefinitely. [`DepthGuard`]
//! rejects any operation whose field nesting exceeds the configured
//! ceiling before a single resolver runs.
//!
//! Root fields have depth 0 and every nested field one more. Introspection
//! fields are not counted, together with everything below them.

use async_graphql::{Error, ErrorExtensions, Pos, ServerError};
use thiserror::Error;

use crate::graphql::selection::{walk, FieldNode, SelectionDocument, SelectionVisitor, Visit};

/// An operation nested deeper than the ceiling allows
#[derive(Debug, Clone, PartialEq, Error)]
#[error("'{operation}' exceeds maximum operation depth of {max_depth}")]
pub struct DepthExceeded {
    pub operation: String,
    pub max_depth: usize,
    /// Position of the first field past the ceiling
    pub pos: Pos,
}

impl DepthExceeded {
    /// Validation error as reported in a GraphQL response
    pub fn into_server_error(self) -> ServerError {
        Error::new(self.to_string())
            .extend_with(|_, e| e.set("code", "DEPTH_LIMIT_EXCEEDED"))
            .into_server_error(self.pos)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DepthGuard {
    max_depth: usize,
}

impl DepthGuard {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Check every operation in `document`
    pub fn check(&self, document: &SelectionDocument) -> Result<(), DepthExceeded> {
        for operation in &document.operations {
            let mut visitor = DepthVisitor {
                max_depth: self.max_depth,
            };
            walk(document, &operation.selections, &mut visitor).map_err(|pos| DepthExceeded {
                operation: operation
                    .name
                    .clone()
                    .unwrap_or_else(|| "anonymous".to_string()),
                max_depth: self.max_depth,
                pos,
            })?;
        }
        Ok(())
    }
}

struct DepthVisitor {
    max_depth: usize,
}

impl SelectionVisitor for DepthVisitor {
    type Error = Pos;

    fn enter_field(&mut self, field: &FieldNode, depth: usize) -> Result<Visit, Pos> {
        if field.is_introspection() {
            return Ok(Visit::Skip);
        }
        if depth > self.max_depth {
            return Err(field.pos);
        }
        Ok(Visit::Descend)
    }
}
