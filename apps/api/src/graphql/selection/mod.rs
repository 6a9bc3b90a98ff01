//! Normalized view of a parsed GraphQL document
//!
//! The parser's AST carries arguments, directives and variable definitions that
//! the resolution layer never looks at. [`SelectionDocument`] keeps only the
//! selection tree as a tagged union of [`SelectionNode`]s, and [`walk`]
//! drives a [`SelectionVisitor`] over it with fragment spreads expanded in
//! place. The depth guard and the selection shape are both visitors.

mod prefetch;
mod shape;

pub use prefetch::{prefetch_users, SubscriptionPrefetch};
pub use shape::{FieldTree, SelectionShape};

use async_graphql::parser::types::{
    DocumentOperations, ExecutableDocument, OperationType, Selection, SelectionSet,
};
use async_graphql::Pos;
use std::collections::HashMap;

/// One entry of a selection set
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionNode {
    Field(FieldNode),
    FragmentSpread(String),
    InlineFragment(InlineFragmentNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldNode {
    pub name: String,
    pub alias: Option<String>,
    pub selections: Vec<SelectionNode>,
    /// Source position, for error locations
    pub pos: Pos,
}

impl FieldNode {
    /// Key under which the field appears in the response
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn is_introspection(&self) -> bool {
        self.name.starts_with("__")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineFragmentNode {
    pub type_condition: Option<String>,
    pub selections: Vec<SelectionNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationNode {
    pub name: Option<String>,
    pub kind: OperationType,
    pub selections: Vec<SelectionNode>,
}

/// Operations and named fragments of one document
#[derive(Debug, Clone, Default)]
pub struct SelectionDocument {
    pub operations: Vec<OperationNode>,
    pub fragments: HashMap<String, Vec<SelectionNode>>,
}

impl SelectionDocument {
    /// The operation a request with `operation_name` would execute
    ///
    /// Without a name the document must hold exactly one operation.
    pub fn operation(&self, operation_name: Option<&str>) -> Option<&OperationNode> {
        match operation_name {
            Some(name) => self
                .operations
                .iter()
                .find(|op| op.name.as_deref() == Some(name)),
            None if self.operations.len() == 1 => self.operations.first(),
            None => None,
        }
    }
}

impl From<&ExecutableDocument> for SelectionDocument {
    fn from(document: &ExecutableDocument) -> Self {
        let operations = match &document.operations {
            DocumentOperations::Single(op) => vec![OperationNode {
                name: None,
                kind: op.node.ty,
                selections: convert_set(&op.node.selection_set.node),
            }],
            DocumentOperations::Multiple(ops) => ops
                .iter()
                .map(|(name, op)| OperationNode {
                    name: Some(name.to_string()),
                    kind: op.node.ty,
                    selections: convert_set(&op.node.selection_set.node),
                })
                .collect(),
        };

        let fragments = document
            .fragments
            .iter()
            .map(|(name, fragment)| {
                (
                    name.to_string(),
                    convert_set(&fragment.node.selection_set.node),
                )
            })
            .collect();

        Self {
            operations,
            fragments,
        }
    }
}

fn convert_set(set: &SelectionSet) -> Vec<SelectionNode> {
    set.items
        .iter()
        .map(|item| match &item.node {
            Selection::Field(field) => SelectionNode::Field(FieldNode {
                name: field.node.name.node.to_string(),
                alias: field.node.alias.as_ref().map(|alias| alias.node.to_string()),
                selections: convert_set(&field.node.selection_set.node),
                pos: field.pos,
            }),
            Selection::FragmentSpread(spread) => {
                SelectionNode::FragmentSpread(spread.node.fragment_name.node.to_string())
            }
            Selection::InlineFragment(inline) => SelectionNode::InlineFragment(InlineFragmentNode {
                type_condition: inline
                    .node
                    .type_condition
                    .as_ref()
                    .map(|cond| cond.node.on.node.to_string()),
                selections: convert_set(&inline.node.selection_set.node),
            }),
        })
        .collect()
}

/// What [`walk`] does after entering a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Descend,
    Skip,
}

/// Callbacks for [`walk`]
///
/// Only concrete fields are reported; fragments are transparent and do not
/// add depth.
pub trait SelectionVisitor {
    type Error;

    /// `depth` is 0 for root fields
    fn enter_field(&mut self, field: &FieldNode, depth: usize) -> Result<Visit, Self::Error>;

    /// Called after a field's children, also for skipped fields
    fn leave_field(&mut self, _field: &FieldNode) {}
}

/// Walk `selections` depth-first, expanding fragment spreads
///
/// A spread naming an unknown fragment, or one already expanded on the
/// current path, is ignored; schema validation reports those.
pub fn walk<V: SelectionVisitor>(
    document: &SelectionDocument,
    selections: &[SelectionNode],
    visitor: &mut V,
) -> Result<(), V::Error> {
    let mut path = Vec::new();
    walk_set(document, selections, 0, &mut path, visitor)
}

fn walk_set<'a, V: SelectionVisitor>(
    document: &'a SelectionDocument,
    selections: &'a [SelectionNode],
    depth: usize,
    path: &mut Vec<&'a str>,
    visitor: &mut V,
) -> Result<(), V::Error> {
    for node in selections {
        match node {
            SelectionNode::Field(field) => {
                if visitor.enter_field(field, depth)? == Visit::Descend {
                    walk_set(document, &field.selections, depth + 1, path, visitor)?;
                }
                visitor.leave_field(field);
            }
            SelectionNode::FragmentSpread(name) => {
                if path.contains(&name.as_str()) {
                    continue;
                }
                let Some(fragment) = document.fragments.get(name) else {
                    continue;
                };
                path.push(name);
                let walked = walk_set(document, fragment, depth, path, visitor);
                path.pop();
                walked?;
            }
            SelectionNode::InlineFragment(inline) => {
                walk_set(document, &inline.selections, depth, path, visitor)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::parser::parse_query;

    fn document(source: &str) -> SelectionDocument {
        SelectionDocument::from(&parse_query(source).unwrap())
    }

    /// Records `(depth, name)` for every entered field
    #[derive(Default)]
    struct Trace(Vec<(usize, String)>);

    impl SelectionVisitor for Trace {
        type Error = ();

        fn enter_field(&mut self, field: &FieldNode, depth: usize) -> Result<Visit, ()> {
            self.0.push((depth, field.name.clone()));
            Ok(Visit::Descend)
        }
    }

    fn trace(doc: &SelectionDocument) -> Vec<(usize, String)> {
        let mut trace = Trace::default();
        walk(doc, &doc.operations[0].selections, &mut trace).unwrap();
        trace.0
    }

    #[test]
    fn test_conversion_keeps_aliases_and_fragments() {
        let doc = document(concat!(
            "query Q { first: user(id: \"x\") { ...F } } ",
            "fragment F on User { id ... on User { name } }",
        ));

        assert_eq!(doc.operations.len(), 1);
        assert_eq!(doc.operations[0].name.as_deref(), Some("Q"));
        let SelectionNode::Field(root) = &doc.operations[0].selections[0] else {
            panic!("expected a field");
        };
        assert_eq!(root.response_key(), "first");
        assert_eq!(root.selections, vec![SelectionNode::FragmentSpread("F".into())]);
        assert_eq!(doc.fragments["F"].len(), 2);
    }

    #[test]
    fn test_walk_expands_fragments_without_adding_depth() {
        let doc = document(concat!(
            "{ users { ...U ... on User { posts { id } } } } ",
            "fragment U on User { id profile { id } }",
        ));

        assert_eq!(
            trace(&doc),
            vec![
                (0, "users".to_string()),
                (1, "id".to_string()),
                (1, "profile".to_string()),
                (2, "id".to_string()),
                (1, "posts".to_string()),
                (2, "id".to_string()),
            ]
        );
    }

    #[test]
    fn test_walk_stops_at_fragment_cycles() {
        let doc = document(
            "{ users { ...A } } fragment A on User { id subscribedToUser { ...A } }",
        );

        assert_eq!(
            trace(&doc),
            vec![
                (0, "users".to_string()),
                (1, "id".to_string()),
                (1, "subscribedToUser".to_string()),
            ]
        );
    }

    #[test]
    fn test_operation_selection() {
        let doc = document("query A { users { id } } query B { posts { id } }");
        assert_eq!(doc.operation(Some("B")).and_then(|op| op.name.as_deref()), Some("B"));
        assert!(doc.operation(None).is_none());
        assert!(doc.operation(Some("C")).is_none());

        let single = document("{ users { id } }");
        assert!(single.operation(None).is_some());
    }
}
