use std::collections::BTreeMap;
use std::convert::Infallible;

use super::{walk, FieldNode, OperationNode, SelectionDocument, SelectionVisitor, Visit};

/// Requested sub-fields of one field, merged across fragments
///
/// Children are keyed by field name, not alias, so two aliased selections
/// of the same field collapse into one entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldTree {
    children: BTreeMap<String, FieldTree>,
}

impl FieldTree {
    pub fn contains(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    pub fn child(&self, name: &str) -> Option<&FieldTree> {
        self.children.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    fn merge(&mut self, other: FieldTree) {
        for (name, tree) in other.children {
            self.children.entry(name).or_default().merge(tree);
        }
    }
}

/// Field trees of every root field of the executed operation
///
/// Directives are not evaluated, so a field under `@skip(if: true)` still
/// appears here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionShape {
    roots: BTreeMap<String, FieldTree>,
}

impl SelectionShape {
    pub fn of(document: &SelectionDocument, operation: &OperationNode) -> Self {
        let mut builder = ShapeBuilder::default();
        if let Err(never) = walk(document, &operation.selections, &mut builder) {
            match never {}
        }
        Self {
            roots: builder.roots,
        }
    }

    /// Tree of the root field answered under `response_key`
    pub fn root(&self, response_key: &str) -> Option<&FieldTree> {
        self.roots.get(response_key)
    }
}

#[derive(Default)]
struct ShapeBuilder {
    roots: BTreeMap<String, FieldTree>,
    open: Vec<(String, FieldTree)>,
}

impl SelectionVisitor for ShapeBuilder {
    type Error = Infallible;

    fn enter_field(&mut self, field: &FieldNode, depth: usize) -> Result<Visit, Infallible> {
        let key = if depth == 0 {
            field.response_key()
        } else {
            field.name.as_str()
        };
        self.open.push((key.to_string(), FieldTree::default()));
        Ok(Visit::Descend)
    }

    fn leave_field(&mut self, _field: &FieldNode) {
        let Some((key, tree)) = self.open.pop() else {
            return;
        };
        let siblings = match self.open.last_mut() {
            Some((_, parent)) => &mut parent.children,
            None => &mut self.roots,
        };
        siblings.entry(key).or_default().merge(tree);
    }
}
