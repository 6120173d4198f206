use std::collections::BTreeMap;

use serde::Serialize;

use crate::span::{Position, Span};

pub type NodeId = usize;

pub const ROOT: NodeId = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub name: String,
    pub span: Span,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    #[serde(flatten)]
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    String { argument: String },
    Map { entries: BTreeMap<String, String> },
    Closure(ClosureBody),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClosureBody {
    pub children: Vec<NodeId>,
    pub assignments: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_argument: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_argument: Option<BTreeMap<String, String>>,
    /// `None` only for the implicit root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub braces: Option<Braces>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Braces {
    pub open: Position,
    /// Position of the closing `}`; `None` when the document ends inside the body.
    pub close: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub target_path: String,
    pub literal_value: String,
    pub span: Span,
    pub owner: NodeId,
}

/// Arena of invocations; index [`ROOT`] is the implicit document-wide closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationTree {
    nodes: Vec<Invocation>,
    assignments: Vec<Assignment>,
}

#[derive(Debug, Clone, Copy)]
pub(super) struct Checkpoint {
    nodes: usize,
    assignments: usize,
    parent: NodeId,
    parent_children: usize,
}

impl InvocationTree {
    pub(super) fn with_root(document: Span) -> Self {
        Self {
            nodes: vec![Invocation {
                name: String::new(),
                span: document,
                parent: None,
                shape: Shape::Closure(ClosureBody::default()),
            }],
            assignments: Vec::new(),
        }
    }

    pub(super) fn push_node(&mut self, parent: NodeId, invocation: Invocation) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Invocation {
            parent: Some(parent),
            ..invocation
        });
        if let Some(body) = self.closure_body_mut(parent) {
            body.children.push(id);
        }
        id
    }

    pub(super) fn push_assignment(&mut self, assignment: Assignment) {
        let index = self.assignments.len();
        let owner = assignment.owner;
        self.assignments.push(assignment);
        if let Some(body) = self.closure_body_mut(owner) {
            body.assignments.push(index);
        }
    }

    pub(super) fn node_mut(&mut self, id: NodeId) -> &mut Invocation {
        &mut self.nodes[id]
    }

    fn closure_body_mut(&mut self, id: NodeId) -> Option<&mut ClosureBody> {
        match &mut self.nodes.get_mut(id)?.shape {
            Shape::Closure(body) => Some(body),
            _ => None,
        }
    }

    pub(super) fn checkpoint(&self, parent: NodeId) -> Checkpoint {
        Checkpoint {
            nodes: self.nodes.len(),
            assignments: self.assignments.len(),
            parent,
            parent_children: self.children(parent).len(),
        }
    }

    pub(super) fn rollback(&mut self, checkpoint: Checkpoint) {
        self.nodes.truncate(checkpoint.nodes);
        self.assignments.truncate(checkpoint.assignments);
        if let Some(body) = self.closure_body_mut(checkpoint.parent) {
            body.children.truncate(checkpoint.parent_children);
            body.assignments
                .retain(|index| *index < checkpoint.assignments);
        }
    }

    pub fn root(&self) -> &Invocation {
        &self.nodes[ROOT]
    }

    pub fn node(&self, id: NodeId) -> &Invocation {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1 && self.assignments.is_empty()
    }

    pub fn closure_body(&self, id: NodeId) -> Option<&ClosureBody> {
        match &self.nodes.get(id)?.shape {
            Shape::Closure(body) => Some(body),
            _ => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.closure_body(id)
            .map_or(&[], |body| body.children.as_slice())
    }

    pub fn assignments_of(&self, id: NodeId) -> impl Iterator<Item = &Assignment> + '_ {
        self.closure_body(id)
            .into_iter()
            .flat_map(|body| body.assignments.iter())
            .map(|index| &self.assignments[*index])
    }

    pub fn all_assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// First child of `id` called `name`; later duplicates are shadowed.
    pub fn child_named(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|child| self.nodes[*child].name == name)
    }

    pub fn assignment_at(&self, id: NodeId, target_path: &str) -> Option<&Assignment> {
        self.assignments_of(id)
            .find(|assignment| assignment.target_path == target_path)
    }

    /// Every closure whose root-anchored chain of names equals `path`,
    /// across duplicated blocks at any level. An empty path yields the root.
    pub fn all_invocations_at_path(&self, path: &[&str]) -> Vec<NodeId> {
        let mut frontier = vec![ROOT];
        for segment in path {
            frontier = frontier
                .iter()
                .flat_map(|parent| self.children(*parent).iter().copied())
                .filter(|child| {
                    let node = &self.nodes[*child];
                    node.name == *segment && matches!(node.shape, Shape::Closure(_))
                })
                .collect();
            if frontier.is_empty() {
                break;
            }
        }
        frontier
    }

    /// Children of every closure at `path`, in document order.
    pub fn invocations_under(&self, path: &[&str]) -> Vec<NodeId> {
        self.all_invocations_at_path(path)
            .into_iter()
            .flat_map(|closure| self.children(closure).iter().copied())
            .collect()
    }
}
