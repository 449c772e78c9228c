//! Immutable node templates.
//!
//! A template is declared once and shared by every agent that runs it: [`crate::BehTree::new`]
//! lays it out into a per-agent arena, so nothing here carries per-instance state. Cloning a
//! template only bumps reference counts on the author-supplied closures.

use std::fmt;
use std::rc::Rc;

use ai_core::{Blackboard, WorldView};

use crate::leaf::Leaf;
use crate::{TreeWorld, UtilityConfig};

pub(crate) type PredicateFn<W> = Rc<dyn Fn(&W, <W as WorldView>::Agent) -> bool>;
pub(crate) type UtilityFn<A> = Rc<dyn Fn(&Blackboard<A>) -> f32>;

/// Behavior tree template.
pub struct Node<W>
where
    W: TreeWorld,
{
    pub(crate) kind: NodeKind<W>,
}

pub(crate) enum NodeKind<W>
where
    W: TreeWorld,
{
    Sequence(Vec<Node<W>>),
    Select(Vec<Node<W>>),
    UtilitySelect {
        children: Vec<Scored<W>>,
        config: UtilityConfig,
    },
    Parallel(Vec<Node<W>>),
    Race(Vec<Node<W>>),
    Repeat(Box<Node<W>>),
    Predicate {
        predicate: PredicateFn<W>,
        child: Box<Node<W>>,
    },
    Leaf(Leaf<W>),
}

/// A utility-select child paired with its scoring function.
pub struct Scored<W>
where
    W: TreeWorld,
{
    pub(crate) node: Node<W>,
    pub(crate) utility: UtilityFn<W::Agent>,
}

impl<W> Clone for Scored<W>
where
    W: TreeWorld,
{
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            utility: Rc::clone(&self.utility),
        }
    }
}

impl<W> Clone for Node<W>
where
    W: TreeWorld,
{
    fn clone(&self) -> Self {
        let kind = match &self.kind {
            NodeKind::Sequence(children) => NodeKind::Sequence(children.clone()),
            NodeKind::Select(children) => NodeKind::Select(children.clone()),
            NodeKind::UtilitySelect { children, config } => NodeKind::UtilitySelect {
                children: children.clone(),
                config: *config,
            },
            NodeKind::Parallel(children) => NodeKind::Parallel(children.clone()),
            NodeKind::Race(children) => NodeKind::Race(children.clone()),
            NodeKind::Repeat(child) => NodeKind::Repeat(child.clone()),
            NodeKind::Predicate { predicate, child } => NodeKind::Predicate {
                predicate: Rc::clone(predicate),
                child: child.clone(),
            },
            NodeKind::Leaf(leaf) => NodeKind::Leaf(leaf.clone()),
        };
        Self { kind }
    }
}

impl<W> fmt::Debug for Node<W>
where
    W: TreeWorld,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_tuple(self.name());
        for child in self.children() {
            out.field(child);
        }
        out.finish()
    }
}

impl<W> Node<W>
where
    W: TreeWorld,
{
    pub(crate) fn from_leaf(leaf: Leaf<W>) -> Self {
        Self {
            kind: NodeKind::Leaf(leaf),
        }
    }

    pub fn name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Sequence(_) => "sequence",
            NodeKind::Select(_) => "select",
            NodeKind::UtilitySelect { .. } => "utility_select",
            NodeKind::Parallel(_) => "parallel",
            NodeKind::Race(_) => "race",
            NodeKind::Repeat(_) => "repeat",
            NodeKind::Predicate { .. } => "predicate",
            NodeKind::Leaf(leaf) => leaf.name(),
        }
    }

    /// Direct children in declared order.
    pub fn children(&self) -> Vec<&Node<W>> {
        match &self.kind {
            NodeKind::Sequence(children)
            | NodeKind::Select(children)
            | NodeKind::Parallel(children)
            | NodeKind::Race(children) => children.iter().collect(),
            NodeKind::UtilitySelect { children, .. } => children.iter().map(|c| &c.node).collect(),
            NodeKind::Repeat(child) | NodeKind::Predicate { child, .. } => vec![&**child],
            NodeKind::Leaf(_) => Vec::new(),
        }
    }

    /// Number of nodes in this subtree, itself included.
    pub fn size(&self) -> usize {
        1 + self.children().into_iter().map(Node::size).sum::<usize>()
    }
}

/// Run children in order until one fails. Empty sequences succeed.
pub fn sequence<W>(children: Vec<Node<W>>) -> Node<W>
where
    W: TreeWorld,
{
    Node {
        kind: NodeKind::Sequence(children),
    }
}

/// Run children in order until one succeeds. Empty selects fail.
pub fn select<W>(children: Vec<Node<W>>) -> Node<W>
where
    W: TreeWorld,
{
    Node {
        kind: NodeKind::Select(children),
    }
}

/// Pair a child with the utility that weights it inside [`utility_select`].
pub fn scored<W>(
    node: Node<W>,
    utility: impl Fn(&Blackboard<W::Agent>) -> f32 + 'static,
) -> Scored<W>
where
    W: TreeWorld,
{
    Scored {
        node,
        utility: Rc::new(utility),
    }
}

/// Like [`select`], but the next child is drawn at random, weighted by utility minus a
/// recently-tried bias.
pub fn utility_select<W>(children: Vec<Scored<W>>) -> Node<W>
where
    W: TreeWorld,
{
    utility_select_with(UtilityConfig::default(), children)
}

pub fn utility_select_with<W>(config: UtilityConfig, children: Vec<Scored<W>>) -> Node<W>
where
    W: TreeWorld,
{
    Node {
        kind: NodeKind::UtilitySelect { children, config },
    }
}

/// Start every child in the same call. Succeeds once all succeed; the first failure cancels the
/// rest.
pub fn parallel<W>(children: Vec<Node<W>>) -> Node<W>
where
    W: TreeWorld,
{
    Node {
        kind: NodeKind::Parallel(children),
    }
}

/// Start every child in the same call; the first to finish decides and the rest are cancelled.
///
/// An empty race fails.
pub fn race<W>(children: Vec<Node<W>>) -> Node<W>
where
    W: TreeWorld,
{
    Node {
        kind: NodeKind::Race(children),
    }
}

/// Re-run `child` once per turn until it fails. Never succeeds.
pub fn repeat<W>(child: Node<W>) -> Node<W>
where
    W: TreeWorld,
{
    Node {
        kind: NodeKind::Repeat(Box::new(child)),
    }
}

/// Guard `child` with a check on the agent's components; fails without starting the child when
/// the check is false.
pub fn predicate<W>(check: impl Fn(&W, W::Agent) -> bool + 'static, child: Node<W>) -> Node<W>
where
    W: TreeWorld,
{
    Node {
        kind: NodeKind::Predicate {
            predicate: Rc::new(check),
            child: Box::new(child),
        },
    }
}
