use std::collections::BTreeMap;

use ai_core::TickContext;

use crate::{BehTree, Node, TreeWorld};

/// Every agent's tree, driven pass by pass in ascending agent order.
pub struct Forest<W>
where
    W: TreeWorld,
{
    trees: BTreeMap<W::Agent, BehTree<W>>,
}

impl<W> Default for Forest<W>
where
    W: TreeWorld,
{
    fn default() -> Self {
        Self {
            trees: BTreeMap::new(),
        }
    }
}

impl<W> Forest<W>
where
    W: TreeWorld,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tree, replacing (and returning) any tree the agent already had.
    pub fn insert(&mut self, tree: BehTree<W>) -> Option<BehTree<W>> {
        self.trees.insert(tree.agent(), tree)
    }

    /// Instance `template` for `agent`.
    pub fn plant(&mut self, agent: W::Agent, template: &Node<W>) -> Option<BehTree<W>> {
        self.insert(BehTree::new(agent, template))
    }

    pub fn remove(&mut self, agent: W::Agent) -> Option<BehTree<W>> {
        self.trees.remove(&agent)
    }

    pub fn get(&self, agent: W::Agent) -> Option<&BehTree<W>> {
        self.trees.get(&agent)
    }

    pub fn get_mut(&mut self, agent: W::Agent) -> Option<&mut BehTree<W>> {
        self.trees.get_mut(&agent)
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn agents(&self) -> impl Iterator<Item = W::Agent> + '_ {
        self.trees.keys().copied()
    }

    /// Drop the trees of agents that died or left the world.
    pub fn retain_alive(&mut self, world: &W) {
        self.trees.retain(|agent, _| world.is_alive(*agent));
    }

    pub fn react_all(&mut self, ctx: &TickContext, world: &mut W) {
        for tree in self.trees.values_mut() {
            tree.react(ctx, world);
        }
    }

    pub fn execute_all(&mut self, ctx: &TickContext, world: &mut W) {
        for tree in self.trees.values_mut() {
            tree.execute(ctx, world);
        }
    }

    pub fn act_all(&mut self, ctx: &TickContext, world: &mut W) {
        for tree in self.trees.values_mut() {
            tree.act(ctx, world);
        }
    }
}
