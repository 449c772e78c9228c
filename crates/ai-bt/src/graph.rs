//! Per-agent node arena.
//!
//! A template is laid out depth-first into a flat slot vector; every slot knows its parent and
//! its position among the parent's children. `execute` answers synchronously when it can and
//! returns `None` when the node suspended. A suspended node that later finishes (woken through a
//! registry) hands its signal to its parent through [`Graph::wake`], which walks parent indices
//! until some ancestor suspends again or the root finishes.

use std::fmt::Write as _;

use ai_core::rng::derive_seed;
use ai_core::{AgentId, Blackboard, DeterministicRng, EventId, SplitMix64, TickContext};

use crate::leaf::Leaf;
use crate::node::{NodeKind, PredicateFn, UtilityFn};
use crate::{ActingNodes, Node, ReactingNodes, Signal, TreeWorld, UtilityConfig};

/// Handle of a node inside one tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Everything a node may touch while it runs.
pub(crate) struct Cx<'a, W>
where
    W: TreeWorld,
{
    pub ctx: &'a TickContext,
    pub agent: W::Agent,
    pub world: &'a mut W,
    pub acting: &'a mut ActingNodes,
    pub reacting: &'a mut ReactingNodes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Order {
    Sequence,
    Select,
}

impl Order {
    /// Whether a child's signal ends the whole composite.
    fn decides(self, signal: Signal) -> bool {
        match self {
            Order::Sequence => signal == Signal::Failure,
            Order::Select => signal == Signal::Success,
        }
    }

    fn exhausted(self) -> Signal {
        match self {
            Order::Sequence => Signal::Success,
            Order::Select => Signal::Failure,
        }
    }
}

struct Utility<A: 'static> {
    children: Vec<NodeId>,
    utilities: Vec<UtilityFn<A>>,
    bias: Vec<f32>,
    tried: Vec<bool>,
    current: Option<usize>,
    /// Seeded on the first execute, from the tick's global seed.
    rng: Option<SplitMix64>,
    config: UtilityConfig,
}

enum Kind<W>
where
    W: TreeWorld,
{
    Ordered {
        order: Order,
        children: Vec<NodeId>,
        current: usize,
    },
    Utility(Utility<W::Agent>),
    Parallel {
        children: Vec<NodeId>,
        outstanding: Vec<bool>,
        succeeded: usize,
    },
    Race {
        children: Vec<NodeId>,
        outstanding: Vec<bool>,
    },
    Repeat {
        child: NodeId,
    },
    Predicate {
        predicate: PredicateFn<W>,
        child: NodeId,
    },
    Leaf(Leaf<W>),
}

#[derive(Debug, Clone, Copy)]
enum Tag {
    Ordered,
    Utility,
    Parallel,
    Race,
    Repeat,
    Predicate,
    Leaf,
}

impl<W> Kind<W>
where
    W: TreeWorld,
{
    fn tag(&self) -> Tag {
        match self {
            Kind::Ordered { .. } => Tag::Ordered,
            Kind::Utility(_) => Tag::Utility,
            Kind::Parallel { .. } => Tag::Parallel,
            Kind::Race { .. } => Tag::Race,
            Kind::Repeat { .. } => Tag::Repeat,
            Kind::Predicate { .. } => Tag::Predicate,
            Kind::Leaf(_) => Tag::Leaf,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Kind::Ordered {
                order: Order::Sequence,
                ..
            } => "sequence",
            Kind::Ordered {
                order: Order::Select,
                ..
            } => "select",
            Kind::Utility(_) => "utility_select",
            Kind::Parallel { .. } => "parallel",
            Kind::Race { .. } => "race",
            Kind::Repeat { .. } => "repeat",
            Kind::Predicate { .. } => "predicate",
            Kind::Leaf(leaf) => leaf.name(),
        }
    }

    fn children(&self) -> &[NodeId] {
        match self {
            Kind::Ordered { children, .. }
            | Kind::Parallel { children, .. }
            | Kind::Race { children, .. } => children,
            Kind::Utility(utility) => &utility.children,
            Kind::Repeat { child } | Kind::Predicate { child, .. } => std::slice::from_ref(child),
            Kind::Leaf(_) => &[],
        }
    }
}

struct Slot<W>
where
    W: TreeWorld,
{
    parent: Option<NodeId>,
    index: usize,
    running: bool,
    kind: Kind<W>,
}

pub(crate) struct Graph<W>
where
    W: TreeWorld,
{
    slots: Vec<Slot<W>>,
}

impl<W> Graph<W>
where
    W: TreeWorld,
{
    /// Lay `template` out. The root lands at [`NodeId::ROOT`].
    pub(crate) fn layout(template: &Node<W>) -> Self {
        let mut graph = Self {
            slots: Vec::with_capacity(template.size()),
        };
        graph.place(template, None, 0);
        graph
    }

    fn place(&mut self, node: &Node<W>, parent: Option<NodeId>, index: usize) -> NodeId {
        let id = NodeId(u32::try_from(self.slots.len()).expect("tree exceeds u32 node ids"));
        // Children are placed after their parent, so reserve the slot first.
        self.slots.push(Slot {
            parent,
            index,
            running: false,
            kind: Kind::Leaf(Leaf::Succeed),
        });

        let kind = match &node.kind {
            NodeKind::Sequence(children) => Kind::Ordered {
                order: Order::Sequence,
                children: self.place_all(children.iter(), id),
                current: 0,
            },
            NodeKind::Select(children) => Kind::Ordered {
                order: Order::Select,
                children: self.place_all(children.iter(), id),
                current: 0,
            },
            NodeKind::UtilitySelect { children, config } => {
                let ids = self.place_all(children.iter().map(|c| &c.node), id);
                let n = ids.len();
                Kind::Utility(Utility {
                    children: ids,
                    utilities: children.iter().map(|c| c.utility.clone()).collect(),
                    bias: vec![0.0; n],
                    tried: vec![false; n],
                    current: None,
                    rng: None,
                    config: *config,
                })
            }
            NodeKind::Parallel(children) => {
                let children = self.place_all(children.iter(), id);
                Kind::Parallel {
                    outstanding: vec![false; children.len()],
                    children,
                    succeeded: 0,
                }
            }
            NodeKind::Race(children) => {
                let children = self.place_all(children.iter(), id);
                Kind::Race {
                    outstanding: vec![false; children.len()],
                    children,
                }
            }
            NodeKind::Repeat(child) => Kind::Repeat {
                child: self.place(child, Some(id), 0),
            },
            NodeKind::Predicate { predicate, child } => Kind::Predicate {
                predicate: predicate.clone(),
                child: self.place(child, Some(id), 0),
            },
            NodeKind::Leaf(leaf) => Kind::Leaf(leaf.clone()),
        };
        self.slots[id.index()].kind = kind;
        id
    }

    fn place_all<'n>(
        &mut self,
        children: impl Iterator<Item = &'n Node<W>>,
        parent: NodeId,
    ) -> Vec<NodeId> {
        children
            .enumerate()
            .map(|(i, child)| self.place(child, Some(parent), i))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn is_running(&self, id: NodeId) -> bool {
        self.slots[id.index()].running
    }

    /// Events any `wait_event` leaf in this arena can wait on.
    pub(crate) fn waited_events(&self) -> impl Iterator<Item = EventId> + '_ {
        self.slots.iter().filter_map(|slot| match &slot.kind {
            Kind::Leaf(leaf) => leaf.waits_on(),
            _ => None,
        })
    }

    pub(crate) fn execute(&mut self, id: NodeId, cx: &mut Cx<'_, W>) -> Option<Signal> {
        let slot = &mut self.slots[id.index()];
        assert!(!slot.running, "execute on already running {id:?}");
        slot.running = true;

        match slot.kind.tag() {
            Tag::Ordered => self.advance_ordered(id, cx),
            Tag::Utility => {
                self.begin_utility(id, cx);
                self.advance_utility(id, cx)
            }
            Tag::Parallel => self.start_parallel(id, cx),
            Tag::Race => self.start_race(id, cx),
            Tag::Repeat => {
                cx.acting.register(id);
                self.run_repeat_child(id, cx)
            }
            Tag::Predicate => self.start_predicate(id, cx),
            Tag::Leaf => {
                let Kind::Leaf(leaf) = &self.slots[id.index()].kind else {
                    unreachable!()
                };
                let signal = leaf.execute(id, cx)?;
                Some(self.finish(id, signal))
            }
        }
    }

    /// Stop a suspended node and everything it started. Emits no signal.
    pub(crate) fn cancel(&mut self, id: NodeId, cx: &mut Cx<'_, W>) {
        assert!(self.is_running(id), "cancel on idle {id:?}");

        match self.slots[id.index()].kind.tag() {
            Tag::Ordered => {
                let child = match &self.slots[id.index()].kind {
                    Kind::Ordered {
                        children, current, ..
                    } => children[*current],
                    _ => unreachable!(),
                };
                self.cancel(child, cx);
            }
            Tag::Utility => {
                let child = match &self.slots[id.index()].kind {
                    Kind::Utility(u) => u.current.map(|i| u.children[i]),
                    _ => unreachable!(),
                };
                if let Some(child) = child {
                    self.cancel(child, cx);
                }
            }
            Tag::Parallel | Tag::Race => self.cancel_outstanding(id, cx),
            Tag::Repeat | Tag::Predicate => {
                if matches!(self.slots[id.index()].kind, Kind::Repeat { .. }) {
                    cx.acting.deregister(id);
                }
                let child = self.only_child(id);
                if self.is_running(child) {
                    self.cancel(child, cx);
                }
            }
            Tag::Leaf => {
                let Kind::Leaf(leaf) = &self.slots[id.index()].kind else {
                    unreachable!()
                };
                leaf.cancel(id, cx);
            }
        }
        self.reset(id);
    }

    /// Act on a node pulled from a registry, then deliver whatever it signals up the tree.
    ///
    /// Returns the root's signal if the whole tree finished.
    pub(crate) fn wake(&mut self, id: NodeId, cx: &mut Cx<'_, W>) -> Option<Signal> {
        debug_assert!(self.is_running(id), "woke idle {id:?}");
        tracing::trace!(turn = cx.ctx.turn, node = id.index(), "wake");

        let signal = match self.slots[id.index()].kind.tag() {
            Tag::Repeat => {
                let child = self.only_child(id);
                if self.is_running(child) {
                    None
                } else {
                    self.run_repeat_child(id, cx)
                }
            }
            Tag::Leaf => {
                let Kind::Leaf(leaf) = &self.slots[id.index()].kind else {
                    unreachable!()
                };
                let signal = leaf.act(id, cx)?;
                Some(self.finish(id, signal))
            }
            _ => unreachable!("{id:?} never registers for wake-ups"),
        }?;
        self.propagate(id, signal, cx)
    }

    fn propagate(
        &mut self,
        mut id: NodeId,
        mut signal: Signal,
        cx: &mut Cx<'_, W>,
    ) -> Option<Signal> {
        while let Some(parent) = self.slots[id.index()].parent {
            signal = self.on_child(parent, id, signal, cx)?;
            id = parent;
        }
        Some(signal)
    }

    /// A child of `id` finished after having suspended.
    fn on_child(
        &mut self,
        id: NodeId,
        child: NodeId,
        signal: Signal,
        cx: &mut Cx<'_, W>,
    ) -> Option<Signal> {
        let index = self.slots[child.index()].index;
        match self.slots[id.index()].kind.tag() {
            Tag::Ordered => {
                if self.order(id).decides(signal) {
                    Some(self.finish(id, signal))
                } else {
                    self.step_ordered(id);
                    self.advance_ordered(id, cx)
                }
            }
            Tag::Utility => match self.utility_attempted(id, signal) {
                Some(done) => Some(done),
                None => self.advance_utility(id, cx),
            },
            Tag::Parallel => self.parallel_child_done(id, index, signal, cx),
            Tag::Race => Some(self.race_child_done(id, index, signal, cx)),
            Tag::Repeat => match signal {
                Signal::Failure => {
                    cx.acting.deregister(id);
                    Some(self.finish(id, Signal::Failure))
                }
                Signal::Success => None,
            },
            Tag::Predicate => Some(self.finish(id, signal)),
            Tag::Leaf => unreachable!("leaves have no children"),
        }
    }

    fn finish(&mut self, id: NodeId, signal: Signal) -> Signal {
        self.reset(id);
        signal
    }

    fn reset(&mut self, id: NodeId) {
        let slot = &mut self.slots[id.index()];
        slot.running = false;
        match &mut slot.kind {
            Kind::Ordered { current, .. } => *current = 0,
            Kind::Utility(u) => {
                u.current = None;
                u.tried.fill(false);
            }
            Kind::Parallel {
                outstanding,
                succeeded,
                ..
            } => {
                outstanding.fill(false);
                *succeeded = 0;
            }
            Kind::Race { outstanding, .. } => outstanding.fill(false),
            Kind::Repeat { .. } | Kind::Predicate { .. } | Kind::Leaf(_) => {}
        }
    }

    fn only_child(&self, id: NodeId) -> NodeId {
        match &self.slots[id.index()].kind {
            Kind::Repeat { child } | Kind::Predicate { child, .. } => *child,
            _ => unreachable!("{id:?} is not an adapter"),
        }
    }

    fn order(&self, id: NodeId) -> Order {
        match &self.slots[id.index()].kind {
            Kind::Ordered { order, .. } => *order,
            _ => unreachable!(),
        }
    }

    fn step_ordered(&mut self, id: NodeId) {
        if let Kind::Ordered { current, .. } = &mut self.slots[id.index()].kind {
            *current += 1;
        }
    }

    fn advance_ordered(&mut self, id: NodeId, cx: &mut Cx<'_, W>) -> Option<Signal> {
        loop {
            let (order, next) = match &self.slots[id.index()].kind {
                Kind::Ordered {
                    order,
                    children,
                    current,
                } => (*order, children.get(*current).copied()),
                _ => unreachable!(),
            };
            let Some(child) = next else {
                return Some(self.finish(id, order.exhausted()));
            };
            match self.execute(child, cx) {
                None => return None,
                Some(signal) if order.decides(signal) => return Some(self.finish(id, signal)),
                Some(_) => self.step_ordered(id),
            }
        }
    }

    fn utility(&mut self, id: NodeId) -> &mut Utility<W::Agent> {
        match &mut self.slots[id.index()].kind {
            Kind::Utility(u) => u,
            _ => unreachable!(),
        }
    }

    /// Per-child bias and tried flags of a utility select, `None` for any other node.
    pub(crate) fn utility_state(&self, id: NodeId) -> Option<(&[f32], &[bool])> {
        match &self.slots.get(id.index())?.kind {
            Kind::Utility(u) => Some((&u.bias, &u.tried)),
            _ => None,
        }
    }

    fn begin_utility(&mut self, id: NodeId, cx: &Cx<'_, W>) {
        let seed = derive_seed(cx.ctx.seed, cx.agent.stable_id(), u64::from(id.0));
        let u = self.utility(id);
        u.rng.get_or_insert_with(|| SplitMix64::new(seed));
        for bias in u.bias.iter_mut() {
            *bias = u.config.decayed(*bias);
        }
    }

    fn advance_utility(&mut self, id: NodeId, cx: &mut Cx<'_, W>) -> Option<Signal> {
        loop {
            let Some(pick) = self.pick_utility(id, cx) else {
                return Some(self.finish(id, Signal::Failure));
            };
            let child = {
                let u = self.utility(id);
                u.current = Some(pick);
                u.children[pick]
            };
            let signal = self.execute(child, cx)?;
            if let Some(done) = self.utility_attempted(id, signal) {
                return Some(done);
            }
        }
    }

    /// Book an attempt on the current child. Returns the selector's own signal once it is
    /// decided.
    fn utility_attempted(&mut self, id: NodeId, signal: Signal) -> Option<Signal> {
        let u = self.utility(id);
        let tried = u.current.take().expect("utility select has no current child");
        u.tried[tried] = true;
        u.bias[tried] = u.config.increased(u.bias[tried]);
        match signal {
            Signal::Success => Some(self.finish(id, Signal::Success)),
            Signal::Failure => None,
        }
    }

    fn pick_utility(&mut self, id: NodeId, cx: &Cx<'_, W>) -> Option<usize> {
        let empty;
        let bb = match cx.world.blackboard(cx.agent) {
            Some(bb) => bb,
            None => {
                empty = Blackboard::new();
                &empty
            }
        };

        let u = self.utility(id);
        let scores: Vec<Option<f32>> = (0..u.children.len())
            .map(|i| (!u.tried[i]).then(|| (u.utilities[i])(bb) - u.bias[i]))
            .collect();
        let weights: Vec<f32> = scores
            .iter()
            .map(|s| s.map_or(0.0, |s| s.max(0.0)))
            .collect();

        let rng = u.rng.as_mut().expect("utility select picked before it was seeded");
        // Nothing positive left: fall back to the best adjusted score among untried children.
        rng.pick_weighted(&weights).or_else(|| {
            scores
                .iter()
                .enumerate()
                .filter_map(|(i, s)| s.map(|s| (i, s)))
                .fold(None, |best: Option<(usize, f32)>, (i, s)| match best {
                    Some((_, b)) if b >= s => best,
                    _ => Some((i, s)),
                })
                .map(|(i, _)| i)
        })
    }

    fn fanout(&mut self, id: NodeId) -> (&[NodeId], &mut [bool]) {
        match &mut self.slots[id.index()].kind {
            Kind::Parallel {
                children,
                outstanding,
                ..
            }
            | Kind::Race {
                children,
                outstanding,
            } => (children.as_slice(), outstanding.as_mut_slice()),
            _ => unreachable!("{id:?} does not fan out"),
        }
    }

    /// Mark child `index` outstanding and run it.
    fn launch(&mut self, id: NodeId, index: usize, cx: &mut Cx<'_, W>) -> Option<Signal> {
        let child = {
            let (children, outstanding) = self.fanout(id);
            outstanding[index] = true;
            children[index]
        };
        self.execute(child, cx)
    }

    fn cancel_outstanding(&mut self, id: NodeId, cx: &mut Cx<'_, W>) {
        let pending: Vec<NodeId> = {
            let (children, outstanding) = self.fanout(id);
            children
                .iter()
                .zip(outstanding.iter_mut())
                .filter_map(|(child, out)| std::mem::take(out).then_some(*child))
                .collect()
        };
        for child in pending {
            self.cancel(child, cx);
        }
    }

    fn start_parallel(&mut self, id: NodeId, cx: &mut Cx<'_, W>) -> Option<Signal> {
        let n = self.slots[id.index()].kind.children().len();
        if n == 0 {
            return Some(self.finish(id, Signal::Success));
        }
        for i in 0..n {
            if let Some(signal) = self.launch(id, i, cx) {
                if let Some(done) = self.parallel_child_done(id, i, signal, cx) {
                    return Some(done);
                }
            }
        }
        None
    }

    fn parallel_child_done(
        &mut self,
        id: NodeId,
        index: usize,
        signal: Signal,
        cx: &mut Cx<'_, W>,
    ) -> Option<Signal> {
        let (total, succeeded) = match &mut self.slots[id.index()].kind {
            Kind::Parallel {
                children,
                outstanding,
                succeeded,
            } => {
                outstanding[index] = false;
                if signal == Signal::Success {
                    *succeeded += 1;
                }
                (children.len(), *succeeded)
            }
            _ => unreachable!(),
        };

        match signal {
            Signal::Failure => {
                self.cancel_outstanding(id, cx);
                Some(self.finish(id, Signal::Failure))
            }
            Signal::Success if succeeded == total => Some(self.finish(id, Signal::Success)),
            Signal::Success => None,
        }
    }

    fn start_race(&mut self, id: NodeId, cx: &mut Cx<'_, W>) -> Option<Signal> {
        let n = self.slots[id.index()].kind.children().len();
        if n == 0 {
            return Some(self.finish(id, Signal::Failure));
        }
        for i in 0..n {
            if let Some(signal) = self.launch(id, i, cx) {
                return Some(self.race_child_done(id, i, signal, cx));
            }
        }
        None
    }

    fn race_child_done(
        &mut self,
        id: NodeId,
        index: usize,
        signal: Signal,
        cx: &mut Cx<'_, W>,
    ) -> Signal {
        self.fanout(id).1[index] = false;
        self.cancel_outstanding(id, cx);
        self.finish(id, signal)
    }

    fn run_repeat_child(&mut self, id: NodeId, cx: &mut Cx<'_, W>) -> Option<Signal> {
        let child = self.only_child(id);
        match self.execute(child, cx) {
            Some(Signal::Failure) => {
                cx.acting.deregister(id);
                Some(self.finish(id, Signal::Failure))
            }
            Some(Signal::Success) | None => None,
        }
    }

    fn start_predicate(&mut self, id: NodeId, cx: &mut Cx<'_, W>) -> Option<Signal> {
        let (passed, child) = match &self.slots[id.index()].kind {
            Kind::Predicate { predicate, child } => (predicate(&*cx.world, cx.agent), *child),
            _ => unreachable!(),
        };
        if !passed {
            return Some(self.finish(id, Signal::Failure));
        }
        let signal = self.execute(child, cx)?;
        Some(self.finish(id, signal))
    }

    /// Indented dump of the arena, one node per line, running nodes flagged.
    pub(crate) fn describe(&self) -> String {
        let mut out = String::new();
        if !self.slots.is_empty() {
            self.describe_into(NodeId::ROOT, 0, &mut out);
        }
        out
    }

    fn describe_into(&self, id: NodeId, depth: usize, out: &mut String) {
        let slot = &self.slots[id.index()];
        let _ = writeln!(
            out,
            "{:indent$}{}{}",
            "",
            slot.kind.name(),
            if slot.running { " [running]" } else { "" },
            indent = depth * 2
        );
        for child in slot.kind.children() {
            self.describe_into(*child, depth + 1, out);
        }
    }
}
