use std::collections::BTreeSet;
use std::fmt;

use ai_core::{AgentId, EventId, TickContext};
use ai_tools::{TraceEvent, TraceSink, Tracer};

use crate::graph::{Cx, Graph, NodeId};
use crate::{ActingNodes, BtStatus, Node, ReactingNodes, Signal, TreeWorld};

/// One agent's instance of a tree template.
///
/// `execute` is a no-op while the tree is running: the root is started at most once until it
/// signals. Suspended nodes make progress through [`BehTree::react`] (event wake-ups) and
/// [`BehTree::act`] (per-turn ticks).
pub struct BehTree<W>
where
    W: TreeWorld,
{
    agent: W::Agent,
    template: Node<W>,
    graph: Graph<W>,
    acting: ActingNodes,
    reacting: ReactingNodes,
    running: bool,
    tracked: bool,
    tracer: Tracer,
}

impl<W> fmt::Debug for BehTree<W>
where
    W: TreeWorld,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehTree")
            .field("agent", &self.agent)
            .field("running", &self.running)
            .field("nodes", &self.graph.len())
            .field("acting", &self.acting)
            .field("reacting", &self.reacting)
            .finish()
    }
}

impl<W> BehTree<W>
where
    W: TreeWorld,
{
    pub fn new(agent: W::Agent, template: &Node<W>) -> Self {
        Self {
            agent,
            template: template.clone(),
            graph: Graph::layout(template),
            acting: ActingNodes::default(),
            reacting: ReactingNodes::default(),
            running: false,
            tracked: false,
            tracer: Tracer::default(),
        }
    }

    /// Emit `bt.start` / `bt.success` / `bt.failure` for the root into `sink`.
    pub fn with_trace(mut self, sink: impl TraceSink + 'static) -> Self {
        self.tracer = Tracer::new(sink);
        self
    }

    /// A fresh instance of the same template bound to another agent. Nothing is shared.
    pub fn copy_to(&self, agent: W::Agent) -> Self {
        Self::new(agent, &self.template)
    }

    pub fn agent(&self) -> W::Agent {
        self.agent
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn node_count(&self) -> usize {
        self.graph.len()
    }

    pub fn is_node_running(&self, node: NodeId) -> bool {
        self.graph.is_running(node)
    }

    /// Current per-child bias of the utility select at `node`.
    pub fn utility_bias(&self, node: NodeId) -> Option<&[f32]> {
        self.graph.utility_state(node).map(|(bias, _)| bias)
    }

    /// Which children of the utility select at `node` were attempted since it last started.
    pub fn utility_tried(&self, node: NodeId) -> Option<&[bool]> {
        self.graph.utility_state(node).map(|(_, tried)| tried)
    }

    pub fn acting(&self) -> &ActingNodes {
        &self.acting
    }

    pub fn reacting(&self) -> &ReactingNodes {
        &self.reacting
    }

    /// Start the root unless it is already running.
    pub fn execute(&mut self, ctx: &TickContext, world: &mut W) -> BtStatus {
        if self.running {
            return BtStatus::Running;
        }
        self.track_events(world);

        self.running = true;
        let agent = self.agent;
        self.tracer
            .emit_with(|| TraceEvent::new(ctx.turn, "bt.start").with_a(agent.stable_id()));
        tracing::trace!(agent = ?agent, turn = ctx.turn, "tree started");

        let mut cx = Cx {
            ctx,
            agent,
            world,
            acting: &mut self.acting,
            reacting: &mut self.reacting,
        };
        let signal = self.graph.execute(NodeId::ROOT, &mut cx);
        if let Some(signal) = signal {
            self.settle(ctx, signal);
        }
        signal.into()
    }

    /// Wake every `wait_event` leaf whose event fired this turn.
    ///
    /// Returns the root's signal if the tree finished during this pass.
    pub fn react(&mut self, ctx: &TickContext, world: &mut W) -> Option<Signal> {
        if !self.running || self.reacting.is_empty() {
            return None;
        }
        let fired: Vec<EventId> = match world.events(self.agent) {
            Some(events) => self
                .reacting
                .events()
                .filter(|event| events.contains(*event))
                .collect(),
            None => return None,
        };

        for event in fired {
            let waiters = self.reacting.waiting_on(event).to_vec();
            for node in waiters {
                // An earlier wake in this pass may have cancelled it.
                if !self.reacting.contains(event, node) {
                    continue;
                }
                if let Some(signal) = self.wake(ctx, world, node) {
                    return Some(signal);
                }
            }
        }
        None
    }

    /// Tick every node registered in [`ActingNodes`] once, in arena order.
    ///
    /// A node registered during the pass (the next leg of a sequence, say) is ticked in the same
    /// pass. A node is never ticked twice in one pass.
    ///
    /// Returns the root's signal if the tree finished during this pass.
    pub fn act(&mut self, ctx: &TickContext, world: &mut W) -> Option<Signal> {
        if !self.running {
            return None;
        }
        let mut ticked = BTreeSet::new();
        loop {
            let pending: Vec<NodeId> = self
                .acting
                .snapshot()
                .into_iter()
                .filter(|node| !ticked.contains(node))
                .collect();
            if pending.is_empty() {
                return None;
            }
            for node in pending {
                // An earlier wake in this pass may have cancelled it.
                if !self.acting.contains(node) {
                    continue;
                }
                ticked.insert(node);
                if let Some(signal) = self.wake(ctx, world, node) {
                    return Some(signal);
                }
            }
        }
    }

    /// Stop the whole tree without a signal.
    pub fn cancel(&mut self, ctx: &TickContext, world: &mut W) {
        if !self.running {
            return;
        }
        let mut cx = Cx {
            ctx,
            agent: self.agent,
            world,
            acting: &mut self.acting,
            reacting: &mut self.reacting,
        };
        self.graph.cancel(NodeId::ROOT, &mut cx);
        self.running = false;
        tracing::debug!(agent = ?self.agent, turn = ctx.turn, "tree cancelled");
    }

    /// Indented status dump of the arena, one node per line.
    pub fn describe(&self) -> String {
        self.graph.describe()
    }

    fn wake(&mut self, ctx: &TickContext, world: &mut W, node: NodeId) -> Option<Signal> {
        let mut cx = Cx {
            ctx,
            agent: self.agent,
            world,
            acting: &mut self.acting,
            reacting: &mut self.reacting,
        };
        let signal = self.graph.wake(node, &mut cx)?;
        self.settle(ctx, signal);
        Some(signal)
    }

    fn settle(&mut self, ctx: &TickContext, signal: Signal) {
        debug_assert!(self.acting.is_empty() && self.reacting.is_empty());
        self.running = false;

        let agent = self.agent;
        let tag = match signal {
            Signal::Success => "bt.success",
            Signal::Failure => "bt.failure",
        };
        self.tracer
            .emit_with(|| TraceEvent::new(ctx.turn, tag).with_a(agent.stable_id()));
        tracing::debug!(agent = ?agent, turn = ctx.turn, ?signal, "tree finished");
    }

    /// Mark every event this tree can wait on as tracked on the agent's event set. Done once,
    /// on the first execute.
    fn track_events(&mut self, world: &mut W) {
        if self.tracked {
            return;
        }
        if let Some(events) = world.events_mut(self.agent) {
            for event in self.graph.waited_events() {
                events.track(event);
            }
            self.tracked = true;
        }
    }
}
