//! Leaf library.
//!
//! Instant leaves answer inside `execute`. Suspending leaves join one registry on `execute`, leave
//! it before they signal, and leave it again on `cancel`: `wait_event` uses
//! [`crate::ReactingNodes`], the movement leaves use [`crate::ActingNodes`].

use std::rc::Rc;

use ai_core::{
    AgentQuery, BbKey, BbValue, Blackboard, EventId, GridAction, IVec2, RelationId, WorldView,
};

use crate::graph::{Cx, NodeId};
use crate::{Node, Signal, TreeWorld};

type PairFilter<W> =
    Rc<dyn Fn(&W, <W as WorldView>::Agent, <W as WorldView>::Agent) -> bool>;
type EffectFn<W> = Rc<dyn Fn(&mut W, <W as WorldView>::Agent) -> bool>;

pub(crate) enum Leaf<W>
where
    W: TreeWorld,
{
    Succeed,
    Fail,
    WaitEvent(EventId),
    MoveTo(MoveTo<W::Agent>),
    GetClosest {
        query: AgentQuery<W>,
        filter: PairFilter<W>,
        key: BbKey<W::Agent>,
    },
    Broadcast(EffectFn<W>),
    Calculate(EffectFn<W>),
    FollowLink {
        from: BbKey<W::Agent>,
        relation: RelationId,
        to: BbKey<W::Agent>,
    },
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum MoveTarget<A: 'static> {
    Agent(BbKey<A>),
    Position(BbKey<IVec2>),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct MoveTo<A: 'static> {
    target: MoveTarget<A>,
    flee: bool,
    visible_only: bool,
}

impl<W> Clone for Leaf<W>
where
    W: TreeWorld,
{
    fn clone(&self) -> Self {
        match self {
            Leaf::Succeed => Leaf::Succeed,
            Leaf::Fail => Leaf::Fail,
            Leaf::WaitEvent(event) => Leaf::WaitEvent(*event),
            Leaf::MoveTo(spec) => Leaf::MoveTo(*spec),
            Leaf::GetClosest { query, filter, key } => Leaf::GetClosest {
                query: query.clone(),
                filter: Rc::clone(filter),
                key: *key,
            },
            Leaf::Broadcast(run) => Leaf::Broadcast(Rc::clone(run)),
            Leaf::Calculate(run) => Leaf::Calculate(Rc::clone(run)),
            Leaf::FollowLink { from, relation, to } => Leaf::FollowLink {
                from: *from,
                relation: *relation,
                to: *to,
            },
        }
    }
}

impl<W> Leaf<W>
where
    W: TreeWorld,
{
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Leaf::Succeed => "succeed",
            Leaf::Fail => "fail",
            Leaf::WaitEvent(_) => "wait_event",
            Leaf::MoveTo(_) => "move_to",
            Leaf::GetClosest { .. } => "get_closest",
            Leaf::Broadcast(_) => "broadcast",
            Leaf::Calculate(_) => "calculate",
            Leaf::FollowLink { .. } => "follow_link",
        }
    }

    pub(crate) fn waits_on(&self) -> Option<EventId> {
        match self {
            Leaf::WaitEvent(event) => Some(*event),
            _ => None,
        }
    }

    pub(crate) fn execute(&self, id: NodeId, cx: &mut Cx<'_, W>) -> Option<Signal> {
        match self {
            Leaf::Succeed => Some(Signal::Success),
            Leaf::Fail => Some(Signal::Failure),
            Leaf::WaitEvent(event) => {
                let fired = cx
                    .world
                    .events(cx.agent)
                    .is_some_and(|events| events.contains(*event));
                if fired {
                    return Some(Signal::Success);
                }
                cx.reacting.register(*event, id);
                None
            }
            Leaf::MoveTo(_) => {
                cx.acting.register(id);
                None
            }
            Leaf::GetClosest { query, filter, key } => {
                let found = closest(&*cx.world, cx.agent, query, filter.as_ref());
                Some(store(cx.world, cx.agent, *key, found))
            }
            Leaf::Broadcast(run) | Leaf::Calculate(run) => Some(signal(run(cx.world, cx.agent))),
            Leaf::FollowLink { from, relation, to } => {
                let source = cx
                    .world
                    .blackboard(cx.agent)
                    .and_then(|bb| bb.get(*from));
                let target = source.and_then(|s| cx.world.related(s, *relation));
                Some(store(cx.world, cx.agent, *to, target))
            }
        }
    }

    /// Per-turn wake-up of a suspended leaf.
    pub(crate) fn act(&self, id: NodeId, cx: &mut Cx<'_, W>) -> Option<Signal> {
        match self {
            Leaf::WaitEvent(event) => {
                cx.reacting.deregister(*event, id);
                Some(Signal::Success)
            }
            Leaf::MoveTo(spec) => {
                let signal = spec.step(cx.world, cx.agent)?;
                cx.acting.deregister(id);
                Some(signal)
            }
            _ => unreachable!("instant leaf {} was woken", self.name()),
        }
    }

    pub(crate) fn cancel(&self, id: NodeId, cx: &mut Cx<'_, W>) {
        match self {
            Leaf::WaitEvent(event) => cx.reacting.deregister(*event, id),
            Leaf::MoveTo(_) => cx.acting.deregister(id),
            _ => unreachable!("instant leaf {} was cancelled", self.name()),
        }
    }
}

impl<A: ai_core::AgentId> MoveTo<A> {
    /// One movement step. `None` keeps the leaf suspended.
    fn step<W>(&self, world: &mut W, agent: A) -> Option<Signal>
    where
        W: TreeWorld<Agent = A>,
    {
        let Some(here) = world.position(agent) else {
            return Some(Signal::Failure);
        };
        let Some(there) = self.target_position(world, agent) else {
            return Some(Signal::Failure);
        };

        if self.visible_only {
            let out_of_sight = world
                .visibility(agent)
                .is_some_and(|radius| here.distance(there) > radius);
            if out_of_sight {
                return Some(Signal::Failure);
            }
        }

        if here == there {
            return Some(Signal::Success);
        }

        let action = GridAction::towards(here, there);
        world.set_action(agent, if self.flee { action.inverse() } else { action });
        None
    }

    fn target_position<W>(&self, world: &W, agent: A) -> Option<IVec2>
    where
        W: TreeWorld<Agent = A>,
    {
        let bb = world.blackboard(agent)?;
        match self.target {
            MoveTarget::Agent(key) => {
                let target = bb.get(key)?;
                if !world.is_alive(target) {
                    return None;
                }
                world.position(target)
            }
            MoveTarget::Position(key) => bb.get(key),
        }
    }
}

fn signal(ok: bool) -> Signal {
    if ok {
        Signal::Success
    } else {
        Signal::Failure
    }
}

/// Write `value` (or clear the slot on `None`) and report whether a value was stored.
fn store<W, T>(world: &mut W, agent: W::Agent, key: BbKey<T>, value: Option<T>) -> Signal
where
    W: TreeWorld,
    T: BbValue<W::Agent>,
{
    let Some(bb) = world.blackboard_mut(agent) else {
        return Signal::Failure;
    };
    match value {
        Some(value) => {
            bb.set(key, value);
            Signal::Success
        }
        None => {
            bb.unset(key);
            Signal::Failure
        }
    }
}

fn closest<W>(
    world: &W,
    agent: W::Agent,
    query: &AgentQuery<W>,
    filter: &dyn Fn(&W, W::Agent, W::Agent) -> bool,
) -> Option<W::Agent>
where
    W: TreeWorld,
{
    let here = world.position(agent)?;
    let radius = world.visibility(agent);

    let mut best: Option<(W::Agent, f32)> = None;
    for candidate in query.matching(world) {
        if candidate == agent || !filter(world, agent, candidate) {
            continue;
        }
        let Some(there) = world.position(candidate) else {
            continue;
        };
        let dist = here.distance(there);
        if radius.is_some_and(|r| dist > r) {
            continue;
        }
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((candidate, dist));
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// Succeed immediately.
pub fn succeed<W>() -> Node<W>
where
    W: TreeWorld,
{
    Node::from_leaf(Leaf::Succeed)
}

/// Fail immediately. Handy for turning an event wait into a race interrupt.
pub fn fail<W>() -> Node<W>
where
    W: TreeWorld,
{
    Node::from_leaf(Leaf::Fail)
}

/// Suspend until `event` fires for this agent. Succeeds at once if it already fired this turn.
pub fn wait_event<W>(event: EventId) -> Node<W>
where
    W: TreeWorld,
{
    Node::from_leaf(Leaf::WaitEvent(event))
}

/// Walk towards (or away from, with `flee`) the agent stored under `target`.
///
/// Succeeds when co-located; fails once the target is unset, dead or has no position.
pub fn move_to<W>(target: BbKey<W::Agent>, flee: bool) -> Node<W>
where
    W: TreeWorld,
{
    Node::from_leaf(Leaf::MoveTo(MoveTo {
        target: MoveTarget::Agent(target),
        flee,
        visible_only: false,
    }))
}

/// [`move_to`] that also fails when the target leaves the agent's visibility radius.
pub fn move_to_visible<W>(target: BbKey<W::Agent>, flee: bool) -> Node<W>
where
    W: TreeWorld,
{
    Node::from_leaf(Leaf::MoveTo(MoveTo {
        target: MoveTarget::Agent(target),
        flee,
        visible_only: true,
    }))
}

/// Walk towards (or away from) a grid position stored on the blackboard.
pub fn move_to_position<W>(target: BbKey<IVec2>, flee: bool) -> Node<W>
where
    W: TreeWorld,
{
    Node::from_leaf(Leaf::MoveTo(MoveTo {
        target: MoveTarget::Position(target),
        flee,
        visible_only: false,
    }))
}

/// Store the nearest agent matched by `query` and accepted by `filter(world, self, candidate)`
/// within the visibility radius. Ties go to the lowest handle.
pub fn get_closest<W>(
    query: AgentQuery<W>,
    filter: impl Fn(&W, W::Agent, W::Agent) -> bool + 'static,
    key: BbKey<W::Agent>,
) -> Node<W>
where
    W: TreeWorld,
{
    Node::from_leaf(Leaf::GetClosest {
        query,
        filter: Rc::new(filter),
        key,
    })
}

/// Closest living agent on another team.
pub fn get_closest_enemy<W>(key: BbKey<W::Agent>) -> Node<W>
where
    W: TreeWorld,
{
    get_closest(
        AgentQuery::new(|world: &W, agent| world.is_alive(agent)),
        |world: &W, me, other| match (world.team(me), world.team(other)) {
            (Some(mine), Some(theirs)) => mine != theirs,
            _ => false,
        },
        key,
    )
}

/// Closest living agent on the same team.
pub fn get_closest_ally<W>(key: BbKey<W::Agent>) -> Node<W>
where
    W: TreeWorld,
{
    get_closest(
        AgentQuery::new(|world: &W, agent| world.is_alive(agent)),
        |world: &W, me, other| match (world.team(me), world.team(other)) {
            (Some(mine), Some(theirs)) => mine == theirs,
            _ => false,
        },
        key,
    )
}

/// Copy this agent's value under `key` into every matched agent's blackboard. Fails when the
/// value is absent here.
pub fn broadcast<W, T>(query: AgentQuery<W>, key: BbKey<T>) -> Node<W>
where
    W: TreeWorld,
    T: BbValue<W::Agent>,
{
    let run = move |world: &mut W, agent: W::Agent| {
        let Some(value) = world.blackboard(agent).and_then(|bb| bb.get(key)) else {
            return false;
        };
        for other in query.matching(&*world) {
            if other == agent {
                continue;
            }
            if let Some(bb) = world.blackboard_mut(other) {
                bb.set(key, value);
            }
        }
        true
    };
    Node::from_leaf(Leaf::Broadcast(Rc::new(run)))
}

/// Evaluate `f` and store its result under `key`. `None` clears the key and fails.
pub fn calculate<W, T>(
    f: impl Fn(&W, W::Agent, &Blackboard<W::Agent>) -> Option<T> + 'static,
    key: BbKey<T>,
) -> Node<W>
where
    W: TreeWorld,
    T: BbValue<W::Agent>,
{
    let run = move |world: &mut W, agent: W::Agent| {
        let value = match world.blackboard(agent) {
            Some(bb) => f(&*world, agent, bb),
            None => return false,
        };
        store(world, agent, key, value) == Signal::Success
    };
    Node::from_leaf(Leaf::Calculate(Rc::new(run)))
}

/// Read an agent from `from`, follow its `relation` link and store the target under `to`.
pub fn follow_link<W>(from: BbKey<W::Agent>, relation: RelationId, to: BbKey<W::Agent>) -> Node<W>
where
    W: TreeWorld,
{
    Node::from_leaf(Leaf::FollowLink { from, relation, to })
}
