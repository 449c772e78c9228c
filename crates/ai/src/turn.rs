use ai_bt::{Forest, TreeWorld};
use ai_core::{clear_event_sets, Phase, Schedule, TickContext};
use ai_hsm::{MachineMut, StateMachineTracker};

use crate::AiConfig;

/// What one turn did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TurnReport {
    pub turn: u64,
    /// State machine transitions fired in the transition phase.
    pub transitions: usize,
}

/// Runs the six phases of a turn over one world.
///
/// Within each phase the host's rules (registered on [`TurnDriver::schedule_mut`]) run first,
/// then the runtime's share:
///
/// 1. `EventDispatch`: host rules only.
/// 2. `EventReaction`: every tree wakes the `wait_event` leaves whose event fired.
/// 3. `Acting`: idle trees restart, then every acting node ticks.
/// 4. `Transition`: the tracker fires state machine transitions.
/// 5. `StateReaction`: host rules only.
/// 6. `Cleanup`: event sets are cleared and trees of dead agents dropped.
pub struct TurnDriver<W>
where
    W: TreeWorld + MachineMut,
{
    schedule: Schedule<W>,
    forest: Forest<W>,
    tracker: StateMachineTracker,
    ctx: TickContext,
}

impl<W> TurnDriver<W>
where
    W: TreeWorld + MachineMut,
{
    pub fn new(seed: u64) -> Self {
        Self::with_tracker(seed, StateMachineTracker::new())
    }

    pub fn with_config(config: &AiConfig) -> Self {
        Self::with_tracker(config.seed, StateMachineTracker::with_config(config.hsm))
    }

    pub fn with_tracker(seed: u64, tracker: StateMachineTracker) -> Self {
        Self {
            schedule: Schedule::new(),
            forest: Forest::new(),
            tracker,
            ctx: TickContext::new(0, seed),
        }
    }

    /// Context the next turn will run with.
    pub fn context(&self) -> TickContext {
        self.ctx
    }

    pub fn turn(&self) -> u64 {
        self.ctx.turn
    }

    pub fn schedule_mut(&mut self) -> &mut Schedule<W> {
        &mut self.schedule
    }

    pub fn forest(&self) -> &Forest<W> {
        &self.forest
    }

    pub fn forest_mut(&mut self) -> &mut Forest<W> {
        &mut self.forest
    }

    pub fn tracker(&self) -> &StateMachineTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut StateMachineTracker {
        &mut self.tracker
    }

    pub fn run_turn(&mut self, world: &mut W) -> TurnReport {
        let ctx = self.ctx;
        let _span = tracing::debug_span!("turn", turn = ctx.turn).entered();

        self.schedule.run_phase(Phase::EventDispatch, &ctx, world);

        self.schedule.run_phase(Phase::EventReaction, &ctx, world);
        self.forest.react_all(&ctx, world);

        self.schedule.run_phase(Phase::Acting, &ctx, world);
        self.forest.execute_all(&ctx, world);
        self.forest.act_all(&ctx, world);

        self.schedule.run_phase(Phase::Transition, &ctx, world);
        let transitions = self.tracker.run_transitions(&ctx, world);

        self.schedule.run_phase(Phase::StateReaction, &ctx, world);

        self.schedule.run_phase(Phase::Cleanup, &ctx, world);
        clear_event_sets(world);
        self.forest.retain_alive(world);

        tracing::trace!(turn = ctx.turn, transitions, "turn complete");
        self.ctx = ctx.next();
        TurnReport {
            turn: ctx.turn,
            transitions,
        }
    }

    /// Run `turns` turns back to back.
    pub fn run(&mut self, world: &mut W, turns: u64) -> Vec<TurnReport> {
        (0..turns).map(|_| self.run_turn(world)).collect()
    }
}
