//! One monster against a party of heroes on an open grid.
//!
//! The monster chases the closest hero it can see; a state machine flips it into `fleeing` when a
//! hero reaches it, and a state-reaction rule turns its intended step around while it flees.
//! Heroes pick between charging and regrouping by a utility score read from their blackboard.
//!
//! ```text
//! RUST_LOG=ai=debug cargo run -p ai --example skirmish
//! ```

use ai::bt::{
    get_closest_ally, get_closest_enemy, move_to, move_to_visible, scored, select, sequence,
    succeed, utility_select_with, Node,
};
use ai::core::{GridMut, GridView, WorldView};
use ai::hsm::{MachineView, StateId};
use ai::{AgentRecord, AiConfig, Phase, SimWorld, TurnDriver};
use anyhow::{Context, Result};

const CONFIG: &str = "
seed: 2024
utility:
  bias_increase: 2.0
  bias_decay: 1.0
  max_bias: 2.0
";

const MACHINES: &str = "
monster:
  hunting: [ {fleeing: hurt} ]
  fleeing: [ {hunting: rested} ]
";

const TURNS: u64 = 24;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AiConfig::from_yaml_str(CONFIG).context("parse skirmish config")?;
    let mut world = SimWorld::new();
    let mut driver: TurnDriver<SimWorld> = TurnDriver::with_config(&config);

    let monster = world.spawn(
        AgentRecord::at((0, 0))
            .with_team(0)
            .with_visibility(6.0)
            .with_tag("monster"),
    );
    let heroes =
        [(5, 4), (-4, 3), (2, -6)].map(|pos| world.spawn(AgentRecord::at(pos).with_team(1)));

    let courage = world.names.key::<f32>("courage");
    for (hero, value) in heroes.iter().zip([2.5, 1.0, 0.5]) {
        if let Some(record) = world.record_mut(*hero) {
            record.blackboard.set(courage, value);
        }
    }

    let spec = serde_yaml::from_str(MACHINES).context("parse state machines")?;
    driver
        .tracker_mut()
        .load(&spec, &mut world.names)
        .context("compile state machines")?;
    driver
        .tracker()
        .add_sm_to_entity(&mut world, monster, "monster")?;

    let monster_tree = monster_tree(&mut world);
    driver.forest_mut().plant(monster, &monster_tree);
    let hero_tree = hero_tree(&mut world, &config);
    for hero in heroes {
        driver.forest_mut().plant(hero, &hero_tree);
    }

    register_rules(&mut driver, &mut world);

    for _ in 0..TURNS {
        let report = driver.run_turn(&mut world);
        world.apply_actions();

        let state = driver
            .tracker()
            .current_state(&world, monster, "monster")
            .and_then(|s| world.names.resolve(s.0));
        let positions: Vec<_> = world
            .agents()
            .into_iter()
            .filter_map(|a| world.position(a).map(|p| (a, p.x, p.y)))
            .collect();
        tracing::info!(
            turn = report.turn,
            transitions = report.transitions,
            monster = state.unwrap_or("?"),
            ?positions,
            "turn"
        );
    }

    if let Some(tree) = driver.forest().get(monster) {
        println!("{}", tree.describe());
    }
    Ok(())
}

fn monster_tree(world: &mut SimWorld) -> Node<SimWorld> {
    let prey = world.names.key("prey");
    select(vec![
        sequence(vec![get_closest_enemy(prey), move_to_visible(prey, false)]),
        succeed(),
    ])
}

fn hero_tree(world: &mut SimWorld, config: &AiConfig) -> Node<SimWorld> {
    let courage = world.names.key::<f32>("courage");
    let foe = world.names.key("foe");
    let friend = world.names.key("friend");

    let charge = sequence(vec![get_closest_enemy(foe), move_to(foe, false)]);
    let regroup = sequence(vec![get_closest_ally(friend), move_to(friend, false)]);
    utility_select_with(
        config.utility,
        vec![
            scored(charge, move |bb| bb.get(courage).unwrap_or(1.0)),
            scored(regroup, move |bb| 3.0 - bb.get(courage).unwrap_or(1.0)),
        ],
    )
}

fn register_rules(driver: &mut TurnDriver<SimWorld>, world: &mut SimWorld) {
    let hurt = world.names.event("hurt");
    let rested = world.names.event("rested");
    let fleeing = StateId::intern(&mut world.names, "fleeing");

    driver
        .schedule_mut()
        .add_system(Phase::EventDispatch, "contact", move |_, world: &mut SimWorld| {
            for monster in world.tagged("monster") {
                let Some(at) = world.position(monster) else {
                    continue;
                };
                let closest = world
                    .agents()
                    .into_iter()
                    .filter(|a| *a != monster && world.is_alive(*a))
                    .filter_map(|a| world.position(a))
                    .map(|p| p.distance(at))
                    .fold(f32::INFINITY, f32::min);
                if closest <= 1.5 {
                    world.fire(monster, hurt);
                } else if closest > 4.0 {
                    world.fire(monster, rested);
                }
            }
        })
        .add_system(Phase::StateReaction, "flee", move |_, world: &mut SimWorld| {
            for monster in world.tagged("monster") {
                if !world.machines(monster).is_some_and(|m| m.is_in(fleeing)) {
                    continue;
                }
                if let Some(action) = world.record(monster).map(|r| r.action) {
                    world.set_action(monster, action.inverse());
                }
            }
        });
}
