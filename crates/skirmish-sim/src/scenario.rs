//! Scenario definitions: hardcoded starting layouts for the headless host.

use std::f32::consts::PI;

use glam::Vec3;
use tracing::info;

use skirmish_core::commands::{AgentCommand, SquadOrder};
use skirmish_core::constants::DEFAULT_ATTACK_DISTANCE;
use skirmish_core::enums::{FormationPattern, OrderType, TacticalPosition};

use crate::components::Side;
use crate::engine::{BattleCommand, SimConfig, SimulationEngine};
use crate::error::{SimError, SimResult};
use crate::world_setup::ShipSetup;

/// Names accepted by [`build`].
pub const SCENARIOS: [&str; 3] = ["duel", "squadron", "escort"];

impl SimulationEngine {
    /// A fresh engine with the named scenario already laid out.
    pub fn with_scenario(name: &str, config: SimConfig) -> SimResult<Self> {
        let mut engine = SimulationEngine::new(config)?;
        build(&mut engine, name)?;
        Ok(engine)
    }
}

/// Populate `engine` with the named scenario.
pub fn build(engine: &mut SimulationEngine, name: &str) -> SimResult<()> {
    match name {
        "duel" => build_duel(engine),
        "squadron" => build_squadron(engine),
        "escort" => build_escort(engine),
        other => return Err(SimError::UnknownScenario(other.to_string())),
    }?;
    info!(scenario = name, "scenario ready");
    Ok(())
}

/// Duel: two fighters 300 m apart, nose to nose, two rocks in between.
fn build_duel(engine: &mut SimulationEngine) -> SimResult<()> {
    let blue = engine.spawn_ship(ShipSetup::fighter(Side::Blue, Vec3::ZERO, 0.0));
    let red = engine.spawn_ship(ShipSetup::fighter(
        Side::Red,
        Vec3::new(0.0, 0.0, -300.0),
        PI,
    ));
    engine.spawn_obstacle(Vec3::new(-20.0, 0.0, -150.0), 10.0);
    engine.spawn_obstacle(Vec3::new(35.0, 0.0, -110.0), 8.0);

    engine.command(BattleCommand::Agent {
        id: blue,
        command: AgentCommand::AttackFrom {
            target: red,
            tactic: TacticalPosition::FlankLeft,
            distance: DEFAULT_ATTACK_DISTANCE,
        },
    })?;
    engine.command(BattleCommand::Agent {
        id: red,
        command: AgentCommand::AttackFrom {
            target: blue,
            tactic: TacticalPosition::Direct,
            distance: DEFAULT_ATTACK_DISTANCE,
        },
    })
}

/// Squadron: a blue wedge crosses an asteroid field toward a red diamond
/// that has been ordered to hunt the blue leader.
fn build_squadron(engine: &mut SimulationEngine) -> SimResult<()> {
    let blue: Vec<_> = (0..4)
        .map(|i| {
            let position = Vec3::new(-30.0 + 20.0 * i as f32, 0.0, 200.0);
            engine.spawn_ship(ShipSetup::fighter(Side::Blue, position, 0.0))
        })
        .collect();
    let red: Vec<_> = (0..4)
        .map(|i| {
            let position = Vec3::new(-30.0 + 20.0 * i as f32, 0.0, -250.0);
            engine.spawn_ship(ShipSetup::fighter(Side::Red, position, PI))
        })
        .collect();
    engine.spawn_asteroid_field(Vec3::ZERO, 90.0, 8);

    let blue_squad = engine.add_squad(blue[0], &blue[1..], FormationPattern::Wedge)?;
    let red_squad = engine.add_squad(red[0], &red[1..], FormationPattern::Diamond)?;

    engine.command(BattleCommand::Agent {
        id: blue[0],
        command: AgentCommand::FlyTo {
            position: Vec3::new(0.0, 0.0, -400.0),
        },
    })?;
    engine.command(BattleCommand::SquadOrder {
        squad: blue_squad,
        order: SquadOrder::new(OrderType::FormUp),
    })?;
    engine.command(BattleCommand::SquadOrder {
        squad: red_squad,
        order: SquadOrder::attack(blue[0]),
    })
}

/// Escort: a red capital ship under two fighters trailing it, with a blue
/// pair ordered to defend a waypoint on its path.
fn build_escort(engine: &mut SimulationEngine) -> SimResult<()> {
    let capital = engine.spawn_ship(ShipSetup::capital(Side::Red, Vec3::ZERO, PI / 2.0));
    let escorts: Vec<_> = [Vec3::new(10.0, 0.0, 20.0), Vec3::new(10.0, 0.0, -20.0)]
        .into_iter()
        .map(|p| engine.spawn_ship(ShipSetup::fighter(Side::Red, p, PI / 2.0)))
        .collect();
    let defenders: Vec<_> = [Vec3::new(-300.0, 0.0, 10.0), Vec3::new(-300.0, 0.0, -10.0)]
        .into_iter()
        .map(|p| engine.spawn_ship(ShipSetup::fighter(Side::Blue, p, -PI / 2.0)))
        .collect();
    engine.spawn_obstacle(Vec3::new(-150.0, 0.0, 40.0), 12.0);

    engine.command(BattleCommand::Agent {
        id: capital,
        command: AgentCommand::FlyToAndFace {
            position: Vec3::new(-400.0, 0.0, 0.0),
            yaw: PI / 2.0,
        },
    })?;
    for &escort in &escorts {
        engine.command(BattleCommand::Agent {
            id: escort,
            command: AgentCommand::FollowTarget { target: capital },
        })?;
    }
    let squad = engine.add_squad(defenders[0], &defenders[1..], FormationPattern::Line)?;
    engine.command(BattleCommand::SquadOrder {
        squad,
        order: SquadOrder::defend(Vec3::new(-200.0, 0.0, 0.0)),
    })
}
