#[cfg(test)]
mod tests {
    use glam::Vec3;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use skirmish_core::commands::{AgentCommand, SquadOrder};
    use skirmish_core::enums::*;
    use skirmish_core::events::AgentEvent;
    use skirmish_core::types::*;

    use crate::agent::Agent;
    use crate::config::{AiTuning, DecisionTuning, NavigationConfig, PilotTuning};
    use crate::decision::{
        Consideration, DecisionEngine, DecisionLog, DecisionRecord, EvaluationResult, Situation,
    };
    use crate::error::ConfigError;
    use crate::formation::FormationSolver;
    use crate::navigation::NavigationField;
    use crate::pilot::{PilotCommand, PilotController, PilotSensors};
    use crate::trail::PursuitTrail;
    use crate::world::{intersect_sphere, BodyInfo, EmptyWorld, Hardpoint, RayHit, WorldQuery};
    use crate::{AgentController, TickInput};

    // ---- Test world ----

    /// Spherical obstacles plus a list of bodies that double as neighbours.
    #[derive(Default)]
    struct SphereWorld {
        obstacles: Vec<(Vec3, f32)>,
        bodies: Vec<BodyInfo>,
    }

    impl SphereWorld {
        fn with_bodies(bodies: Vec<BodyInfo>) -> Self {
            Self {
                obstacles: Vec::new(),
                bodies,
            }
        }
    }

    impl WorldQuery for SphereWorld {
        fn raycast(&self, from: Vec3, to: Vec3, _exclude: &[BodyId]) -> Option<RayHit> {
            self.obstacles
                .iter()
                .filter_map(|(center, radius)| intersect_sphere(from, to, *center, *radius))
                .min_by(|a, b| a.distance.total_cmp(&b.distance))
        }

        fn body(&self, id: BodyId) -> Option<BodyInfo> {
            self.bodies.iter().find(|b| b.id == id).copied()
        }

        fn neighbors(&self) -> &[BodyInfo] {
            &self.bodies
        }
    }

    fn enemy(id: u32, position: Vec3, yaw: f32) -> BodyInfo {
        BodyInfo {
            id: BodyId(id),
            position,
            velocity: Vec3::ZERO,
            yaw,
            attitude: Attitude::Enemy,
            movable: true,
        }
    }

    fn approx(a: f32, b: f32, tol: f32) -> bool {
        (a - b).abs() < tol
    }

    // ---- Decision engine ----

    struct Fixed {
        score: f32,
        state: AiState,
    }

    impl Consideration for Fixed {
        fn name(&self) -> &'static str {
            "Fixed"
        }

        fn evaluate(&self, _agent: &Agent, _situation: &Situation) -> EvaluationResult {
            EvaluationResult::suggest(self.score, format!("fixed {:?}", self.state), self.state)
        }
    }

    /// Scores its state with the situation's health value; zero abstains.
    struct HealthScored(AiState);

    impl Consideration for HealthScored {
        fn name(&self) -> &'static str {
            "HealthScored"
        }

        fn evaluate(&self, _agent: &Agent, situation: &Situation) -> EvaluationResult {
            if situation.health <= 0.0 {
                return EvaluationResult::none();
            }
            EvaluationResult::suggest(situation.health, "health", self.0)
        }
    }

    fn situation(health: f32) -> Situation {
        Situation {
            health,
            ..Default::default()
        }
    }

    /// Engine committed to AttackRun at 0.5; health drives a competing Retreat.
    fn committed_engine(rng: &mut ChaCha8Rng) -> (DecisionEngine, Agent) {
        let mut engine = DecisionEngine::with_considerations(
            DecisionTuning::default(),
            vec![
                Box::new(HealthScored(AiState::Retreat)),
                Box::new(Fixed {
                    score: 0.5,
                    state: AiState::AttackRun,
                }),
            ],
        );
        let mut agent = Agent::new(BodyId(1));
        let switched = engine.tick(&mut agent, &situation(0.0), 0.0, rng);
        assert!(switched.is_some());
        assert_eq!(agent.state, AiState::AttackRun);
        assert!(engine.commitment_remaining() >= 2.0);
        (engine, agent)
    }

    #[test]
    fn test_low_health_retreats_over_aggression() {
        let engine = DecisionEngine::new(DecisionTuning::default());
        let mut agent = Agent::new(BodyId(1));
        agent.target = Some(BodyId(2));

        let best = engine
            .evaluate(&agent, &situation(0.1))
            .expect("low health should produce a suggestion");
        assert_eq!(best.suggested_state, AiState::Retreat);
        assert!(approx(best.score, 0.9, 1e-6));

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut engine = engine;
        engine.tick(&mut agent, &situation(0.1), 0.0, &mut rng);
        assert_eq!(agent.state, AiState::Retreat);
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn test_healthy_agent_with_target_attacks() {
        let engine = DecisionEngine::new(DecisionTuning::default());
        let mut agent = Agent::new(BodyId(1));
        agent.target = Some(BodyId(2));
        let best = engine.evaluate(&agent, &situation(1.0)).unwrap();
        assert_eq!(best.suggested_state, AiState::AttackRun);
        assert!(approx(best.score, 0.5, 1e-6));
    }

    #[test]
    fn test_recovering_retreat_holds_until_half_health() {
        let engine = DecisionEngine::new(DecisionTuning::default());
        let mut agent = Agent::new(BodyId(1));
        agent.state = AiState::Retreat;
        let best = engine.evaluate(&agent, &situation(0.4)).unwrap();
        assert_eq!(best.suggested_state, AiState::Retreat);
        assert!(approx(best.score, 0.8, 1e-6));

        // Not retreating yet: nothing to say at 40%.
        agent.state = AiState::Idle;
        assert!(engine.evaluate(&agent, &situation(0.4)).is_none());
    }

    #[test]
    fn test_recent_hit_suggests_evasion() {
        let engine = DecisionEngine::new(DecisionTuning::default());
        let agent = Agent::new(BodyId(1));
        let s = Situation {
            now_secs: 10.0,
            health: 1.0,
            last_hit_secs: Some(9.0),
            ..Default::default()
        };
        let best = engine.evaluate(&agent, &s).unwrap();
        assert_eq!(best.suggested_state, AiState::Evasion);
        assert_eq!(best.suggested_tactic, Some(TacticalPosition::Evade));

        let stale = Situation {
            last_hit_secs: Some(5.0),
            ..s
        };
        assert!(engine.evaluate(&agent, &stale).is_none());
    }

    #[test]
    fn test_squad_orders() {
        let engine = DecisionEngine::new(DecisionTuning::default());
        let agent = Agent::new(BodyId(1));

        let form_up = Situation {
            health: 1.0,
            order: SquadOrder::new(OrderType::FormUp),
            ..Default::default()
        };
        assert_eq!(
            engine.evaluate(&agent, &form_up).unwrap().suggested_state,
            AiState::Formation
        );

        let defend = Situation {
            health: 1.0,
            order: SquadOrder::defend(Vec3::new(50.0, 0.0, 0.0)),
            ..Default::default()
        };
        let best = engine.evaluate(&agent, &defend).unwrap();
        assert_eq!(best.suggested_state, AiState::Arrive);
        assert_eq!(best.suggested_position, Some(Vec3::new(50.0, 0.0, 0.0)));

        // Defend without a position abstains.
        let vague = Situation {
            health: 1.0,
            order: SquadOrder::new(OrderType::Defend),
            ..Default::default()
        };
        assert!(engine.evaluate(&agent, &vague).is_none());

        let attack = Situation {
            health: 1.0,
            order: SquadOrder::attack(BodyId(9)),
            ..Default::default()
        };
        let best = engine.evaluate(&agent, &attack).unwrap();
        assert_eq!(best.suggested_state, AiState::AttackRun);
        assert!(approx(best.score, 0.85, 1e-6));
    }

    #[test]
    fn test_evaluate_returns_max_score() {
        let states = [
            AiState::Idle,
            AiState::Seek,
            AiState::AttackRun,
            AiState::Retreat,
            AiState::Formation,
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..50 {
            let n = rng.gen_range(1..12);
            let entries: Vec<(f32, AiState)> = (0..n)
                .map(|_| {
                    let score = (rng.gen_range(1..=20) as f32) / 20.0;
                    (score, states[rng.gen_range(0..states.len())])
                })
                .collect();
            let engine = DecisionEngine::with_considerations(
                DecisionTuning::default(),
                entries
                    .iter()
                    .map(|&(score, state)| Box::new(Fixed { score, state }) as Box<dyn Consideration>)
                    .collect(),
            );

            let best = engine.evaluate(&Agent::new(BodyId(1)), &situation(1.0)).unwrap();
            let max = entries.iter().map(|e| e.0).fold(f32::MIN, f32::max);
            let first_max = entries.iter().find(|e| e.0 == max).unwrap();
            assert_eq!(best.score, max);
            assert_eq!(best.suggested_state, first_max.1, "ties go to the first seen");
        }
    }

    #[test]
    fn test_no_considerations_no_decision() {
        let mut engine =
            DecisionEngine::with_considerations(DecisionTuning::default(), Vec::new());
        let mut agent = Agent::new(BodyId(1));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(engine.tick(&mut agent, &situation(1.0), 0.5, &mut rng).is_none());
        assert_eq!(agent.state, AiState::Idle);
        assert_eq!(engine.current_thought(), "Thinking...");
    }

    #[test]
    fn test_commitment_blocks_modest_improvement() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let (mut engine, mut agent) = committed_engine(&mut rng);

        // 0.7 is neither critical nor 0.25 above 0.5.
        assert!(engine.tick(&mut agent, &situation(0.7), 0.31, &mut rng).is_none());
        assert_eq!(agent.state, AiState::AttackRun);
        assert!(engine.current_thought().contains("[Locked"));

        // Equal to the committed score is not enough either.
        assert!(engine.tick(&mut agent, &situation(0.5), 0.31, &mut rng).is_none());
        assert_eq!(agent.state, AiState::AttackRun);
    }

    #[test]
    fn test_commitment_overridden_by_margin() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let (mut engine, mut agent) = committed_engine(&mut rng);

        let switched = engine.tick(&mut agent, &situation(0.76), 0.31, &mut rng);
        assert_eq!(switched.map(|r| r.suggested_state), Some(AiState::Retreat));
        assert_eq!(agent.state, AiState::Retreat);
        assert!(approx(engine.committed_score(), 0.76, 1e-6));
    }

    #[test]
    fn test_commitment_overridden_by_critical_score() {
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let (mut engine, mut agent) = committed_engine(&mut rng);
        engine.tick(&mut agent, &situation(0.85), 0.31, &mut rng);
        assert_eq!(agent.state, AiState::Retreat);
    }

    #[test]
    fn test_expired_commitment_accepts_equal_score() {
        let mut rng = ChaCha8Rng::seed_from_u64(14);
        let (mut engine, mut agent) = committed_engine(&mut rng);
        engine.tick(&mut agent, &situation(0.5), 5.0, &mut rng);
        assert_eq!(agent.state, AiState::Retreat);
        assert_eq!(engine.history().len(), 2);
        assert_eq!(engine.history().latest().unwrap().action, AiState::Retreat);
    }

    #[test]
    fn test_vanished_support_releases_commitment() {
        let mut rng = ChaCha8Rng::seed_from_u64(16);
        let mut engine = DecisionEngine::with_considerations(
            DecisionTuning::default(),
            vec![
                Box::new(HealthScored(AiState::Formation)),
                Box::new(Fixed {
                    score: 0.5,
                    state: AiState::AttackRun,
                }),
            ],
        );
        let mut agent = Agent::new(BodyId(1));
        engine.tick(&mut agent, &situation(0.95), 0.0, &mut rng);
        assert_eq!(agent.state, AiState::Formation);
        assert!(approx(engine.committed_score(), 0.95, 1e-6));

        // Still locked in: 0.5 cannot beat 0.95.
        assert!(engine.tick(&mut agent, &situation(0.0), 0.31, &mut rng).is_none());
        assert_eq!(agent.state, AiState::Formation);

        // Window over and nothing backs Formation any more.
        let switched = engine.tick(&mut agent, &situation(0.0), 5.0, &mut rng);
        assert_eq!(switched.map(|r| r.suggested_state), Some(AiState::AttackRun));
        assert_eq!(agent.state, AiState::AttackRun);
    }

    #[test]
    fn test_silent_considerations_clear_committed_score() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let mut engine = DecisionEngine::with_considerations(
            DecisionTuning::default(),
            vec![Box::new(HealthScored(AiState::Formation))],
        );
        let mut agent = Agent::new(BodyId(1));
        engine.tick(&mut agent, &situation(0.95), 0.0, &mut rng);
        assert!(approx(engine.committed_score(), 0.95, 1e-6));

        assert!(engine.tick(&mut agent, &situation(0.0), 5.0, &mut rng).is_none());
        assert_eq!(engine.committed_score(), 0.0);
        assert_eq!(agent.state, AiState::Formation);

        // A weak suggestion is now enough.
        engine.tick(&mut agent, &situation(0.2), 5.0, &mut rng);
        assert!(approx(engine.committed_score(), 0.2, 1e-6));
    }

    #[test]
    fn test_thinking_waits_for_reaction_interval() {
        let mut rng = ChaCha8Rng::seed_from_u64(15);
        let (mut engine, mut agent) = committed_engine(&mut rng);
        // Reaction interval is at least 0.1 s, so a tiny step cannot think.
        assert!(engine.tick(&mut agent, &situation(0.95), 0.01, &mut rng).is_none());
        assert_eq!(agent.state, AiState::AttackRun);
    }

    #[test]
    fn test_decision_log_evicts_oldest() {
        let mut log = DecisionLog::new(3);
        for i in 0..5 {
            log.push(DecisionRecord {
                timestamp_secs: i as f64,
                action: AiState::Seek,
                reason: format!("step {i}"),
                score: 0.5,
            });
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.capacity(), 3);
        let stamps: Vec<f64> = log.iter().map(|r| r.timestamp_secs).collect();
        assert_eq!(stamps, vec![2.0, 3.0, 4.0]);
        assert_eq!(log.latest().unwrap().reason, "step 4");
    }

    #[test]
    fn test_decision_record_display() {
        let record = DecisionRecord {
            timestamp_secs: 12.34,
            action: AiState::Retreat,
            reason: "Health critical (10%), retreating".into(),
            score: 0.9,
        };
        assert_eq!(
            record.to_string(),
            "[12.3s] Retreat: Health critical (10%), retreating (score 0.90)"
        );
    }

    // ---- Formation ----

    #[test]
    fn test_slot_zero_is_leader_for_every_pattern() {
        let solver = FormationSolver::default();
        for pattern in FormationPattern::ALL {
            assert_eq!(solver.offset(0, pattern), Vec3::ZERO, "{pattern:?}");
        }
    }

    #[test]
    fn test_wedge_rows() {
        let solver = FormationSolver::default();
        // spacing 3, depth 4
        assert_eq!(solver.offset(1, FormationPattern::Wedge), Vec3::new(-1.5, 0.0, 4.0));
        assert_eq!(solver.offset(2, FormationPattern::Wedge), Vec3::new(1.5, 0.0, 4.0));
        assert_eq!(solver.offset(3, FormationPattern::Wedge), Vec3::new(-3.0, 0.0, 8.0));
        assert_eq!(solver.offset(4, FormationPattern::Wedge), Vec3::new(0.0, 0.0, 8.0));
        assert_eq!(solver.offset(5, FormationPattern::Wedge), Vec3::new(3.0, 0.0, 8.0));
    }

    #[test]
    fn test_patterns_have_distinct_slots() {
        let solver = FormationSolver::default();
        for pattern in FormationPattern::ALL {
            let offsets: Vec<Vec3> = (0..12).map(|s| solver.offset(s, pattern)).collect();
            for i in 0..offsets.len() {
                for j in (i + 1)..offsets.len() {
                    assert!(
                        offsets[i].distance(offsets[j]) > 0.5,
                        "{pattern:?} slots {i} and {j} overlap"
                    );
                }
            }
        }
    }

    #[test]
    fn test_line_and_spread_offsets() {
        let solver = FormationSolver::default();
        assert_eq!(solver.offset(3, FormationPattern::Line), Vec3::new(0.0, 0.0, 12.0));
        assert_eq!(solver.offset(1, FormationPattern::Spread), Vec3::new(-3.0, 0.0, 0.0));
        assert_eq!(solver.offset(2, FormationPattern::Spread), Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(solver.offset(3, FormationPattern::Spread), Vec3::new(-6.0, 0.0, 0.0));
    }

    #[test]
    fn test_slot_index_clamped() {
        let solver = FormationSolver::default();
        assert_eq!(
            solver.offset(500, FormationPattern::Line),
            solver.offset(31, FormationPattern::Line)
        );
    }

    #[test]
    fn test_world_position_rotates_with_leader() {
        let solver = FormationSolver::default();
        let leader = Vec3::new(10.0, 0.0, 10.0);

        // Leader facing -Z: slot 1 of a line sits at +Z (behind).
        let p = solver.world_position(1, FormationPattern::Line, leader, 0.0);
        assert!(p.distance(Vec3::new(10.0, 0.0, 14.0)) < 1e-4);

        // Leader facing -X: behind is +X.
        let yaw = std::f32::consts::FRAC_PI_2;
        let p = solver.world_position(1, FormationPattern::Line, leader, yaw);
        assert!(p.distance(Vec3::new(14.0, 0.0, 10.0)) < 1e-4, "{p}");
        assert_eq!(solver.orientation(1, yaw), yaw);
    }

    #[test]
    fn test_positions_lists_leader_first() {
        let solver = FormationSolver::default();
        let leader = Vec3::new(5.0, 0.0, 0.0);
        let positions = solver.positions(4, FormationPattern::Wedge, leader, 0.0);
        assert_eq!(positions.len(), 4);
        assert_eq!(positions[0], leader);
    }

    #[test]
    fn test_assign_is_bijective() {
        let solver = FormationSolver::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let ships: Vec<(BodyId, Vec3)> = (0..7)
            .map(|i| {
                (
                    BodyId(i + 10),
                    Vec3::new(rng.gen_range(-50.0..50.0), 0.0, rng.gen_range(-50.0..50.0)),
                )
            })
            .collect();

        let assignments = solver.assign(FormationPattern::Diamond, Vec3::ZERO, 0.0, &ships, 1);
        assert_eq!(assignments.len(), ships.len());

        let mut ids: Vec<u32> = assignments.iter().map(|a| a.ship.0).collect();
        ids.sort_unstable();
        assert_eq!(ids, (10..17).collect::<Vec<u32>>());

        let slots: Vec<usize> = assignments.iter().map(|a| a.slot).collect();
        assert_eq!(slots, (1..8).collect::<Vec<usize>>());
    }

    #[test]
    fn test_assign_prefers_nearest_ship() {
        let solver = FormationSolver::default();
        let slot1 = solver.world_position(1, FormationPattern::Wedge, Vec3::ZERO, 0.0);
        let slot2 = solver.world_position(2, FormationPattern::Wedge, Vec3::ZERO, 0.0);
        // Listed in the "wrong" order on purpose.
        let ships = [(BodyId(1), slot2), (BodyId(2), slot1)];

        let assignments = solver.assign(FormationPattern::Wedge, Vec3::ZERO, 0.0, &ships, 1);
        assert_eq!(assignments[0].slot, 1);
        assert_eq!(assignments[0].ship, BodyId(2));
        assert_eq!(assignments[1].slot, 2);
        assert_eq!(assignments[1].ship, BodyId(1));
    }

    // ---- Navigation ----

    #[test]
    fn test_ray_count_rounds_to_power_of_two() {
        let field = NavigationField::new(NavigationConfig {
            ray_count: 60,
            ..Default::default()
        });
        assert_eq!(field.ray_count(), 64);
        assert_eq!(field.directions().len(), 64);
        assert!(field.directions()[0].distance(Vec3::NEG_Z) < 1e-6);
    }

    #[test]
    fn test_open_space_picks_best_aligned_ray() {
        let mut field = NavigationField::default();
        let ship = ShipState::at(Vec3::ZERO, 0.0);
        let goal = Vec3::new(37.0, 0.0, -81.0);
        let goal_dir = goal.normalize();

        let dir = field.best_direction(&ship, goal, BodyId(1), &[], 0.0, &EmptyWorld);
        let best = field
            .directions()
            .iter()
            .map(|d| d.dot(goal_dir))
            .fold(f32::MIN, f32::max);
        assert!(approx(dir.dot(goal_dir), best, 1e-6));
        assert!(approx(dir.length(), 1.0, 1e-5));
        assert_eq!(field.last_direction(), dir);
    }

    #[test]
    fn test_obstacle_dead_ahead_deflects() {
        let mut field = NavigationField::default();
        let world = SphereWorld {
            obstacles: vec![(Vec3::new(0.0, 0.0, -15.0), 5.0)],
            bodies: Vec::new(),
        };
        let ship = ShipState::at(Vec3::ZERO, 0.0);
        let goal = Vec3::new(0.0, 0.0, -100.0);

        let dir = field.best_direction(&ship, goal, BodyId(1), &[], 0.0, &world);
        let alignment = dir.dot(Vec3::NEG_Z);
        assert!(alignment >= 0.0, "should not turn back: {alignment}");
        assert!(alignment < 0.999, "should not fly into the obstacle: {alignment}");
        assert!(field.danger()[0] > 0.0);
        assert!(field.interest()[0] > 0.99);
    }

    #[test]
    fn test_degenerate_goal_keeps_heading() {
        let mut field = NavigationField::default();
        let ship = ShipState::at(Vec3::new(3.0, 0.0, 3.0), 1.0);
        let dir = field.best_direction(&ship, ship.position, BodyId(1), &[], 0.0, &EmptyWorld);
        assert!(dir.distance(ship.forward()) < 1e-6);
    }

    #[test]
    fn test_lookahead_scales_with_speed() {
        let field = NavigationField::default();
        assert_eq!(field.lookahead(0.0), 30.0);
        assert_eq!(field.lookahead(40.0), 80.0);
        assert_eq!(field.lookahead(1000.0), 150.0);
    }

    // ---- Pilot ----

    fn pilot_update(
        pilot: &mut PilotController,
        ship: &ShipState,
        spec: &ShipSpec,
        command: &PilotCommand,
        world: &dyn WorldQuery,
    ) -> ControlOutput {
        pilot.update(
            ship,
            spec,
            command,
            PilotSensors {
                self_id: BodyId(1),
                world,
                navigation: None,
            },
        )
    }

    #[test]
    fn test_arrival_hysteresis() {
        let mut pilot = PilotController::new(PilotTuning::default());
        let spec = ShipSpec::fighter();
        let command = PilotCommand::to(Vec3::ZERO);

        pilot_update(&mut pilot, &ShipState::at(Vec3::ZERO, 0.0), &spec, &command, &EmptyWorld);
        assert!(pilot.has_arrived());

        // Drifting out to 1.4x the radius keeps the latch.
        for step in 0..=70 {
            let z = step as f32 * 0.1;
            let ship = ShipState::at(Vec3::new(0.0, 0.0, z), 0.0);
            pilot_update(&mut pilot, &ship, &spec, &command, &EmptyWorld);
            assert!(pilot.has_arrived(), "lost arrival at {z}");
        }

        let ship = ShipState::at(Vec3::new(0.0, 0.0, 8.0), 0.0);
        pilot_update(&mut pilot, &ship, &spec, &command, &EmptyWorld);
        assert!(!pilot.has_arrived());

        // A fresh pilot at 7 m has not arrived.
        let mut fresh = PilotController::new(PilotTuning::default());
        let ship = ShipState::at(Vec3::new(0.0, 0.0, 7.0), 0.0);
        pilot_update(&mut fresh, &ship, &spec, &command, &EmptyWorld);
        assert!(!fresh.has_arrived());
    }

    #[test]
    fn test_fast_ship_inside_radius_not_arrived() {
        let mut pilot = PilotController::new(PilotTuning::default());
        let mut ship = ShipState::at(Vec3::ZERO, 0.0);
        ship.velocity = Vec3::new(0.0, 0.0, -10.0);
        pilot_update(&mut pilot, &ship, &ShipSpec::fighter(), &PilotCommand::to(Vec3::ZERO), &EmptyWorld);
        assert!(!pilot.has_arrived());
    }

    #[test]
    fn test_turn_sign_follows_target_side() {
        let spec = ShipSpec::fighter();
        let ship = ShipState::at(Vec3::ZERO, 0.0);

        let mut pilot = PilotController::new(PilotTuning::default());
        let left = pilot_update(&mut pilot, &ship, &spec, &PilotCommand::to(Vec3::new(-50.0, 0.0, 0.0)), &EmptyWorld);
        assert!(left.turn > 0.0);

        let mut pilot = PilotController::new(PilotTuning::default());
        let right = pilot_update(&mut pilot, &ship, &spec, &PilotCommand::to(Vec3::new(50.0, 0.0, 0.0)), &EmptyWorld);
        assert!(right.turn < 0.0);

        let mut pilot = PilotController::new(PilotTuning::default());
        let ahead = pilot_update(&mut pilot, &ship, &spec, &PilotCommand::to(Vec3::new(0.0, 0.0, -50.0)), &EmptyWorld);
        assert!(ahead.turn.abs() < 1e-4);
        assert!(ahead.throttle > 0.9);
    }

    #[test]
    fn test_no_thrust_while_turning() {
        let mut pilot = PilotController::new(PilotTuning::default());
        let ship = ShipState::at(Vec3::ZERO, 0.0);
        let target = yaw_to_forward(30f32.to_radians()) * 100.0;
        let out = pilot_update(&mut pilot, &ship, &ShipSpec::fighter(), &PilotCommand::to(target), &EmptyWorld);
        assert!(out.turn > 0.0);
        assert_eq!(out.throttle, 0.0);
        assert!(!out.boost);
    }

    #[test]
    fn test_capital_turns_slower() {
        let ship = ShipState::at(Vec3::ZERO, 0.0);
        let target = yaw_to_forward(1f32.to_radians()) * 100.0;
        let command = PilotCommand::to(target);

        let mut pilot = PilotController::new(PilotTuning::default());
        let fighter = pilot_update(&mut pilot, &ship, &ShipSpec::fighter(), &command, &EmptyWorld);
        let mut pilot = PilotController::new(PilotTuning::default());
        let capital = pilot_update(&mut pilot, &ship, &ShipSpec::capital(), &command, &EmptyWorld);

        assert!(fighter.turn > 0.0 && fighter.turn < 1.0);
        assert!(approx(capital.turn, fighter.turn * 0.2, 1e-3));
    }

    #[test]
    fn test_braking_goes_full_above_threshold() {
        let spec = ShipSpec::fighter();
        let command = PilotCommand::to(Vec3::new(0.0, 0.0, -100.0)).speed(7.0);

        let mut fast = ShipState::at(Vec3::ZERO, 0.0);
        fast.velocity = Vec3::new(0.0, 0.0, -8.0);
        let mut pilot = PilotController::new(PilotTuning::default());
        assert_eq!(pilot_update(&mut pilot, &fast, &spec, &command, &EmptyWorld).throttle, -1.0);

        let slow_command = PilotCommand::to(Vec3::new(0.0, 0.0, -100.0)).speed(3.0);
        let mut slow = ShipState::at(Vec3::ZERO, 0.0);
        slow.velocity = Vec3::new(0.0, 0.0, -4.0);
        let mut pilot = PilotController::new(PilotTuning::default());
        let out = pilot_update(&mut pilot, &slow, &spec, &slow_command, &EmptyWorld);
        assert!(approx(out.throttle, -0.2, 1e-4));
    }

    #[test]
    fn test_orientation_matched_when_parked() {
        let spec = ShipSpec::fighter();
        let mut pilot = PilotController::new(PilotTuning::default());
        let ship = ShipState::at(Vec3::ZERO, 0.3);
        pilot_update(&mut pilot, &ship, &spec, &PilotCommand::to(Vec3::ZERO).facing(0.3), &EmptyWorld);
        assert!(pilot.has_arrived());
        assert!(pilot.orientation_matched());
        assert!(pilot.debug_string().contains("Arrived:true"));

        let mut pilot = PilotController::new(PilotTuning::default());
        let ship = ShipState::at(Vec3::ZERO, 0.0);
        let out = pilot_update(&mut pilot, &ship, &spec, &PilotCommand::to(Vec3::ZERO).facing(0.3), &EmptyWorld);
        assert!(!pilot.orientation_matched());
        assert!(out.turn > 0.0);
    }

    #[test]
    fn test_head_on_neighbour_triggers_avoidance() {
        let spec = ShipSpec::fighter();
        let mut ship = ShipState::at(Vec3::ZERO, 0.0);
        ship.velocity = Vec3::new(0.0, 0.0, -10.0);
        let command = PilotCommand::to(Vec3::new(0.0, 0.0, -200.0));

        let mut pilot = PilotController::new(PilotTuning::default());
        let clear = pilot_update(&mut pilot, &ship, &spec, &command, &EmptyWorld);
        assert!(!pilot.is_avoiding());
        assert!(clear.turn.abs() < 1e-4);

        let mut oncoming = enemy(2, Vec3::new(0.0, 0.0, -30.0), std::f32::consts::PI);
        oncoming.velocity = Vec3::new(0.0, 0.0, 10.0);
        let world = SphereWorld::with_bodies(vec![oncoming]);
        let mut pilot = PilotController::new(PilotTuning::default());
        let dodge = pilot_update(&mut pilot, &ship, &spec, &command, &world);
        assert!(pilot.is_avoiding());
        assert!(dodge.turn.abs() > 0.5);

        // The same ship on the ignore list is not avoided.
        let mut pilot = PilotController::new(PilotTuning::default());
        pilot_update(&mut pilot, &ship, &spec, &command.clone().ignoring(BodyId(2)), &world);
        assert!(!pilot.is_avoiding());
    }

    #[test]
    fn test_wingman_at_matched_speed_not_avoided() {
        let spec = ShipSpec::fighter();
        let mut ship = ShipState::at(Vec3::ZERO, 0.0);
        ship.velocity = Vec3::new(0.0, 0.0, -10.0);
        let mut wingman = enemy(2, Vec3::new(3.0, 0.0, 0.0), 0.0);
        wingman.attitude = Attitude::Friend;
        wingman.velocity = ship.velocity;

        let mut pilot = PilotController::new(PilotTuning::default());
        pilot_update(
            &mut pilot,
            &ship,
            &spec,
            &PilotCommand::to(Vec3::new(0.0, 0.0, -200.0)),
            &SphereWorld::with_bodies(vec![wingman]),
        );
        assert!(!pilot.is_avoiding());
    }

    #[test]
    fn test_feed_forward_clamped() {
        let spec = ShipSpec::fighter();
        let mut ship = ShipState::at(Vec3::ZERO, 0.0);
        ship.velocity = Vec3::new(0.0, 0.0, -20.0);
        let command = PilotCommand::to(Vec3::new(0.0, 0.0, -500.0))
            .matching(Vec3::new(0.0, 0.0, -100.0));
        let mut pilot = PilotController::new(PilotTuning::default());
        let out = pilot_update(&mut pilot, &ship, &spec, &command, &EmptyWorld);
        // Desired 30 m/s (1.5x max) vs 20 m/s now.
        assert_eq!(out.throttle, 1.0);
    }

    // ---- Pursuit trail ----

    #[test]
    fn test_trail_never_holds_stale_points() {
        let mut trail = PursuitTrail::default();
        for i in 0..600 {
            let now = i as f64 * 0.05;
            trail.update(Vec3::new(i as f32, 0.0, 0.0), now);
            assert!(trail.points().all(|p| now - p.timestamp_secs <= 10.0));
        }
        assert!(!trail.is_empty());
        assert!(trail.len() <= 41, "{}", trail.len());
    }

    #[test]
    fn test_trail_respects_record_interval() {
        let mut trail = PursuitTrail::default();
        trail.update(Vec3::ZERO, 0.0);
        trail.update(Vec3::X, 0.1);
        assert_eq!(trail.len(), 1);
        trail.update(Vec3::X, 0.3);
        assert_eq!(trail.len(), 2);
        trail.clear();
        assert!(trail.is_empty());
    }

    #[test]
    fn test_pursuit_point_fallbacks() {
        let world = SphereWorld {
            obstacles: vec![(Vec3::new(0.0, 0.0, -50.0), 10.0)],
            bodies: Vec::new(),
        };
        let from = Vec3::ZERO;

        let mut trail = PursuitTrail::default();
        trail.update(Vec3::new(30.0, 0.0, -100.0), 0.0);
        trail.update(Vec3::new(0.0, 0.0, -100.0), 1.0);

        // Visible target wins.
        let visible = Vec3::new(40.0, 0.0, 0.0);
        assert_eq!(trail.pursuit_point(from, visible, &[], &world), visible);

        // Hidden target: newest visible breadcrumb.
        let hidden = Vec3::new(0.0, 0.0, -120.0);
        assert_eq!(
            trail.pursuit_point(from, hidden, &[], &world),
            Vec3::new(30.0, 0.0, -100.0)
        );

        // Nothing visible: oldest breadcrumb.
        let mut blind = PursuitTrail::default();
        blind.update(Vec3::new(0.0, 0.0, -90.0), 0.0);
        blind.update(Vec3::new(0.0, 0.0, -100.0), 1.0);
        assert_eq!(
            blind.pursuit_point(from, hidden, &[], &world),
            Vec3::new(0.0, 0.0, -90.0)
        );

        // No trail at all: the target itself.
        let empty = PursuitTrail::default();
        assert_eq!(empty.pursuit_point(from, hidden, &[], &world), hidden);
    }

    // ---- Agent controller ----

    fn quiet_controller(id: u32) -> AgentController {
        AgentController::new(BodyId(id), 7, AiTuning::default()).with_decision_engine(
            DecisionEngine::with_considerations(DecisionTuning::default(), Vec::new()),
        )
    }

    fn input_at(ship: ShipState, now: f64) -> TickInput {
        TickInput::new(ship, ShipSpec::fighter(), now, 0.1)
    }

    fn attack(target: u32) -> AgentCommand {
        AgentCommand::AttackFrom {
            target: BodyId(target),
            tactic: TacticalPosition::Direct,
            distance: 15.0,
        }
    }

    #[test]
    fn test_missing_state_gives_neutral_output() {
        let mut controller = quiet_controller(1);
        let mut events = Vec::new();
        let mut input = input_at(ShipState::default(), 0.0);
        input.ship = None;

        let out = controller.tick(&input, &EmptyWorld, &mut events);
        assert_eq!(out.controls, ControlOutput::neutral());
        assert!(!out.fire.any());
        assert!(events.is_empty());

        input.spec = None;
        input.ship = Some(ShipState::default());
        assert_eq!(controller.tick(&input, &EmptyWorld, &mut events).controls, ControlOutput::neutral());
    }

    #[test]
    fn test_fly_to_sets_arrive() {
        let mut controller = quiet_controller(1);
        controller.command(AgentCommand::FlyTo {
            position: Vec3::new(0.0, 0.0, -100.0),
        });
        let mut events = Vec::new();
        let out = controller.tick(&input_at(ShipState::at(Vec3::ZERO, 0.0), 0.0), &EmptyWorld, &mut events);
        assert_eq!(controller.state(), AiState::Arrive);
        assert_eq!(controller.target(), None);
        assert!(out.controls.throttle > 0.9);
        assert!(!controller.has_arrived());
    }

    #[test]
    fn test_fly_to_and_face_holds_heading_on_arrival() {
        let mut controller = quiet_controller(1);
        controller.command(AgentCommand::FlyToAndFace {
            position: Vec3::ZERO,
            yaw: 0.0,
        });
        let mut events = Vec::new();
        controller.tick(&input_at(ShipState::at(Vec3::ZERO, 0.0), 0.0), &EmptyWorld, &mut events);
        assert_eq!(controller.state(), AiState::ArriveOrient);
        assert!(controller.has_arrived());
        assert!(controller.orientation_matched());
    }

    #[test]
    fn test_attack_opportunity_starts_attack_phase() {
        let mut controller = quiet_controller(1);
        let world = SphereWorld::with_bodies(vec![enemy(2, Vec3::new(0.0, 0.0, -100.0), 0.0)]);
        controller.command(attack(2));

        let mut events = Vec::new();
        controller.tick(&input_at(ShipState::at(Vec3::ZERO, 0.0), 0.0), &world, &mut events);
        assert_eq!(controller.state(), AiState::AttackRun);
        assert_eq!(controller.phase(), TacticalPhase::Attack);
        assert!(events.iter().any(|e| matches!(
            e,
            AgentEvent::PhaseChanged {
                from: TacticalPhase::Approach,
                to: TacticalPhase::Attack,
                ..
            }
        )));
    }

    #[test]
    fn test_close_range_forces_breakaway() {
        let mut controller = quiet_controller(1);
        let world = SphereWorld::with_bodies(vec![enemy(2, Vec3::new(0.0, 0.0, -3.0), 0.0)]);
        controller.command(attack(2));

        let mut events = Vec::new();
        let mut input = input_at(ShipState::at(Vec3::ZERO, 0.0), 0.0);
        input.hardpoints_in_range = vec![
            Hardpoint {
                kind: HardpointKind::Fixed,
            },
            Hardpoint {
                kind: HardpointKind::Turret,
            },
        ];
        let out = controller.tick(&input, &world, &mut events);
        assert!(controller.agent().is_breaking_away());
        assert!(events
            .iter()
            .any(|e| matches!(e, AgentEvent::BreakAwayStarted { .. })));
        // Never fire the forward guns while breaking away.
        assert!(!out.fire.fire_fixed);
        assert!(out.fire.fire_turrets);

        // Range opens past the clear range: breakaway ends.
        let far = SphereWorld::with_bodies(vec![enemy(2, Vec3::new(0.0, 0.0, -12.0), 0.0)]);
        events.clear();
        controller.tick(&input_at(ShipState::at(Vec3::ZERO, 0.0), 0.1), &far, &mut events);
        assert!(!controller.agent().is_breaking_away());
        assert!(events
            .iter()
            .any(|e| matches!(e, AgentEvent::BreakAwayEnded { .. })));
    }

    #[test]
    fn test_breakaway_times_out() {
        let mut controller = quiet_controller(1);
        let world = SphereWorld::with_bodies(vec![enemy(2, Vec3::new(0.0, 0.0, -3.0), 0.0)]);
        controller.command(attack(2));
        let mut events = Vec::new();
        controller.tick(&input_at(ShipState::at(Vec3::ZERO, 0.0), 0.0), &world, &mut events);
        assert!(controller.agent().is_breaking_away());

        // Hold position at 7 m: inside the clear range, so only the timer ends it.
        let near = SphereWorld::with_bodies(vec![enemy(2, Vec3::new(0.0, 0.0, -7.0), 0.0)]);
        for i in 1..=25 {
            controller.tick(&input_at(ShipState::at(Vec3::ZERO, 0.0), i as f64 * 0.1), &near, &mut events);
        }
        assert!(!controller.agent().is_breaking_away());
    }

    #[test]
    fn test_fixed_guns_need_alignment() {
        let mut controller = quiet_controller(1);
        controller.command(attack(2));
        let guns = vec![Hardpoint {
            kind: HardpointKind::Fixed,
        }];
        let mut events = Vec::new();

        let ahead = SphereWorld::with_bodies(vec![enemy(2, Vec3::new(0.0, 0.0, -50.0), 0.0)]);
        let mut input = input_at(ShipState::at(Vec3::ZERO, 0.0), 0.0);
        input.hardpoints_in_range = guns.clone();
        let out = controller.tick(&input, &ahead, &mut events);
        assert!(out.fire.fire_fixed);
        assert_eq!(out.fire.target, Some(BodyId(2)));

        let abeam = SphereWorld::with_bodies(vec![enemy(2, Vec3::new(50.0, 0.0, 0.0), 0.0)]);
        let out = controller.tick(&input, &abeam, &mut events);
        assert!(!out.fire.fire_fixed);
    }

    #[test]
    fn test_hold_fire_suppresses_weapons() {
        let mut controller = quiet_controller(1);
        controller.command(attack(2));
        let world = SphereWorld::with_bodies(vec![enemy(2, Vec3::new(0.0, 0.0, -50.0), 0.0)]);
        let mut input = input_at(ShipState::at(Vec3::ZERO, 0.0), 0.0);
        input.order = SquadOrder::new(OrderType::HoldFire);
        input.hardpoints_in_range = vec![
            Hardpoint {
                kind: HardpointKind::Fixed,
            },
            Hardpoint {
                kind: HardpointKind::Missile,
            },
        ];
        let mut events = Vec::new();
        let out = controller.tick(&input, &world, &mut events);
        assert!(!out.fire.any());
        assert_eq!(out.fire.target, Some(BodyId(2)));
    }

    #[test]
    fn test_target_loss_falls_back() {
        let mut controller = quiet_controller(1);
        controller.command(attack(2));
        let mut events = Vec::new();
        let world = SphereWorld::with_bodies(vec![enemy(2, Vec3::new(0.0, 0.0, -80.0), 0.0)]);
        controller.tick(&input_at(ShipState::at(Vec3::ZERO, 0.0), 0.0), &world, &mut events);
        assert_eq!(controller.state(), AiState::AttackRun);

        events.clear();
        controller.tick(&input_at(ShipState::at(Vec3::ZERO, 0.0), 0.1), &EmptyWorld, &mut events);
        assert_eq!(controller.target(), None);
        assert_eq!(controller.state(), AiState::Idle);
        assert!(controller.trail().is_empty());
        assert!(events.iter().any(|e| matches!(
            e,
            AgentEvent::TargetLost {
                target: BodyId(2),
                ..
            }
        )));
    }

    #[test]
    fn test_target_loss_returns_to_formation() {
        let mut controller = quiet_controller(1);
        let leader = BodyInfo {
            attitude: Attitude::Friend,
            ..enemy(3, Vec3::new(0.0, 0.0, -20.0), 0.0)
        };
        controller.command(AgentCommand::JoinFormation {
            leader: BodyId(3),
            slot: 1,
            pattern: FormationPattern::Wedge,
        });
        controller.command(attack(2));
        let mut events = Vec::new();
        let world = SphereWorld::with_bodies(vec![leader, enemy(2, Vec3::new(0.0, 0.0, -80.0), 0.0)]);
        controller.tick(&input_at(ShipState::at(Vec3::ZERO, 0.0), 0.0), &world, &mut events);
        assert_eq!(controller.state(), AiState::AttackRun);

        let leader_only = SphereWorld::with_bodies(vec![leader]);
        controller.tick(&input_at(ShipState::at(Vec3::ZERO, 0.0), 0.1), &leader_only, &mut events);
        assert_eq!(controller.state(), AiState::Formation);
        assert_eq!(controller.formation_assignment().map(|f| f.slot), Some(1));
    }

    #[test]
    fn test_formation_member_closes_on_slot() {
        let mut controller = quiet_controller(1);
        let leader = BodyInfo {
            attitude: Attitude::Friend,
            ..enemy(3, Vec3::new(0.0, 0.0, -60.0), 0.0)
        };
        controller.command(AgentCommand::JoinFormation {
            leader: BodyId(3),
            slot: 4,
            pattern: FormationPattern::Wedge,
        });
        let mut events = Vec::new();
        let out = controller.tick(
            &input_at(ShipState::at(Vec3::ZERO, 0.0), 0.0),
            &SphereWorld::with_bodies(vec![leader]),
            &mut events,
        );
        // Slot 4 of a wedge is straight behind the leader, dead ahead of us.
        assert_eq!(controller.state(), AiState::Formation);
        assert!(out.controls.throttle > 0.5);
        assert!(out.controls.turn.abs() < 0.2);
    }

    #[test]
    fn test_force_state_clears_breakaway() {
        let mut controller = quiet_controller(1);
        let world = SphereWorld::with_bodies(vec![enemy(2, Vec3::new(0.0, 0.0, -3.0), 0.0)]);
        controller.command(attack(2));
        let mut events = Vec::new();
        controller.tick(&input_at(ShipState::at(Vec3::ZERO, 0.0), 0.0), &world, &mut events);
        assert!(controller.agent().is_breaking_away());

        controller.command(AgentCommand::ForceState {
            state: AiState::Seek,
        });
        controller.tick(&input_at(ShipState::at(Vec3::ZERO, 0.0), 0.1), &world, &mut events);
        assert_eq!(controller.state(), AiState::Seek);
        assert!(!controller.agent().is_breaking_away());
        assert_eq!(controller.agent().state_timer, 0.0);
    }

    #[test]
    fn test_evasion_expires_into_attack_run() {
        let mut controller = quiet_controller(1);
        let world = SphereWorld::with_bodies(vec![enemy(2, Vec3::new(0.0, 0.0, -200.0), 0.0)]);
        controller.command(attack(2));
        controller.command(AgentCommand::EnterEvasion {
            threat: Some(BodyId(2)),
        });

        let mut events = Vec::new();
        controller.tick(&input_at(ShipState::at(Vec3::ZERO, 0.0), 0.0), &world, &mut events);
        assert_eq!(controller.state(), AiState::Evasion);
        let duration = events.iter().find_map(|e| match e {
            AgentEvent::EvasionStarted { duration_secs, direction, .. } => {
                Some((*duration_secs, *direction))
            }
            _ => None,
        });
        let (duration, direction) = duration.expect("evasion event");
        assert!((3.0..=6.0).contains(&duration));
        // Escape runs away from the threat, not toward it.
        assert!(direction.z > 0.0);

        // A second request while evading is ignored.
        controller.command(AgentCommand::EnterEvasion { threat: None });
        events.clear();
        controller.tick(&input_at(ShipState::at(Vec3::ZERO, 0.0), 0.1), &world, &mut events);
        assert!(!events
            .iter()
            .any(|e| matches!(e, AgentEvent::EvasionStarted { .. })));

        for i in 2..70 {
            controller.tick(&input_at(ShipState::at(Vec3::ZERO, 0.0), i as f64 * 0.1), &world, &mut events);
        }
        assert_eq!(controller.state(), AiState::AttackRun);
        assert!(events
            .iter()
            .any(|e| matches!(e, AgentEvent::EvasionEnded { .. })));
    }

    #[test]
    fn test_brain_retreats_when_hurt() {
        let mut controller = AgentController::new(BodyId(1), 7, AiTuning::default());
        controller.command(attack(2));
        let world = SphereWorld::with_bodies(vec![enemy(2, Vec3::new(0.0, 0.0, -80.0), 0.0)]);
        let mut input = input_at(ShipState::at(Vec3::ZERO, 0.0), 0.0);
        input.health = 0.1;

        let mut events = Vec::new();
        let out = controller.tick(&input, &world, &mut events);
        assert_eq!(controller.state(), AiState::Retreat);
        assert!(events.iter().any(|e| matches!(
            e,
            AgentEvent::DecisionMade {
                state: AiState::Retreat,
                ..
            }
        )));
        // Retreat target is away from the enemy, which is dead ahead.
        assert!(controller.agent().target_position.z > 0.0);
        assert!(out.controls.turn.abs() > 0.5);
        assert_eq!(controller.decision_history().len(), 1);
        assert!(controller.debug_info().contains("retreating"));
    }

    #[test]
    fn test_attack_order_sets_target() {
        let mut controller = AgentController::new(BodyId(1), 7, AiTuning::default());
        let world = SphereWorld::with_bodies(vec![enemy(2, Vec3::new(0.0, 0.0, -80.0), 0.0)]);
        let mut input = input_at(ShipState::at(Vec3::ZERO, 0.0), 0.0);
        input.order = SquadOrder::attack(BodyId(2));

        let mut events = Vec::new();
        controller.tick(&input, &world, &mut events);
        assert_eq!(controller.target(), Some(BodyId(2)));
        assert_eq!(controller.state(), AiState::AttackRun);
    }

    #[test]
    fn test_order_change_overrides_form_up() {
        let mut controller = AgentController::new(BodyId(1), 7, AiTuning::default());
        let world = SphereWorld::with_bodies(vec![enemy(2, Vec3::new(0.0, 0.0, -80.0), 0.0)]);
        let ship = ShipState::at(Vec3::ZERO, 0.0);
        let mut events = Vec::new();
        let mut now = 0.0;
        let mut run = |controller: &mut AgentController, order: SquadOrder, ticks: usize| {
            for _ in 0..ticks {
                let mut input = input_at(ship, now);
                input.order = order;
                controller.tick(&input, &world, &mut events);
                now += 0.1;
            }
        };

        run(&mut controller, SquadOrder::new(OrderType::FormUp), 20);
        assert_eq!(controller.state(), AiState::Formation);

        run(&mut controller, SquadOrder::attack(BodyId(2)), 1);
        assert_eq!(controller.state(), AiState::AttackRun);
        assert_eq!(controller.target(), Some(BodyId(2)));
        run(&mut controller, SquadOrder::attack(BodyId(2)), 20);
        assert_eq!(controller.state(), AiState::AttackRun);

        run(&mut controller, SquadOrder::new(OrderType::HoldFire), 1);
        assert_eq!(controller.state(), AiState::Idle);

        run(&mut controller, SquadOrder::new(OrderType::FormUp), 1);
        assert_eq!(controller.state(), AiState::Formation);
    }

    #[test]
    fn test_defend_order_flies_to_position() {
        let mut controller = quiet_controller(1);
        let mut input = input_at(ShipState::at(Vec3::ZERO, 0.0), 0.0);
        input.order = SquadOrder::defend(Vec3::new(0.0, 0.0, -200.0));
        let mut events = Vec::new();
        controller.tick(&input, &EmptyWorld, &mut events);
        assert_eq!(controller.state(), AiState::Arrive);
        assert_eq!(controller.agent().target_position, Vec3::new(0.0, 0.0, -200.0));
    }

    #[test]
    fn test_follow_new_target_clears_trail() {
        let mut controller = quiet_controller(1);
        let world = SphereWorld::with_bodies(vec![
            enemy(2, Vec3::new(0.0, 0.0, -80.0), 0.0),
            enemy(3, Vec3::new(40.0, 0.0, -80.0), 0.0),
        ]);
        controller.command(attack(2));
        let mut events = Vec::new();
        controller.tick(&input_at(ShipState::at(Vec3::ZERO, 0.0), 0.0), &world, &mut events);
        assert!(!controller.trail().is_empty());

        // Same target: the trail is still good.
        controller.command(AgentCommand::FollowTarget { target: BodyId(2) });
        controller.tick(&input_at(ShipState::at(Vec3::ZERO, 0.0), 0.1), &world, &mut events);
        assert_eq!(controller.state(), AiState::Follow);
        assert!(!controller.trail().is_empty());

        controller.command(AgentCommand::FollowTarget { target: BodyId(3) });
        controller.tick(&input_at(ShipState::at(Vec3::ZERO, 0.0), 0.2), &world, &mut events);
        assert_eq!(controller.target(), Some(BodyId(3)));
        assert!(controller.trail().is_empty());
    }

    #[test]
    fn test_same_seed_same_outputs() {
        let world = SphereWorld {
            obstacles: vec![(Vec3::new(10.0, 0.0, -40.0), 8.0)],
            bodies: vec![enemy(2, Vec3::new(0.0, 0.0, -120.0), 0.4)],
        };
        let run = || {
            let mut controller = AgentController::new(BodyId(1), 99, AiTuning::default());
            controller.command(attack(2));
            let mut ship = ShipState::at(Vec3::ZERO, 0.0);
            let mut outputs = Vec::new();
            let mut events = Vec::new();
            for i in 0..100 {
                let out = controller.tick(&input_at(ship, i as f64 * 0.1), &world, &mut events);
                // Crude kinematics are enough to vary the inputs.
                ship.yaw += out.controls.turn * 0.3;
                ship.velocity = ship.forward() * (ship.speed() + out.controls.throttle).clamp(0.0, 20.0);
                ship.position += ship.velocity * 0.1;
                outputs.push(out);
            }
            (outputs, events)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_tuning_partial_json() {
        let tuning: AiTuning =
            serde_json::from_str(r#"{"pilot":{"rotation_kp":10.0},"formation":{"spacing":6.0}}"#)
                .unwrap();
        assert_eq!(tuning.pilot.rotation_kp, 10.0);
        assert_eq!(tuning.pilot.rotation_kd, PilotTuning::default().rotation_kd);
        assert_eq!(tuning.formation.spacing, 6.0);
        assert_eq!(tuning.navigation, NavigationConfig::default());

        let json = serde_json::to_string(&tuning).unwrap();
        let back: AiTuning = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tuning);
    }

    #[test]
    fn test_tuning_rejects_unusable_values() {
        assert_eq!(AiTuning::default().validate(), Ok(()));

        let tuning: AiTuning =
            serde_json::from_str(r#"{"decision":{"reaction_min":0.5,"reaction_max":0.1}}"#).unwrap();
        assert_eq!(
            tuning.validate(),
            Err(ConfigError::InvertedRange {
                field: "decision.reaction",
                min: 0.5,
                max: 0.1,
            })
        );

        let mut tuning = AiTuning::default();
        tuning.decision.commit_min = 5.0;
        assert!(matches!(tuning.validate(), Err(ConfigError::InvertedRange { field: "decision.commit", .. })));

        let mut tuning = AiTuning::default();
        tuning.dogfight.evasion_max_secs = 1.0;
        assert!(matches!(
            tuning.validate(),
            Err(ConfigError::InvertedRange { field: "dogfight.evasion_secs", .. })
        ));

        let mut tuning = AiTuning::default();
        tuning.navigation.max_lookahead = 0.0;
        assert!(matches!(tuning.validate(), Err(ConfigError::NotPositive { .. })));

        let mut tuning = AiTuning::default();
        tuning.decision.reaction_max = f32::NAN;
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_intersect_sphere() {
        let hit = intersect_sphere(Vec3::ZERO, Vec3::new(0.0, 0.0, -30.0), Vec3::new(0.0, 0.0, -15.0), 5.0)
            .unwrap();
        assert!(approx(hit.distance, 10.0, 1e-4));
        assert!(hit.normal.distance(Vec3::Z) < 1e-4);

        assert!(intersect_sphere(Vec3::ZERO, Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, -15.0), 5.0).is_none());
        assert!(intersect_sphere(Vec3::ZERO, Vec3::new(30.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -15.0), 5.0).is_none());

        let inside = intersect_sphere(Vec3::ZERO, Vec3::X, Vec3::ZERO, 2.0).unwrap();
        assert_eq!(inside.distance, 0.0);
    }
}
