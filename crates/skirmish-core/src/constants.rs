//! Simulation constants and tuning parameters.
//!
//! Every runtime-tunable value in `skirmish-ai` takes its default from here.

/// Physics tick rate (Hz).
pub const TICK_RATE: u32 = 60;

/// Seconds per tick.
pub const DT: f32 = 1.0 / TICK_RATE as f32;

/// Generic epsilon for degenerate-vector checks.
pub const EPSILON: f32 = 1e-4;

// --- Navigation (context steering) ---

/// Rays in the context map. Must be a power of two.
pub const NAV_RAY_COUNT: usize = 64;

/// Minimum ray length (m).
pub const NAV_BASE_LOOKAHEAD: f32 = 30.0;

/// Ray length grows with speed: speed * this factor (seconds).
pub const NAV_SPEED_LOOKAHEAD_FACTOR: f32 = 2.0;

/// Hard cap on ray length (m).
pub const NAV_MAX_LOOKAHEAD: f32 = 150.0;

/// Danger weight against interest. Must stay well above 20 so any real
/// hazard outranks pure goal alignment.
pub const NAV_DANGER_PENALTY: f32 = 25.0;

/// Rays on each side that receive a smeared copy of a hit's danger.
pub const NAV_DANGER_SMEAR: usize = 2;

/// Seconds between cached navigation queries (10 Hz).
pub const NAV_STEERING_INTERVAL: f64 = 0.1;

// --- Pilot (arrival + PD control) ---

/// Rotation proportional gain.
pub const PILOT_ROTATION_KP: f32 = 25.0;

/// Rotation derivative gain.
pub const PILOT_ROTATION_KD: f32 = 5.0;

/// Kp multiplier for capital-class hulls.
pub const PILOT_CAPITAL_AGILITY: f32 = 0.2;

/// Safety factor on the kinematic braking speed limit.
pub const PILOT_BRAKING_SAFETY: f32 = 0.9;

/// Speed under which an agent inside its arrival radius counts as arrived (m/s).
pub const PILOT_ARRIVAL_SPEED: f32 = 5.0;

/// Arrived clears only beyond arrival_radius times this.
pub const PILOT_ARRIVAL_HYSTERESIS: f32 = 1.5;

/// Heading error above which forward thrust is suppressed (degrees).
pub const PILOT_TURN_GATE_DEG: f32 = 15.0;

/// Speed error (m/s) that maps to full throttle.
pub const PILOT_THROTTLE_GAIN_SPEED: f32 = 5.0;

/// Forward speed above which any braking request becomes full brake (m/s).
pub const PILOT_FULL_BRAKE_SPEED: f32 = 5.0;

/// Speed error above which the pilot asks for boost (m/s).
pub const PILOT_BOOST_SPEED_ERROR: f32 = 20.0;

/// Desired velocity with feed-forward is clamped to max speed times this.
pub const PILOT_FEED_FORWARD_LIMIT: f32 = 1.5;

/// Heading error under which orientation counts as matched (degrees).
pub const PILOT_ORIENTATION_TOLERANCE_DEG: f32 = 2.0;

/// Default arrival radius (m).
pub const DEFAULT_ARRIVAL_RADIUS: f32 = 5.0;

/// Default slowdown radius (m).
pub const DEFAULT_SLOWDOWN_RADIUS: f32 = 25.0;

// --- Dynamic collision avoidance ---

/// Closest-approach prediction horizon (s).
pub const AVOID_LOOKAHEAD_SECS: f32 = 3.0;

/// Predicted miss distance that engages avoidance at full urgency (m).
pub const AVOID_DANGER_RADIUS: f32 = 8.0;

/// Predicted miss distance beyond which avoidance releases (m).
pub const AVOID_RADIUS: f32 = 20.0;

/// Neighbours closing slower than this are ignored (m/s). Keeps
/// station-keeping wingmen from pushing each other apart.
pub const AVOID_MIN_CLOSING_SPEED: f32 = 0.5;

// --- Decision engine ---

/// Reaction interval bounds (s).
pub const DECISION_REACTION_MIN: f32 = 0.1;
pub const DECISION_REACTION_MAX: f32 = 0.3;

/// Commitment duration bounds after a switch (s).
pub const DECISION_COMMIT_MIN: f32 = 2.0;
pub const DECISION_COMMIT_MAX: f32 = 4.0;

/// Score above which a suggestion may interrupt a running commitment.
pub const DECISION_CRITICAL_SCORE: f32 = 0.8;

/// Margin over the committed score that also interrupts a commitment.
pub const DECISION_OVERRIDE_MARGIN: f32 = 0.25;

/// Decision log capacity.
pub const DECISION_LOG_CAPACITY: usize = 50;

/// Health fraction under which self-preservation takes over.
pub const HEALTH_CRITICAL: f32 = 0.25;

/// Health fraction a retreating agent waits for before re-engaging.
pub const HEALTH_RECOVERED: f32 = 0.5;

/// Seconds after a hit during which the agent feels under fire.
pub const UNDER_FIRE_WINDOW_SECS: f64 = 2.0;

// --- Dogfight ---

/// Range under which a breakaway is forced (m).
pub const BREAKAWAY_MIN_RANGE: f32 = 5.0;

/// Range past which a breakaway ends early (m).
pub const BREAKAWAY_CLEAR_RANGE: f32 = 10.0;

/// Breakaway duration (s).
pub const BREAKAWAY_DURATION: f32 = 2.0;

/// Distance to the tactical point that starts the attack (m).
pub const APPROACH_ARRIVE_RANGE: f32 = 15.0;

/// Attack phase duration cap (s).
pub const ATTACK_PHASE_SECS: f32 = 5.0;

/// Approach phase duration cap after a disengage (s).
pub const APPROACH_PHASE_SECS: f32 = 8.0;

/// Facing dot product that triggers opportunistic attack.
pub const OPPORTUNITY_DOT: f32 = 0.95;

/// Maximum range for opportunistic attack (m).
pub const OPPORTUNITY_RANGE: f32 = 250.0;

/// Range under which an attack run disengages (m).
pub const DISENGAGE_RANGE: f32 = 10.0;

/// Range a disengaging agent opens before approaching again (m).
pub const REENGAGE_RANGE: f32 = 25.0;

/// Maximum intercept lead time (s).
pub const INTERCEPT_MAX_LEAD_SECS: f32 = 1.5;

/// Default stand-off distance for tactical points (m).
pub const DEFAULT_ATTACK_DISTANCE: f32 = 15.0;

/// Separation neighbourhood radius (m).
pub const SEPARATION_RADIUS: f32 = 7.0;

/// Separation strength.
pub const SEPARATION_WEIGHT: f32 = 100.0;

/// Distance of the navigation carrot during attack runs (m).
pub const ATTACK_CARROT_DISTANCE: f32 = 100.0;

/// Inside this range of the tactical point the carrot is dropped (m).
pub const ATTACK_DIRECT_RANGE: f32 = 20.0;

/// Evade-wobble amplitude bounds (m).
pub const EVADE_WOBBLE_MIN: f32 = 15.0;
pub const EVADE_WOBBLE_MAX: f32 = 80.0;

/// Evasion duration bounds (s).
pub const EVASION_MIN_SECS: f32 = 3.0;
pub const EVASION_MAX_SECS: f32 = 6.0;

/// Evasion target projection distance (m).
pub const EVASION_PROJECTION: f32 = 1000.0;

/// Follow distance behind the followed body (m).
pub const FOLLOW_DISTANCE: f32 = 15.0;

/// Fraction of max speed used to close on a stationary followed body.
pub const FOLLOW_IDLE_SPEED_FRACTION: f32 = 0.3;

/// Fixed weapons fire only above this forward/target dot product.
pub const FIRE_ALIGNMENT_DOT: f32 = 0.97;

// --- Pursuit trail ---

/// Seconds between trail samples.
pub const TRAIL_RECORD_INTERVAL: f64 = 0.25;

/// Trail samples older than this are dropped (s).
pub const TRAIL_MAX_AGE: f64 = 10.0;

// --- Formation ---

/// Lateral spacing between formation slots (m).
pub const FORMATION_SPACING: f32 = 3.0;

/// Depth between formation ranks (m).
pub const FORMATION_DEPTH: f32 = 4.0;

/// Highest supported slot index; larger indices are clamped.
pub const MAX_FORMATION_SLOT: usize = 31;

/// Leader position prediction horizon (s).
pub const FORMATION_LEAD_SECS: f32 = 1.0;

/// Slot distance beyond which a wingman boosts to catch up (m).
pub const FORMATION_CATCH_UP_RANGE: f32 = 50.0;

// --- Ships ---

/// Cruise speed while warping (m/s).
pub const WARP_SPEED: f32 = 5000.0;

/// Acceleration multiplier while boosting.
pub const BOOST_FACTOR: f32 = 1.5;

// --- Headless host ---

/// Default run seed.
pub const DEFAULT_SEED: u64 = 42;

/// Rate (1/s) at which yaw rate follows the commanded turn rate.
pub const SIM_ANGULAR_RESPONSE: f32 = 8.0;

/// Fraction of sideways velocity bled off per second.
pub const SIM_LATERAL_DRAG: f32 = 2.0;

/// Collision radius of a fighter hull (m).
pub const FIGHTER_RADIUS: f32 = 2.0;

/// Collision radius of a capital hull (m).
pub const CAPITAL_RADIUS: f32 = 8.0;

/// Decisions per agent included in a snapshot.
pub const SNAPSHOT_DECISIONS: usize = 5;
