//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// High-level behavior of an agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiState {
    /// Hold position and heading.
    #[default]
    Idle,
    /// Fly toward a point at full speed.
    Seek,
    /// Fly to a point and stop.
    Arrive,
    /// Fly to a point, stop, and face a heading.
    ArriveOrient,
    /// Trail behind another body.
    Follow,
    /// Hold a slot relative to a squad leader.
    Formation,
    /// Tactical attack approach with phase logic.
    AttackRun,
    /// Hold a tactical point around the target (broadside / orbit).
    CombatFly,
    /// Run along a fixed escape vector for a while.
    Evasion,
    /// Flee from the target at full speed.
    Retreat,
    /// High-speed travel.
    Warp,
}

impl AiState {
    /// States that are meaningless without a live target.
    pub fn needs_target(&self) -> bool {
        matches!(
            self,
            AiState::Follow | AiState::AttackRun | AiState::CombatFly | AiState::Retreat
        )
    }

    /// States that run the dogfight phase logic.
    pub fn is_dogfight(&self) -> bool {
        matches!(self, AiState::AttackRun | AiState::CombatFly | AiState::Retreat)
    }
}

/// Sub-phase of an attack run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TacticalPhase {
    /// Move to the tactical point.
    #[default]
    Approach,
    /// Close on the predicted intercept.
    Attack,
    /// Open range before the next pass.
    Disengage,
}

/// Where, relative to the target, an attack run sets up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TacticalPosition {
    /// Head-on.
    #[default]
    Direct,
    FlankLeft,
    FlankRight,
    Behind,
    /// Tangential orbit with a defensive wobble.
    Evade,
}

impl TacticalPosition {
    /// Positions picked at random for a fresh pass.
    pub const ATTACK_POSITIONS: [TacticalPosition; 4] = [
        TacticalPosition::Direct,
        TacticalPosition::FlankLeft,
        TacticalPosition::FlankRight,
        TacticalPosition::Behind,
    ];
}

/// Geometric arrangement of a squad around its leader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormationPattern {
    /// Column behind the leader.
    Line,
    /// V formation.
    #[default]
    Wedge,
    /// Defensive diamond.
    Diamond,
    /// Angled line trailing to the right.
    Echelon,
    /// Abreast line for patrol.
    Spread,
}

impl FormationPattern {
    pub const ALL: [FormationPattern; 5] = [
        FormationPattern::Line,
        FormationPattern::Wedge,
        FormationPattern::Diamond,
        FormationPattern::Echelon,
        FormationPattern::Spread,
    ];
}

/// Squad-level order kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    #[default]
    None,
    /// Return to formation on the leader.
    FormUp,
    /// Attack a specific target.
    AttackTarget,
    /// Engage nearest threats at will.
    FreeFire,
    /// Hold station at a position.
    Defend,
    /// Break and evade.
    Evasion,
    /// Do not fire.
    HoldFire,
}

/// Disposition of a body toward the observing agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attitude {
    Friend,
    Enemy,
    Neutral,
    #[default]
    None,
}

/// Kind of weapon mount, as reported by the weapon system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HardpointKind {
    /// Fixed forward gun: needs ship alignment.
    Fixed,
    /// Self-aiming turret.
    Turret,
    /// Missile launcher.
    Missile,
}
