//! Squad coordination: stands in for the service that hands orders to
//! agents between ticks.
//!
//! Every member reads its squad's standing order. FormUp additionally
//! assigns formation slots to the wingmen; the leader keeps flying its own
//! commands.

use std::collections::BTreeMap;

use glam::Vec3;
use tracing::{debug, info};

use skirmish_ai::config::FormationConfig;
use skirmish_ai::formation::FormationSolver;
use skirmish_core::commands::{AgentCommand, SquadOrder};
use skirmish_core::enums::{FormationPattern, OrderType};
use skirmish_core::types::BodyId;

use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Squad {
    pub id: u32,
    pub leader: BodyId,
    /// Leader first.
    pub members: Vec<BodyId>,
    pub pattern: FormationPattern,
    pub order: SquadOrder,
}

impl Squad {
    pub fn wingmen(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.members.iter().copied().filter(move |&m| m != self.leader)
    }
}

#[derive(Debug, Default)]
pub struct SquadCoordinator {
    squads: BTreeMap<u32, Squad>,
    solver: FormationSolver,
    next_id: u32,
}

impl SquadCoordinator {
    pub fn new(formation: &FormationConfig) -> Self {
        Self {
            squads: BTreeMap::new(),
            solver: FormationSolver::new(formation),
            next_id: 1,
        }
    }

    /// Register a squad and return its id.
    pub fn create(&mut self, leader: BodyId, wingmen: &[BodyId], pattern: FormationPattern) -> u32 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        let mut members = vec![leader];
        members.extend(wingmen.iter().copied().filter(|&w| w != leader));
        self.squads.insert(
            id,
            Squad {
                id,
                leader,
                members,
                pattern,
                order: SquadOrder::default(),
            },
        );
        id
    }

    pub fn squad(&self, id: u32) -> Option<&Squad> {
        self.squads.get(&id)
    }

    pub fn squads(&self) -> impl Iterator<Item = &Squad> {
        self.squads.values()
    }

    /// The order `ship` should read this tick.
    pub fn order_for(&self, squad: Option<u32>, ship: BodyId) -> SquadOrder {
        let Some(squad) = squad.and_then(|id| self.squads.get(&id)) else {
            return SquadOrder::default();
        };
        if squad.order.kind == OrderType::FormUp && squad.leader == ship {
            return SquadOrder::default();
        }
        squad.order
    }

    /// Store `order` for the squad. Returns the direct commands it implies,
    /// i.e. slot assignments for FormUp.
    pub fn issue_order(
        &mut self,
        squad_id: u32,
        order: SquadOrder,
        poses: &BTreeMap<BodyId, (Vec3, f32)>,
    ) -> SimResult<Vec<(BodyId, AgentCommand)>> {
        let squad = self
            .squads
            .get_mut(&squad_id)
            .ok_or(SimError::UnknownSquad(squad_id))?;
        squad.order = order;
        info!(squad = squad_id, order = ?order.kind, "squad order");

        if order.kind != OrderType::FormUp {
            return Ok(Vec::new());
        }
        let Some(&(leader_pos, leader_yaw)) = poses.get(&squad.leader) else {
            return Ok(Vec::new());
        };
        let wingmen: Vec<(BodyId, Vec3)> = squad
            .wingmen()
            .filter_map(|id| poses.get(&id).map(|&(pos, _)| (id, pos)))
            .collect();

        let assignments =
            self.solver
                .assign(squad.pattern, leader_pos, leader_yaw, &wingmen, 1);
        Ok(assignments
            .into_iter()
            .map(|a| {
                debug!(squad = squad_id, ship = %a.ship, slot = a.slot, "slot assigned");
                (
                    a.ship,
                    AgentCommand::JoinFormation {
                        leader: squad.leader,
                        slot: a.slot,
                        pattern: squad.pattern,
                    },
                )
            })
            .collect())
    }

    /// Drop a destroyed ship from its squad and from any order targeting it.
    ///
    /// Returns the squad whose leader changed, so the host can re-form it.
    pub fn remove_member(&mut self, id: BodyId) -> Option<u32> {
        let mut promoted = None;
        for squad in self.squads.values_mut() {
            if squad.order.target == Some(id) {
                squad.order = SquadOrder::default();
            }
            let before = squad.members.len();
            squad.members.retain(|&m| m != id);
            if squad.members.len() == before || squad.leader != id {
                continue;
            }
            if let Some(&next) = squad.members.first() {
                info!(squad = squad.id, leader = %next, "new squad leader");
                squad.leader = next;
                promoted = Some(squad.id);
            }
        }
        self.squads.retain(|_, s| !s.members.is_empty());
        promoted
    }
}
