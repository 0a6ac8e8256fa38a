//! Initial assignment of homes and workplaces

use std::collections::HashMap;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::Rng;

use super::agent::Agent;
use super::building::Structure;
use super::error::CityError;
use super::types::{AgentId, Role, StructureId};
use super::world::CityState;

/// Random-start sequential fill over a list of structures.
///
/// The current structure is reused until it stops accepting agents, then
/// it is dropped from the pool and another one is drawn at random.
struct StructurePool {
    candidates: Vec<StructureId>,
    current: Option<usize>,
}

impl StructurePool {
    fn new(candidates: Vec<StructureId>) -> Self {
        Self {
            candidates,
            current: None,
        }
    }

    fn next(
        &mut self,
        structures: &HashMap<StructureId, Structure>,
        rng: &mut StdRng,
        accepts: impl Fn(&Structure) -> bool,
    ) -> Option<StructureId> {
        loop {
            if let Some(index) = self.current {
                let id = self.candidates[index];
                if structures.get(&id).is_some_and(&accepts) {
                    return Some(id);
                }
                self.candidates.remove(index);
                self.current = None;
            }
            if self.candidates.is_empty() {
                return None;
            }
            self.current = Some(rng.random_range(0..self.candidates.len()));
        }
    }
}

fn has_room_for_inhabitant(structure: &Structure) -> bool {
    structure.inhabitants().len() < structure.capacity()
}

impl CityState {
    /// Creates `count` agents and houses them.
    ///
    /// Houses are filled first; once every house is full, office buildings
    /// take the overflow and become habitations. If those run out too the
    /// agents placed so far are kept and `ExhaustedCapacity` is returned.
    pub fn assign_homes(&mut self, count: usize) -> Result<usize, CityError> {
        let mut pool = StructurePool::new(self.houses.clone());
        let mut overflowed = false;

        for placed in 0..count {
            let home = match pool.next(&self.structures, &mut self.rng, has_room_for_inhabitant) {
                Some(home) => Some(home),
                None if !overflowed => {
                    overflowed = true;
                    debug!("Houses are full after {} agents, using buildings", placed);
                    pool = StructurePool::new(self.buildings.clone());
                    pool.next(&self.structures, &mut self.rng, has_room_for_inhabitant)
                }
                None => None,
            };

            let Some(home) = home else {
                warn!("Exceeded city capacity: {} of {} agents housed", placed, count);
                return Err(CityError::ExhaustedCapacity {
                    category: "habitations",
                    placed,
                    requested: count,
                });
            };
            self.spawn_agent(home)?;
        }

        Ok(count)
    }

    /// Creates one agent living in `home`, hidden at its door
    pub fn spawn_agent(&mut self, home: StructureId) -> Result<AgentId, CityError> {
        if !self.structures.contains_key(&home) {
            return Err(CityError::UnknownStructure(home));
        }

        let window = self.config.schedule;
        let start_time = self.random_range(window.early_start..window.late_start);
        let end_time = self.random_range(window.early_end..window.late_end);
        let id = AgentId(self.next_sim_id());
        let mut agent = Agent::new(id, start_time, end_time);

        let structure = self
            .structures
            .get_mut(&home)
            .ok_or(CityError::UnknownStructure(home))?;
        if !structure.is_habitation() {
            structure.switch_role(Role::Habitation);
        }
        let event = structure.add_inhabitant(id);
        agent.home = Some(home);
        agent.position = structure.door().on_ground(self.config.agent_height);

        self.events.push(event);
        self.agents.insert(id, agent);
        self.agent_order.push(id);
        Ok(id)
    }

    /// Rebuilds the habitation and workplace lists from current roles.
    ///
    /// Houses always house; buildings and skyscrapers go by their role.
    pub fn split_roles(&mut self) {
        self.habitations = self.houses.clone();
        self.workplaces.clear();

        for id in self.buildings.iter().chain(&self.skyscrapers) {
            let Some(structure) = self.structures.get(id) else {
                continue;
            };
            if structure.is_habitation() {
                self.habitations.push(*id);
            } else {
                self.workplaces.push(*id);
            }
        }
    }

    /// Gives a workplace to every agent without one.
    ///
    /// Agents left over when every workplace is full are reported through
    /// `ExhaustedCapacity` and stay without a job.
    pub fn assign_workplaces(&mut self) -> Result<usize, CityError> {
        let jobless: Vec<AgentId> = self
            .agent_order
            .iter()
            .filter(|id| self.agents.get(id).is_some_and(|a| a.workplace.is_none()))
            .copied()
            .collect();
        let mut pool = StructurePool::new(self.workplaces.clone());

        for (placed, agent_id) in jobless.iter().enumerate() {
            let Some(workplace) = pool.next(&self.structures, &mut self.rng, |s| !s.is_full())
            else {
                warn!(
                    "Exceeded workplace capacity: {} of {} agents employed",
                    placed,
                    jobless.len()
                );
                return Err(CityError::ExhaustedCapacity {
                    category: "workplaces",
                    placed,
                    requested: jobless.len(),
                });
            };
            self.hire(*agent_id, workplace)?;
        }

        Ok(jobless.len())
    }

    fn hire(&mut self, agent_id: AgentId, workplace: StructureId) -> Result<(), CityError> {
        let structure = self
            .structures
            .get_mut(&workplace)
            .ok_or(CityError::UnknownStructure(workplace))?;
        structure.add_worker(agent_id);
        if let Some(agent) = self.agents.get_mut(&agent_id) {
            agent.workplace = Some(workplace);
        }
        Ok(())
    }
}
