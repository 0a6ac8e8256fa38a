//! Relocation of agents displaced by destroyed structures

use log::debug;

use super::navigation::Navigator;
use super::types::StructureId;
use super::world::CityState;

impl CityState {
    /// Last structure in `list` (scanning backwards) that is not full
    fn last_vacancy(&self, list: &[StructureId]) -> Option<StructureId> {
        list.iter()
            .rev()
            .copied()
            .find(|id| self.structures.get(id).is_some_and(|s| !s.is_full()))
    }

    /// Moves homeless agents into habitations with room.
    ///
    /// Agents are served newest first; an agent with nowhere to go stays
    /// queued. Returns how many were housed.
    pub fn relocate_homeless<N: Navigator + ?Sized>(&mut self, nav: &mut N) -> usize {
        let mut relocated = 0;

        for i in (0..self.homeless.len()).rev() {
            let agent_id = self.homeless[i];
            let Some(home) = self.last_vacancy(&self.habitations) else {
                continue;
            };
            let Some(structure) = self.structures.get_mut(&home) else {
                continue;
            };

            let event = structure.add_inhabitant(agent_id);
            let door = structure.door().on_ground(self.config.agent_height);
            self.events.push(event);

            if let Some(agent) = self.agents.get_mut(&agent_id) {
                agent.home = Some(home);
                agent.position = door;
                if agent.is_moving() {
                    // picked up again as a retarget on the next step
                    agent.destination = None;
                }
            }
            nav.place(agent_id, door);
            self.homeless.remove(i);
            relocated += 1;
            debug!("Agent {:?} moved into {:?}", agent_id.0, home.0);
        }

        self.stats.agents_relocated += relocated as u32;
        relocated
    }

    /// Moves workless agents into workplaces with room.
    pub fn relocate_workless<N: Navigator + ?Sized>(&mut self, nav: &mut N) -> usize {
        let mut relocated = 0;

        for i in (0..self.workless.len()).rev() {
            let agent_id = self.workless[i];
            let Some(workplace) = self.last_vacancy(&self.workplaces) else {
                continue;
            };
            let Some(structure) = self.structures.get_mut(&workplace) else {
                continue;
            };

            structure.add_worker(agent_id);
            let door = structure.door().on_ground(self.config.agent_height);

            if let Some(agent) = self.agents.get_mut(&agent_id) {
                agent.workplace = Some(workplace);
                agent.position = door;
                if agent.is_moving() {
                    agent.destination = None;
                }
            }
            nav.place(agent_id, door);
            self.workless.remove(i);
            relocated += 1;
            debug!("Agent {:?} now works at {:?}", agent_id.0, workplace.0);
        }

        self.stats.agents_relocated += relocated as u32;
        relocated
    }

    /// One repair pass over both queues, then refreshes the build flag
    pub fn repair<N: Navigator + ?Sized>(&mut self, nav: &mut N) {
        if self.homeless.is_empty() && self.workless.is_empty() {
            self.build_complete = true;
            return;
        }

        self.stats.repair_passes += 1;
        if !self.homeless.is_empty() {
            self.relocate_homeless(nav);
        }
        if !self.workless.is_empty() {
            self.relocate_workless(nav);
        }
        self.build_complete = self.homeless.is_empty() && self.workless.is_empty();
    }
}
