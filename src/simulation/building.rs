//! Structures of the city
//!
//! A structure is either a habitation or a workplace at any time, and
//! tracks who lives or works there. Capacity is fixed at creation.

use super::events::OccupancyEvent;
use super::placer::StructurePlacement;
use super::types::{AgentId, Position, Role, StructureClass, StructureId};

/// A house, office building or skyscraper
#[derive(Debug, Clone)]
pub struct Structure {
    pub id: StructureId,
    pub class: StructureClass,
    pub position: Position,
    /// Yaw in degrees
    pub angle: f32,
    pub height: f32,
    capacity: usize,
    role: Role,
    inhabitants: Vec<AgentId>,
    workers: Vec<AgentId>,
    /// Vector from the structure to the road it faces
    road_offset: Position,
}

impl Structure {
    pub fn new(id: StructureId, placement: &StructurePlacement) -> Self {
        Self {
            id,
            class: placement.class,
            position: placement.position,
            angle: placement.angle,
            height: placement.height,
            capacity: placement.capacity,
            role: Role::default(),
            inhabitants: Vec::new(),
            workers: Vec::new(),
            road_offset: placement.road_offset,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_habitation(&self) -> bool {
        self.role == Role::Habitation
    }

    pub fn switch_role(&mut self, role: Role) {
        self.role = role;
    }

    pub fn inhabitants(&self) -> &[AgentId] {
        &self.inhabitants
    }

    pub fn workers(&self) -> &[AgentId] {
        &self.workers
    }

    /// Registers a new inhabitant.
    ///
    /// # Panics
    /// Panics if the structure already holds `capacity` inhabitants.
    #[must_use]
    pub fn add_inhabitant(&mut self, agent: AgentId) -> OccupancyEvent {
        assert!(
            self.inhabitants.len() < self.capacity,
            "{} {:?} is over capacity ({} inhabitants)",
            self.class,
            self.id,
            self.capacity
        );
        self.inhabitants.push(agent);
        OccupancyEvent::Entered(self.id)
    }

    /// Registers a new worker.
    ///
    /// # Panics
    /// Panics if the structure already holds `capacity` workers.
    pub fn add_worker(&mut self, agent: AgentId) {
        assert!(
            self.workers.len() < self.capacity,
            "{} {:?} is over capacity ({} workers)",
            self.class,
            self.id,
            self.capacity
        );
        self.workers.push(agent);
    }

    /// Full when either occupant list has reached capacity
    pub fn is_full(&self) -> bool {
        self.inhabitants.len() == self.capacity || self.workers.len() == self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.inhabitants.is_empty() && self.workers.is_empty()
    }

    /// Empties both occupant lists, returning `(inhabitants, workers)`
    pub fn drain(&mut self) -> (Vec<AgentId>, Vec<AgentId>) {
        (
            std::mem::take(&mut self.inhabitants),
            std::mem::take(&mut self.workers),
        )
    }

    /// Point on the adjacent road where agents enter and leave
    pub fn door(&self) -> Position {
        self.position + self.road_offset
    }

    pub fn road_offset(&self) -> Position {
        self.road_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::types::SimId;

    fn structure(capacity: usize) -> Structure {
        let placement = StructurePlacement {
            class: StructureClass::Building,
            position: Position::new(1.0, 0.5, 2.0),
            angle: 0.0,
            height: 1.0,
            footprint: 0.2,
            capacity,
            road_offset: Position::new(0.0, 0.0, -0.25),
            density: 0.92,
        };
        Structure::new(StructureId(SimId(7)), &placement)
    }

    #[test]
    fn new_structures_start_as_empty_workplaces() {
        let s = structure(3);
        assert_eq!(s.role(), Role::Workplace);
        assert!(s.is_empty());
        assert!(!s.is_full());
    }

    #[test]
    fn inhabitants_fire_entered_events() {
        let mut s = structure(2);
        let event = s.add_inhabitant(AgentId(SimId(1)));
        assert_eq!(event, OccupancyEvent::Entered(StructureId(SimId(7))));
        assert_eq!(s.inhabitants(), &[AgentId(SimId(1))]);
    }

    #[test]
    fn either_list_at_capacity_makes_it_full() {
        let mut s = structure(2);
        s.add_worker(AgentId(SimId(1)));
        assert!(!s.is_full());
        s.add_worker(AgentId(SimId(2)));
        assert!(s.is_full());
        assert!(s.inhabitants().is_empty());
    }

    #[test]
    #[should_panic(expected = "over capacity")]
    fn adding_past_capacity_panics() {
        let mut s = structure(1);
        let _ = s.add_inhabitant(AgentId(SimId(1)));
        let _ = s.add_inhabitant(AgentId(SimId(2)));
    }

    #[test]
    fn drain_returns_and_clears_occupants() {
        let mut s = structure(3);
        let _ = s.add_inhabitant(AgentId(SimId(1)));
        s.add_worker(AgentId(SimId(2)));
        s.add_worker(AgentId(SimId(3)));

        let (inhabitants, workers) = s.drain();
        assert_eq!(inhabitants, vec![AgentId(SimId(1))]);
        assert_eq!(workers, vec![AgentId(SimId(2)), AgentId(SimId(3))]);
        assert!(s.is_empty());
    }

    #[test]
    fn door_is_on_the_road() {
        let s = structure(1);
        assert_eq!(s.door(), Position::new(1.0, 0.5, 1.75));
        assert_eq!(s.door(), s.position + s.road_offset());
    }
}
