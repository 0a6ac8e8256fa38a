//! Navigation service used by the agent schedule
//!
//! The city only asks for "go there" and "are we there yet"; how agents
//! actually get around is up to the implementation.

use std::collections::HashMap;

use super::types::{AgentId, Position};

pub trait Navigator {
    /// Puts an agent at `position`, standing still
    fn place(&mut self, agent: AgentId, position: Position);

    /// Starts moving an agent toward `target`
    fn move_to(&mut self, agent: AgentId, target: Position);

    /// Stops an agent where it stands
    fn halt(&mut self, agent: AgentId);

    fn has_arrived(&self, agent: AgentId) -> bool;

    fn position(&self, agent: AgentId) -> Option<Position>;

    /// Moves agents forward in time
    fn advance(&mut self, _delta_secs: f32) {}
}

#[derive(Debug, Clone, Copy)]
struct NavAgent {
    position: Position,
    destination: Position,
    stopped: bool,
}

/// Walks agents in a straight line at constant speed
#[derive(Debug, Clone)]
pub struct StraightLineNavigator {
    speed: f32,
    arrival_threshold: f32,
    agents: HashMap<AgentId, NavAgent>,
}

impl StraightLineNavigator {
    pub fn new(speed: f32, arrival_threshold: f32) -> Self {
        Self {
            speed,
            arrival_threshold,
            agents: HashMap::new(),
        }
    }

    pub fn is_stopped(&self, agent: AgentId) -> bool {
        self.agents.get(&agent).map_or(true, |a| a.stopped)
    }
}

impl Navigator for StraightLineNavigator {
    fn place(&mut self, agent: AgentId, position: Position) {
        self.agents.insert(
            agent,
            NavAgent {
                position,
                destination: position,
                stopped: true,
            },
        );
    }

    fn move_to(&mut self, agent: AgentId, target: Position) {
        let entry = self.agents.entry(agent).or_insert(NavAgent {
            position: target,
            destination: target,
            stopped: true,
        });
        entry.destination = target;
        entry.stopped = false;
    }

    fn halt(&mut self, agent: AgentId) {
        if let Some(a) = self.agents.get_mut(&agent) {
            a.stopped = true;
        }
    }

    fn has_arrived(&self, agent: AgentId) -> bool {
        self.agents
            .get(&agent)
            .is_some_and(|a| a.position.distance(&a.destination) < self.arrival_threshold)
    }

    fn position(&self, agent: AgentId) -> Option<Position> {
        self.agents.get(&agent).map(|a| a.position)
    }

    fn advance(&mut self, delta_secs: f32) {
        let step = self.speed * delta_secs;
        for a in self.agents.values_mut().filter(|a| !a.stopped) {
            let remaining = a.position.distance(&a.destination);
            if remaining <= step || remaining == 0.0 {
                a.position = a.destination;
            } else {
                a.position = a.position.lerp(&a.destination, step / remaining);
            }
        }
    }
}
