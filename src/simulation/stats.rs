//! Run statistics

use log::info;

/// Counters accumulated over a simulation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CityStats {
    pub commutes_started: u32,
    pub commutes_completed: u32,
    pub structures_destroyed: u32,
    pub agents_relocated: u32,
    /// Repair passes that had at least one queued agent
    pub repair_passes: u32,
}

impl CityStats {
    pub fn completion_rate(&self) -> f32 {
        if self.commutes_started > 0 {
            (self.commutes_completed as f32 / self.commutes_started as f32) * 100.0
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        info!("Commutes started: {}", self.commutes_started);
        info!("Commutes completed: {}", self.commutes_completed);
        info!("Structures destroyed: {}", self.structures_destroyed);
        info!("Agents relocated: {}", self.agents_relocated);
        info!("Repair passes: {}", self.repair_passes);
        info!("Completion rate: {:.1}%", self.completion_rate());
    }
}
