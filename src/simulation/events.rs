//! Occupancy notifications emitted by the city
//!
//! Consumers (renderers, loggers) drain these after each tick.

use super::types::StructureId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccupancyEvent {
    /// An agent went inside the structure
    Entered(StructureId),
    /// An agent left the structure for a trip
    Left(StructureId),
    /// The structure was removed from the city
    Destroyed(StructureId),
}

impl OccupancyEvent {
    pub fn structure(&self) -> StructureId {
        match self {
            OccupancyEvent::Entered(id)
            | OccupancyEvent::Left(id)
            | OccupancyEvent::Destroyed(id) => *id,
        }
    }
}
