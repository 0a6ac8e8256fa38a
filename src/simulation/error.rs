//! Recoverable errors raised by the city simulation

use thiserror::Error;

use super::types::StructureId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CityError {
    /// Every eligible structure filled up before all agents were placed
    #[error("exceeded city capacity: placed {placed} of {requested} agents in {category}")]
    ExhaustedCapacity {
        category: &'static str,
        placed: usize,
        requested: usize,
    },

    #[error("structure {0:?} not found")]
    UnknownStructure(StructureId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
