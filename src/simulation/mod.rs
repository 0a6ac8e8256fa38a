//! Procedural city simulation
//!
//! Generates a city from a density map and a Voronoi road network, houses
//! and employs a population, and runs the agents' daily commute. Nothing in
//! here depends on a renderer; presentation hooks are the outbound
//! [`OccupancyEvent`] queue.

mod agent;
mod building;
mod clock;
mod config;
mod density;
mod error;
mod events;
mod navigation;
mod placer;
mod population;
mod repair;
mod road_graph;
mod runner;
mod stats;
mod types;
mod world;

pub use agent::{Activity, Agent, ScheduleAction, Trip};
pub use building::Structure;
pub use clock::DayClock;
pub use config::{
    CityConfig, NoiseParams, ScheduleWindow, AGENT_HEIGHT, AGENT_SPEED, ARRIVAL_THRESHOLD,
    BUILDING_THRESHOLD, CENTER_RADIUS, DAY_LENGTH_SECS, HOUSE_THRESHOLD, MAP_SIZE, PLANE_SIZE,
    POPULATION_SIZE, ROAD_HEIGHT, ROAD_LENGTH_SCALE, ROAD_WIDTH, SITE_COUNT, STRUCTURE_FOOTPRINT,
};
pub use density::{DensityField, NoiseSource, PerlinNoise, WeightedSamples};
pub use error::CityError;
pub use events::OccupancyEvent;
pub use navigation::{Navigator, StraightLineNavigator};
pub use placer::{CityLayout, RoadPlacement, StructurePlacement, StructurePlacer};
pub use road_graph::{
    generate_sites, Bounds, RoadGraph, RoadSegment, Site, SpadeVoronoi, VoronoiOutput,
    VoronoiService, DEFAULT_SITE_GROUP,
};
pub use runner::Simulation;
pub use stats::CityStats;
pub use types::{AgentId, GridPoint, Position, Role, SimId, StructureClass, StructureId};
pub use world::{CityState, DrainedOccupants};
