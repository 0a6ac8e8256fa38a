//! Generation and simulation parameters
//!
//! Defaults reproduce a 20x20 scene backed by a 1000x1000 density map.

use super::error::CityError;

/// Side length of the scene plane in world units
pub const PLANE_SIZE: f32 = 20.0;
/// Side length of the density map in cells
pub const MAP_SIZE: usize = 1000;
/// Number of density-weighted random sites fed to the Voronoi step
pub const SITE_COUNT: usize = 10;
/// Radius (in cells) of the open area kept around the city center
pub const CENTER_RADIUS: i64 = 200;

/// Density below which a site becomes a house
pub const HOUSE_THRESHOLD: f32 = 0.90;
/// Density below which a site becomes an office building
pub const BUILDING_THRESHOLD: f32 = 0.95;

/// Footprint width of every structure
pub const STRUCTURE_FOOTPRINT: f32 = 0.1 * PLANE_SIZE / 10.0;
pub const ROAD_WIDTH: f32 = 0.1 * PLANE_SIZE / 10.0;
pub const ROAD_HEIGHT: f32 = 0.01 * PLANE_SIZE / 10.0;
/// Scale applied to a segment's world length to get the road mesh length
pub const ROAD_LENGTH_SCALE: f32 = 0.5 * PLANE_SIZE / 10.0;

pub const POPULATION_SIZE: usize = 100;
/// Height at which agents walk
pub const AGENT_HEIGHT: f32 = 0.05;
/// Default walking speed in world units per second
pub const AGENT_SPEED: f32 = 3.5;
/// Distance under which an agent counts as arrived
pub const ARRIVAL_THRESHOLD: f32 = 0.3;

/// Real seconds for one simulated day
pub const DAY_LENGTH_SECS: f32 = 60.0;

/// Parameters of the coherent noise blended into the density map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseParams {
    pub frequency_x: f32,
    pub frequency_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub seed: i32,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            frequency_x: 0.02,
            frequency_y: 0.018,
            offset_x: 0.43,
            offset_y: 0.22,
            seed: 1337,
        }
    }
}

/// Day-time windows from which agent schedules are drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleWindow {
    pub early_start: f32,
    pub late_start: f32,
    pub early_end: f32,
    pub late_end: f32,
}

impl Default for ScheduleWindow {
    fn default() -> Self {
        Self {
            early_start: 0.20,
            late_start: 0.30,
            early_end: 0.70,
            late_end: 0.80,
        }
    }
}

/// Every tunable of a city run
#[derive(Debug, Clone, PartialEq)]
pub struct CityConfig {
    pub map_size: usize,
    pub plane_size: f32,
    pub noise: NoiseParams,
    pub center_radius: i64,
    pub site_count: usize,
    pub house_threshold: f32,
    pub building_threshold: f32,
    pub footprint: f32,
    pub road_width: f32,
    pub road_height: f32,
    pub road_length_scale: f32,
    pub population: usize,
    pub schedule: ScheduleWindow,
    pub day_length_secs: f32,
    pub agent_height: f32,
    pub agent_speed: f32,
    pub arrival_threshold: f32,
    /// Seed for reproducible runs; OS entropy when unset
    pub seed: Option<u64>,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            map_size: MAP_SIZE,
            plane_size: PLANE_SIZE,
            noise: NoiseParams::default(),
            center_radius: CENTER_RADIUS,
            site_count: SITE_COUNT,
            house_threshold: HOUSE_THRESHOLD,
            building_threshold: BUILDING_THRESHOLD,
            footprint: STRUCTURE_FOOTPRINT,
            road_width: ROAD_WIDTH,
            road_height: ROAD_HEIGHT,
            road_length_scale: ROAD_LENGTH_SCALE,
            population: POPULATION_SIZE,
            schedule: ScheduleWindow::default(),
            day_length_secs: DAY_LENGTH_SECS,
            agent_height: AGENT_HEIGHT,
            agent_speed: AGENT_SPEED,
            arrival_threshold: ARRIVAL_THRESHOLD,
            seed: None,
        }
    }
}

impl CityConfig {
    /// Default configuration with a fixed RNG seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Distance (in cells) between a road and the structures lining it
    pub fn structure_spacing(&self) -> f32 {
        self.to_map(self.road_width / 2.0 + 3.0 * self.footprint / 4.0)
    }

    /// Converts a scene length to a length in map cells
    pub fn to_map(&self, value: f32) -> f32 {
        value / self.plane_size * self.map_size as f32
    }

    /// Converts a map coordinate to a scene coordinate centered on the origin
    pub fn to_scene(&self, value: f32) -> f32 {
        value / self.map_size as f32 * self.plane_size - self.plane_size / 2.0
    }

    /// Converts a map-space length or vector component to scene units
    pub fn to_scene_length(&self, value: f32) -> f32 {
        value / self.map_size as f32 * self.plane_size
    }

    /// Inverse of [`to_scene`](Self::to_scene)
    pub fn to_grid(&self, value: f32) -> f32 {
        (value + self.plane_size / 2.0) / self.plane_size * self.map_size as f32
    }

    pub fn validate(&self) -> Result<(), CityError> {
        if self.map_size == 0 {
            return Err(CityError::InvalidConfig("map size must be positive".into()));
        }
        if self.plane_size <= 0.0 || self.footprint <= 0.0 {
            return Err(CityError::InvalidConfig(
                "plane size and footprint must be positive".into(),
            ));
        }
        if self.house_threshold >= self.building_threshold {
            return Err(CityError::InvalidConfig(format!(
                "house threshold {} must be below building threshold {}",
                self.house_threshold, self.building_threshold
            )));
        }
        let s = &self.schedule;
        if !(s.early_start < s.late_start && s.early_end < s.late_end) {
            return Err(CityError::InvalidConfig(
                "schedule windows must be non-empty".into(),
            ));
        }
        if !(0.0..1.0).contains(&s.early_start) || !(0.0..=1.0).contains(&s.late_end) {
            return Err(CityError::InvalidConfig(
                "schedule windows must lie within one day".into(),
            ));
        }
        if self.day_length_secs <= 0.0 || self.arrival_threshold <= 0.0 {
            return Err(CityError::InvalidConfig(
                "day length and arrival threshold must be positive".into(),
            ));
        }
        Ok(())
    }
}
