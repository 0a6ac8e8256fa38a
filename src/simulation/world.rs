//! The city aggregate
//!
//! `CityState` owns every structure and agent, the category lists that
//! index them, the relocation queues and the outbound event queue. All
//! cross references are ids into its maps.

use std::collections::HashMap;
use std::fmt::Write as _;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use super::agent::{Activity, Agent, ScheduleAction, Trip};
use super::building::Structure;
use super::config::CityConfig;
use super::density::{DensityField, NoiseSource, PerlinNoise};
use super::error::CityError;
use super::events::OccupancyEvent;
use super::navigation::Navigator;
use super::placer::{RoadPlacement, StructurePlacement, StructurePlacer};
use super::road_graph::{generate_sites, Bounds, RoadGraph, SpadeVoronoi, VoronoiService};
use super::stats::CityStats;
use super::types::{AgentId, Position, SimId, StructureClass, StructureId};

/// Density shades used by [`CityState::render_map`], lightest first
const MAP_SHADES: [char; 5] = [' ', '.', ':', '-', '='];
const MAP_ROAD: char = '#';

/// Occupants released by a destroyed structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainedOccupants {
    pub class: StructureClass,
    pub inhabitants: Vec<AgentId>,
    pub workers: Vec<AgentId>,
}

pub struct CityState {
    pub(crate) config: CityConfig,
    pub(crate) rng: StdRng,

    pub(crate) structures: HashMap<StructureId, Structure>,
    pub(crate) agents: HashMap<AgentId, Agent>,
    /// Agents in creation order, for deterministic iteration
    pub(crate) agent_order: Vec<AgentId>,

    pub(crate) houses: Vec<StructureId>,
    pub(crate) buildings: Vec<StructureId>,
    pub(crate) skyscrapers: Vec<StructureId>,
    pub(crate) habitations: Vec<StructureId>,
    pub(crate) workplaces: Vec<StructureId>,

    /// Agents waiting for a new home, in insertion order
    pub(crate) homeless: Vec<AgentId>,
    /// Agents waiting for a new workplace, in insertion order
    pub(crate) workless: Vec<AgentId>,
    pub(crate) build_complete: bool,

    pub(crate) events: Vec<OccupancyEvent>,
    pub(crate) stats: CityStats,

    density: Option<DensityField>,
    roads: Vec<RoadPlacement>,
    road_graph: RoadGraph,

    next_id: usize,
}

impl CityState {
    /// Empty city; structures and agents are added by the caller
    pub fn new(config: CityConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            config,
            rng,
            structures: HashMap::new(),
            agents: HashMap::new(),
            agent_order: Vec::new(),
            houses: Vec::new(),
            buildings: Vec::new(),
            skyscrapers: Vec::new(),
            habitations: Vec::new(),
            workplaces: Vec::new(),
            homeless: Vec::new(),
            workless: Vec::new(),
            build_complete: false,
            events: Vec::new(),
            stats: CityStats::default(),
            density: None,
            roads: Vec::new(),
            road_graph: RoadGraph::default(),
            next_id: 0,
        }
    }

    /// Runs the full generation pipeline with Perlin noise and the built-in
    /// Voronoi service
    pub fn from_config(config: CityConfig) -> Result<Self> {
        let noise = PerlinNoise::new(config.noise.seed);
        Self::generate(config, &noise, &SpadeVoronoi)
    }

    /// Density map, sites, roads, structures, then population
    pub fn generate<N, V>(config: CityConfig, noise: &N, service: &V) -> Result<Self>
    where
        N: NoiseSource + ?Sized,
        V: VoronoiService + ?Sized,
    {
        config.validate().context("Invalid city configuration")?;
        let mut city = Self::new(config);

        let density = DensityField::generate(city.config.map_size, &city.config.noise, noise);
        let samples = density.weighted_samples(city.config.center_radius);
        let sites = generate_sites(
            city.config.map_size,
            city.config.center_radius,
            &samples,
            city.config.site_count,
            &mut city.rng,
        );
        if sites.len() < 3 {
            warn!("Only {} Voronoi sites; the road network will be sparse", sites.len());
        }

        let road_graph = RoadGraph::build(service, &sites, Bounds::square(city.config.map_size))
            .context("Failed to build the road graph")?;

        let layout = StructurePlacer::new(&density, &city.config)
            .plan(road_graph.segments(), &mut city.rng);
        for placement in &layout.structures {
            city.spawn_structure(placement);
        }

        info!(
            "Generated {} sites, {} road segments, {} houses, {} buildings, {} skyscrapers",
            sites.len(),
            road_graph.segments().len(),
            city.houses.len(),
            city.buildings.len(),
            city.skyscrapers.len()
        );

        city.roads = layout.roads;
        city.road_graph = road_graph;
        city.density = Some(density);

        city.populate();
        Ok(city)
    }

    /// Assigns homes, splits roles, then assigns workplaces. Exhaustion is
    /// logged and the city keeps whatever was placed.
    pub fn populate(&mut self) {
        let population = self.config.population;
        if let Err(e) = self.assign_homes(population) {
            warn!("{}", e);
        }
        self.split_roles();
        if let Err(e) = self.assign_workplaces() {
            warn!("{}", e);
        }
        info!(
            "Population: {} agents, {} habitations, {} workplaces",
            self.agents.len(),
            self.habitations.len(),
            self.workplaces.len()
        );
    }

    pub(crate) fn next_sim_id(&mut self) -> SimId {
        let id = SimId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Uniform draw from the city's RNG
    pub(crate) fn random_range(&mut self, range: std::ops::Range<f32>) -> f32 {
        if range.is_empty() {
            return range.start;
        }
        self.rng.random_range(range)
    }

    /// Creates a structure from a placement and files it under its class
    pub fn spawn_structure(&mut self, placement: &StructurePlacement) -> StructureId {
        let id = StructureId(self.next_sim_id());
        let mut structure = Structure::new(id, placement);
        structure.switch_role(placement.default_role());

        match placement.class {
            StructureClass::House => self.houses.push(id),
            StructureClass::Building => self.buildings.push(id),
            StructureClass::Skyscraper => self.skyscrapers.push(id),
        }
        self.structures.insert(id, structure);
        id
    }

    /// Removes a structure and queues its occupants for relocation.
    ///
    /// Drained agents lose their home or workplace reference in the same
    /// step, so nothing points at the removed structure afterwards.
    pub fn notify_destroyed(&mut self, id: StructureId) -> Result<DrainedOccupants, CityError> {
        let mut structure = self
            .structures
            .remove(&id)
            .ok_or(CityError::UnknownStructure(id))?;

        let class_list = match structure.class {
            StructureClass::House => &mut self.houses,
            StructureClass::Building => &mut self.buildings,
            StructureClass::Skyscraper => &mut self.skyscrapers,
        };
        class_list.retain(|s| *s != id);
        // a building may have switched role since the last split
        self.habitations.retain(|s| *s != id);
        self.workplaces.retain(|s| *s != id);

        let (inhabitants, workers) = structure.drain();
        for agent_id in &inhabitants {
            if let Some(agent) = self.agents.get_mut(agent_id) {
                agent.home = None;
            }
            if !self.homeless.contains(agent_id) {
                self.homeless.push(*agent_id);
            }
        }
        for agent_id in &workers {
            if let Some(agent) = self.agents.get_mut(agent_id) {
                agent.workplace = None;
            }
            if !self.workless.contains(agent_id) {
                self.workless.push(*agent_id);
            }
        }
        for agent in self.agents.values_mut() {
            if agent.destination == Some(id) {
                agent.destination = None;
            }
        }

        self.events.push(OccupancyEvent::Destroyed(id));
        self.stats.structures_destroyed += 1;
        info!(
            "{} {:?} destroyed: {} homeless, {} workless",
            structure.class,
            id.0,
            inhabitants.len(),
            workers.len()
        );

        Ok(DrainedOccupants {
            class: structure.class,
            inhabitants,
            workers,
        })
    }

    /// One simulation step at `time_of_day`.
    ///
    /// Removals are drained first, then the repair pass runs, then agents
    /// move and their schedules advance.
    pub fn tick<N: Navigator + ?Sized>(
        &mut self,
        time_of_day: f32,
        delta_secs: f32,
        removals: &[StructureId],
        nav: &mut N,
    ) {
        for &id in removals {
            if let Err(e) = self.notify_destroyed(id) {
                warn!("Ignoring removal: {}", e);
            }
        }
        self.repair(nav);
        nav.advance(delta_secs);
        self.step_agents(time_of_day, nav);
    }

    /// Registers every agent with the navigator at its current position
    pub fn place_agents<N: Navigator + ?Sized>(&self, nav: &mut N) {
        for id in &self.agent_order {
            if let Some(agent) = self.agents.get(id) {
                nav.place(*id, agent.position);
            }
        }
    }

    /// Advances every agent's schedule in creation order
    pub fn step_agents<N: Navigator + ?Sized>(&mut self, time_of_day: f32, nav: &mut N) {
        for i in 0..self.agent_order.len() {
            let id = self.agent_order[i];
            self.step_agent(id, time_of_day, nav);
        }
    }

    fn step_agent<N: Navigator + ?Sized>(&mut self, id: AgentId, time_of_day: f32, nav: &mut N) {
        let Some(agent) = self.agents.get_mut(&id) else {
            return;
        };
        if let Some(position) = nav.position(id) {
            agent.position = position;
        }

        // Home or workplace changed under a moving agent
        if agent.is_moving() && agent.trip_target() != agent.destination {
            let target = agent.trip_target();
            agent.destination = target;
            if let Some(door) = target.and_then(|t| self.entrance(t)) {
                nav.move_to(id, door);
            }
            return;
        }

        let arrived = agent.destination.is_some() && nav.has_arrived(id);
        match agent.next_action(time_of_day, arrived) {
            ScheduleAction::None => {}
            ScheduleAction::GoToWork => self.depart(id, Trip::ToWork, nav),
            ScheduleAction::GoHome => self.depart(id, Trip::ToHome, nav),
            ScheduleAction::Arrive => self.arrive(id, nav),
        }
    }

    fn depart<N: Navigator + ?Sized>(&mut self, id: AgentId, trip: Trip, nav: &mut N) {
        let Some(agent) = self.agents.get_mut(&id) else {
            return;
        };
        let (from, to) = match trip {
            Trip::ToWork => (agent.home, agent.workplace),
            Trip::ToHome => (agent.workplace, agent.home),
        };
        agent.activity = Activity::Moving(trip);
        agent.destination = to;
        agent.visible = true;

        if let Some(from) = from.filter(|s| self.structures.contains_key(s)) {
            self.events.push(OccupancyEvent::Left(from));
        }
        if let Some(door) = to.and_then(|t| self.entrance(t)) {
            nav.move_to(id, door);
        }
        self.stats.commutes_started += 1;
        debug!("Agent {:?} leaves {:?} heading {:?}", id.0, from, trip);
    }

    fn arrive<N: Navigator + ?Sized>(&mut self, id: AgentId, nav: &mut N) {
        nav.halt(id);
        let Some(agent) = self.agents.get_mut(&id) else {
            return;
        };
        let Some(destination) = agent.destination.take() else {
            return;
        };
        agent.visible = false;
        agent.activity = match agent.activity {
            Activity::Moving(Trip::ToWork) => Activity::Working,
            _ => Activity::Chilling,
        };

        if self.structures.contains_key(&destination) {
            self.events.push(OccupancyEvent::Entered(destination));
        }
        self.stats.commutes_completed += 1;
        debug!("Agent {:?} arrived at {:?}", id.0, destination.0);
    }

    /// Door of a structure at walking height
    pub(crate) fn entrance(&self, id: StructureId) -> Option<Position> {
        self.structures
            .get(&id)
            .map(|s| s.door().on_ground(self.config.agent_height))
    }

    /// Picks any standing structure, e.g. to simulate a collision
    pub fn random_structure(&mut self) -> Option<StructureId> {
        let ids = self.structure_ids();
        ids.choose(&mut self.rng).copied()
    }

    /// Every standing structure: houses, then buildings, then skyscrapers
    pub fn structure_ids(&self) -> Vec<StructureId> {
        self.houses
            .iter()
            .chain(&self.buildings)
            .chain(&self.skyscrapers)
            .copied()
            .collect()
    }

    pub fn config(&self) -> &CityConfig {
        &self.config
    }

    pub fn structure(&self, id: StructureId) -> Option<&Structure> {
        self.structures.get(&id)
    }

    pub fn structures(&self) -> impl Iterator<Item = &Structure> {
        self.structures.values()
    }

    pub fn structure_count(&self) -> usize {
        self.structures.len()
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Agents in creation order
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agent_order.iter().filter_map(|id| self.agents.get(id))
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn houses(&self) -> &[StructureId] {
        &self.houses
    }

    pub fn buildings(&self) -> &[StructureId] {
        &self.buildings
    }

    pub fn skyscrapers(&self) -> &[StructureId] {
        &self.skyscrapers
    }

    pub fn habitations(&self) -> &[StructureId] {
        &self.habitations
    }

    pub fn workplaces(&self) -> &[StructureId] {
        &self.workplaces
    }

    pub fn homeless(&self) -> &[AgentId] {
        &self.homeless
    }

    pub fn workless(&self) -> &[AgentId] {
        &self.workless
    }

    /// Whether the last repair pass left both relocation queues empty
    pub fn is_build_complete(&self) -> bool {
        self.build_complete
    }

    pub fn stats(&self) -> &CityStats {
        &self.stats
    }

    pub fn events(&self) -> &[OccupancyEvent] {
        &self.events
    }

    /// Hands pending notifications to the caller
    pub fn drain_events(&mut self) -> Vec<OccupancyEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn density(&self) -> Option<&DensityField> {
        self.density.as_ref()
    }

    pub fn roads(&self) -> &[RoadPlacement] {
        &self.roads
    }

    pub fn road_graph(&self) -> &RoadGraph {
        &self.road_graph
    }

    /// Total inhabitant slots over habitations
    fn housing_capacity(&self) -> usize {
        self.habitations
            .iter()
            .filter_map(|id| self.structures.get(id))
            .map(|s| s.capacity())
            .sum()
    }

    fn job_capacity(&self) -> usize {
        self.workplaces
            .iter()
            .filter_map(|id| self.structures.get(id))
            .map(|s| s.capacity())
            .sum()
    }

    pub fn summary(&self) -> String {
        let mut out = String::new();
        let moving = self.agents().filter(|a| a.is_moving()).count();
        let working = self
            .agents()
            .filter(|a| a.activity == Activity::Working)
            .count();

        let _ = writeln!(out, "=== Voronoi City Summary ===");
        let _ = writeln!(
            out,
            "Roads: {} segments ({} in spanning tree)",
            self.road_graph.segments().len(),
            self.road_graph.spanning_tree().len()
        );
        let _ = writeln!(
            out,
            "Houses: {}, Buildings: {}, Skyscrapers: {}",
            self.houses.len(),
            self.buildings.len(),
            self.skyscrapers.len()
        );
        let _ = writeln!(
            out,
            "Habitations: {} ({} slots), Workplaces: {} ({} slots)",
            self.habitations.len(),
            self.housing_capacity(),
            self.workplaces.len(),
            self.job_capacity()
        );
        let _ = writeln!(
            out,
            "Agents: {} (moving: {}, working: {}, homeless: {}, workless: {})",
            self.agents.len(),
            moving,
            working,
            self.homeless.len(),
            self.workless.len()
        );
        let _ = writeln!(
            out,
            "Build complete: {}",
            if self.build_complete { "yes" } else { "no" }
        );
        out
    }

    /// ASCII view of the density map with roads and structures on top.
    ///
    /// Rows follow grid x and columns follow grid y.
    pub fn render_map(&self, cols: usize, rows: usize) -> String {
        if cols == 0 || rows == 0 {
            return String::new();
        }
        let size = self.config.map_size as f32;
        let mut grid = vec![vec![MAP_SHADES[0]; cols]; rows];

        if let Some(density) = &self.density {
            for (r, line) in grid.iter_mut().enumerate() {
                for (c, cell) in line.iter_mut().enumerate() {
                    let x = (r as f32 + 0.5) / rows as f32 * size;
                    let y = (c as f32 + 0.5) / cols as f32 * size;
                    let value = density.sample(x, y).unwrap_or(0.0);
                    let shade = ((value * MAP_SHADES.len() as f32) as usize).min(MAP_SHADES.len() - 1);
                    *cell = MAP_SHADES[shade];
                }
            }
        }

        let to_cell = |x: f32, y: f32| -> (i64, i64) {
            (
                (x / size * rows as f32).floor() as i64,
                (y / size * cols as f32).floor() as i64,
            )
        };

        for segment in self.road_graph.segments() {
            let from = to_cell(segment.start.x, segment.start.y);
            let to = to_cell(segment.end.x, segment.end.y);
            draw_line(&mut grid, from, to, MAP_ROAD);
        }

        for id in self.structure_ids() {
            let Some(structure) = self.structures.get(&id) else {
                continue;
            };
            let x = self.config.to_grid(structure.position.z);
            let y = self.config.to_grid(structure.position.x);
            let (r, c) = to_cell(x, y);
            plot(&mut grid, r, c, structure.class.symbol());
        }

        let mut out = String::with_capacity((cols + 1) * rows);
        for line in grid {
            out.extend(line);
            out.push('\n');
        }
        out
    }
}

fn plot(grid: &mut [Vec<char>], r: i64, c: i64, ch: char) {
    if r < 0 || c < 0 {
        return;
    }
    if let Some(cell) = grid
        .get_mut(r as usize)
        .and_then(|line| line.get_mut(c as usize))
    {
        *cell = ch;
    }
}

/// Bresenham line, clipped to the grid
fn draw_line(grid: &mut [Vec<char>], from: (i64, i64), to: (i64, i64), ch: char) {
    let (mut x0, mut y0) = from;
    let (x1, y1) = to;
    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;

    loop {
        plot(grid, x0, y0, ch);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x0 += sx;
        }
        if e2 < dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bresenham_covers_both_endpoints() {
        let mut grid = vec![vec![' '; 5]; 5];
        draw_line(&mut grid, (0, 0), (4, 2), '#');
        assert_eq!(grid[0][0], '#');
        assert_eq!(grid[4][2], '#');
        let drawn = grid.iter().flatten().filter(|c| **c == '#').count();
        assert_eq!(drawn, 5);
    }

    #[test]
    fn lines_leaving_the_grid_are_clipped() {
        let mut grid = vec![vec![' '; 3]; 3];
        draw_line(&mut grid, (-2, 1), (5, 1), '#');
        assert_eq!(grid.iter().flatten().filter(|c| **c == '#').count(), 3);
    }
}
