//! Headless run loop

use log::info;

use super::clock::DayClock;
use super::navigation::{Navigator, StraightLineNavigator};
use super::types::StructureId;
use super::world::CityState;

/// A city with a clock and a navigator, stepped with [`Simulation::tick`]
pub struct Simulation<N: Navigator = StraightLineNavigator> {
    pub city: CityState,
    pub clock: DayClock,
    pub navigator: N,
    pending_removals: Vec<StructureId>,
    ticks: u64,
}

impl Simulation<StraightLineNavigator> {
    pub fn new(city: CityState) -> Self {
        let config = city.config();
        let navigator = StraightLineNavigator::new(config.agent_speed, config.arrival_threshold);
        Self::with_navigator(city, navigator)
    }
}

impl<N: Navigator> Simulation<N> {
    pub fn with_navigator(city: CityState, mut navigator: N) -> Self {
        city.place_agents(&mut navigator);
        let clock = DayClock::new(city.config().day_length_secs);
        Self {
            city,
            clock,
            navigator,
            pending_removals: Vec::new(),
            ticks: 0,
        }
    }

    /// Queues a structure removal for the next tick
    pub fn queue_removal(&mut self, id: StructureId) {
        self.pending_removals.push(id);
    }

    pub fn tick(&mut self, delta_secs: f32) {
        self.clock.advance(delta_secs);
        let removals = std::mem::take(&mut self.pending_removals);
        self.city.tick(
            self.clock.time_of_day(),
            delta_secs,
            &removals,
            &mut self.navigator,
        );
        self.ticks += 1;
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn log_summary(&self) {
        info!("=== SIMULATION COMPLETE ===");
        info!("Ticks: {}", self.ticks);
        info!(
            "Days elapsed: {}, time of day: {:.2}",
            self.clock.days_elapsed(),
            self.clock.time_of_day()
        );
        info!("Structures standing: {}", self.city.structure_count());
        info!("Agents: {}", self.city.agent_count());
        info!("Homeless: {}", self.city.homeless().len());
        info!("Workless: {}", self.city.workless().len());
        info!(
            "Build complete: {}",
            if self.city.is_build_complete() { "yes" } else { "no" }
        );
        self.city.stats().log_summary();
    }
}
