use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{debug, info, warn};

use voronoi_city::simulation::{CityConfig, CityState, Simulation};

#[derive(Parser)]
#[command(name = "voronoi_city")]
#[command(about = "Procedural Voronoi city with a headless commuter simulation")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "2000")]
    ticks: u32,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.1")]
    delta: f32,

    /// RNG seed for a reproducible city
    #[arg(long)]
    seed: Option<u64>,

    /// Number of agents to house
    #[arg(long, default_value_t = voronoi_city::simulation::POPULATION_SIZE)]
    population: usize,

    /// Number of density-weighted random Voronoi sites
    #[arg(long, default_value_t = voronoi_city::simulation::SITE_COUNT)]
    points: usize,

    /// Number of random structures destroyed during the run
    #[arg(long, default_value = "0")]
    destroy: u32,

    /// Real seconds per simulated day
    #[arg(long, default_value_t = voronoi_city::simulation::DAY_LENGTH_SECS)]
    day_length: f32,

    /// Side length of the density map in cells
    #[arg(long, default_value_t = voronoi_city::simulation::MAP_SIZE)]
    map_size: usize,

    /// Print an ASCII map before and after the run
    #[arg(long)]
    map: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = CityConfig {
        seed: cli.seed,
        population: cli.population,
        site_count: cli.points,
        day_length_secs: cli.day_length,
        map_size: cli.map_size,
        // keep the open center proportional to the map
        center_radius: (cli.map_size / 5) as i64,
        ..CityConfig::default()
    };

    run_headless(config, &cli)
}

/// Generate the city and run it without graphics
fn run_headless(config: CityConfig, cli: &Cli) -> Result<()> {
    info!(
        "Running Voronoi city in headless mode: {} ticks of {}s",
        cli.ticks, cli.delta
    );

    let city = CityState::from_config(config).context("City generation failed")?;
    info!("Initial state:\n{}", city.summary());
    if cli.map {
        println!("{}", city.render_map(80, 40));
    }

    let mut sim = Simulation::new(city);
    let interval = if cli.destroy > 0 {
        (cli.ticks / cli.destroy.saturating_add(1)).max(1)
    } else {
        0
    };
    let mut destroyed = 0;

    for tick in 1..=cli.ticks {
        if destroyed < cli.destroy && interval > 0 && tick % interval == 0 {
            match sim.city.random_structure() {
                Some(id) => {
                    sim.queue_removal(id);
                    destroyed += 1;
                }
                None => warn!("No structure left to destroy at tick {}", tick),
            }
        }
        sim.tick(cli.delta);
        for event in sim.city.drain_events() {
            debug!("{:?}", event);
        }
    }

    info!("Final state:\n{}", sim.city.summary());
    if cli.map {
        println!("{}", sim.city.render_map(80, 40));
    }
    sim.log_summary();
    Ok(())
}
