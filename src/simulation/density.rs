//! Density map generation and density-weighted sampling
//!
//! The map blends coherent noise with the normalized distance to the map
//! center so that density peaks in the middle of the city and gets noisier
//! toward the edges.

use fastnoise_lite::{FastNoiseLite, NoiseType};
use rand::Rng;

use super::config::NoiseParams;

/// Weight granted to a cell of density 1.0
const SAMPLE_WEIGHT_SCALE: f32 = 100.0;

/// Coherent noise primitive returning values in [0, 1]
pub trait NoiseSource {
    fn sample(&self, x: f32, y: f32) -> f32;
}

impl<F> NoiseSource for F
where
    F: Fn(f32, f32) -> f32,
{
    fn sample(&self, x: f32, y: f32) -> f32 {
        self(x, y)
    }
}

/// Perlin noise backed by FastNoiseLite
///
/// Frequency is left at 1.0 since callers pre-scale coordinates.
pub struct PerlinNoise {
    noise: FastNoiseLite,
}

impl PerlinNoise {
    pub fn new(seed: i32) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::Perlin));
        noise.set_frequency(Some(1.0));
        Self { noise }
    }
}

impl NoiseSource for PerlinNoise {
    fn sample(&self, x: f32, y: f32) -> f32 {
        // FastNoiseLite returns [-1, 1]
        ((self.noise.get_noise_2d(x, y) + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

/// Square grid of densities in [0, 1], indexed `[i][j]`
#[derive(Debug, Clone, PartialEq)]
pub struct DensityField {
    size: usize,
    cells: Vec<f32>,
}

impl DensityField {
    pub fn generate<N: NoiseSource + ?Sized>(size: usize, params: &NoiseParams, noise: &N) -> Self {
        let center = (size / 2) as f32;
        let mut cells = Vec::with_capacity(size * size);

        for i in 0..size {
            for j in 0..size {
                let dx = center - i as f32;
                let dy = center - j as f32;
                let distance_to_center = (dx * dx + dy * dy).sqrt() / size as f32;

                let n = noise.sample(
                    params.frequency_x * i as f32 + params.offset_x,
                    params.frequency_y * j as f32 + params.offset_y,
                );
                // Higher values when we get closer to the center
                let value = n * distance_to_center + (1.0 - distance_to_center);
                cells.push(value.min(1.0));
            }
        }

        Self { size, cells }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        if i >= self.size || j >= self.size {
            return None;
        }
        self.cells.get(i * self.size + j).copied()
    }

    /// Density at a fractional grid coordinate, `None` outside the map
    pub fn sample(&self, x: f32, y: f32) -> Option<f32> {
        let size = self.size as f32;
        if !(x >= 0.0 && x < size && y >= 0.0 && y < size) {
            return None;
        }
        self.get(x as usize, y as usize)
    }

    /// Builds the density-weighted point sequence used to seed sites.
    ///
    /// Cells within `exclusion_radius` of the center are left out.
    pub fn weighted_samples(&self, exclusion_radius: i64) -> WeightedSamples {
        let half = (self.size / 2) as i64;
        let radius_sq = exclusion_radius * exclusion_radius;
        let mut samples = WeightedSamples::default();

        for i in 0..self.size {
            for j in 0..self.size {
                let x = i as i64 - half;
                let y = j as i64 - half;
                if x * x + y * y <= radius_sq {
                    continue;
                }
                let occurrences = (SAMPLE_WEIGHT_SCALE * self.cells[i * self.size + j]) as u64;
                samples.push((i as u32, j as u32), occurrences);
            }
        }

        samples
    }
}

/// A run-length encoded sequence of grid cells where each cell appears
/// `floor(100 * density)` times.
///
/// Indexing and uniform draws behave exactly like the expanded sequence
/// without materializing every duplicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedSamples {
    cells: Vec<(u32, u32)>,
    /// Running total of occurrences, one entry per cell
    cumulative: Vec<u64>,
}

impl WeightedSamples {
    fn push(&mut self, cell: (u32, u32), occurrences: u64) {
        if occurrences == 0 {
            return;
        }
        let total = self.len() + occurrences;
        self.cells.push(cell);
        self.cumulative.push(total);
    }

    /// Length of the expanded sequence
    pub fn len(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of distinct cells in the sequence
    pub fn distinct_cells(&self) -> usize {
        self.cells.len()
    }

    /// Element at `index` of the expanded sequence
    pub fn get(&self, index: u64) -> Option<(u32, u32)> {
        if index >= self.len() {
            return None;
        }
        let slot = self.cumulative.partition_point(|&end| end <= index);
        self.cells.get(slot).copied()
    }

    /// Occurrences of a cell in the expanded sequence
    pub fn weight_of(&self, cell: (u32, u32)) -> u64 {
        self.cells
            .iter()
            .position(|c| *c == cell)
            .map(|slot| {
                let start = if slot == 0 { 0 } else { self.cumulative[slot - 1] };
                self.cumulative[slot] - start
            })
            .unwrap_or(0)
    }

    /// Uniform draw over the expanded sequence
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(u32, u32)> {
        if self.is_empty() {
            return None;
        }
        let index = rng.random_range(0..self.len());
        self.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn constant(value: f32) -> impl Fn(f32, f32) -> f32 {
        move |_, _| value
    }

    #[test]
    fn center_cell_is_fully_dense() {
        let field = DensityField::generate(10, &NoiseParams::default(), &constant(0.0));
        assert_eq!(field.get(5, 5), Some(1.0));
    }

    #[test]
    fn density_falls_off_with_distance_when_noise_is_zero() {
        let field = DensityField::generate(10, &NoiseParams::default(), &constant(0.0));
        // corner (0, 0) is sqrt(50) cells from the center
        let expected = 1.0 - (50.0f32).sqrt() / 10.0;
        let corner = field.get(0, 0).unwrap();
        assert!((corner - expected).abs() < 1e-6);
        assert!(field.get(5, 5).unwrap() > field.get(5, 0).unwrap());
    }

    #[test]
    fn density_is_clamped_to_one() {
        let field = DensityField::generate(8, &NoiseParams::default(), &constant(3.0));
        assert!(field.cells.iter().all(|v| *v <= 1.0));
    }

    #[test]
    fn out_of_bounds_lookups_return_none() {
        let field = DensityField::generate(4, &NoiseParams::default(), &constant(0.5));
        assert_eq!(field.sample(-0.5, 1.0), None);
        assert_eq!(field.sample(4.0, 1.0), None);
        assert_eq!(field.sample(1.0, 4.2), None);
        assert!(field.sample(3.9, 0.0).is_some());
        assert_eq!(field.get(4, 0), None);
    }

    #[test]
    fn perlin_generation_is_reproducible() {
        let params = NoiseParams::default();
        let a = DensityField::generate(64, &params, &PerlinNoise::new(params.seed));
        let b = DensityField::generate(64, &params, &PerlinNoise::new(params.seed));
        assert_eq!(a, b);
        assert!(a.cells.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn weighted_samples_skip_the_center_area() {
        // noise above 1 saturates every cell at exactly 1.0
        let field = DensityField::generate(10, &NoiseParams::default(), &constant(2.0));
        let samples = field.weighted_samples(2);
        // 13 lattice cells lie within radius 2 of (5, 5)
        assert_eq!(samples.distinct_cells(), 100 - 13);
        assert_eq!(samples.weight_of((5, 5)), 0);
        assert_eq!(samples.weight_of((0, 0)), 100);
        assert_eq!(samples.len(), 87 * 100);
    }

    #[test]
    fn expanded_indexing_matches_run_lengths() {
        let mut samples = WeightedSamples::default();
        samples.push((1, 1), 2);
        samples.push((2, 2), 0);
        samples.push((3, 3), 3);

        let expanded: Vec<_> = (0..samples.len()).filter_map(|i| samples.get(i)).collect();
        assert_eq!(expanded, vec![(1, 1), (1, 1), (3, 3), (3, 3), (3, 3)]);
        assert_eq!(samples.get(5), None);
    }

    #[test]
    fn draws_favor_denser_cells() {
        let mut samples = WeightedSamples::default();
        samples.push((0, 0), 10);
        samples.push((1, 1), 90);

        let mut rng = StdRng::seed_from_u64(3);
        let dense = (0..2000)
            .filter(|_| samples.choose(&mut rng) == Some((1, 1)))
            .count();
        assert!(dense > 1500, "dense cell drawn {} times", dense);
    }
}
