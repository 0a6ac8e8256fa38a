//! Places roads and structures along Voronoi segments
//!
//! Works entirely on placement requests; nothing here touches the city
//! state, so a layout can be inspected before it is built.

use log::debug;
use rand::Rng;

use super::config::CityConfig;
use super::density::DensityField;
use super::road_graph::RoadSegment;
use super::types::{GridPoint, Position, Role, StructureClass};

/// Structures per segment are spaced this many footprints apart
const STRUCTURE_PITCH: f32 = 1.5;

/// A road mesh to be laid along one segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadPlacement {
    pub center: Position,
    /// Yaw in degrees
    pub angle: f32,
    pub length: f32,
    pub width: f32,
    pub height: f32,
}

/// A structure to be created next to a road
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructurePlacement {
    pub class: StructureClass,
    /// Center of the structure's base, raised by half its height
    pub position: Position,
    /// Yaw in degrees, aligned with the adjacent road
    pub angle: f32,
    pub height: f32,
    pub footprint: f32,
    pub capacity: usize,
    /// Vector from the structure to its road
    pub road_offset: Position,
    /// Density of the grid cell the structure was placed on
    pub density: f32,
}

impl StructurePlacement {
    /// One occupant per footprint-sized storey
    pub fn capacity_for(height: f32, footprint: f32) -> usize {
        let storeys = (height / footprint).floor();
        if storeys.is_finite() && storeys > 0.0 {
            storeys as usize
        } else {
            0
        }
    }

    /// Role a freshly created structure of this class starts with
    pub fn default_role(&self) -> Role {
        match self.class {
            StructureClass::House => Role::Habitation,
            StructureClass::Building | StructureClass::Skyscraper => Role::Workplace,
        }
    }
}

/// Roads and structures for a whole city
#[derive(Debug, Clone, Default)]
pub struct CityLayout {
    pub roads: Vec<RoadPlacement>,
    pub structures: Vec<StructurePlacement>,
}

impl CityLayout {
    pub fn count(&self, class: StructureClass) -> usize {
        self.structures.iter().filter(|s| s.class == class).count()
    }
}

pub struct StructurePlacer<'a> {
    density: &'a DensityField,
    config: &'a CityConfig,
}

impl<'a> StructurePlacer<'a> {
    pub fn new(density: &'a DensityField, config: &'a CityConfig) -> Self {
        Self { density, config }
    }

    /// Lays out every segment in order
    pub fn plan<R: Rng + ?Sized>(&self, segments: &[RoadSegment], rng: &mut R) -> CityLayout {
        let mut layout = CityLayout::default();
        for segment in segments {
            self.place_along(segment, rng, &mut layout);
        }
        layout
    }

    /// Number of structure slots along a segment (slot 0 is never used)
    pub fn structure_count(&self, segment: &RoadSegment) -> usize {
        let world_length = self.config.to_scene_length(segment.length());
        (world_length / (self.config.footprint * STRUCTURE_PITCH)) as usize
    }

    /// Road mesh for a segment
    pub fn road_for(&self, segment: &RoadSegment) -> RoadPlacement {
        let cfg = self.config;
        let vector = segment.vector();
        let world = vector * cfg.to_scene_length(1.0);
        let angle = world.signed_angle_from_x();
        let mid = segment.start + vector * 0.5;

        RoadPlacement {
            // grid y runs along scene x, grid x along scene z
            center: Position::new(cfg.to_scene(mid.y), cfg.road_height / 2.0, cfg.to_scene(mid.x)),
            angle: angle + 90.0,
            length: world.length() * cfg.road_length_scale,
            width: cfg.road_width,
            height: cfg.road_height,
        }
    }

    /// Adds the road for `segment` and the structures lining both of its sides
    pub fn place_along<R: Rng + ?Sized>(
        &self,
        segment: &RoadSegment,
        rng: &mut R,
        layout: &mut CityLayout,
    ) {
        let road = self.road_for(segment);
        let angle = road.angle - 90.0;
        layout.roads.push(road);

        let count = self.structure_count(segment);
        let vector = segment.vector();
        let ortho = (vector * self.config.to_scene_length(1.0))
            .perpendicular()
            .normalized();
        let spacing = self.config.structure_spacing();
        let side = ortho * spacing;

        let to_road = Position::new(
            self.config.to_scene_length(side.y),
            0.0,
            self.config.to_scene_length(side.x),
        );

        let before = layout.structures.len();
        for k in 1..count {
            let t = k as f32 / count as f32;
            let point = segment.start + vector * t;

            let candidates = [(point + side, -to_road), (point - side, to_road)];
            for (site, offset) in candidates {
                if let Some(placement) = self.classify(site, angle, offset, rng) {
                    layout.structures.push(placement);
                }
            }
        }

        debug!(
            "Segment of length {:.1} cells: {} slots, {} structures",
            segment.length(),
            count,
            layout.structures.len() - before
        );
    }

    /// Picks the structure class for a candidate site.
    ///
    /// Sites outside the density map produce nothing.
    pub fn classify<R: Rng + ?Sized>(
        &self,
        site: GridPoint,
        angle: f32,
        road_offset: Position,
        rng: &mut R,
    ) -> Option<StructurePlacement> {
        let density = self.density.sample(site.x, site.y)?;
        let cfg = self.config;
        let footprint = cfg.footprint;

        let (class, height) = if density < cfg.house_threshold {
            (StructureClass::House, footprint)
        } else if density < cfg.building_threshold {
            let jitter = rng.random_range(0.0..footprint * 2.0);
            (StructureClass::Building, density + jitter)
        } else {
            let jitter = rng.random_range(footprint * 3.0..footprint * 4.0);
            (StructureClass::Skyscraper, density + jitter)
        };

        Some(StructurePlacement {
            class,
            position: Position::new(cfg.to_scene(site.y), height / 2.0, cfg.to_scene(site.x)),
            angle,
            height,
            footprint,
            capacity: StructurePlacement::capacity_for(height, footprint),
            road_offset,
            density,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::config::NoiseParams;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_config() -> CityConfig {
        CityConfig {
            map_size: 100,
            plane_size: 20.0,
            ..CityConfig::default()
        }
    }

    fn flat_field(size: usize, value: f32) -> DensityField {
        // noise that cancels the radial falloff, except at the center cell
        let center = (size / 2) as f32;
        let params = NoiseParams {
            frequency_x: 1.0,
            frequency_y: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            seed: 0,
        };
        DensityField::generate(size, &params, &move |x: f32, y: f32| {
            let d = ((center - x).powi(2) + (center - y).powi(2)).sqrt() / size as f32;
            if d == 0.0 {
                value
            } else {
                (value - (1.0 - d)) / d
            }
        })
    }

    #[test]
    fn capacity_is_storey_count() {
        assert_eq!(StructurePlacement::capacity_for(0.2, 0.2), 1);
        assert_eq!(StructurePlacement::capacity_for(1.19, 0.2), 5);
        assert_eq!(StructurePlacement::capacity_for(0.1, 0.2), 0);
    }

    #[test]
    fn classification_follows_thresholds() {
        let config = small_config();
        let mut rng = StdRng::seed_from_u64(1);

        for (value, class) in [
            (0.5, StructureClass::House),
            (0.92, StructureClass::Building),
            (0.99, StructureClass::Skyscraper),
        ] {
            let field = flat_field(100, value);
            let placer = StructurePlacer::new(&field, &config);
            let placement = placer
                .classify(GridPoint::new(20.0, 30.0), 0.0, Position::default(), &mut rng)
                .unwrap();
            assert_eq!(placement.class, class, "density {}", value);
        }
    }

    #[test]
    fn houses_are_single_storey_habitations() {
        let config = small_config();
        let field = flat_field(100, 0.3);
        let placer = StructurePlacer::new(&field, &config);
        let mut rng = StdRng::seed_from_u64(2);
        let house = placer
            .classify(GridPoint::new(10.0, 10.0), 0.0, Position::default(), &mut rng)
            .unwrap();

        assert_eq!(house.height, config.footprint);
        assert_eq!(house.capacity, 1);
        assert_eq!(house.default_role(), Role::Habitation);
    }

    #[test]
    fn tall_structures_hold_more_occupants() {
        let config = small_config();
        let field = flat_field(100, 0.99);
        let placer = StructurePlacer::new(&field, &config);
        let mut rng = StdRng::seed_from_u64(3);
        let tower = placer
            .classify(GridPoint::new(10.0, 10.0), 0.0, Position::default(), &mut rng)
            .unwrap();

        assert!(tower.height >= 0.99 + 3.0 * config.footprint - 1e-4);
        assert!(tower.capacity >= 7);
        assert_eq!(tower.default_role(), Role::Workplace);
    }

    #[test]
    fn out_of_bounds_sites_are_skipped() {
        let config = small_config();
        let field = flat_field(100, 0.5);
        let placer = StructurePlacer::new(&field, &config);
        let mut rng = StdRng::seed_from_u64(4);

        for site in [
            GridPoint::new(-0.5, 10.0),
            GridPoint::new(100.0, 10.0),
            GridPoint::new(10.0, 100.0),
            GridPoint::new(10.0, -3.0),
        ] {
            assert!(placer.classify(site, 0.0, Position::default(), &mut rng).is_none());
        }
    }

    #[test]
    fn segment_slots_depend_on_world_length() {
        let config = small_config();
        let field = flat_field(100, 0.5);
        let placer = StructurePlacer::new(&field, &config);

        // 50 cells = 10 world units; 10 / (0.2 * 1.5) = 33.3
        let long = RoadSegment::new(GridPoint::new(10.0, 10.0), GridPoint::new(60.0, 10.0));
        assert_eq!(placer.structure_count(&long), 33);

        // 1 cell = 0.2 world units, shorter than one pitch
        let short = RoadSegment::new(GridPoint::new(10.0, 10.0), GridPoint::new(11.0, 10.0));
        assert_eq!(placer.structure_count(&short), 0);
    }

    #[test]
    fn structures_flank_the_road_and_point_back_at_it() {
        let config = small_config();
        let field = flat_field(100, 0.5);
        let placer = StructurePlacer::new(&field, &config);
        let mut rng = StdRng::seed_from_u64(5);
        let mut layout = CityLayout::default();

        let segment = RoadSegment::new(GridPoint::new(50.0, 20.0), GridPoint::new(50.0, 80.0));
        placer.place_along(&segment, &mut rng, &mut layout);

        assert_eq!(layout.roads.len(), 1);
        let count = placer.structure_count(&segment);
        assert_eq!(layout.structures.len(), 2 * (count - 1));

        // The road runs along grid x = 50, i.e. scene z = 0
        for structure in &layout.structures {
            let door = structure.position + structure.road_offset;
            assert!(door.z.abs() < 1e-4, "door {:?}", door);
            assert!(structure.position.z.abs() > 1e-3);
        }
    }

    #[test]
    fn road_sits_on_segment_midpoint() {
        let config = small_config();
        let field = flat_field(100, 0.5);
        let placer = StructurePlacer::new(&field, &config);

        let segment = RoadSegment::new(GridPoint::new(0.0, 50.0), GridPoint::new(100.0, 50.0));
        let road = placer.road_for(&segment);
        assert!((road.center.x - 0.0).abs() < 1e-5);
        assert!((road.center.z - 0.0).abs() < 1e-5);
        assert!((road.length - 20.0 * config.road_length_scale).abs() < 1e-4);
        assert!((road.angle - 90.0).abs() < 1e-4);
    }
}
