//! Road network derived from a Voronoi diagram
//!
//! The diagram itself comes from a [`VoronoiService`]; the rest of the
//! simulation only ever reads the resulting segment list.

use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use ordered_float::OrderedFloat;
use petgraph::algo::min_spanning_tree;
use petgraph::data::Element;
use petgraph::graph::{NodeIndex, UnGraph};
use rand::Rng;
use spade::{DelaunayTriangulation, Point2, Triangulation as _};
use std::collections::BTreeMap;

use super::density::WeightedSamples;
use super::types::GridPoint;

/// Group tag attached to every generated site
pub const DEFAULT_SITE_GROUP: u32 = 0;

/// A generator point of the Voronoi diagram
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Site {
    pub position: GridPoint,
    /// Opaque tag required by the service contract
    pub group: u32,
}

impl Site {
    pub fn new(x: f32, y: f32, group: u32) -> Self {
        Self {
            position: GridPoint::new(x, y),
            group,
        }
    }
}

/// Axis-aligned rectangle in grid space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounds covering a whole square map
    pub fn square(size: usize) -> Self {
        Self::new(0.0, 0.0, size as f32, size as f32)
    }

    pub fn contains(&self, point: GridPoint) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// Clips the segment `a -> b` to the rectangle (Liang-Barsky).
    /// Returns `None` when the segment lies entirely outside.
    pub fn clip(&self, a: (f64, f64), b: (f64, f64)) -> Option<(GridPoint, GridPoint)> {
        let (x0, y0) = a;
        let dx = b.0 - a.0;
        let dy = b.1 - a.1;
        let min_x = self.x as f64;
        let min_y = self.y as f64;
        let max_x = (self.x + self.width) as f64;
        let max_y = (self.y + self.height) as f64;

        let mut t0 = 0.0f64;
        let mut t1 = 1.0f64;
        let checks = [
            (-dx, x0 - min_x),
            (dx, max_x - x0),
            (-dy, y0 - min_y),
            (dy, max_y - y0),
        ];

        for (p, q) in checks {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }

        let start = GridPoint::new((x0 + t0 * dx) as f32, (y0 + t0 * dy) as f32);
        let end = GridPoint::new((x0 + t1 * dx) as f32, (y0 + t1 * dy) as f32);
        Some((start, end))
    }
}

/// A road placement between two grid-space endpoints
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadSegment {
    pub start: GridPoint,
    pub end: GridPoint,
}

impl RoadSegment {
    pub fn new(start: GridPoint, end: GridPoint) -> Self {
        Self { start, end }
    }

    pub fn vector(&self) -> GridPoint {
        self.end - self.start
    }

    pub fn length(&self) -> f32 {
        self.vector().length()
    }
}

/// Everything a Voronoi implementation hands back
#[derive(Debug, Clone, Default)]
pub struct VoronoiOutput {
    /// Voronoi edges clipped to the bounds
    pub segments: Vec<RoadSegment>,
    /// Minimum spanning tree over the Delaunay edges
    pub spanning_tree: Vec<RoadSegment>,
    /// Delaunay edges
    pub triangulation: Vec<RoadSegment>,
}

/// Computes a Voronoi diagram for a site set.
///
/// Implementations are interchangeable as long as they return segments in
/// grid space.
pub trait VoronoiService {
    fn compute(&self, sites: &[Site], bounds: Bounds) -> Result<VoronoiOutput>;
}

/// Voronoi diagram derived from a `spade` Delaunay triangulation
#[derive(Debug, Clone, Copy, Default)]
pub struct SpadeVoronoi;

type PointKey = (OrderedFloat<f64>, OrderedFloat<f64>);

fn point_key(p: Point2<f64>) -> PointKey {
    (OrderedFloat(p.x), OrderedFloat(p.y))
}

/// Circumcenter of a non-degenerate triangle
fn circumcenter(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> (f64, f64) {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    let a2 = a.x * a.x + a.y * a.y;
    let b2 = b.x * b.x + b.y * b.y;
    let c2 = c.x * c.x + c.y * c.y;
    let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;
    (ux, uy)
}

/// A Delaunay edge and the triangles on either side of it
struct DelaunayEdge {
    from: Point2<f64>,
    to: Point2<f64>,
    /// (circumcenter, vertex opposite the edge) per adjacent triangle
    sides: Vec<((f64, f64), Point2<f64>)>,
}

impl DelaunayEdge {
    /// Voronoi edge dual to this Delaunay edge, before clipping
    fn dual(&self, bounds: &Bounds) -> Option<((f64, f64), (f64, f64))> {
        match self.sides.as_slice() {
            [(a, _), (b, _)] => Some((*a, *b)),
            [(center, opposite)] => {
                // Hull edge: the dual is a ray leaving the hull
                let ex = self.to.x - self.from.x;
                let ey = self.to.y - self.from.y;
                let (mut nx, mut ny) = (-ey, ex);
                let mid_x = (self.from.x + self.to.x) * 0.5;
                let mid_y = (self.from.y + self.to.y) * 0.5;
                if nx * (opposite.x - mid_x) + ny * (opposite.y - mid_y) > 0.0 {
                    nx = -nx;
                    ny = -ny;
                }
                let len = (nx * nx + ny * ny).sqrt();
                if len == 0.0 {
                    return None;
                }
                let cx = (bounds.x + bounds.width * 0.5) as f64;
                let cy = (bounds.y + bounds.height * 0.5) as f64;
                let reach = 2.0 * (bounds.width + bounds.height) as f64
                    + ((center.0 - cx).powi(2) + (center.1 - cy).powi(2)).sqrt();
                let far = (center.0 + nx / len * reach, center.1 + ny / len * reach);
                Some((*center, far))
            }
            _ => None,
        }
    }
}

impl VoronoiService for SpadeVoronoi {
    fn compute(&self, sites: &[Site], bounds: Bounds) -> Result<VoronoiOutput> {
        if sites.len() < 3 {
            warn!(
                "Only {} sites supplied; a Voronoi diagram needs at least 3",
                sites.len()
            );
        }

        let mut triangulation: DelaunayTriangulation<Point2<f64>> = DelaunayTriangulation::new();
        for site in sites {
            let point = Point2::new(site.position.x as f64, site.position.y as f64);
            triangulation
                .insert(point)
                .map_err(|e| anyhow!("Failed to insert site {:?}: {:?}", site.position, e))?;
        }

        // Keyed by endpoint positions so iteration order is deterministic
        let mut edges: BTreeMap<(PointKey, PointKey), DelaunayEdge> = BTreeMap::new();
        for face in triangulation.inner_faces() {
            let [a, b, c] = face.vertices().map(|v| v.position());
            let center = circumcenter(a, b, c);

            for (from, to, opposite) in [(a, b, c), (b, c, a), (c, a, b)] {
                let (ka, kb) = (point_key(from), point_key(to));
                let key = if ka <= kb { (ka, kb) } else { (kb, ka) };
                edges
                    .entry(key)
                    .or_insert_with(|| DelaunayEdge {
                        from,
                        to,
                        sides: Vec::with_capacity(2),
                    })
                    .sides
                    .push((center, opposite));
            }
        }

        let mut output = VoronoiOutput::default();
        let mut graph: UnGraph<Point2<f64>, OrderedFloat<f64>> = UnGraph::new_undirected();
        let mut nodes: BTreeMap<PointKey, NodeIndex> = BTreeMap::new();

        for edge in edges.values() {
            let from = GridPoint::new(edge.from.x as f32, edge.from.y as f32);
            let to = GridPoint::new(edge.to.x as f32, edge.to.y as f32);
            output.triangulation.push(RoadSegment::new(from, to));

            let a = *nodes
                .entry(point_key(edge.from))
                .or_insert_with(|| graph.add_node(edge.from));
            let b = *nodes
                .entry(point_key(edge.to))
                .or_insert_with(|| graph.add_node(edge.to));
            let weight = ((edge.to.x - edge.from.x).powi(2) + (edge.to.y - edge.from.y).powi(2)).sqrt();
            graph.add_edge(a, b, OrderedFloat(weight));

            if let Some((start, end)) = edge.dual(&bounds) {
                if let Some((start, end)) = bounds.clip(start, end) {
                    let segment = RoadSegment::new(start, end);
                    if segment.length() > f32::EPSILON {
                        output.segments.push(segment);
                    }
                }
            }
        }

        for element in min_spanning_tree(&graph) {
            if let Element::Edge { source, target, .. } = element {
                let from = graph[NodeIndex::new(source)];
                let to = graph[NodeIndex::new(target)];
                output.spanning_tree.push(RoadSegment::new(
                    GridPoint::new(from.x as f32, from.y as f32),
                    GridPoint::new(to.x as f32, to.y as f32),
                ));
            }
        }

        debug!(
            "Voronoi: {} sites -> {} road segments, {} delaunay edges",
            sites.len(),
            output.segments.len(),
            output.triangulation.len()
        );

        Ok(output)
    }
}

/// Road layout of a city: the Voronoi segments plus the auxiliary graphs
/// the service returns
#[derive(Debug, Clone, Default)]
pub struct RoadGraph {
    segments: Vec<RoadSegment>,
    spanning_tree: Vec<RoadSegment>,
    triangulation: Vec<RoadSegment>,
}

impl RoadGraph {
    pub fn build<V: VoronoiService + ?Sized>(
        service: &V,
        sites: &[Site],
        bounds: Bounds,
    ) -> Result<Self> {
        let output = service
            .compute(sites, bounds)
            .context("Voronoi service failed")?;
        Ok(Self::from(output))
    }

    pub fn segments(&self) -> &[RoadSegment] {
        &self.segments
    }

    pub fn spanning_tree(&self) -> &[RoadSegment] {
        &self.spanning_tree
    }

    pub fn triangulation(&self) -> &[RoadSegment] {
        &self.triangulation
    }
}

impl From<VoronoiOutput> for RoadGraph {
    fn from(output: VoronoiOutput) -> Self {
        Self {
            segments: output.segments,
            spanning_tree: output.spanning_tree,
            triangulation: output.triangulation,
        }
    }
}

/// Sites for the Voronoi step: the map center, every lattice cell lying
/// exactly on the center circle, and `count` density-weighted draws.
pub fn generate_sites<R: Rng + ?Sized>(
    map_size: usize,
    center_radius: i64,
    samples: &WeightedSamples,
    count: usize,
    rng: &mut R,
) -> Vec<Site> {
    let half = (map_size / 2) as i64;
    let radius_sq = center_radius * center_radius;
    let mut sites = vec![Site::new(half as f32, half as f32, DEFAULT_SITE_GROUP)];

    for i in 0..map_size as i64 {
        for j in 0..map_size as i64 {
            let x = i - half;
            let y = j - half;
            if x * x + y * y == radius_sq {
                sites.push(Site::new(i as f32, j as f32, DEFAULT_SITE_GROUP));
            }
        }
    }

    if samples.is_empty() && count > 0 {
        warn!("No weighted samples available; skipping {} random sites", count);
        return sites;
    }

    for _ in 0..count {
        if let Some((x, y)) = samples.choose(rng) {
            sites.push(Site::new(x as f32, y as f32, DEFAULT_SITE_GROUP));
        }
    }

    sites
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_keeps_inner_segments_untouched() {
        let bounds = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let (a, b) = bounds.clip((1.0, 1.0), (9.0, 2.0)).unwrap();
        assert_eq!(a, GridPoint::new(1.0, 1.0));
        assert_eq!(b, GridPoint::new(9.0, 2.0));
    }

    #[test]
    fn clip_trims_crossing_segments() {
        let bounds = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let (a, b) = bounds.clip((-5.0, 5.0), (15.0, 5.0)).unwrap();
        assert_eq!(a, GridPoint::new(0.0, 5.0));
        assert_eq!(b, GridPoint::new(10.0, 5.0));
    }

    #[test]
    fn clip_rejects_outside_segments() {
        let bounds = Bounds::new(0.0, 0.0, 10.0, 10.0);
        assert!(bounds.clip((-5.0, -1.0), (15.0, -1.0)).is_none());
        assert!(bounds.clip((11.0, 0.0), (20.0, 10.0)).is_none());
    }

    #[test]
    fn spade_voronoi_produces_bounded_segments() {
        let sites = [
            Site::new(100.0, 100.0, 0),
            Site::new(300.0, 100.0, 0),
            Site::new(200.0, 300.0, 0),
            Site::new(200.0, 180.0, 0),
        ];
        let bounds = Bounds::new(0.0, 0.0, 400.0, 400.0);
        let output = SpadeVoronoi.compute(&sites, bounds).unwrap();

        assert_eq!(output.triangulation.len(), 6);
        assert_eq!(output.spanning_tree.len(), 3);
        assert!(!output.segments.is_empty());
        for segment in &output.segments {
            for p in [segment.start, segment.end] {
                assert!(p.x >= -1e-3 && p.x <= 400.0 + 1e-3, "{:?}", p);
                assert!(p.y >= -1e-3 && p.y <= 400.0 + 1e-3, "{:?}", p);
            }
        }
    }

    #[test]
    fn voronoi_edges_are_equidistant_from_their_sites() {
        // A lone triangle: every edge is on the hull, so each dual is a ray
        // from the circumcenter along the edge's bisector.
        let sites = [
            Site::new(10.0, 10.0, 0),
            Site::new(30.0, 10.0, 0),
            Site::new(20.0, 30.0, 0),
        ];
        let bounds = Bounds::new(0.0, 0.0, 40.0, 40.0);
        let output = SpadeVoronoi.compute(&sites, bounds).unwrap();
        assert_eq!(output.segments.len(), 3);

        // The bisector of the bottom edge is the vertical line x = 20
        assert!(output
            .segments
            .iter()
            .any(|s| (s.start.x - 20.0).abs() < 1e-3 && (s.end.x - 20.0).abs() < 1e-3));
    }

    #[test]
    fn sites_include_center_and_circle_lattice() {
        let samples = WeightedSamples::default();
        let mut rng = rand::rng();
        let sites = generate_sites(20, 5, &samples, 4, &mut rng);

        assert_eq!(sites[0].position, GridPoint::new(10.0, 10.0));
        // 25 = 3^2 + 4^2 = 5^2 + 0^2 gives 12 lattice points on the circle
        assert_eq!(sites.len(), 1 + 12);
        assert!(sites.iter().all(|s| s.group == DEFAULT_SITE_GROUP));
    }
}
