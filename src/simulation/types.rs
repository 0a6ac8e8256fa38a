//! Core types for the city simulation
//!
//! Typed ids plus the two coordinate spaces: the density grid and the
//! scene plane.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimId(pub usize);

/// A wrapper type for structure IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructureId(pub SimId);

/// A wrapper type for agent IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub SimId);

/// Density class a structure was placed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureClass {
    /// Low density, single inhabitant
    House,
    /// Medium density office building
    Building,
    /// High density tower
    Skyscraper,
}

impl StructureClass {
    pub fn name(&self) -> &'static str {
        match self {
            StructureClass::House => "House",
            StructureClass::Building => "Building",
            StructureClass::Skyscraper => "Skyscraper",
        }
    }

    /// Character used when drawing the ASCII map
    pub fn symbol(&self) -> char {
        match self {
            StructureClass::House => 'H',
            StructureClass::Building => 'B',
            StructureClass::Skyscraper => 'S',
        }
    }
}

impl fmt::Display for StructureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a structure houses agents or employs them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Workplace,
    Habitation,
}

/// A point in density grid space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GridPoint {
    pub x: f32,
    pub y: f32,
}

impl GridPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(&self, other: &GridPoint) -> f32 {
        (*other - *self).length()
    }

    /// Counter-clockwise perpendicular vector
    pub fn perpendicular(&self) -> GridPoint {
        GridPoint::new(-self.y, self.x)
    }

    pub fn normalized(&self) -> GridPoint {
        let len = self.length();
        if len > 0.0 {
            GridPoint::new(self.x / len, self.y / len)
        } else {
            GridPoint::default()
        }
    }

    /// Signed angle in degrees from the +x axis, counter-clockwise positive
    pub fn signed_angle_from_x(&self) -> f32 {
        self.y.atan2(self.x).to_degrees()
    }
}

impl Add for GridPoint {
    type Output = GridPoint;

    fn add(self, rhs: GridPoint) -> GridPoint {
        GridPoint::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for GridPoint {
    type Output = GridPoint;

    fn sub(self, rhs: GridPoint) -> GridPoint {
        GridPoint::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for GridPoint {
    type Output = GridPoint;

    fn mul(self, rhs: f32) -> GridPoint {
        GridPoint::new(self.x * rhs, self.y * rhs)
    }
}

/// A 3D position in the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn lerp(&self, other: &Position, t: f32) -> Position {
        Position {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }

    /// Same position projected onto the ground plane
    pub fn on_ground(&self, height: f32) -> Position {
        Position::new(self.x, height, self.z)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Position {
    type Output = Position;

    fn neg(self) -> Position {
        Position::new(-self.x, -self.y, -self.z)
    }
}
