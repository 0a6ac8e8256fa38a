//! Voronoi City Library
//!
//! Procedural city generation and a headless commuter simulation.

pub mod simulation;
