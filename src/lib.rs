//! Four-color map checking: derive which regions of a map are neighbours
//! from their boundary polygons, and validate a user's coloring against that
//! relation.
//!
//! The two calls a map UI needs are [`adjacency::is_adjacent`] (or
//! [`adjacency::GeometricOracle`] for a custom tolerance) and
//! [`validate::validate`].

pub mod adjacency;
pub mod config;
pub mod data;
pub mod geometry;
pub mod index;
pub mod neighbors;
pub mod report;
pub mod server;
pub mod types;
pub mod validate;

pub use adjacency::{is_adjacent, Adjacency, GeometricOracle};
pub use types::{ColorAssignment, ColorIndex, Palette, Region, ValidationReport, Violation};
pub use validate::validate;
