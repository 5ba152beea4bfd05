//! Formation geometry
//!
//! A formation is a rigid planar target configuration for N agents,
//! encoded by an integer incidence matrix over M pairwise constraints.
//! The catalog holds the predefined polygon formations for 1 to 8 agents.

pub mod geometry;
pub mod catalog;

pub use geometry::*;
pub use catalog::*;
