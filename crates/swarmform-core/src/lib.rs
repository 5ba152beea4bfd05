//! # swarmform Core
//!
//! Fixed-time formation control for planar quadcopter swarms.
//!
//! Agents are driven toward a rigid 2D formation using relative-position
//! feedback only. The control law combines two signed fractional powers
//! with exponents straddling one and a switching term, which yields a
//! convergence time bound independent of the initial error.
//!
//! ## Modules
//!
//! - [`formation`]: Formation geometry (incidence matrix, desired layout) and catalog
//! - [`control`]: Fixed-time control law (plain and disturbed variants)
//! - [`disturbance`]: Bounded synthetic disturbance signals
//! - [`runtime`]: Shared control state between position producers and command readers
//! - [`error`]: Error taxonomy

pub mod error;
pub mod disturbance;
pub mod formation;
pub mod control;
pub mod runtime;

pub use error::{ConfigurationError, FormationError};
pub use formation::{Formation, FormationKind};
pub use control::{ControlGains, ControlStep, DisturbanceMode, FormationControlLaw};
pub use runtime::{CommandSnapshot, HistoryRow, PositionHistory, SharedControlState};

use nalgebra::{Matrix2xX, Vector2};

/// Planar vector type
pub type Vec2 = Vector2<f64>;

/// 2 x N matrix with one column per agent
pub type AgentMatrix = Matrix2xX<f64>;

/// Planar dimension of the formation space
pub const PLANAR_DIM: usize = 2;
