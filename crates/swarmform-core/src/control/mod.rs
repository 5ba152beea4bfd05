//! Fixed-time formation control
//!
//! - Signed fractional powers sig(x, p)
//! - Gain configuration and validation
//! - Control law shared by the plain and disturbed variants

pub mod signed_power;
pub mod gains;
pub mod law;

pub use signed_power::*;
pub use gains::*;
pub use law::*;
