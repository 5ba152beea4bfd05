//! Runtime state shared between position producers and command readers
//!
//! - [`SharedControlState`]: serialized updates, snapshot-published commands
//! - [`PositionHistory`]: per-update position log and CSV export

pub mod shared;
pub mod history;

pub use shared::*;
pub use history::*;
