//! # swarmform Simulator
//!
//! Software-in-the-loop rendition of a formation flight session.
//!
//! A simulated motion-capture feed produces position samples for every
//! agent, the shared control state turns them into velocity commands, and
//! one pilot loop per agent applies its command column to a kinematic
//! plant at the control period.
//!
//! ## Modules
//!
//! - [`config`]: Session configuration (JSON, serde defaults)
//! - [`plant`]: Single-integrator agent world
//! - [`mocap`]: Noisy position sampling
//! - [`pilot`]: Per-agent command loop and speed saturation
//! - [`session`]: Threaded session runner and deterministic lockstep rollout

pub mod error;
pub mod config;
pub mod plant;
pub mod mocap;
pub mod pilot;
pub mod session;

pub use config::SessionConfig;
pub use error::SimError;
pub use mocap::{GaussianNoise, MocapFeed};
pub use pilot::{saturate_velocity, Pilot, PilotReport};
pub use plant::KinematicPlant;
pub use session::{run_session, LockstepRollout, RolloutReport, SessionReport};
