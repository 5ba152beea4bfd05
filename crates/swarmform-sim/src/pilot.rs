//! Per-agent pilot loop
//!
//! Each pilot polls its column of the shared command at the control
//! period, limits the horizontal speed and holds the resulting velocity
//! on the plant until the next poll. When the formation phase ends the
//! agent hovers in place.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use swarmform_core::{ConfigurationError, SharedControlState, Vec2};

use crate::error::SimError;
use crate::plant::KinematicPlant;

/// Rescale `v` to `max_speed` if it is faster
///
/// Returns the limited velocity and whether it had to be rescaled.
pub fn saturate_velocity(v: &Vec2, max_speed: f64) -> (Vec2, bool) {
    let speed = v.norm();
    if speed > max_speed {
        return (v * (max_speed / speed), true);
    }
    (*v, false)
}

/// Summary of one pilot's formation phase
#[derive(Debug, Clone, PartialEq)]
pub struct PilotReport {
    pub agent_id: u32,
    /// Number of commands applied
    pub commands: usize,
    /// Commands that had to be saturated
    pub saturated: usize,
}

/// Command loop for one agent
#[derive(Debug, Clone)]
pub struct Pilot {
    agent_id: u32,
    index: usize,
    /// Poll period [s]
    control_period: f64,
    /// Speed limit [m/s]
    max_speed: f64,
}

impl Pilot {
    pub fn new(
        agent_id: u32,
        state: &SharedControlState,
        control_period: f64,
        max_speed: f64,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            agent_id,
            index: state.agent_index(agent_id)?,
            control_period,
            max_speed,
        })
    }

    pub fn agent_id(&self) -> u32 {
        self.agent_id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Current saturated command and whether saturation was needed
    pub fn command(&self, state: &SharedControlState) -> Result<(Vec2, bool), ConfigurationError> {
        let raw = state.command_for(self.agent_id)?;
        Ok(saturate_velocity(&raw, self.max_speed))
    }

    /// Run the formation phase for `run_time` seconds or until `abort` is set
    pub fn fly(
        &self,
        state: &SharedControlState,
        plant: &Mutex<KinematicPlant>,
        run_time: f64,
        abort: &AtomicBool,
    ) -> Result<PilotReport, SimError> {
        info!(agent_id = self.agent_id, "hovering, listening to controller");

        let period = Duration::from_secs_f64(self.control_period);
        let start = Instant::now();
        let mut last = start;
        let mut held = Vec2::zeros();
        let mut report = PilotReport {
            agent_id: self.agent_id,
            commands: 0,
            saturated: 0,
        };

        while start.elapsed().as_secs_f64() < run_time && !abort.load(Ordering::Acquire) {
            let now = Instant::now();
            plant
                .lock()
                .apply(self.index, &held, now.duration_since(last).as_secs_f64());
            last = now;

            let (v, saturated) = self.command(state)?;
            held = v;
            report.commands += 1;
            if saturated {
                report.saturated += 1;
            }

            thread::sleep(period);
        }

        // Finish the last hold, then hover
        plant
            .lock()
            .apply(self.index, &held, last.elapsed().as_secs_f64());

        if report.saturated > 0 {
            warn!(
                agent_id = self.agent_id,
                saturated = report.saturated,
                max_speed = self.max_speed,
                "speed exceeded limit, commands were saturated"
            );
        }
        debug!(agent_id = self.agent_id, commands = report.commands, "formation phase over");
        info!(agent_id = self.agent_id, "landing");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use swarmform_core::{AgentMatrix, ControlGains, DisturbanceMode};

    #[test]
    fn test_saturate_velocity() {
        let slow = Vec2::new(0.3, 0.4);
        assert_eq!(saturate_velocity(&slow, 0.8), (slow, false));

        let fast = Vec2::new(3.0, 4.0);
        let (limited, saturated) = saturate_velocity(&fast, 0.8);
        assert!(saturated);
        assert_relative_eq!(limited.norm(), 0.8, epsilon = 1e-12);
        assert_relative_eq!(limited, Vec2::new(0.48, 0.64), epsilon = 1e-12);
    }

    #[test]
    fn test_saturate_zero() {
        assert_eq!(saturate_velocity(&Vec2::zeros(), 0.8), (Vec2::zeros(), false));

        // Exactly at the limit is not saturated
        let edge = Vec2::new(0.8, 0.0);
        assert_eq!(saturate_velocity(&edge, 0.8), (edge, false));
    }

    #[test]
    fn test_pilot_reads_own_column() {
        let state =
            SharedControlState::from_catalog(vec![3, 4], ControlGains::default(), DisturbanceMode::None)
                .unwrap();
        state.update(3, Vec2::new(0.0, 10.0)).unwrap();
        state.update(4, Vec2::new(0.0, -10.0)).unwrap();

        let pilot = Pilot::new(4, &state, 0.03, 0.8).unwrap();
        assert_eq!(pilot.index(), 1);
        let (v, saturated) = pilot.command(&state).unwrap();
        assert!(saturated);
        assert_relative_eq!(v.norm(), 0.8, epsilon = 1e-12);
        assert!(v.y > 0.0);

        assert!(Pilot::new(9, &state, 0.03, 0.8).is_err());
    }

    #[test]
    fn test_fly_stops_on_abort() {
        let state =
            SharedControlState::from_catalog(vec![1, 2], ControlGains::default(), DisturbanceMode::None)
                .unwrap();
        let plant = Mutex::new(KinematicPlant::new(AgentMatrix::zeros(2)));
        let pilot = Pilot::new(1, &state, 0.01, 0.8).unwrap();

        let abort = AtomicBool::new(true);
        let report = pilot.fly(&state, &plant, 10.0, &abort).unwrap();
        assert_eq!(report.commands, 0);
        assert_eq!(plant.lock().positions(), &AgentMatrix::zeros(2));
    }
}
