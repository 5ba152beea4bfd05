//! Session configuration
//!
//! Defines the parameters of a simulated formation flight. Every field has
//! a default, so a JSON file only needs to name what it overrides.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use swarmform_core::{ControlGains, DisturbanceMode};

use crate::error::SimError;

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Agent ids, in formation column order
    pub agents: Vec<u32>,
    /// Pilot loop period [s]
    pub control_period: f64,
    /// Horizontal speed limit applied by each pilot [m/s]
    pub max_speed: f64,
    /// Duration of the formation phase [s]
    pub run_time: f64,
    /// Motion-capture sample rate for the whole swarm [Hz]
    pub mocap_rate: f64,
    /// Position noise standard deviation [m]
    pub mocap_noise_std: f64,
    /// Seed for initial placement and measurement noise
    pub seed: u64,
    /// Half-width of the square agents start in [m]
    pub initial_spread: f64,
    /// Control law gains
    pub gains: ControlGains,
    /// Disturbance gain; `None` runs the plain law
    pub disturbance_gain: Option<f64>,
    /// Directory for the timestamped position export; `None` skips export
    pub export_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            agents: vec![3, 4, 5, 6, 7, 8],
            control_period: 0.03,
            max_speed: 0.8,
            run_time: 15.0,
            mocap_rate: 120.0,
            mocap_noise_std: 0.0005,
            seed: 12345,
            initial_spread: 1.5,
            gains: ControlGains::default(),
            disturbance_gain: None,
            export_dir: None,
        }
    }
}

impl SessionConfig {
    /// Load from a JSON file and validate
    pub fn from_json_file(path: &Path) -> Result<Self, SimError> {
        let text = fs::read_to_string(path).map_err(|source| SimError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| SimError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Disturbance mode selected by `disturbance_gain`
    pub fn disturbance_mode(&self) -> DisturbanceMode {
        match self.disturbance_gain {
            Some(gain) => DisturbanceMode::Bounded { gain },
            None => DisturbanceMode::None,
        }
    }

    /// Check timing and geometry parameters
    ///
    /// Gains and the agent count are checked when the control state is built.
    pub fn validate(&self) -> Result<(), SimError> {
        let positive = [
            ("control_period", self.control_period),
            ("max_speed", self.max_speed),
            ("mocap_rate", self.mocap_rate),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        let non_negative = [
            ("run_time", self.run_time),
            ("mocap_noise_std", self.mocap_noise_std),
            ("initial_spread", self.initial_spread),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SimError::InvalidConfig(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }

        if self.agents.is_empty() {
            return Err(SimError::InvalidConfig("agents must not be empty".into()));
        }
        Ok(())
    }
}
