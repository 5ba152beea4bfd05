//! Kinematic plant
//!
//! Single-integrator agents in the plane: ṗᵢ = vᵢ, integrated with a
//! forward Euler step. Each pilot commands its own column at its own
//! cadence, so integration is per agent.

use swarmform_core::{AgentMatrix, Vec2};

/// Planar positions of all simulated agents
#[derive(Debug, Clone)]
pub struct KinematicPlant {
    /// True positions (2 x N) [m]
    positions: AgentMatrix,
}

impl KinematicPlant {
    pub fn new(initial: AgentMatrix) -> Self {
        Self { positions: initial }
    }

    pub fn num_agents(&self) -> usize {
        self.positions.ncols()
    }

    /// True position of agent `index`
    pub fn position(&self, index: usize) -> Vec2 {
        self.positions.column(index).into_owned()
    }

    pub fn positions(&self) -> &AgentMatrix {
        &self.positions
    }

    /// Hold velocity `v` on agent `index` for `dt` seconds
    pub fn apply(&mut self, index: usize, v: &Vec2, dt: f64) {
        let mut column = self.positions.column_mut(index);
        column += v * dt;
    }

    /// Apply a full 2 x N velocity command for `dt` seconds
    pub fn apply_all(&mut self, u: &AgentMatrix, dt: f64) {
        self.positions += u * dt;
    }
}
