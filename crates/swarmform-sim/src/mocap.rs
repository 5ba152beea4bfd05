//! Simulated motion capture
//!
//! Produces noisy planar position samples from the plant's true state,
//! and random initial placements for a session.

use swarmform_core::{AgentMatrix, Vec2};

/// Xorshift64 generator with Box-Muller Gaussian samples
///
/// Deterministic for a given seed, so rollouts are reproducible.
#[derive(Debug, Clone)]
pub struct GaussianNoise {
    state: u64,
}

impl GaussianNoise {
    pub fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Uniform sample in [0, 1]
    pub fn uniform(&mut self) -> f64 {
        (self.next_u64() as f64) / (u64::MAX as f64)
    }

    /// Standard normal sample
    pub fn gaussian(&mut self) -> f64 {
        let u1 = self.uniform().max(1e-10);
        let u2 = self.uniform();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    /// Planar vector with independent N(0, std_dev²) components
    pub fn gaussian_vec2(&mut self, std_dev: f64) -> Vec2 {
        Vec2::new(self.gaussian() * std_dev, self.gaussian() * std_dev)
    }
}

/// Position feed for the whole swarm
#[derive(Debug, Clone)]
pub struct MocapFeed {
    /// Noise standard deviation [m]
    noise_std: f64,
    rng: GaussianNoise,
}

impl MocapFeed {
    pub fn new(noise_std: f64, seed: u64) -> Self {
        Self {
            noise_std,
            rng: GaussianNoise::new(seed),
        }
    }

    /// Noisy measurement of `true_position`
    pub fn measure(&mut self, true_position: &Vec2) -> Vec2 {
        if self.noise_std == 0.0 {
            return *true_position;
        }
        true_position + self.rng.gaussian_vec2(self.noise_std)
    }
}

/// Uniform placement of `num_agents` agents in [-spread, spread]²
pub fn scatter(num_agents: usize, spread: f64, seed: u64) -> AgentMatrix {
    let mut rng = GaussianNoise::new(seed);
    AgentMatrix::from_fn(num_agents, |_, _| (2.0 * rng.uniform() - 1.0) * spread)
}
