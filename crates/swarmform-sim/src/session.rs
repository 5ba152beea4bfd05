//! Session runners
//!
//! [`run_session`] mirrors a live flight: a motion-capture thread streams
//! samples into the shared control state while one pilot thread per agent
//! polls commands in real time.
//!
//! [`LockstepRollout`] replays the same loop on a fixed virtual clock:
//! every step samples all agents, publishes through
//! [`SharedControlState::update_at`], then integrates the saturated
//! command for one control period. Results depend only on the config.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, error, info};

use swarmform_core::runtime::timestamped_export_path;
use swarmform_core::{AgentMatrix, SharedControlState};

use crate::config::SessionConfig;
use crate::error::SimError;
use crate::mocap::{scatter, MocapFeed};
use crate::pilot::{saturate_velocity, Pilot, PilotReport};
use crate::plant::KinematicPlant;

/// Outcome of a threaded session
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// Position updates published by the mocap thread
    pub updates: u64,
    pub pilots: Vec<PilotReport>,
    /// True positions when the session ended
    pub final_positions: AgentMatrix,
    /// ‖f(p) - f_des‖ at the start and end
    pub initial_mismatch: f64,
    pub final_mismatch: f64,
    /// Written history file, if export was configured
    pub export_path: Option<PathBuf>,
}

/// Build the shared control state described by `config`
pub fn build_state(config: &SessionConfig) -> Result<SharedControlState, SimError> {
    config.validate()?;
    let state = SharedControlState::from_catalog(
        config.agents.clone(),
        config.gains,
        config.disturbance_mode(),
    )?;
    info!(
        agents = ?config.agents,
        edges = state.formation().num_edges(),
        mode = ?config.disturbance_mode(),
        "formation controller ready"
    );
    Ok(state)
}

fn mismatch(state: &SharedControlState, p: &AgentMatrix) -> Result<f64, SimError> {
    Ok(state.formation().potential_mismatch(p)?.norm())
}

fn export_history(state: &SharedControlState, config: &SessionConfig) -> Result<Option<PathBuf>, SimError> {
    let Some(dir) = &config.export_dir else {
        return Ok(None);
    };
    let path = timestamped_export_path(dir);
    state.export(&path)?;
    info!(path = %path.display(), rows = state.history().len(), "saved position history");
    Ok(Some(path))
}

/// Run a real-time session with one mocap thread and one pilot per agent
pub fn run_session(config: &SessionConfig) -> Result<SessionReport, SimError> {
    let state = build_state(config)?;
    let n = config.agents.len();
    let plant = Mutex::new(KinematicPlant::new(scatter(n, config.initial_spread, config.seed)));
    let initial_mismatch = mismatch(&state, plant.lock().positions())?;

    let pilots = config
        .agents
        .iter()
        .map(|&id| Pilot::new(id, &state, config.control_period, config.max_speed))
        .collect::<Result<Vec<_>, _>>()?;

    let abort = AtomicBool::new(false);
    let mocap_period = Duration::from_secs_f64(1.0 / config.mocap_rate);
    let mut feed = MocapFeed::new(config.mocap_noise_std, config.seed.wrapping_add(1));

    let (updates, pilot_reports) = thread::scope(|scope| {
        let state = &state;
        let plant = &plant;
        let abort = &abort;

        let mocap = scope.spawn(move || -> Result<u64, SimError> {
            let start = Instant::now();
            let mut updates = 0u64;
            while start.elapsed().as_secs_f64() < config.run_time && !abort.load(Ordering::Acquire) {
                for (index, &id) in config.agents.iter().enumerate() {
                    let truth = plant.lock().position(index);
                    let sample = feed.measure(&truth);
                    if let Err(err) = state.update(id, sample) {
                        error!(agent_id = id, %err, "control update failed, stopping session");
                        abort.store(true, Ordering::Release);
                        return Err(err.into());
                    }
                    updates += 1;
                }
                thread::sleep(mocap_period);
            }
            Ok(updates)
        });

        let handles: Vec<_> = pilots
            .iter()
            .map(|pilot| scope.spawn(move || pilot.fly(state, plant, config.run_time, abort)))
            .collect();

        let updates = mocap
            .join()
            .map_err(|_| SimError::ThreadPanicked("mocap"))
            .and_then(|result| result);
        if updates.is_err() {
            abort.store(true, Ordering::Release);
        }

        let reports = handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .map_err(|_| SimError::ThreadPanicked("pilot"))
                    .and_then(|result| result)
            })
            .collect::<Result<Vec<_>, _>>();

        (updates, reports)
    });
    let updates = updates?;
    let pilots = pilot_reports?;

    let final_positions = plant.into_inner().positions().clone();
    let final_mismatch = mismatch(&state, &final_positions)?;
    info!(updates, initial_mismatch, final_mismatch, "session finished");

    let export_path = export_history(&state, config)?;
    Ok(SessionReport {
        updates,
        pilots,
        final_positions,
        initial_mismatch,
        final_mismatch,
        export_path,
    })
}

/// Outcome of a lockstep rollout
#[derive(Debug, Clone)]
pub struct RolloutReport {
    pub steps: usize,
    pub final_positions: AgentMatrix,
    pub initial_mismatch: f64,
    pub final_mismatch: f64,
    /// Steps in which at least one command was saturated
    pub saturated_steps: usize,
}

/// Deterministic fixed-step session on a virtual clock
#[derive(Debug)]
pub struct LockstepRollout {
    state: SharedControlState,
    plant: KinematicPlant,
    feed: MocapFeed,
    /// Step length [s]
    dt: f64,
    max_speed: f64,
    origin: Instant,
    steps: usize,
}

impl LockstepRollout {
    /// Rollout starting from a scattered placement
    pub fn new(config: &SessionConfig) -> Result<Self, SimError> {
        let initial = scatter(config.agents.len(), config.initial_spread, config.seed);
        Self::with_initial(config, initial)
    }

    /// Rollout starting from `initial` (2 x N)
    pub fn with_initial(config: &SessionConfig, initial: AgentMatrix) -> Result<Self, SimError> {
        let state = build_state(config)?;
        state.formation().check_columns(&initial)?;
        Ok(Self {
            state,
            plant: KinematicPlant::new(initial),
            feed: MocapFeed::new(config.mocap_noise_std, config.seed.wrapping_add(1)),
            dt: config.control_period,
            max_speed: config.max_speed,
            origin: Instant::now(),
            steps: 0,
        })
    }

    pub fn state(&self) -> &SharedControlState {
        &self.state
    }

    pub fn plant(&self) -> &KinematicPlant {
        &self.plant
    }

    /// Virtual time of the next step [s]
    pub fn time(&self) -> f64 {
        self.steps as f64 * self.dt
    }

    /// Sample every agent, publish, then integrate one period
    ///
    /// Returns whether any command was saturated.
    pub fn step(&mut self) -> Result<bool, SimError> {
        let now = self.origin + Duration::from_secs_f64(self.time());
        for (index, &id) in self.state.agent_ids().iter().enumerate() {
            let sample = self.feed.measure(&self.plant.position(index));
            self.state.update_at(id, sample, now)?;
        }

        let u = self.state.get_u();
        let mut any_saturated = false;
        for (index, column) in u.column_iter().enumerate() {
            let (v, saturated) = saturate_velocity(&column.into_owned(), self.max_speed);
            any_saturated |= saturated;
            self.plant.apply(index, &v, self.dt);
        }

        self.steps += 1;
        Ok(any_saturated)
    }

    /// Step until `duration` seconds of virtual time have elapsed
    pub fn run(&mut self, duration: f64) -> Result<RolloutReport, SimError> {
        let initial_mismatch = mismatch(&self.state, self.plant.positions())?;
        let steps = (duration / self.dt).round() as usize;
        let mut saturated_steps = 0;

        for _ in 0..steps {
            if self.step()? {
                saturated_steps += 1;
            }
        }

        let final_mismatch = mismatch(&self.state, self.plant.positions())?;
        debug!(steps, initial_mismatch, final_mismatch, "lockstep rollout finished");
        Ok(RolloutReport {
            steps,
            final_positions: self.plant.positions().clone(),
            initial_mismatch,
            final_mismatch,
            saturated_steps,
        })
    }

    /// Export the recorded history according to `config.export_dir`
    pub fn export(&self, config: &SessionConfig) -> Result<Option<PathBuf>, SimError> {
        export_history(&self.state, config)
    }
}
