//! Shared control state
//!
//! Bridges asynchronous position producers (one call per received sample)
//! and periodic command readers (one loop per agent).
//!
//! Producer state is serialized behind a mutex. Each update publishes a new
//! immutable [`CommandSnapshot`] by swapping an `Arc`; readers clone the
//! `Arc` under a brief read lock and never observe a command assembled from
//! two different updates.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use super::history::{HistoryRow, PositionHistory};
use crate::control::{ControlGains, DisturbanceMode, FormationControlLaw};
use crate::error::{ConfigurationError, FormationError};
use crate::formation::Formation;
use crate::{AgentMatrix, Vec2};

/// Command published by one complete update
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSnapshot {
    /// Number of updates that produced a command so far (0 = initial zeros)
    pub generation: u64,
    /// Elapsed time the command was computed for [s]
    pub elapsed: f64,
    /// Velocity command (2 x N) [m/s]
    pub command: AgentMatrix,
}

#[derive(Debug)]
struct ProducerState {
    positions: AgentMatrix,
    t0: Option<Instant>,
    history: PositionHistory,
    generation: u64,
}

/// Thread-safe holder of positions, history and the latest command
#[derive(Debug)]
pub struct SharedControlState {
    agent_ids: Vec<u32>,
    index_by_id: HashMap<u32, usize>,
    law: FormationControlLaw,
    producer: Mutex<ProducerState>,
    command: RwLock<Arc<CommandSnapshot>>,
}

impl SharedControlState {
    /// Create shared state for `agent_ids`, in column order
    pub fn new(agent_ids: Vec<u32>, law: FormationControlLaw) -> Result<Self, ConfigurationError> {
        let num_agents = law.formation().num_agents();
        if agent_ids.len() != num_agents {
            return Err(ConfigurationError::AgentCountMismatch {
                formation: num_agents,
                agents: agent_ids.len(),
            });
        }

        let mut index_by_id = HashMap::with_capacity(agent_ids.len());
        for (index, &id) in agent_ids.iter().enumerate() {
            if index_by_id.insert(id, index).is_some() {
                return Err(ConfigurationError::DuplicateAgent(id));
            }
        }

        debug!(?agent_ids, mode = ?law.disturbance_mode(), "shared control state ready");

        Ok(Self {
            agent_ids,
            index_by_id,
            producer: Mutex::new(ProducerState {
                positions: AgentMatrix::zeros(num_agents),
                t0: None,
                history: PositionHistory::new(),
                generation: 0,
            }),
            command: RwLock::new(Arc::new(CommandSnapshot {
                generation: 0,
                elapsed: 0.0,
                command: AgentMatrix::zeros(num_agents),
            })),
            law,
        })
    }

    /// Select the catalog formation for `agent_ids.len()` agents and build the law
    pub fn from_catalog(
        agent_ids: Vec<u32>,
        gains: ControlGains,
        disturbance: DisturbanceMode,
    ) -> Result<Self, ConfigurationError> {
        let formation = Arc::new(Formation::for_agents(agent_ids.len())?);
        let law = FormationControlLaw::new(formation, gains, disturbance)?;
        Self::new(agent_ids, law)
    }

    /// Record a position sample for `agent_id` and publish a new command
    pub fn update(&self, agent_id: u32, position: Vec2) -> Result<Arc<CommandSnapshot>, FormationError> {
        self.publish(agent_id, position, None)
    }

    /// [`update`](Self::update) with an explicit sample instant
    pub fn update_at(
        &self,
        agent_id: u32,
        position: Vec2,
        now: Instant,
    ) -> Result<Arc<CommandSnapshot>, FormationError> {
        self.publish(agent_id, position, Some(now))
    }

    fn publish(
        &self,
        agent_id: u32,
        position: Vec2,
        now: Option<Instant>,
    ) -> Result<Arc<CommandSnapshot>, FormationError> {
        let index = self.agent_index(agent_id)?;
        if !position.iter().all(|v| v.is_finite()) {
            return Err(ConfigurationError::NonFinitePosition { agent_id }.into());
        }

        let mut guard = self.producer.lock();
        let state = &mut *guard;

        // Sampled under the lock so history rows stay ordered
        let now = now.unwrap_or_else(Instant::now);

        let t0 = state.t0.unwrap_or(now);
        let elapsed = now.saturating_duration_since(t0).as_secs_f64();

        // Nothing is committed unless the command is valid
        let mut positions = state.positions.clone();
        positions.set_column(index, &position);
        let command = self.law.compute(&positions, elapsed)?;

        state.t0 = Some(t0);
        state.positions = positions;
        state.history.record(elapsed, &state.positions);
        state.generation += 1;

        let snapshot = Arc::new(CommandSnapshot {
            generation: state.generation,
            elapsed,
            command,
        });
        *self.command.write() = Arc::clone(&snapshot);

        trace!(
            agent_id,
            generation = snapshot.generation,
            elapsed,
            "published command"
        );
        Ok(snapshot)
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<CommandSnapshot> {
        Arc::clone(&*self.command.read())
    }

    /// Copy of the latest published command (2 x N)
    pub fn get_u(&self) -> AgentMatrix {
        self.snapshot().command.clone()
    }

    /// Latest command column for one agent
    pub fn command_for(&self, agent_id: u32) -> Result<Vec2, ConfigurationError> {
        let index = self.agent_index(agent_id)?;
        Ok(self.snapshot().command.column(index).into_owned())
    }

    /// Copy of the current best-known positions (2 x N)
    pub fn positions(&self) -> AgentMatrix {
        self.producer.lock().positions.clone()
    }

    /// Copy of the recorded history
    pub fn history(&self) -> Vec<HistoryRow> {
        self.producer.lock().history.rows().to_vec()
    }

    /// Write the history as CSV to `path`
    pub fn export(&self, path: &Path) -> Result<(), FormationError> {
        let history = self.producer.lock().history.clone();
        history.export(path)?;
        debug!(rows = history.len(), path = %path.display(), "exported position history");
        Ok(())
    }

    /// Write the history as CSV to `writer`
    pub fn export_to<W: Write>(&self, writer: W) -> Result<(), FormationError> {
        let history = self.producer.lock().history.clone();
        history.write_csv(writer)?;
        Ok(())
    }

    /// Column index of `agent_id`
    pub fn agent_index(&self, agent_id: u32) -> Result<usize, ConfigurationError> {
        self.index_by_id
            .get(&agent_id)
            .copied()
            .ok_or(ConfigurationError::UnknownAgent(agent_id))
    }

    pub fn agent_ids(&self) -> &[u32] {
        &self.agent_ids
    }

    pub fn law(&self) -> &FormationControlLaw {
        &self.law
    }

    pub fn formation(&self) -> &Formation {
        self.law.formation()
    }
}
