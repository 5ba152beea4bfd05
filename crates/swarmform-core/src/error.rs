//! Error types
//!
//! Configuration mistakes are fatal at construction or first use.
//! Invariant violations indicate a bug and are never retried.

use thiserror::Error;

/// Caller configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("incidence matrix has {columns} columns but the formation has {agents} agents")]
    IncidenceMismatch { agents: usize, columns: usize },
    #[error("no formation defined for {0} agents")]
    UnsupportedAgentCount(usize),
    #[error("unknown agent id {0}")]
    UnknownAgent(u32),
    #[error("agent id {0} listed more than once")]
    DuplicateAgent(u32),
    #[error("formation expects {formation} agents, got {agents} agent ids")]
    AgentCountMismatch { formation: usize, agents: usize },
    #[error("disturbance table supports at most {max} channels, requested {requested}")]
    DisturbanceChannels { requested: usize, max: usize },
    #[error("position matrix has {got} columns, expected {expected}")]
    PositionDimension { expected: usize, got: usize },
    #[error("non-finite position sample for agent {agent_id}")]
    NonFinitePosition { agent_id: u32 },
    #[error("invalid gains: {0}")]
    InvalidGains(String),
}

/// Top-level error for formation control
#[derive(Debug, Error)]
pub enum FormationError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    #[error("failed to export history: {0}")]
    Export(#[from] std::io::Error),
}

impl FormationError {
    /// True if the error stems from caller configuration
    pub fn is_configuration(&self) -> bool {
        matches!(self, FormationError::Configuration(_))
    }
}
