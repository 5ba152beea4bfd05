//! Predefined formations
//!
//! Closed catalog of rigid polygon formations for 1 to 8 agents. Each
//! incidence matrix is written agent-major (one row per agent, one column
//! per edge) and transposed into the M x N form on construction.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use super::geometry::Formation;
use crate::error::ConfigurationError;

/// Named catalog entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormationKind {
    Point,
    Line,
    Triangle,
    Square,
    Pentagon,
    Hexagon,
    Heptagon,
    Octagon,
}

impl FormationKind {
    /// All catalog entries, ordered by agent count
    pub const ALL: [FormationKind; 8] = [
        FormationKind::Point,
        FormationKind::Line,
        FormationKind::Triangle,
        FormationKind::Square,
        FormationKind::Pentagon,
        FormationKind::Hexagon,
        FormationKind::Heptagon,
        FormationKind::Octagon,
    ];

    /// Catalog entry for a given agent count
    pub fn from_agents(num_agents: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.num_agents() == num_agents)
    }

    /// Number of agents in this formation
    pub fn num_agents(self) -> usize {
        self.entry().agents
    }

    /// Number of edges in this formation
    pub fn num_edges(self) -> usize {
        self.entry().edges
    }

    /// Build the formation geometry
    pub fn build(self) -> Formation {
        let entry = self.entry();
        let by_agent = DMatrix::from_row_slice(entry.agents, entry.edges, entry.incidence_by_agent);
        // Shapes are fixed by the table, so construction cannot fail
        match Formation::new(entry.agents, by_agent.transpose()) {
            Ok(formation) => formation,
            Err(err) => unreachable!("catalog entry {self:?} is malformed: {err}"),
        }
    }

    fn entry(self) -> &'static CatalogEntry {
        match self {
            FormationKind::Point => &POINT,
            FormationKind::Line => &LINE,
            FormationKind::Triangle => &TRIANGLE,
            FormationKind::Square => &SQUARE,
            FormationKind::Pentagon => &PENTAGON,
            FormationKind::Hexagon => &HEXAGON,
            FormationKind::Heptagon => &HEPTAGON,
            FormationKind::Octagon => &OCTAGON,
        }
    }
}

impl Formation {
    /// Predefined formation for `num_agents`, or `None` outside 1..=8
    pub fn catalog(num_agents: usize) -> Option<Formation> {
        FormationKind::from_agents(num_agents).map(FormationKind::build)
    }

    /// Predefined formation for `num_agents`, failing fast when unsupported
    pub fn for_agents(num_agents: usize) -> Result<Formation, ConfigurationError> {
        Self::catalog(num_agents).ok_or(ConfigurationError::UnsupportedAgentCount(num_agents))
    }
}

struct CatalogEntry {
    agents: usize,
    edges: usize,
    /// Row-major, agents x edges
    incidence_by_agent: &'static [i32],
}

const POINT: CatalogEntry = CatalogEntry {
    agents: 1,
    edges: 0,
    incidence_by_agent: &[],
};

#[rustfmt::skip]
const LINE: CatalogEntry = CatalogEntry {
    agents: 2,
    edges: 1,
    incidence_by_agent: &[
        -1,
         1,
    ],
};

#[rustfmt::skip]
const TRIANGLE: CatalogEntry = CatalogEntry {
    agents: 3,
    edges: 3,
    incidence_by_agent: &[
         1, -1,  0,
         0,  1, -1,
        -1,  0,  1,
    ],
};

#[rustfmt::skip]
const SQUARE: CatalogEntry = CatalogEntry {
    agents: 4,
    edges: 5,
    incidence_by_agent: &[
        -1,  0,  0,  1, -1,
         1, -1,  0,  0,  0,
         0,  1, -1,  0,  1,
         0,  0,  1, -1,  0,
    ],
};

#[rustfmt::skip]
const PENTAGON: CatalogEntry = CatalogEntry {
    agents: 5,
    edges: 7,
    incidence_by_agent: &[
         1,  0,  0,  0, -1, -1,  1,
        -1,  1,  0,  0,  0,  0,  0,
         0, -1,  1,  0,  0,  0, -1,
         0,  0, -1,  1,  0,  1,  0,
         0,  0,  0, -1,  1,  0,  0,
    ],
};

#[rustfmt::skip]
const HEXAGON: CatalogEntry = CatalogEntry {
    agents: 6,
    edges: 8,
    incidence_by_agent: &[
         1,  0,  0,  0,  0, -1, -1, -1,
        -1,  1,  0,  0,  0,  0,  0,  0,
         0, -1,  1,  0,  0,  0,  0,  1,
         0,  0, -1,  1,  0,  0,  0,  0,
         0,  0,  0, -1,  1,  0,  1,  0,
         0,  0,  0,  0, -1,  1,  0,  0,
    ],
};

#[rustfmt::skip]
const HEPTAGON: CatalogEntry = CatalogEntry {
    agents: 7,
    edges: 11,
    incidence_by_agent: &[
         1,  0,  0,  0,  0, -1,  0, -1, -1,  0,  0,
        -1,  1,  0,  0,  0,  0,  0,  0,  0,  1,  0,
         0, -1,  1,  0,  0,  0,  0,  0,  0,  0,  0,
         0,  0, -1,  1,  0,  0,  0,  0,  1, -1,  0,
         0,  0,  0, -1,  1,  0,  0,  1,  0,  0,  1,
         0,  0,  0,  0, -1,  0, -1,  0,  0,  0,  0,
         0,  0,  0,  0,  0,  1,  1,  0,  0,  0, -1,
    ],
};

#[rustfmt::skip]
const OCTAGON: CatalogEntry = CatalogEntry {
    agents: 8,
    edges: 13,
    incidence_by_agent: &[
         1,  0,  0,  0,  0,  0,  0, -1,  1,  0,  0,  0,  0,
        -1,  1,  0,  0,  0,  0,  0,  0,  0,  0,  0, -1,  0,
         0, -1,  1,  0,  0,  0,  0,  0,  0,  0,  1,  0,  0,
         0,  0, -1,  1,  0,  0,  0,  0,  0, -1,  0,  0,  0,
         0,  0,  0, -1,  1,  0,  0,  0, -1,  0, -1,  0, -1,
         0,  0,  0,  0, -1,  1,  0,  0,  0,  0,  0,  1,  0,
         0,  0,  0,  0,  0, -1,  1,  0,  0,  0,  0,  0,  1,
         0,  0,  0,  0,  0,  0, -1,  1,  0,  1,  0,  0,  0,
    ],
};
