//! Formation constraint geometry
//!
//! Given the incidence matrix H (M x N), the constraint structure is lifted
//! into the planar position space:
//!
//! H̄ = H ⊗ I₂                       (2M x 2N)
//! e_des = H̄ · vec(p_des)           (M stacked 2-vectors)
//! f_des,j = ½‖e_des,j‖²
//!
//! vec(·) stacks the columns of a 2 x N matrix: [x₁, y₁, x₂, y₂, ...].
//! This ordering is what makes the edge blocks of H̄·vec(p) line up with
//! consecutive 2-vectors, and must not be changed.
//!
//! Positions are quantized to [`POSITION_DIGITS`] decimals before entering
//! the constraint algebra, for the desired layout as well as for measured
//! configurations, so that p = p_des reproduces f_des bit for bit.

use std::fmt;

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::error::ConfigurationError;
use crate::{AgentMatrix, PLANAR_DIM};

/// Radius of the circle the desired positions are placed on [m]
pub const FORMATION_SCALE: f64 = 0.75;

/// Decimal digits kept when quantizing positions
pub const POSITION_DIGITS: i32 = 8;

/// Immutable formation geometry
///
/// All derived quantities are computed once at construction. Share between
/// controllers with `Arc<Formation>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Formation {
    /// Number of agents (N)
    num_agents: usize,
    /// Incidence matrix H (M x N)
    incidence: DMatrix<i32>,
    /// Lifted incidence H̄ = H ⊗ I₂ (2M x 2N)
    h_bar: DMatrix<f64>,
    /// Desired positions (2 x N)
    p_des: AgentMatrix,
    /// Desired edge potentials (M)
    f_des: DVector<f64>,
    /// Desired edge lengths (M)
    d_des: DVector<f64>,
}

impl Formation {
    /// Build a formation from an agent count and an M x N incidence matrix
    pub fn new(num_agents: usize, incidence: DMatrix<i32>) -> Result<Self, ConfigurationError> {
        if incidence.ncols() != num_agents {
            return Err(ConfigurationError::IncidenceMismatch {
                agents: num_agents,
                columns: incidence.ncols(),
            });
        }

        let h_bar = incidence
            .map(f64::from)
            .kronecker(&DMatrix::<f64>::identity(PLANAR_DIM, PLANAR_DIM));

        let p_des = circle_layout(num_agents);
        let e_des = &h_bar * stack_quantized(&p_des);
        let f_des = edge_potentials(&e_des);
        let d_des = edge_lengths(&e_des);

        debug!(
            agents = num_agents,
            edges = incidence.nrows(),
            "built formation geometry"
        );

        Ok(Self {
            num_agents,
            incidence,
            h_bar,
            p_des,
            f_des,
            d_des,
        })
    }

    /// Number of agents (N)
    pub fn num_agents(&self) -> usize {
        self.num_agents
    }

    /// Number of edges / constraints (M)
    pub fn num_edges(&self) -> usize {
        self.incidence.nrows()
    }

    /// Incidence matrix H (M x N)
    pub fn incidence(&self) -> &DMatrix<i32> {
        &self.incidence
    }

    /// Lifted incidence matrix H̄ (2M x 2N)
    pub fn h_bar(&self) -> &DMatrix<f64> {
        &self.h_bar
    }

    /// Desired positions p_des (2 x N)
    pub fn desired_positions(&self) -> &AgentMatrix {
        &self.p_des
    }

    /// Desired per-edge potentials f_des (M)
    pub fn desired_potentials(&self) -> &DVector<f64> {
        &self.f_des
    }

    /// Desired per-edge lengths ‖e_des,j‖ (M)
    pub fn desired_distances(&self) -> &DVector<f64> {
        &self.d_des
    }

    /// Edge error vectors e = H̄ · vec(p) for a 2 x N configuration
    pub fn edge_errors(&self, p: &AgentMatrix) -> Result<DVector<f64>, ConfigurationError> {
        self.check_columns(p)?;
        Ok(&self.h_bar * stack_quantized(p))
    }

    /// Potential mismatch δ = f(p) - f_des per edge
    pub fn potential_mismatch(&self, p: &AgentMatrix) -> Result<DVector<f64>, ConfigurationError> {
        let e = self.edge_errors(p)?;
        Ok(edge_potentials(&e) - &self.f_des)
    }

    /// Reject configurations whose column count differs from N
    pub fn check_columns(&self, p: &AgentMatrix) -> Result<(), ConfigurationError> {
        if p.ncols() != self.num_agents {
            return Err(ConfigurationError::PositionDimension {
                expected: self.num_agents,
                got: p.ncols(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Formation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Formation(N={}, M={}, d={})",
            self.num_agents,
            self.num_edges(),
            PLANAR_DIM
        )?;
        write!(f, "Incidence matrix H:{}", self.incidence)?;
        write!(
            f,
            "Desired positions (p_des):{}",
            self.p_des.map(|x| (x * 1e4).round() / 1e4)
        )
    }
}

/// Desired layout: origin for a single agent, otherwise evenly spaced on
/// a circle of radius [`FORMATION_SCALE`], agent i at angle 360°·i/N
/// measured from the +y axis.
pub fn circle_layout(num_agents: usize) -> AgentMatrix {
    if num_agents <= 1 {
        return AgentMatrix::zeros(num_agents);
    }
    let mut p = AgentMatrix::zeros(num_agents);
    for i in 0..num_agents {
        let theta = (360.0 / num_agents as f64 * i as f64).to_radians();
        p[(0, i)] = FORMATION_SCALE * theta.sin();
        p[(1, i)] = FORMATION_SCALE * theta.cos();
    }
    p
}

/// Stack the columns of a 2 x N matrix into [x₁, y₁, ..., x_N, y_N]
pub fn stack_columns(p: &AgentMatrix) -> DVector<f64> {
    // nalgebra storage is column-major, so the raw slice is already the stacking
    DVector::from_column_slice(p.as_slice())
}

/// [`stack_columns`] with every coordinate rounded to [`POSITION_DIGITS`]
///
/// Suppresses floating noise near equilibrium, where the fractional-power
/// terms would otherwise amplify it into spurious commands.
pub fn stack_quantized(p: &AgentMatrix) -> DVector<f64> {
    let scale = 10f64.powi(POSITION_DIGITS);
    stack_columns(p).map(|x| (x * scale).round() / scale)
}

/// Inverse of [`stack_columns`]
pub fn unstack_columns(v: &DVector<f64>) -> AgentMatrix {
    AgentMatrix::from_column_slice(v.as_slice())
}

/// ½‖e_j‖² for each consecutive 2-vector of a stacked edge error
pub fn edge_potentials(e: &DVector<f64>) -> DVector<f64> {
    let m = e.len() / PLANAR_DIM;
    DVector::from_fn(m, |j, _| {
        let ex = e[PLANAR_DIM * j];
        let ey = e[PLANAR_DIM * j + 1];
        0.5 * (ex * ex + ey * ey)
    })
}

fn edge_lengths(e: &DVector<f64>) -> DVector<f64> {
    let m = e.len() / PLANAR_DIM;
    DVector::from_fn(m, |j, _| e.fixed_rows::<2>(PLANAR_DIM * j).norm())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_incidence_column_mismatch() {
        let h = DMatrix::from_row_slice(1, 2, &[-1, 1]);
        let err = Formation::new(3, h).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::IncidenceMismatch { agents: 3, columns: 2 }
        );
    }

    #[test]
    fn test_h_bar_is_kronecker_expansion() {
        let h = DMatrix::from_row_slice(2, 3, &[1, -1, 0, 0, 1, -1]);
        let formation = Formation::new(3, h.clone()).unwrap();
        let h_bar = formation.h_bar();

        assert_eq!(h_bar.shape(), (4, 6));
        for j in 0..2 {
            for i in 0..3 {
                let c = f64::from(h[(j, i)]);
                assert_eq!(h_bar[(2 * j, 2 * i)], c);
                assert_eq!(h_bar[(2 * j + 1, 2 * i + 1)], c);
                assert_eq!(h_bar[(2 * j, 2 * i + 1)], 0.0);
                assert_eq!(h_bar[(2 * j + 1, 2 * i)], 0.0);
            }
        }
    }

    #[test]
    fn test_circle_layout_radius_and_spacing() {
        for n in 2..=8 {
            let p = circle_layout(n);
            let step = 2.0 * std::f64::consts::PI / n as f64;
            for i in 0..n {
                let col = p.column(i);
                assert_relative_eq!(col.norm(), FORMATION_SCALE, epsilon = 1e-12);
                let theta = (col[0]).atan2(col[1]);
                let expected = step * i as f64;
                let diff = (theta - expected).rem_euclid(2.0 * std::f64::consts::PI);
                assert!(diff < 1e-9 || (2.0 * std::f64::consts::PI - diff) < 1e-9);
            }
        }
    }

    #[test]
    fn test_single_agent_at_origin() {
        let p = circle_layout(1);
        assert_eq!(p.ncols(), 1);
        assert_eq!(p[(0, 0)], 0.0);
        assert_eq!(p[(1, 0)], 0.0);
    }

    #[test]
    fn test_stacking_is_agent_major() {
        let p = AgentMatrix::from_column_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(p[(0, 1)], 3.0);
        assert_eq!(p[(1, 1)], 4.0);

        let v = stack_columns(&p);
        assert_eq!(v.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(unstack_columns(&v), p);
    }

    #[test]
    fn test_quantization() {
        let p = AgentMatrix::from_column_slice(&[0.123456789, 3e-9, -3e-9, 1.0]);
        let v = stack_quantized(&p);
        assert_eq!(v[0], 0.12345679);
        assert_eq!(v[1], 0.0);
        assert_eq!(v[2], 0.0);
        assert_eq!(v[3], 1.0);
    }

    #[test]
    fn test_line_desired_potential() {
        let h = DMatrix::from_row_slice(1, 2, &[-1, 1]);
        let formation = Formation::new(2, h).unwrap();

        // Agents at (0, 0.75) and (0, -0.75): edge length 1.5
        assert_relative_eq!(formation.desired_distances()[0], 1.5, epsilon = 1e-12);
        assert_relative_eq!(formation.desired_potentials()[0], 0.5 * 1.5 * 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_mismatch_zero_at_desired() {
        let h = DMatrix::from_row_slice(3, 3, &[1, 0, -1, -1, 1, 0, 0, -1, 1]);
        let formation = Formation::new(3, h).unwrap();
        let delta = formation
            .potential_mismatch(formation.desired_positions())
            .unwrap();
        assert_relative_eq!(delta.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mismatch_rejects_wrong_width() {
        let h = DMatrix::from_row_slice(1, 2, &[-1, 1]);
        let formation = Formation::new(2, h).unwrap();
        let err = formation.potential_mismatch(&AgentMatrix::zeros(3)).unwrap_err();
        assert_eq!(err, ConfigurationError::PositionDimension { expected: 2, got: 3 });
    }
}
