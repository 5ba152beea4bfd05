//! Fixed-time formation control law
//!
//! Maps the current 2 x N configuration p and elapsed time t to a 2 x N
//! velocity command:
//!
//! e   = H̄ · vec(p)                     edge error vectors (M x 2-vectors)
//! fⱼ  = ½‖eⱼ‖²                          edge potentials
//! R   = blockdiag(e₁ᵀ, ..., e_Mᵀ)        (M x 2M)
//! Rd  = R · H̄                           (M x 2N)
//! δ   = f - f_des
//! g   = Rdᵀ · δ                         gradient of ½‖δ‖² w.r.t. vec(p)
//! u   = -K1·sig(g, α) - K2·sig(g, β) - Kₛ·sign(g)  [+ K_d·d(2N, t)]
//!
//! The law is a pure function of (formation, p, t). The plain and disturbed
//! variants differ only by [`DisturbanceMode`].

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use super::gains::{ControlGains, DisturbanceMode};
use super::signed_power::{sig_vec, sign_vec};
use crate::disturbance::{disturbance, MAX_DISTURBANCE_CHANNELS};
use crate::error::{ConfigurationError, FormationError};
use crate::formation::{edge_potentials, stack_quantized, unstack_columns, Formation};
use crate::{AgentMatrix, PLANAR_DIM};

/// Every intermediate of one control evaluation
#[derive(Debug, Clone)]
pub struct ControlStep {
    /// Stacked edge errors e (2M)
    pub errors: DVector<f64>,
    /// Edge potentials f (M)
    pub potentials: DVector<f64>,
    /// Potential mismatch δ = f - f_des (M)
    pub delta: DVector<f64>,
    /// Aggregated gradient g = Rdᵀδ (2N)
    pub gradient: DVector<f64>,
    /// Injected disturbance K_d·d(2N, t), if any (2N)
    pub disturbance: Option<DVector<f64>>,
    /// Velocity command (2 x N)
    pub command: AgentMatrix,
}

/// Fixed-time formation control law
#[derive(Debug, Clone)]
pub struct FormationControlLaw {
    formation: Arc<Formation>,
    gains: ControlGains,
    disturbance: DisturbanceMode,
}

impl FormationControlLaw {
    /// Create a control law, validating gains and disturbance capacity
    pub fn new(
        formation: Arc<Formation>,
        gains: ControlGains,
        disturbance: DisturbanceMode,
    ) -> Result<Self, ConfigurationError> {
        gains.validate()?;
        disturbance.validate()?;

        if let DisturbanceMode::Bounded { .. } = disturbance {
            let channels = PLANAR_DIM * formation.num_agents();
            if channels > MAX_DISTURBANCE_CHANNELS {
                return Err(ConfigurationError::DisturbanceChannels {
                    requested: channels,
                    max: MAX_DISTURBANCE_CHANNELS,
                });
            }
        }

        Ok(Self {
            formation,
            gains,
            disturbance,
        })
    }

    /// Plain distributed law without disturbance injection
    pub fn plain(formation: Arc<Formation>, gains: ControlGains) -> Result<Self, ConfigurationError> {
        Self::new(formation, gains, DisturbanceMode::None)
    }

    /// Robust variant injecting `gain`·d(2N, t)
    pub fn disturbed(
        formation: Arc<Formation>,
        gains: ControlGains,
        gain: f64,
    ) -> Result<Self, ConfigurationError> {
        Self::new(formation, gains, DisturbanceMode::Bounded { gain })
    }

    pub fn formation(&self) -> &Arc<Formation> {
        &self.formation
    }

    pub fn gains(&self) -> &ControlGains {
        &self.gains
    }

    pub fn disturbance_mode(&self) -> DisturbanceMode {
        self.disturbance
    }

    /// Compute the 2 x N velocity command for configuration `p` at time `t`
    pub fn compute(&self, p: &AgentMatrix, t: f64) -> Result<AgentMatrix, FormationError> {
        Ok(self.evaluate(p, t)?.command)
    }

    /// Compute the command and return every intermediate quantity
    pub fn evaluate(&self, p: &AgentMatrix, t: f64) -> Result<ControlStep, FormationError> {
        self.formation.check_columns(p)?;

        let n = self.formation.num_agents();
        let m = self.formation.num_edges();
        let h_bar = self.formation.h_bar();

        let p_vec = stack_quantized(p);
        let errors = h_bar * &p_vec;
        let potentials = edge_potentials(&errors);

        let delta = &potentials - self.formation.desired_potentials();
        let gradient = if m == 0 {
            DVector::zeros(PLANAR_DIM * n)
        } else {
            let rd = selection_matrix(&errors, m) * h_bar;
            rd.tr_mul(&delta)
        };

        let ControlGains {
            k1,
            k2,
            alpha,
            beta,
            k_sign,
        } = self.gains;
        let mut u = -(sig_vec(&gradient, alpha) * k1)
            - sig_vec(&gradient, beta) * k2
            - sign_vec(&gradient) * k_sign;

        let injected = match self.disturbance {
            DisturbanceMode::None => None,
            DisturbanceMode::Bounded { gain } => Some(disturbance(PLANAR_DIM * n, t)? * gain),
        };
        if let Some(d) = &injected {
            u += d;
        }
        if !u.iter().all(|v| v.is_finite()) {
            return Err(FormationError::InvariantViolation(format!(
                "non-finite command, gradient norm {}",
                gradient.norm()
            )));
        }

        Ok(ControlStep {
            errors,
            potentials,
            delta,
            gradient,
            disturbance: injected,
            command: unstack_columns(&u),
        })
    }
}

/// R (M x 2M) with row j holding eⱼᵀ in column block j
fn selection_matrix(errors: &DVector<f64>, m: usize) -> DMatrix<f64> {
    let mut r = DMatrix::zeros(m, PLANAR_DIM * m);
    for j in 0..m {
        r[(j, PLANAR_DIM * j)] = errors[PLANAR_DIM * j];
        r[(j, PLANAR_DIM * j + 1)] = errors[PLANAR_DIM * j + 1];
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formation::FormationKind;
    use approx::assert_relative_eq;

    fn law(kind: FormationKind) -> FormationControlLaw {
        FormationControlLaw::plain(Arc::new(kind.build()), ControlGains::default()).unwrap()
    }

    #[test]
    fn test_zero_command_at_desired_for_all_formations() {
        for kind in FormationKind::ALL {
            let law = law(kind);
            let p_des = law.formation().desired_positions().clone();
            let step = law.evaluate(&p_des, 1.0).unwrap();

            assert_eq!(step.delta.norm(), 0.0, "{kind:?}");
            assert_eq!(step.gradient.norm(), 0.0, "{kind:?}");
            assert_eq!(step.command.norm(), 0.0, "{kind:?}");
            assert!(step.disturbance.is_none());
        }
    }

    #[test]
    fn test_disturbed_command_equals_disturbance_at_desired() {
        let formation = Arc::new(FormationKind::Square.build());
        let law = FormationControlLaw::disturbed(formation.clone(), ControlGains::default(), 0.02)
            .unwrap();
        let t = 2.7;
        let u = law.compute(formation.desired_positions(), t).unwrap();
        let d = disturbance(8, t).unwrap() * 0.02;

        assert_eq!(u.as_slice(), d.as_slice());
    }

    #[test]
    fn test_selection_matrix_layout() {
        let e = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        let r = selection_matrix(&e, 2);
        assert_eq!(r.shape(), (2, 4));
        assert_eq!(r.row(0).iter().copied().collect::<Vec<_>>(), vec![1.0, 2.0, 0.0, 0.0]);
        assert_eq!(r.row(1).iter().copied().collect::<Vec<_>>(), vec![0.0, 0.0, 3.0, 4.0]);
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        // g is the gradient of V(p) = ½‖f(p) - f_des‖²
        let law = law(FormationKind::Pentagon);
        let formation = law.formation().clone();
        let mut p = formation.desired_positions().clone();
        p[(0, 1)] += 0.13;
        p[(1, 3)] -= 0.07;

        let potential = |p: &AgentMatrix| 0.5 * formation.potential_mismatch(p).unwrap().norm_squared();
        let g = law.evaluate(&p, 0.0).unwrap().gradient;

        let h = 1e-3;
        for k in 0..p.len() {
            let mut plus = p.clone();
            let mut minus = p.clone();
            plus[k] += h;
            minus[k] -= h;
            let numeric = (potential(&plus) - potential(&minus)) / (2.0 * h);
            assert_relative_eq!(g[k], numeric, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_command_opposes_gradient() {
        let law = law(FormationKind::Hexagon);
        let mut p = law.formation().desired_positions().clone();
        p[(0, 2)] += 0.2;
        p[(1, 5)] += 0.1;

        let step = law.evaluate(&p, 0.0).unwrap();
        let u = crate::formation::stack_columns(&step.command);
        for k in 0..u.len() {
            assert!(u[k] * step.gradient[k] <= 0.0);
        }
        assert!(u.dot(&step.gradient) < 0.0);
    }

    #[test]
    fn test_rejects_wrong_position_width() {
        let law = law(FormationKind::Triangle);
        let err = law.compute(&AgentMatrix::zeros(4), 0.0).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_single_agent_only_disturbance() {
        let formation = Arc::new(FormationKind::Point.build());
        let p = AgentMatrix::from_column_slice(&[3.0, -1.0]);

        let plain = FormationControlLaw::plain(formation.clone(), ControlGains::default()).unwrap();
        assert_eq!(plain.compute(&p, 0.0).unwrap().norm(), 0.0);

        // No edges: the disturbed command is the injected disturbance alone
        let disturbed =
            FormationControlLaw::disturbed(formation, ControlGains::default(), 0.05).unwrap();
        let u = disturbed.compute(&p, 1.2).unwrap();
        let d = disturbance(2, 1.2).unwrap() * 0.05;
        assert_eq!(u.as_slice(), d.as_slice());
        assert!(u.norm() > 0.0);
    }

    #[test]
    fn test_overflowing_command_is_invariant_violation() {
        let law = law(FormationKind::Line);
        let p = AgentMatrix::from_column_slice(&[0.0, 0.75, 0.0, -1e70]);
        let err = law.compute(&p, 0.0).unwrap_err();
        assert!(matches!(err, FormationError::InvariantViolation(_)));
    }

    #[test]
    fn test_invalid_gains_rejected() {
        let gains = ControlGains {
            alpha: 1.2,
            ..Default::default()
        };
        let result = FormationControlLaw::plain(Arc::new(FormationKind::Line.build()), gains);
        assert!(matches!(result, Err(ConfigurationError::InvalidGains(_))));
    }

    #[test]
    fn test_disturbed_variant_rejects_oversized_swarm() {
        let h = DMatrix::from_row_slice(1, 10, &[1, -1, 0, 0, 0, 0, 0, 0, 0, 0]);
        let formation = Arc::new(Formation::new(10, h).unwrap());
        let result = FormationControlLaw::disturbed(formation, ControlGains::default(), 0.01);
        assert_eq!(
            result.unwrap_err(),
            ConfigurationError::DisturbanceChannels { requested: 20, max: 18 }
        );
    }
}
