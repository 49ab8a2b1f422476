//! Reconciles the decomposed contributions against the measured net torque.

use crate::calculator::Decomposition;
use nalgebra::DVector;

/// Consistency-check output for one frame.
#[derive(Debug, Clone)]
pub struct NetForces {
    /// Unexplained torque: zero when the decomposition fully accounts for
    /// the measured net torque.
    pub residual: DVector<f64>,
    /// Aggregate of the computed internal contributions, expected to
    /// approximate the measured net torque.
    pub internal: DVector<f64>,
}

/// The two signed sums below define correctness for this decomposition.
/// No tolerance judgement is made here. The residual is emitted for
/// external analysis.
pub fn check(decomposition: &Decomposition, measured_torque: &DVector<f64>) -> NetForces {
    let d = decomposition;
    let residual =
        &d.gravity - &d.inertial + measured_torque - &d.coriolis + &d.contact_right + &d.contact_left;
    let internal = &d.inertial - &d.gravity + &d.coriolis - &d.contact_right - &d.contact_left;
    NetForces { residual, internal }
}
