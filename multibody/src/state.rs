use crate::system::MultibodySystem;
use nalgebra::{DMatrix, DVector, UnitQuaternion, Vector3};
use spatial_algebra::{SpatialInertia, SpatialVector};

/// Mutable per-run dynamic state of a [`MultibodySystem`].
///
/// One live instance is reused frame after frame; every realization
/// overwrites all derived quantities, so values are only meaningful for the
/// coordinates most recently pushed through
/// [`MultibodySystem::realize`](crate::system::MultibodySystem::realize).
/// Clone one instance per worker for parallel callers.
#[derive(Debug, Clone)]
pub struct DynamicState {
    pub qpos: DVector<f64>,
    pub qvel: DVector<f64>,
    /// World position of each body origin.
    pub xpos: Vec<Vector3<f64>>,
    /// World orientation of each body frame.
    pub xquat: Vec<UnitQuaternion<f64>>,
    /// World position of each body center of mass.
    pub xipos: Vec<Vector3<f64>>,
    /// World-frame spatial inertia of each body about its origin.
    pub cinert: Vec<SpatialInertia>,
    /// World spatial velocity of each body at its origin.
    pub cvel: Vec<SpatialVector>,
    /// Velocity-dependent spatial acceleration of each body (coordinate
    /// accelerations held at zero), world frame, about the body origin.
    pub cacc_bias: Vec<SpatialVector>,
    /// Per-DOF motion subspace column, world frame, about the body origin.
    pub cdof: Vec<SpatialVector>,
    /// Per-DOF world joint axis, captured during forward kinematics.
    pub joint_axis: Vec<Vector3<f64>>,
    /// Per-DOF world anchor point, captured during forward kinematics.
    pub joint_anchor: Vec<Vector3<f64>>,
    /// Joint-space mass matrix M(q).
    pub mass_matrix: DMatrix<f64>,
    /// Composite rigid body scratch, leaves-to-root accumulation.
    pub(crate) crb: Vec<SpatialInertia>,
}

impl DynamicState {
    pub fn new(system: &MultibodySystem) -> Self {
        let n = system.ndof();
        let m = system.nbody();
        Self {
            qpos: DVector::zeros(n),
            qvel: DVector::zeros(n),
            xpos: vec![Vector3::zeros(); m],
            xquat: vec![UnitQuaternion::identity(); m],
            xipos: vec![Vector3::zeros(); m],
            cinert: vec![SpatialInertia::zeros(); m],
            cvel: vec![SpatialVector::zeros(); m],
            cacc_bias: vec![SpatialVector::zeros(); m],
            cdof: vec![SpatialVector::zeros(); n],
            joint_axis: vec![Vector3::zeros(); n],
            joint_anchor: vec![Vector3::zeros(); n],
            mass_matrix: DMatrix::zeros(n, n),
            crb: vec![SpatialInertia::zeros(); m],
        }
    }
}
