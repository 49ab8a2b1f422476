//! Composite rigid body mass matrix and joint-space force mappings.
//!
//! Everything here operates on a realized [`DynamicState`]: world poses,
//! spatial inertias, and motion subspace columns are taken as given and the
//! routines only combine them.

use crate::{joint::JointKind, state::DynamicState, system::MultibodySystem, system::GROUND};
use nalgebra::{DMatrix, DVector, Vector3};
use spatial_algebra::{cross_force, from_parts, shift_force, shift_inertia, SpatialVector};

/// Composite rigid body algorithm. Fills `state.mass_matrix` with the
/// joint-space mass matrix for the currently realized pose.
pub(crate) fn crba(system: &MultibodySystem, state: &mut DynamicState) {
    let n = system.ndof();
    state.mass_matrix.fill(0.0);

    // Leaves to root: accumulate subtree inertias about each body origin.
    state.crb.copy_from_slice(&state.cinert);
    for body_id in (1..system.nbody()).rev() {
        let parent = system.bodies()[body_id].parent;
        if parent != GROUND {
            let d = state.xpos[body_id] - state.xpos[parent];
            let shifted = shift_inertia(&state.crb[body_id], &d);
            state.crb[parent] += shifted;
        }
    }

    for i in 0..n {
        let body_i = system.dof_body(i);
        // Force produced by a unit acceleration of DOF i, about body_i's
        // origin. Shifted outward as the walk crosses body boundaries.
        let mut buf = state.crb[body_i] * state.cdof[i];
        state.mass_matrix[(i, i)] = state.cdof[i].dot(&buf);

        let mut current = body_i;
        let mut j = system.dof_parent(i);
        while let Some(dof) = j {
            let body_j = system.dof_body(dof);
            if body_j != current {
                buf = shift_force(buf, state.xpos[current] - state.xpos[body_j]);
                current = body_j;
            }
            let m_ij = state.cdof[dof].dot(&buf);
            state.mass_matrix[(i, dof)] = m_ij;
            state.mass_matrix[(dof, i)] = m_ij;
            j = system.dof_parent(dof);
        }
    }
}

impl MultibodySystem {
    /// World position of a body-frame point.
    pub fn world_point(
        &self,
        state: &DynamicState,
        body: usize,
        local_point: &Vector3<f64>,
    ) -> Vector3<f64> {
        state.xpos[body] + state.xquat[body] * local_point
    }

    /// Express a world point in a body's frame.
    pub fn transform_point_to_body(
        &self,
        state: &DynamicState,
        body: usize,
        world_point: &Vector3<f64>,
    ) -> Vector3<f64> {
        state.xquat[body].inverse() * (world_point - state.xpos[body])
    }

    /// 6xN Jacobian of a body-frame point: rows 0-2 map joint rates to the
    /// world angular velocity of the body, rows 3-5 to the world linear
    /// velocity of the point. Columns for joints off the point's kinematic
    /// chain stay zero.
    pub fn frame_jacobian(
        &self,
        state: &DynamicState,
        body: usize,
        local_point: &Vector3<f64>,
    ) -> DMatrix<f64> {
        let mut jac = DMatrix::zeros(6, self.ndof());
        let point = self.world_point(state, body, local_point);

        let mut current = body;
        while current != GROUND {
            for &dof in self.body_joints(current) {
                let joint = &self.joints()[dof];
                let axis = state.joint_axis[dof];
                let (ang, lin) = match joint.kind {
                    JointKind::Hinge => (axis, axis.cross(&(point - state.joint_anchor[dof]))),
                    JointKind::Slide => (Vector3::zeros(), axis),
                };
                for row in 0..3 {
                    jac[(row, dof)] = ang[row];
                    jac[(row + 3, dof)] = lin[row];
                }
            }
            current = self.bodies()[current].parent;
        }
        jac
    }

    /// Accumulate into `tau` the generalized forces equivalent to a wrench
    /// applied at a body-fixed station: `local_point` is expressed in the
    /// body frame, `force` and `torque` in the world frame.
    pub fn apply_force_at_point(
        &self,
        state: &DynamicState,
        body: usize,
        local_point: &Vector3<f64>,
        force: &Vector3<f64>,
        torque: &Vector3<f64>,
        tau: &mut DVector<f64>,
    ) {
        let point = self.world_point(state, body, local_point);
        let mut current = body;
        while current != GROUND {
            for &dof in self.body_joints(current) {
                let joint = &self.joints()[dof];
                let axis = state.joint_axis[dof];
                tau[dof] += match joint.kind {
                    JointKind::Hinge => {
                        let r = point - state.joint_anchor[dof];
                        axis.cross(&r).dot(force) + axis.dot(torque)
                    }
                    JointKind::Slide => axis.dot(force),
                };
            }
            current = self.bodies()[current].parent;
        }
    }

    /// Map per-body spatial forces (world frame, about each body origin)
    /// through the system Jacobian transpose into joint space.
    pub fn system_jacobian_transpose(
        &self,
        state: &DynamicState,
        forces: &[SpatialVector],
    ) -> DVector<f64> {
        let mut tau = DVector::zeros(self.ndof());
        for body in 1..self.nbody() {
            let mut f = forces[body];
            let mut current = body;
            loop {
                for &dof in self.body_joints(current) {
                    tau[dof] += state.cdof[dof].dot(&f);
                }
                let parent = self.bodies()[current].parent;
                if parent == GROUND {
                    break;
                }
                f = shift_force(f, state.xpos[current] - state.xpos[parent]);
                current = parent;
            }
        }
        tau
    }

    /// Spatial gravity force on each body about its origin: the weight at
    /// the COM plus the lever-arm moment. Ground entry is zero.
    pub fn gravity_forces(&self, state: &DynamicState) -> Vec<SpatialVector> {
        let mut forces = vec![SpatialVector::zeros(); self.nbody()];
        for body in 1..self.nbody() {
            let weight = self.bodies()[body].mass_properties.mass * self.gravity;
            let h = state.xipos[body] - state.xpos[body];
            forces[body] = from_parts(h.cross(&weight), weight);
        }
        forces
    }

    /// Velocity-product bias force on each body about its origin:
    /// `I a_bias + v ×* (I v)`, with `a_bias` the spatial acceleration the
    /// body has when all coordinate accelerations are zero. Zero for every
    /// body at rest.
    pub fn centrifugal_forces(&self, state: &DynamicState) -> Vec<SpatialVector> {
        let mut forces = vec![SpatialVector::zeros(); self.nbody()];
        for body in 1..self.nbody() {
            let momentum = state.cinert[body] * state.cvel[body];
            forces[body] =
                state.cinert[body] * state.cacc_bias[body] + cross_force(state.cvel[body], momentum);
        }
        forces
    }
}
