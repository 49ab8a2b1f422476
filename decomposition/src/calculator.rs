//! Per-frame decomposition of the equation of motion into its additive
//! joint-space contributions.

use crate::{
    config::{EngineConfig, ResolvedRoles, SideChannels},
    errors::EngineErrors,
    trajectory::FrameInputs,
};
use multibody::{DynamicState, MultibodySystem};
use nalgebra::{DMatrix, DVector, Vector3};

/// The five torque contributions plus the two attachment Jacobians for one
/// realized frame.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub inertial: DVector<f64>,
    pub gravity: DVector<f64>,
    pub coriolis: DVector<f64>,
    pub contact_right: DVector<f64>,
    pub contact_left: DVector<f64>,
    /// Geometric frame Jacobians at the attachment stations; not part of
    /// the residual, emitted for downstream actuator mapping.
    pub attachment_jacobian_right: DMatrix<f64>,
    pub attachment_jacobian_left: DMatrix<f64>,
}

#[derive(Debug)]
pub struct ForceDecomposition<'a> {
    system: &'a MultibodySystem,
    roles: ResolvedRoles,
    config: EngineConfig,
    attachment_offset: Vector3<f64>,
}

impl<'a> ForceDecomposition<'a> {
    pub fn new(system: &'a MultibodySystem, config: EngineConfig) -> Result<Self, EngineErrors> {
        let roles = config.roles.resolve(system)?;
        let attachment_offset = Vector3::from(config.attachment_offset);
        Ok(Self {
            system,
            roles,
            config,
            attachment_offset,
        })
    }

    /// Compute all contributions for a frame. The state must have been
    /// realized at this frame's coordinates.
    pub fn decompose(&self, state: &DynamicState, frame: &FrameInputs) -> Decomposition {
        let inertial = &state.mass_matrix * &frame.accelerations;
        let gravity = self
            .system
            .system_jacobian_transpose(state, &self.system.gravity_forces(state));
        let coriolis = self
            .system
            .system_jacobian_transpose(state, &self.system.centrifugal_forces(state));

        let contact_right = self.contact_torque(
            state,
            self.roles.right_contact,
            self.config.contact_layout.right,
            &frame.contacts,
        );
        let contact_left = self.contact_torque(
            state,
            self.roles.left_contact,
            self.config.contact_layout.left,
            &frame.contacts,
        );

        let attachment_jacobian_right =
            self.system
                .frame_jacobian(state, self.roles.right_attachment, &self.attachment_offset);
        let attachment_jacobian_left =
            self.system
                .frame_jacobian(state, self.roles.left_attachment, &self.attachment_offset);

        Decomposition {
            inertial,
            gravity,
            coriolis,
            contact_right,
            contact_left,
            attachment_jacobian_right,
            attachment_jacobian_left,
        }
    }

    /// One side's contact contribution. The COP is measured in the ground
    /// frame and re-expressed on the contact body; the force and moment are
    /// deliberately left in the ground frame, which is the frame the
    /// Jacobian-transpose mapping expects.
    fn contact_torque(
        &self,
        state: &DynamicState,
        body: usize,
        side: SideChannels,
        contacts: &DVector<f64>,
    ) -> DVector<f64> {
        let force = Vector3::new(
            contacts[side.force],
            contacts[side.force + 1],
            contacts[side.force + 2],
        );
        let cop = Vector3::new(
            contacts[side.cop],
            contacts[side.cop + 1],
            contacts[side.cop + 2],
        );
        let moment = Vector3::new(
            contacts[side.moment],
            contacts[side.moment + 1],
            contacts[side.moment + 2],
        );

        let station = self.system.transform_point_to_body(state, body, &cop);
        let mut tau = DVector::zeros(self.system.ndof());
        self.system
            .apply_force_at_point(state, body, &station, &force, &moment, &mut tau);
        tau
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use multibody::{BodyBuilder, JointBuilder, JointKind, MassPropertiesBuilder,
        MultibodySystemBuilder};
    const TOL: f64 = 1e-12;

    fn leg_model(gravity: [f64; 3]) -> MultibodySystem {
        let mass = MassPropertiesBuilder::new(1.0, [0.0; 3], [0.1, 0.1, 0.1, 0.0, 0.0, 0.0]);
        let mut builder = MultibodySystemBuilder::new(gravity);
        for name in ["femur_r", "femur_l"] {
            builder.add_body(BodyBuilder::new(name, None, mass.clone()));
        }
        builder.add_body(BodyBuilder::new("calcn_r", Some("femur_r"), mass.clone()));
        builder.add_body(BodyBuilder::new("calcn_l", Some("femur_l"), mass.clone()));
        builder.add_joint(JointBuilder::new(
            "hip_r",
            "femur_r",
            JointKind::Hinge,
            [0.0, 0.0, 1.0],
        ));
        builder.add_joint(JointBuilder::new(
            "hip_l",
            "femur_l",
            JointKind::Hinge,
            [0.0, 0.0, 1.0],
        ));
        builder.add_joint(JointBuilder::new(
            "ankle_r",
            "calcn_r",
            JointKind::Hinge,
            [0.0, 0.0, 1.0],
        ));
        builder.add_joint(JointBuilder::new(
            "ankle_l",
            "calcn_l",
            JointKind::Hinge,
            [0.0, 0.0, 1.0],
        ));
        builder.build().unwrap()
    }

    fn quiet_frame(n: usize) -> FrameInputs {
        FrameInputs {
            time: 0.0,
            contacts: DVector::zeros(18),
            coordinates: DVector::zeros(2 * n),
            accelerations: DVector::zeros(n),
            measured_torque: DVector::zeros(n),
        }
    }

    #[test]
    fn test_quiet_frame_leaves_only_gravity() {
        let system = leg_model([0.0, -9.81, 0.0]);
        let calculator = ForceDecomposition::new(&system, EngineConfig::default()).unwrap();
        let mut state = DynamicState::new(&system);
        let frame = quiet_frame(system.ndof());
        system.realize(&mut state, frame.coordinates.as_slice());

        let d = calculator.decompose(&state, &frame);
        assert_abs_diff_eq!(d.inertial.norm(), 0.0, epsilon = TOL);
        assert_abs_diff_eq!(d.coriolis.norm(), 0.0, epsilon = TOL);
        assert_abs_diff_eq!(d.contact_right.norm(), 0.0, epsilon = TOL);
        assert_abs_diff_eq!(d.contact_left.norm(), 0.0, epsilon = TOL);
    }

    #[test]
    fn test_contact_torque_reaches_only_its_chain() {
        let system = leg_model([0.0; 3]);
        let calculator = ForceDecomposition::new(&system, EngineConfig::default()).unwrap();
        let mut state = DynamicState::new(&system);
        let mut frame = quiet_frame(system.ndof());
        // Right vertical force of 100 N at a COP 0.1 m ahead of the origin.
        frame.contacts[1] = 100.0;
        frame.contacts[3] = 0.1;
        system.realize(&mut state, frame.coordinates.as_slice());

        let d = calculator.decompose(&state, &frame);
        // Hinges about z at the origin: torque = (cop × f)_z = 0.1 · 100.
        assert_abs_diff_eq!(d.contact_right[0], 10.0, epsilon = TOL);
        assert_abs_diff_eq!(d.contact_right[2], 10.0, epsilon = TOL);
        assert_abs_diff_eq!(d.contact_right[1], 0.0, epsilon = TOL);
        assert_abs_diff_eq!(d.contact_right[3], 0.0, epsilon = TOL);
        assert_abs_diff_eq!(d.contact_left.norm(), 0.0, epsilon = TOL);
    }

    #[test]
    fn test_contact_moment_channel_adds_to_hinge() {
        let system = leg_model([0.0; 3]);
        let calculator = ForceDecomposition::new(&system, EngineConfig::default()).unwrap();
        let mut state = DynamicState::new(&system);
        let mut frame = quiet_frame(system.ndof());
        // Pure left free moment about z.
        frame.contacts[17] = 5.0;
        system.realize(&mut state, frame.coordinates.as_slice());

        let d = calculator.decompose(&state, &frame);
        assert_abs_diff_eq!(d.contact_left[1], 5.0, epsilon = TOL);
        assert_abs_diff_eq!(d.contact_left[3], 5.0, epsilon = TOL);
        assert_abs_diff_eq!(d.contact_right.norm(), 0.0, epsilon = TOL);
    }

    #[test]
    fn test_attachment_jacobian_shape_and_chain() {
        let system = leg_model([0.0, -9.81, 0.0]);
        let calculator = ForceDecomposition::new(&system, EngineConfig::default()).unwrap();
        let mut state = DynamicState::new(&system);
        let frame = quiet_frame(system.ndof());
        system.realize(&mut state, frame.coordinates.as_slice());

        let d = calculator.decompose(&state, &frame);
        assert_eq!(d.attachment_jacobian_right.nrows(), 6);
        assert_eq!(d.attachment_jacobian_right.ncols(), system.ndof());
        // The femur station only moves with its own hip hinge.
        assert_abs_diff_eq!(d.attachment_jacobian_right[(2, 0)], 1.0, epsilon = TOL);
        assert_abs_diff_eq!(d.attachment_jacobian_right[(3, 0)], 0.35, epsilon = TOL);
        for dof in 1..system.ndof() {
            assert_abs_diff_eq!(
                d.attachment_jacobian_right.column(dof).norm(),
                0.0,
                epsilon = TOL
            );
        }
    }
}
