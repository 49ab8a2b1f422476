use crate::{
    body::{Body, BodyBuilder},
    joint::{DofKind, Joint, JointBuilder, JointKind},
    state::DynamicState,
    MultibodyErrors,
};
use nalgebra::{Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use spatial_algebra::{angular, cross_motion, from_parts, linear, spatial_inertia, SpatialInertia};
use std::{collections::HashMap, fs::File, io::Read, path::Path};

/// Index of the implicit ground body.
pub const GROUND: usize = 0;

/// Model description as read from a RON model file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultibodySystemBuilder {
    #[serde(default)]
    pub gravity: [f64; 3],
    pub bodies: Vec<BodyBuilder>,
    pub joints: Vec<JointBuilder>,
}

impl MultibodySystemBuilder {
    pub fn new(gravity: [f64; 3]) -> Self {
        Self {
            gravity,
            bodies: Vec::new(),
            joints: Vec::new(),
        }
    }

    pub fn add_body(&mut self, body: BodyBuilder) {
        self.bodies.push(body);
    }

    pub fn add_joint(&mut self, joint: JointBuilder) {
        self.joints.push(joint);
    }

    pub fn load(path: &Path) -> Result<Self, MultibodyErrors> {
        let mut contents = String::new();
        File::open(path)
            .and_then(|mut file| file.read_to_string(&mut contents))
            .map_err(|source| MultibodyErrors::ModelFileRead {
                path: path.display().to_string(),
                source,
            })?;
        ron::from_str(&contents).map_err(|e| MultibodyErrors::ModelFileParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), MultibodyErrors> {
        let mut names = HashMap::new();
        for body in &self.bodies {
            if body.name.is_empty() {
                return Err(MultibodyErrors::EmptyBodyName);
            }
            if body.name == "ground" || names.insert(body.name.clone(), ()).is_some() {
                return Err(MultibodyErrors::DuplicateBodyName(body.name.clone()));
            }
        }

        for body in &self.bodies {
            if let Some(parent) = &body.parent {
                if parent != "ground" && !names.contains_key(parent) {
                    return Err(MultibodyErrors::UnknownParent(
                        body.name.clone(),
                        parent.clone(),
                    ));
                }
            }
        }

        if self.joints.is_empty() {
            return Err(MultibodyErrors::NoDegreesOfFreedom);
        }
        for joint in &self.joints {
            if !names.contains_key(&joint.body) {
                return Err(MultibodyErrors::UnknownJointBody(
                    joint.name.clone(),
                    joint.body.clone(),
                ));
            }
            let axis = Vector3::from(joint.axis);
            if axis.norm() == 0.0 {
                return Err(MultibodyErrors::ZeroLengthAxis(joint.name.clone()));
            }
        }
        Ok(())
    }

    /// Compile the description into an immutable runtime system: bodies in
    /// topological order from the ground, joints grouped by body with one
    /// generalized coordinate each.
    pub fn build(&self) -> Result<MultibodySystem, MultibodyErrors> {
        self.validate()?;

        // Breadth-first order from the ground so parents precede children.
        let mut bodies = vec![Body::ground()];
        let mut name_index = HashMap::new();
        name_index.insert("ground".to_string(), GROUND);

        let mut placed = vec![false; self.bodies.len()];
        loop {
            let mut progressed = false;
            for (i, builder) in self.bodies.iter().enumerate() {
                if placed[i] {
                    continue;
                }
                let parent_name = builder.parent.as_deref().unwrap_or("ground");
                if let Some(&parent) = name_index.get(parent_name) {
                    name_index.insert(builder.name.clone(), bodies.len());
                    bodies.push(Body {
                        name: builder.name.clone(),
                        parent,
                        offset: Vector3::from(builder.offset),
                        mass_properties: builder.mass_properties.build()?,
                    });
                    placed[i] = true;
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
        if let Some(i) = placed.iter().position(|&p| !p) {
            return Err(MultibodyErrors::DisconnectedBody(
                self.bodies[i].name.clone(),
            ));
        }

        // Joints ordered by body topological order, declaration order within
        // a body; the DOF index is the joint index.
        let mut joints = Vec::with_capacity(self.joints.len());
        let mut body_jnt = vec![Vec::new(); bodies.len()];
        for body_id in 1..bodies.len() {
            for builder in self
                .joints
                .iter()
                .filter(|j| name_index[&j.body] == body_id)
            {
                let dof = joints.len();
                body_jnt[body_id].push(dof);
                joints.push(Joint {
                    name: builder.name.clone(),
                    body: body_id,
                    kind: builder.kind,
                    axis: Vector3::from(builder.axis).normalize(),
                    anchor: Vector3::from(builder.anchor),
                });
            }
        }

        // dof_parent: previous DOF on the same body, else the last DOF of
        // the nearest ancestor body that carries joints.
        let mut last_dof = vec![None; bodies.len()];
        let mut dof_parent = vec![None; joints.len()];
        let mut dof_body = vec![GROUND; joints.len()];
        for body_id in 1..bodies.len() {
            let mut prev = last_dof[bodies[body_id].parent];
            for &dof in &body_jnt[body_id] {
                dof_parent[dof] = prev;
                dof_body[dof] = body_id;
                prev = Some(dof);
            }
            last_dof[body_id] = prev;
        }

        Ok(MultibodySystem {
            gravity: Vector3::from(self.gravity),
            bodies,
            joints,
            body_jnt,
            dof_body,
            dof_parent,
            name_index,
        })
    }
}

/// Immutable articulated system for a run; outlives every frame.
#[derive(Debug)]
pub struct MultibodySystem {
    pub gravity: Vector3<f64>,
    bodies: Vec<Body>,
    joints: Vec<Joint>,
    body_jnt: Vec<Vec<usize>>,
    dof_body: Vec<usize>,
    dof_parent: Vec<Option<usize>>,
    name_index: HashMap<String, usize>,
}

impl MultibodySystem {
    /// Number of generalized coordinates.
    pub fn ndof(&self) -> usize {
        self.joints.len()
    }

    /// Number of bodies, ground included.
    pub fn nbody(&self) -> usize {
        self.bodies.len()
    }

    pub fn body_index(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).copied()
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub(crate) fn body_joints(&self, body: usize) -> &[usize] {
        &self.body_jnt[body]
    }

    pub(crate) fn dof_body(&self, dof: usize) -> usize {
        self.dof_body[dof]
    }

    pub(crate) fn dof_parent(&self, dof: usize) -> Option<usize> {
        self.dof_parent[dof]
    }

    pub fn dof_kinds(&self) -> Vec<DofKind> {
        self.joints.iter().map(Joint::dof_kind).collect()
    }

    /// Realize the state at a packed coordinate vector (`n` positions then
    /// `n` velocities): forward kinematics, world spatial inertias, motion
    /// subspace, body velocities, and the mass matrix become valid for these
    /// coordinates. Invalid numeric values (NaN) are not rejected; they
    /// propagate into the realized quantities.
    pub fn realize(&self, state: &mut DynamicState, coordinates: &[f64]) {
        let n = self.ndof();
        assert_eq!(
            coordinates.len(),
            2 * n,
            "coordinates must pack {n} positions then {n} velocities"
        );
        for i in 0..n {
            state.qpos[i] = coordinates[i];
            state.qvel[i] = coordinates[n + i];
        }
        self.realize_positions(state);
        self.realize_velocities(state);
        crate::dynamics::crba(self, state);
    }

    fn realize_positions(&self, state: &mut DynamicState) {
        state.xpos[GROUND] = Vector3::zeros();
        state.xquat[GROUND] = UnitQuaternion::identity();
        state.cinert[GROUND] = SpatialInertia::zeros();

        for body_id in 1..self.nbody() {
            let body = &self.bodies[body_id];
            let mut pos = state.xpos[body.parent] + state.xquat[body.parent] * body.offset;
            let mut quat = state.xquat[body.parent];

            // Joints act in declaration order; world axis and anchor are
            // captured at each joint's turn, before its own motion.
            for &dof in &self.body_jnt[body_id] {
                let joint = &self.joints[dof];
                let world_axis = quat * joint.axis;
                state.joint_axis[dof] = world_axis;
                state.joint_anchor[dof] = pos + quat * joint.anchor;
                match joint.kind {
                    JointKind::Hinge => {
                        let anchor = state.joint_anchor[dof];
                        let rot = UnitQuaternion::from_axis_angle(
                            &Unit::new_normalize(world_axis),
                            state.qpos[dof],
                        );
                        quat = rot * quat;
                        pos = anchor + rot * (pos - anchor);
                    }
                    JointKind::Slide => {
                        pos += world_axis * state.qpos[dof];
                    }
                }
            }

            state.xpos[body_id] = pos;
            state.xquat[body_id] = quat;

            let rot = quat.to_rotation_matrix().into_inner();
            state.xipos[body_id] = pos + quat * body.mass_properties.center_of_mass;
            let inertia_world = rot * body.mass_properties.inertia * rot.transpose();
            let h = state.xipos[body_id] - pos;
            state.cinert[body_id] =
                spatial_inertia(body.mass_properties.mass, &inertia_world, h);

            for &dof in &self.body_jnt[body_id] {
                let joint = &self.joints[dof];
                let axis = state.joint_axis[dof];
                state.cdof[dof] = match joint.kind {
                    JointKind::Hinge => {
                        from_parts(axis, axis.cross(&(pos - state.joint_anchor[dof])))
                    }
                    JointKind::Slide => from_parts(Vector3::zeros(), axis),
                };
            }
        }
    }

    fn realize_velocities(&self, state: &mut DynamicState) {
        state.cvel[GROUND] = spatial_algebra::SpatialVector::zeros();
        state.cacc_bias[GROUND] = spatial_algebra::SpatialVector::zeros();
        for body_id in 1..self.nbody() {
            let parent = self.bodies[body_id].parent;
            let v_parent = state.cvel[parent];
            let a_parent = state.cacc_bias[parent];
            let w = angular(&v_parent);
            let alpha = angular(&a_parent);
            let r = state.xpos[body_id] - state.xpos[parent];
            let mut vel = from_parts(w, linear(&v_parent) + w.cross(&r));
            let mut acc = from_parts(alpha, linear(&a_parent) + alpha.cross(&r));
            // Each joint axis rides on the motion accumulated before it, so
            // its rate contributes v_pred × (S q̇) to the bias acceleration.
            for &dof in &self.body_jnt[body_id] {
                let delta = state.cdof[dof] * state.qvel[dof];
                acc += cross_motion(vel, delta);
                vel += delta;
            }
            state.cvel[body_id] = vel;
            state.cacc_bias[body_id] = acc;
        }
    }
}
