//! Articulated multibody model with a strict system/state split.
//!
//! [`system::MultibodySystem`] is the immutable model for a run: the named
//! body tree, single-degree-of-freedom joints, and the gravity field, built
//! from a RON model file through [`system::MultibodySystemBuilder`].
//! [`state::DynamicState`] holds everything that depends on the current
//! generalized coordinates: body poses, world spatial inertias, motion
//! subspace columns, body spatial velocities, and the joint-space mass
//! matrix. Realizing a state at a set of coordinates makes those quantities
//! valid for mass-matrix and Jacobian queries until the next realization.

pub mod body;
mod dynamics;
pub mod joint;
pub mod mass_properties;
pub mod state;
pub mod system;

use thiserror::Error;

pub use body::{Body, BodyBuilder};
pub use joint::{DofKind, Joint, JointBuilder, JointKind};
pub use mass_properties::{MassProperties, MassPropertiesBuilder, MassPropertiesErrors};
pub use state::DynamicState;
pub use system::{MultibodySystem, MultibodySystemBuilder, GROUND};

#[derive(Debug, Error)]
pub enum MultibodyErrors {
    #[error("name cannot be empty for body")]
    EmptyBodyName,
    #[error("duplicate body name '{0}'")]
    DuplicateBodyName(String),
    #[error("body '{0}' has unknown parent '{1}'")]
    UnknownParent(String, String),
    #[error("body tree is not connected to the ground at body '{0}'")]
    DisconnectedBody(String),
    #[error("joint '{0}' is attached to unknown body '{1}'")]
    UnknownJointBody(String, String),
    #[error("joint '{0}' has a zero-length axis")]
    ZeroLengthAxis(String),
    #[error("model has no degrees of freedom")]
    NoDegreesOfFreedom,
    #[error("{0}")]
    MassProperties(#[from] MassPropertiesErrors),
    #[error("failed to read model file '{path}': {source}")]
    ModelFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse model file '{path}': {message}")]
    ModelFileParse { path: String, message: String },
}
