use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JointKind {
    /// One rotational degree of freedom about `axis` through `anchor`.
    Hinge,
    /// One translational degree of freedom along `axis`.
    Slide,
}

/// Kind of a generalized coordinate, used by callers that must distinguish
/// angular quantities (e.g. degree-to-radian input conversion) from linear
/// ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DofKind {
    Rotational,
    Translational,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointBuilder {
    pub name: String,
    /// Name of the child body this joint moves.
    pub body: String,
    pub kind: JointKind,
    pub axis: [f64; 3],
    /// Child-body-frame point the joint acts through. Irrelevant for slides.
    #[serde(default)]
    pub anchor: [f64; 3],
}

impl JointBuilder {
    pub fn new(name: &str, body: &str, kind: JointKind, axis: [f64; 3]) -> Self {
        Self {
            name: name.to_string(),
            body: body.to_string(),
            kind,
            axis,
            anchor: [0.0; 3],
        }
    }

    pub fn with_anchor(mut self, anchor: [f64; 3]) -> Self {
        self.anchor = anchor;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Joint {
    pub name: String,
    pub body: usize,
    pub kind: JointKind,
    /// Unit axis in the child body frame.
    pub axis: Vector3<f64>,
    pub anchor: Vector3<f64>,
}

impl Joint {
    pub fn dof_kind(&self) -> DofKind {
        match self.kind {
            JointKind::Hinge => DofKind::Rotational,
            JointKind::Slide => DofKind::Translational,
        }
    }
}
