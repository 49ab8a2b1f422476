use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MassPropertiesErrors {
    #[error("mass cannot be less than or equal to zero")]
    MassLessThanOrEqualToZero,
    #[error("Ixx cant be less than or equal to zero")]
    IxxLessThanOrEqualToZero,
    #[error("Iyy cant be less than or equal to zero")]
    IyyLessThanOrEqualToZero,
    #[error("Izz cant be less than or equal to zero")]
    IzzLessThanOrEqualToZero,
}

/// Mass properties as they appear in the model file: inertia is about the
/// center of mass in the body frame, ordered [ixx, iyy, izz, ixy, ixz, iyz].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MassPropertiesBuilder {
    pub mass: f64,
    #[serde(default)]
    pub center_of_mass: [f64; 3],
    pub inertia: [f64; 6],
}

impl MassPropertiesBuilder {
    pub fn new(mass: f64, center_of_mass: [f64; 3], inertia: [f64; 6]) -> Self {
        Self {
            mass,
            center_of_mass,
            inertia,
        }
    }

    pub fn build(&self) -> Result<MassProperties, MassPropertiesErrors> {
        if self.mass <= 0.0 {
            return Err(MassPropertiesErrors::MassLessThanOrEqualToZero);
        }
        let [ixx, iyy, izz, ixy, ixz, iyz] = self.inertia;
        if ixx <= 0.0 {
            return Err(MassPropertiesErrors::IxxLessThanOrEqualToZero);
        }
        if iyy <= 0.0 {
            return Err(MassPropertiesErrors::IyyLessThanOrEqualToZero);
        }
        if izz <= 0.0 {
            return Err(MassPropertiesErrors::IzzLessThanOrEqualToZero);
        }
        Ok(MassProperties {
            mass: self.mass,
            center_of_mass: Vector3::from(self.center_of_mass),
            inertia: Matrix3::new(ixx, ixy, ixz, ixy, iyy, iyz, ixz, iyz, izz),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MassProperties {
    pub mass: f64,
    /// Body-frame offset of the center of mass from the body origin.
    pub center_of_mass: Vector3<f64>,
    /// Rotational inertia about the center of mass, body frame.
    pub inertia: Matrix3<f64>,
}

impl MassProperties {
    /// Massless placeholder used for the implicit ground body.
    pub fn zero() -> Self {
        Self {
            mass: 0.0,
            center_of_mass: Vector3::zeros(),
            inertia: Matrix3::zeros(),
        }
    }
}
