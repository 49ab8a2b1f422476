use crate::mass_properties::{MassProperties, MassPropertiesBuilder};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyBuilder {
    pub name: String,
    /// None attaches the body to the implicit ground.
    #[serde(default)]
    pub parent: Option<String>,
    /// Parent-frame offset of this body's origin before its joints act.
    #[serde(default)]
    pub offset: [f64; 3],
    pub mass_properties: MassPropertiesBuilder,
}

impl BodyBuilder {
    pub fn new(name: &str, parent: Option<&str>, mass_properties: MassPropertiesBuilder) -> Self {
        Self {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            offset: [0.0; 3],
            mass_properties,
        }
    }

    pub fn with_offset(mut self, offset: [f64; 3]) -> Self {
        self.offset = offset;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Body {
    pub name: String,
    pub parent: usize,
    pub offset: Vector3<f64>,
    pub mass_properties: MassProperties,
}

impl Body {
    pub(crate) fn ground() -> Self {
        Self {
            name: "ground".to_string(),
            parent: 0,
            offset: Vector3::zeros(),
            mass_properties: MassProperties::zero(),
        }
    }
}
