use crate::errors::EngineErrors;
use multibody::MultibodySystem;
use serde::{Deserialize, Serialize};

/// Logical body roles mapped to model body names, resolved once at startup.
/// Defaults match the gait model this engine was built around: contact
/// wrenches act on the feet, attachment Jacobians are evaluated on the
/// thighs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyRoles {
    pub right_contact_body: String,
    pub left_contact_body: String,
    pub right_attachment_body: String,
    pub left_attachment_body: String,
}

impl Default for BodyRoles {
    fn default() -> Self {
        Self {
            right_contact_body: "calcn_r".to_string(),
            left_contact_body: "calcn_l".to_string(),
            right_attachment_body: "femur_r".to_string(),
            left_attachment_body: "femur_l".to_string(),
        }
    }
}

/// Start columns of one side's channels within a contact-stream row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SideChannels {
    pub force: usize,
    pub cop: usize,
    pub moment: usize,
}

/// Column layout of the external-force stream. The default is the measured
/// 18-channel plate layout: right force, right COP, left force, left COP,
/// right moment, left moment, three scalars each.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactLayout {
    pub channels: usize,
    pub right: SideChannels,
    pub left: SideChannels,
}

impl Default for ContactLayout {
    fn default() -> Self {
        Self {
            channels: 18,
            right: SideChannels {
                force: 0,
                cop: 3,
                moment: 12,
            },
            left: SideChannels {
                force: 6,
                cop: 9,
                moment: 15,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub roles: BodyRoles,
    /// Body-frame station on each attachment body where the attachment
    /// Jacobians are evaluated.
    pub attachment_offset: [f64; 3],
    pub contact_layout: ContactLayout,
    /// Leading frames to compute but not write.
    pub warmup_frames: usize,
    /// Maximum spread allowed between the four per-stream time tags.
    pub time_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            roles: BodyRoles::default(),
            attachment_offset: [0.0, -0.35, 0.0],
            contact_layout: ContactLayout::default(),
            warmup_frames: 1,
            time_tolerance: 1e-6,
        }
    }
}

/// Body indices for the four roles after lookup against a model.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRoles {
    pub right_contact: usize,
    pub left_contact: usize,
    pub right_attachment: usize,
    pub left_attachment: usize,
}

impl BodyRoles {
    pub fn resolve(&self, system: &MultibodySystem) -> Result<ResolvedRoles, EngineErrors> {
        let lookup = |role: &'static str, name: &str| {
            system
                .body_index(name)
                .ok_or_else(|| EngineErrors::RoleNotFound {
                    role,
                    name: name.to_string(),
                })
        };
        Ok(ResolvedRoles {
            right_contact: lookup("right contact", &self.right_contact_body)?,
            left_contact: lookup("left contact", &self.left_contact_body)?,
            right_attachment: lookup("right attachment", &self.right_attachment_body)?,
            left_attachment: lookup("left attachment", &self.left_attachment_body)?,
        })
    }
}
