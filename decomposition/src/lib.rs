//! Joint-space force decomposition for recorded motion trials.
//!
//! The engine takes an articulated multibody model and four time-aligned
//! trajectory streams: external contact channels, generalized states,
//! generalized accelerations, and measured net joint torques. Frame by
//! frame it splits the equation of motion M(q)q̈ + C(q,q̇) = τ + F into
//! inertial, Coriolis/centrifugal, gravitational, and right/left contact
//! torques, then reconciles their signed sum against the measured net
//! torque. The residual of that reconciliation is the run's diagnostic
//! output. The engine reports it without judging it.
//!
//! Processing is single-threaded and strictly frame-ordered. Frames are
//! independent of each other, so callers wanting parallelism can clone one
//! [`multibody::DynamicState`] per worker against the shared read-only
//! system and keep only the output ordering sequential.

pub mod calculator;
pub mod checker;
pub mod config;
pub mod engine;
pub mod errors;
pub mod trajectory;
pub mod writer;

pub use calculator::{Decomposition, ForceDecomposition};
pub use checker::{check, NetForces};
pub use config::{BodyRoles, ContactLayout, EngineConfig, ResolvedRoles, SideChannels};
pub use engine::Engine;
pub use errors::EngineErrors;
pub use trajectory::{FrameInputs, TrajectoryReader};
pub use writer::OutputManager;
