use multibody::MultibodyErrors;
use thiserror::Error;

/// Everything that can end a run. Kinds stay distinguishable here even
/// though the binary collapses them all to exit code 1.
#[derive(Debug, Error)]
pub enum EngineErrors {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Model(#[from] MultibodyErrors),
    #[error("model has no body named '{name}' for the {role} role")]
    RoleNotFound { role: &'static str, name: String },
    #[error(
        "input streams disagree on time at frame {frame}: \
         {times:?} exceeds tolerance {tolerance}"
    )]
    StreamMisaligned {
        frame: usize,
        /// Per-stream time tags: external force, state, acceleration, torque.
        times: [f64; 4],
        tolerance: f64,
    },
    #[error("{stream} stream ended early at frame {frame}")]
    StreamTruncated { stream: &'static str, frame: usize },
    #[error("could not parse '{token}' in the {stream} stream at frame {frame}")]
    ParseValue {
        stream: &'static str,
        token: String,
        frame: usize,
    },
    #[error("i/o failure on '{0}': {1}")]
    Io(String, #[source] std::io::Error),
    #[error("failed to write output: {0}")]
    Write(#[from] csv::Error),
}
