//! Lockstep reader for the four time-aligned input streams.
//!
//! Streams are whitespace/tab-delimited text, one row per frame, first
//! column a per-stream time tag. The state stream governs termination: when
//! it is exhausted at a tag read, the sequence ends. Any other stream ending
//! first, a tag disagreement beyond tolerance, or a non-numeric token is a
//! reported error rather than a silent garbage read.

use crate::{config::EngineConfig, errors::EngineErrors};
use multibody::{DofKind, MultibodySystem};
use nalgebra::DVector;
use std::{
    collections::VecDeque,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// One frame's worth of input, constructed fresh each iteration.
#[derive(Debug, Clone)]
pub struct FrameInputs {
    pub time: f64,
    /// External-force channels, `contact_layout.channels` wide.
    pub contacts: DVector<f64>,
    /// Packed generalized coordinates: `n` positions then `n` velocities.
    pub coordinates: DVector<f64>,
    /// Generalized accelerations, already converted to radians where the
    /// DOF is rotational.
    pub accelerations: DVector<f64>,
    pub measured_torque: DVector<f64>,
}

struct TokenReader {
    name: &'static str,
    source: Box<dyn BufRead>,
    tokens: VecDeque<String>,
}

impl TokenReader {
    fn from_path(name: &'static str, path: &Path) -> Result<Self, EngineErrors> {
        let file = File::open(path)
            .map_err(|e| EngineErrors::Io(path.display().to_string(), e))?;
        Ok(Self::new(name, Box::new(BufReader::new(file))))
    }

    fn new(name: &'static str, source: Box<dyn BufRead>) -> Self {
        Self {
            name,
            source,
            tokens: VecDeque::new(),
        }
    }

    fn next_token(&mut self) -> Result<Option<String>, EngineErrors> {
        while self.tokens.is_empty() {
            let mut line = String::new();
            let read = self
                .source
                .read_line(&mut line)
                .map_err(|e| EngineErrors::Io(self.name.to_string(), e))?;
            if read == 0 {
                return Ok(None);
            }
            self.tokens
                .extend(line.split_whitespace().map(str::to_string));
        }
        Ok(self.tokens.pop_front())
    }

    /// Leading time tag; EOF here is a clean end-of-stream.
    fn next_tag(&mut self, frame: usize) -> Result<Option<f64>, EngineErrors> {
        match self.next_token()? {
            None => Ok(None),
            Some(token) => Ok(Some(parse(self.name, token, frame)?)),
        }
    }

    /// Payload scalar; EOF here is truncation.
    fn next_value(&mut self, frame: usize) -> Result<f64, EngineErrors> {
        match self.next_token()? {
            None => Err(EngineErrors::StreamTruncated {
                stream: self.name,
                frame,
            }),
            Some(token) => parse(self.name, token, frame),
        }
    }
}

fn parse(stream: &'static str, token: String, frame: usize) -> Result<f64, EngineErrors> {
    token
        .parse()
        .map_err(|_| EngineErrors::ParseValue { stream, token, frame })
}

/// Lazy, finite, non-restartable sequence of [`FrameInputs`]. The first
/// error ends the sequence.
pub struct TrajectoryReader {
    contacts: TokenReader,
    states: TokenReader,
    accelerations: TokenReader,
    torques: TokenReader,
    dof_kinds: Vec<DofKind>,
    channels: usize,
    time_tolerance: f64,
    frame: usize,
    done: bool,
}

impl TrajectoryReader {
    pub fn open(
        system: &MultibodySystem,
        config: &EngineConfig,
        contacts: &Path,
        states: &Path,
        accelerations: &Path,
        torques: &Path,
    ) -> Result<Self, EngineErrors> {
        Ok(Self::from_sources(
            system,
            config,
            TokenReader::from_path("external force", contacts)?,
            TokenReader::from_path("state", states)?,
            TokenReader::from_path("acceleration", accelerations)?,
            TokenReader::from_path("torque", torques)?,
        ))
    }

    fn from_sources(
        system: &MultibodySystem,
        config: &EngineConfig,
        contacts: TokenReader,
        states: TokenReader,
        accelerations: TokenReader,
        torques: TokenReader,
    ) -> Self {
        Self {
            contacts,
            states,
            accelerations,
            torques,
            dof_kinds: system.dof_kinds(),
            channels: config.contact_layout.channels,
            time_tolerance: config.time_tolerance,
            frame: 0,
            done: false,
        }
    }

    fn read_frame(&mut self) -> Result<Option<FrameInputs>, EngineErrors> {
        let frame = self.frame;
        let n = self.dof_kinds.len();

        let Some(t_state) = self.states.next_tag(frame)? else {
            return Ok(None);
        };
        let t_contact = match self.contacts.next_tag(frame)? {
            Some(t) => t,
            None => {
                return Err(EngineErrors::StreamTruncated {
                    stream: "external force",
                    frame,
                })
            }
        };
        let t_accel = match self.accelerations.next_tag(frame)? {
            Some(t) => t,
            None => {
                return Err(EngineErrors::StreamTruncated {
                    stream: "acceleration",
                    frame,
                })
            }
        };
        let t_torque = match self.torques.next_tag(frame)? {
            Some(t) => t,
            None => {
                return Err(EngineErrors::StreamTruncated {
                    stream: "torque",
                    frame,
                })
            }
        };

        let times = [t_contact, t_state, t_accel, t_torque];
        let spread = times.iter().fold(0.0f64, |acc, t| acc.max((t - t_state).abs()));
        if spread > self.time_tolerance {
            return Err(EngineErrors::StreamMisaligned {
                frame,
                times,
                tolerance: self.time_tolerance,
            });
        }

        let mut contacts = DVector::zeros(self.channels);
        for value in contacts.iter_mut() {
            *value = self.contacts.next_value(frame)?;
        }

        let mut accelerations = DVector::zeros(n);
        for (value, kind) in accelerations.iter_mut().zip(&self.dof_kinds) {
            let raw = self.accelerations.next_value(frame)?;
            *value = match kind {
                DofKind::Rotational => raw * std::f64::consts::PI / 180.0,
                DofKind::Translational => raw,
            };
        }

        let mut measured_torque = DVector::zeros(n);
        for value in measured_torque.iter_mut() {
            *value = self.torques.next_value(frame)?;
        }

        let mut coordinates = DVector::zeros(2 * n);
        for value in coordinates.iter_mut() {
            *value = self.states.next_value(frame)?;
        }

        self.frame += 1;
        Ok(Some(FrameInputs {
            time: t_state,
            contacts,
            coordinates,
            accelerations,
            measured_torque,
        }))
    }
}

impl Iterator for TrajectoryReader {
    type Item = Result<FrameInputs, EngineErrors>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use multibody::{BodyBuilder, JointBuilder, JointKind, MassPropertiesBuilder,
        MultibodySystemBuilder};
    use std::io::Cursor;
    const TOL: f64 = 1e-12;

    fn two_dof_system() -> MultibodySystem {
        // DOF 0 rotational, DOF 1 translational.
        let mut builder = MultibodySystemBuilder::new([0.0, -9.81, 0.0]);
        builder.add_body(BodyBuilder::new(
            "trunk",
            None,
            MassPropertiesBuilder::new(1.0, [0.0; 3], [0.1, 0.1, 0.1, 0.0, 0.0, 0.0]),
        ));
        builder.add_joint(JointBuilder::new(
            "tilt",
            "trunk",
            JointKind::Hinge,
            [0.0, 0.0, 1.0],
        ));
        builder.add_joint(JointBuilder::new(
            "tx",
            "trunk",
            JointKind::Slide,
            [1.0, 0.0, 0.0],
        ));
        builder.build().unwrap()
    }

    fn reader_from(
        system: &MultibodySystem,
        config: &EngineConfig,
        contacts: &str,
        states: &str,
        accelerations: &str,
        torques: &str,
    ) -> TrajectoryReader {
        let source = |name, text: &str| {
            TokenReader::new(name, Box::new(Cursor::new(text.to_string())))
        };
        TrajectoryReader::from_sources(
            system,
            config,
            source("external force", contacts),
            source("state", states),
            source("acceleration", accelerations),
            source("torque", torques),
        )
    }

    fn zeros(count: usize) -> String {
        vec!["0.0"; count].join("\t")
    }

    #[test]
    fn test_unit_conversion_rotational_only() {
        let system = two_dof_system();
        let config = EngineConfig::default();
        let contacts = format!("0.0\t{}", zeros(18));
        let states = format!("0.0\t{}", zeros(4));
        let accelerations = "0.0\t90.0\t90.0";
        let torques = "0.0\t1.0\t2.0";
        let mut reader = reader_from(
            &system,
            &config,
            &contacts,
            &states,
            accelerations,
            torques,
        );

        let frame = reader.next().unwrap().unwrap();
        assert_abs_diff_eq!(
            frame.accelerations[0],
            std::f64::consts::FRAC_PI_2,
            epsilon = TOL
        );
        assert_abs_diff_eq!(frame.accelerations[1], 90.0, epsilon = TOL);
        assert_abs_diff_eq!(frame.measured_torque[1], 2.0, epsilon = TOL);
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_state_exhaustion_ends_sequence() {
        let system = two_dof_system();
        let config = EngineConfig::default();
        let two_frames = |payload: usize| {
            format!("0.0\t{}\n0.01\t{}", zeros(payload), zeros(payload))
        };
        let reader = reader_from(
            &system,
            &config,
            &two_frames(18),
            &two_frames(4),
            &two_frames(2),
            &two_frames(2),
        );
        let frames: Result<Vec<_>, _> = reader.collect();
        assert_eq!(frames.unwrap().len(), 2);
    }

    #[test]
    fn test_short_side_stream_is_truncation() {
        let system = two_dof_system();
        let config = EngineConfig::default();
        let states = format!("0.0\t{}\n0.01\t{}", zeros(4), zeros(4));
        let contacts = format!("0.0\t{}", zeros(18));
        let accelerations = format!("0.0\t{}\n0.01\t{}", zeros(2), zeros(2));
        let torques = format!("0.0\t{}\n0.01\t{}", zeros(2), zeros(2));
        let mut reader = reader_from(
            &system,
            &config,
            &contacts,
            &states,
            &accelerations,
            &torques,
        );

        assert!(reader.next().unwrap().is_ok());
        let err = reader.next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            EngineErrors::StreamTruncated { stream: "external force", frame: 1 }
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_time_tag_disagreement_is_misalignment() {
        let system = two_dof_system();
        let config = EngineConfig::default();
        let contacts = format!("0.5\t{}", zeros(18));
        let states = format!("0.0\t{}", zeros(4));
        let accelerations = format!("0.0\t{}", zeros(2));
        let torques = format!("0.0\t{}", zeros(2));
        let mut reader = reader_from(
            &system,
            &config,
            &contacts,
            &states,
            &accelerations,
            &torques,
        );

        let err = reader.next().unwrap().unwrap_err();
        assert!(matches!(err, EngineErrors::StreamMisaligned { frame: 0, .. }));
    }

    #[test]
    fn test_non_numeric_token_is_parse_error() {
        let system = two_dof_system();
        let config = EngineConfig::default();
        let contacts = format!("0.0\t{}", zeros(18));
        let states = format!("0.0\t{}", zeros(4));
        let accelerations = "0.0\tbogus\t0.0";
        let torques = format!("0.0\t{}", zeros(2));
        let mut reader = reader_from(
            &system,
            &config,
            &contacts,
            &states,
            accelerations,
            &torques,
        );

        let err = reader.next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            EngineErrors::ParseValue { stream: "acceleration", .. }
        ));
    }
}
