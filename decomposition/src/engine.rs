//! Frame loop: read, realize, decompose, check, write.

use crate::{
    calculator::{Decomposition, ForceDecomposition},
    checker::{check, NetForces},
    config::EngineConfig,
    errors::EngineErrors,
    trajectory::FrameInputs,
    writer::OutputManager,
};
use colored::Colorize;
use multibody::{DynamicState, MultibodySystem};
use nalgebra::DVector;

#[derive(Debug)]
pub struct Engine<'a> {
    system: &'a MultibodySystem,
    calculator: ForceDecomposition<'a>,
    warmup_frames: usize,
    verbose: bool,
}

impl<'a> Engine<'a> {
    /// Resolves the configured body roles against the model; a missing role
    /// is a hard failure before any frame is touched.
    pub fn new(
        system: &'a MultibodySystem,
        config: EngineConfig,
        verbose: bool,
    ) -> Result<Self, EngineErrors> {
        let warmup_frames = config.warmup_frames;
        let calculator = ForceDecomposition::new(system, config)?;
        Ok(Self {
            system,
            calculator,
            warmup_frames,
            verbose,
        })
    }

    /// Process every frame in order, single-threaded, writing outputs for
    /// frames past the warm-up. Returns the number of frames processed.
    pub fn run(
        &self,
        frames: impl Iterator<Item = Result<FrameInputs, EngineErrors>>,
        outputs: &mut OutputManager,
    ) -> Result<usize, EngineErrors> {
        let right_jacobian = outputs.new_writer("right_attachment_jacobian")?;
        let left_jacobian = outputs.new_writer("left_attachment_jacobian")?;
        let residual = outputs.new_writer("residual_force")?;
        let internal = outputs.new_writer("net_internal_values")?;

        if self.verbose {
            println!(
                "{} {} bodies, {} degrees of freedom",
                "model:".bold(),
                self.system.nbody(),
                self.system.ndof()
            );
        }

        let mut state = DynamicState::new(self.system);
        let mut processed = 0;
        for (index, frame) in frames.enumerate() {
            let frame = frame?;
            self.system.realize(&mut state, frame.coordinates.as_slice());
            let decomposition = self.calculator.decompose(&state, &frame);
            let net = check(&decomposition, &frame.measured_torque);

            if self.verbose {
                print_frame(&frame, &decomposition, &net);
            }
            if index >= self.warmup_frames {
                outputs.write_matrix(right_jacobian, &decomposition.attachment_jacobian_right)?;
                outputs.write_matrix(left_jacobian, &decomposition.attachment_jacobian_left)?;
                outputs.write_vector(residual, &net.residual)?;
                outputs.write_vector(internal, &net.internal)?;
            }
            processed = index + 1;
        }
        outputs.flush()?;
        Ok(processed)
    }
}

fn print_frame(frame: &FrameInputs, decomposition: &Decomposition, net: &NetForces) {
    println!("{} {:.4} s", "frame at".bold(), frame.time);
    print_vector("net joint torques", &frame.measured_torque);
    print_vector("inertia", &decomposition.inertial);
    print_vector("gravity", &decomposition.gravity);
    print_vector("centrifugal effects", &decomposition.coriolis);
    print_vector("right foot contact", &decomposition.contact_right);
    print_vector("left foot contact", &decomposition.contact_left);
    print_vector("residual", &net.residual);
}

fn print_vector(label: &str, vector: &DVector<f64>) {
    let values: Vec<String> = vector.iter().map(|v| format!("{v:.6}")).collect();
    println!("  {} [{}]", label.cyan(), values.join(", "));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::BodyRoles, trajectory::TrajectoryReader};
    use approx::assert_abs_diff_eq;
    use multibody::{BodyBuilder, JointBuilder, JointKind, MassPropertiesBuilder,
        MultibodySystemBuilder};
    use std::{fs, path::PathBuf};
    const TOL: f64 = 1e-12;

    fn unit_cart() -> MultibodySystem {
        let mut builder = MultibodySystemBuilder::new([0.0; 3]);
        builder.add_body(BodyBuilder::new(
            "cart",
            None,
            MassPropertiesBuilder::new(1.0, [0.0; 3], [0.1, 0.1, 0.1, 0.0, 0.0, 0.0]),
        ));
        builder.add_joint(JointBuilder::new(
            "track",
            "cart",
            JointKind::Slide,
            [1.0, 0.0, 0.0],
        ));
        builder.build().unwrap()
    }

    fn cart_config() -> EngineConfig {
        let cart = "cart".to_string();
        EngineConfig {
            roles: BodyRoles {
                right_contact_body: cart.clone(),
                left_contact_body: cart.clone(),
                right_attachment_body: cart.clone(),
                left_attachment_body: cart,
            },
            ..EngineConfig::default()
        }
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("decomposition_engine_{tag}_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_streams(dir: &PathBuf, accelerations: &[f64]) -> [PathBuf; 4] {
        let tags: Vec<f64> = (0..accelerations.len()).map(|i| i as f64 * 0.01).collect();
        let contacts: String = tags
            .iter()
            .map(|t| format!("{t}\t{}\n", vec!["0"; 18].join("\t")))
            .collect();
        let states: String = tags.iter().map(|t| format!("{t}\t0\t0\n")).collect();
        let accels: String = tags
            .iter()
            .zip(accelerations)
            .map(|(t, a)| format!("{t}\t{a}\n"))
            .collect();
        let torques: String = tags.iter().map(|t| format!("{t}\t0\n")).collect();

        let paths = [
            dir.join("grf.txt"),
            dir.join("states.txt"),
            dir.join("accelerations.txt"),
            dir.join("torques.txt"),
        ];
        fs::write(&paths[0], contacts).unwrap();
        fs::write(&paths[1], states).unwrap();
        fs::write(&paths[2], accels).unwrap();
        fs::write(&paths[3], torques).unwrap();
        paths
    }

    fn read_rows(path: PathBuf) -> Vec<Vec<f64>> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| line.split('\t').map(|v| v.parse().unwrap()).collect())
            .collect()
    }

    #[test]
    fn test_three_frame_run_skips_warmup_row() {
        let system = unit_cart();
        let config = cart_config();
        let dir = scratch_dir("three_frame");
        let [grf, states, accels, torques] = write_streams(&dir, &[0.0, 2.0, 0.0]);

        let engine = Engine::new(&system, config.clone(), false).unwrap();
        let frames =
            TrajectoryReader::open(&system, &config, &grf, &states, &accels, &torques).unwrap();
        let out_dir = dir.join("results");
        let mut outputs = OutputManager::new(&out_dir).unwrap();
        let processed = engine.run(frames, &mut outputs).unwrap();
        assert_eq!(processed, 3);

        // Unit mass slide: M = [1], so internal tracks the acceleration.
        let internal = read_rows(out_dir.join("net_internal_values.txt"));
        let residual = read_rows(out_dir.join("residual_force.txt"));
        assert_eq!(internal.len(), 2);
        assert_eq!(residual.len(), 2);
        assert_abs_diff_eq!(internal[0][0], 2.0, epsilon = TOL);
        assert_abs_diff_eq!(residual[0][0], -2.0, epsilon = TOL);
        assert_abs_diff_eq!(internal[1][0], 0.0, epsilon = TOL);

        // One 6-row Jacobian block per emitted frame.
        let jacobian = read_rows(out_dir.join("right_attachment_jacobian.txt"));
        assert_eq!(jacobian.len(), 12);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_warmup_zero_keeps_every_row() {
        let system = unit_cart();
        let mut config = cart_config();
        config.warmup_frames = 0;
        let dir = scratch_dir("no_warmup");
        let [grf, states, accels, torques] = write_streams(&dir, &[1.0, 0.0, 1.0, 0.0]);

        let engine = Engine::new(&system, config.clone(), false).unwrap();
        let frames =
            TrajectoryReader::open(&system, &config, &grf, &states, &accels, &torques).unwrap();
        let out_dir = dir.join("results");
        let mut outputs = OutputManager::new(&out_dir).unwrap();
        engine.run(frames, &mut outputs).unwrap();

        let internal = read_rows(out_dir.join("net_internal_values.txt"));
        assert_eq!(internal.len(), 4);
        for (row, expected) in internal.iter().zip([1.0, 0.0, 1.0, 0.0]) {
            assert_abs_diff_eq!(row[0], expected, epsilon = TOL);
        }

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_role_fails_before_frames() {
        let system = unit_cart();
        let err = Engine::new(&system, EngineConfig::default(), false).unwrap_err();
        assert!(matches!(err, EngineErrors::RoleNotFound { .. }));
    }

    #[test]
    fn test_stream_error_aborts_run() {
        let system = unit_cart();
        let config = cart_config();
        let dir = scratch_dir("misaligned");
        let [grf, states, accels, torques] = write_streams(&dir, &[0.0, 0.0]);
        // Push the torque tags off by a visible amount.
        fs::write(&torques, "0.5\t0\n0.51\t0\n").unwrap();

        let engine = Engine::new(&system, config.clone(), false).unwrap();
        let frames =
            TrajectoryReader::open(&system, &config, &grf, &states, &accels, &torques).unwrap();
        let out_dir = dir.join("results");
        let mut outputs = OutputManager::new(&out_dir).unwrap();
        let err = engine.run(frames, &mut outputs).unwrap_err();
        assert!(matches!(err, EngineErrors::StreamMisaligned { frame: 0, .. }));

        fs::remove_dir_all(&dir).ok();
    }
}
