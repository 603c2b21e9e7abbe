//! Camera intrinsics, parameters and trajectories
//!
//! JSON keeps everything. The Redwood `.log` and TUM formats only carry
//! camera poses (the inverse of the extrinsic), so trajectories read from
//! them use the PrimeSense default intrinsic.

use crate::json::{matrix_from_vec, matrix_to_vec, read_envelope, write_envelope, Envelope};
use crate::text::{fmt_f64, parse_floats, Records};
use meshport_core::{
    Error, Matrix4d, PinholeCameraIntrinsic, PinholeCameraParameters, PinholeCameraTrajectory,
    Result, Transform3D, Vector3d,
};
use nalgebra::{Quaternion, UnitQuaternion};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

const INTRINSIC_CLASS: &str = "PinholeCameraIntrinsic";
const PARAMETERS_CLASS: &str = "PinholeCameraParameters";
const TRAJECTORY_CLASS: &str = "PinholeCameraTrajectory";

#[derive(Debug, Serialize, Deserialize)]
struct IntrinsicBody {
    width: u32,
    height: u32,
    intrinsic_matrix: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ParametersBody {
    extrinsic: Vec<f64>,
    intrinsic: Envelope<IntrinsicBody>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TrajectoryBody {
    parameters: Vec<Envelope<ParametersBody>>,
}

impl From<&PinholeCameraIntrinsic> for IntrinsicBody {
    fn from(intrinsic: &PinholeCameraIntrinsic) -> Self {
        Self {
            width: intrinsic.width,
            height: intrinsic.height,
            intrinsic_matrix: matrix_to_vec(&intrinsic.intrinsic_matrix),
        }
    }
}

impl TryFrom<IntrinsicBody> for PinholeCameraIntrinsic {
    type Error = Error;

    fn try_from(body: IntrinsicBody) -> Result<Self> {
        Ok(Self {
            width: body.width,
            height: body.height,
            intrinsic_matrix: matrix_from_vec(&body.intrinsic_matrix, "intrinsic_matrix")?,
        })
    }
}

impl From<&PinholeCameraParameters> for ParametersBody {
    fn from(parameters: &PinholeCameraParameters) -> Self {
        Self {
            extrinsic: matrix_to_vec(&parameters.extrinsic),
            intrinsic: Envelope::new(INTRINSIC_CLASS, IntrinsicBody::from(&parameters.intrinsic)),
        }
    }
}

impl TryFrom<ParametersBody> for PinholeCameraParameters {
    type Error = Error;

    fn try_from(body: ParametersBody) -> Result<Self> {
        let intrinsic = body.intrinsic.open(INTRINSIC_CLASS)?;
        Ok(Self {
            intrinsic: intrinsic.try_into()?,
            extrinsic: matrix_from_vec(&body.extrinsic, "extrinsic")?,
        })
    }
}

pub(crate) fn read_intrinsic_json(reader: &mut dyn BufRead) -> Result<PinholeCameraIntrinsic> {
    read_envelope::<IntrinsicBody>(reader, INTRINSIC_CLASS)?.try_into()
}

pub(crate) fn write_intrinsic_json(intrinsic: &PinholeCameraIntrinsic, writer: &mut dyn Write) -> Result<()> {
    write_envelope(writer, INTRINSIC_CLASS, IntrinsicBody::from(intrinsic))
}

pub(crate) fn read_parameters_json(reader: &mut dyn BufRead) -> Result<PinholeCameraParameters> {
    read_envelope::<ParametersBody>(reader, PARAMETERS_CLASS)?.try_into()
}

pub(crate) fn write_parameters_json(parameters: &PinholeCameraParameters, writer: &mut dyn Write) -> Result<()> {
    write_envelope(writer, PARAMETERS_CLASS, ParametersBody::from(parameters))
}

pub(crate) fn read_trajectory_json(reader: &mut dyn BufRead) -> Result<PinholeCameraTrajectory> {
    let body: TrajectoryBody = read_envelope(reader, TRAJECTORY_CLASS)?;
    let parameters = body
        .parameters
        .into_iter()
        .map(|envelope| envelope.open(PARAMETERS_CLASS)?.try_into())
        .collect::<Result<Vec<_>>>()?;
    Ok(PinholeCameraTrajectory { parameters })
}

pub(crate) fn write_trajectory_json(trajectory: &PinholeCameraTrajectory, writer: &mut dyn Write) -> Result<()> {
    let body = TrajectoryBody {
        parameters: trajectory
            .parameters
            .iter()
            .map(|p| Envelope::new(PARAMETERS_CLASS, ParametersBody::from(p)))
            .collect(),
    };
    write_envelope(writer, TRAJECTORY_CLASS, body)
}

/// Camera-to-world pose of a frame
fn pose_of(parameters: &PinholeCameraParameters) -> Result<Matrix4d> {
    parameters
        .extrinsic
        .try_inverse()
        .ok_or_else(|| Error::shape("camera extrinsic is not invertible"))
}

/// Frame parameters for a camera-to-world pose read from a pose-only file
fn frame_from_pose(pose: Matrix4d, line: usize) -> Result<PinholeCameraParameters> {
    let extrinsic = pose
        .try_inverse()
        .ok_or_else(|| Error::parse(format!("line {}: camera pose is not invertible", line)))?;
    Ok(PinholeCameraParameters::new(
        PinholeCameraIntrinsic::prime_sense_default(),
        extrinsic,
    ))
}

pub(crate) fn read_trajectory_log(reader: &mut dyn BufRead) -> Result<PinholeCameraTrajectory> {
    let mut records = Records::new(reader);
    let mut trajectory = PinholeCameraTrajectory::new();

    while let Some(metadata) = records.next_line()? {
        if metadata.tokens().len() != 3 {
            return Err(metadata.error("expected a three-value frame metadata line"));
        }
        let frame_line = metadata.number;
        let mut pose = Matrix4d::zeros();
        for row in 0..4 {
            let line = records
                .next_line()?
                .ok_or_else(|| Error::parse(format!("frame at line {} has fewer than 4 pose rows", frame_line)))?;
            let values: [f64; 4] = parse_floats(&line.tokens(), line.number)?;
            for (col, value) in values.into_iter().enumerate() {
                pose[(row, col)] = value;
            }
        }
        trajectory.parameters.push(frame_from_pose(pose, frame_line)?);
    }
    Ok(trajectory)
}

pub(crate) fn write_trajectory_log(trajectory: &PinholeCameraTrajectory, writer: &mut dyn Write) -> Result<()> {
    for (i, parameters) in trajectory.parameters.iter().enumerate() {
        let pose = pose_of(parameters)?;
        writeln!(writer, "{} {} {}", i, i, i + 1)?;
        for row in pose.row_iter() {
            writeln!(
                writer,
                "{:.8} {:.8} {:.8} {:.8}",
                row[0], row[1], row[2], row[3]
            )?;
        }
    }
    Ok(())
}

pub(crate) fn read_trajectory_tum(reader: &mut dyn BufRead) -> Result<PinholeCameraTrajectory> {
    let mut records = Records::new(reader);
    let mut trajectory = PinholeCameraTrajectory::new();

    while let Some(line) = records.next_line()? {
        let [_timestamp, tx, ty, tz, qx, qy, qz, qw] = parse_floats(&line.tokens(), line.number)?;
        let quaternion = Quaternion::new(qw, qx, qy, qz);
        if !(quaternion.norm() > 0.0) {
            return Err(line.error("rotation quaternion has zero length"));
        }
        let pose = Transform3D::from_translation_rotation(
            Vector3d::new(tx, ty, tz),
            UnitQuaternion::from_quaternion(quaternion),
        );
        trajectory.parameters.push(frame_from_pose(pose.matrix, line.number)?);
    }
    Ok(trajectory)
}

/// One line per frame; the frame index stands in for the timestamp
pub(crate) fn write_trajectory_tum(trajectory: &PinholeCameraTrajectory, writer: &mut dyn Write) -> Result<()> {
    for (i, parameters) in trajectory.parameters.iter().enumerate() {
        let pose = Transform3D::from(pose_of(parameters)?);
        let t = pose.translation();
        let q = pose.rotation();
        writeln!(
            writer,
            "{} {} {} {} {} {} {} {}",
            i,
            fmt_f64(t.x),
            fmt_f64(t.y),
            fmt_f64(t.z),
            fmt_f64(q.i),
            fmt_f64(q.j),
            fmt_f64(q.k),
            fmt_f64(q.w)
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Cursor;

    fn trajectory() -> PinholeCameraTrajectory {
        let intrinsic = PinholeCameraIntrinsic::prime_sense_default();
        let frames = [
            Transform3D::identity(),
            Transform3D::from_translation_rotation(
                Vector3d::new(0.5, -1.0, 2.0),
                UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3),
            ),
        ];
        PinholeCameraTrajectory {
            parameters: frames
                .iter()
                .map(|pose| PinholeCameraParameters::new(intrinsic, pose.inverse().unwrap().matrix))
                .collect(),
        }
    }

    #[test]
    fn test_json_is_exact_and_nested() {
        let original = trajectory();
        let mut out: Vec<u8> = Vec::new();
        write_trajectory_json(&original, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["class_name"], TRAJECTORY_CLASS);
        assert_eq!(value["parameters"][0]["intrinsic"]["class_name"], INTRINSIC_CLASS);
        assert_eq!(value["parameters"][1]["extrinsic"].as_array().unwrap().len(), 16);

        let back = read_trajectory_json(&mut Cursor::new(out)).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_intrinsic_matrix_length_is_checked() {
        let text = r#"{"class_name":"PinholeCameraIntrinsic","version_major":1,"version_minor":0,
                      "width":640,"height":480,"intrinsic_matrix":[525,0,0,0,525,0,319.5,239.5]}"#;
        assert!(matches!(read_intrinsic_json(&mut Cursor::new(text)), Err(Error::Parse(_))));
    }

    #[test]
    fn test_log_layout_and_round_trip() {
        let original = trajectory();
        let mut out: Vec<u8> = Vec::new();
        write_trajectory_log(&original, &mut out).unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert_eq!(text.lines().count(), 10);
        assert_eq!(text.lines().next(), Some("0 0 1"));
        assert_eq!(text.lines().nth(5), Some("1 1 2"));
        assert!(text.lines().nth(1).unwrap().starts_with("1.00000000 "));

        let back = read_trajectory_log(&mut Cursor::new(out)).unwrap();
        assert_eq!(back.len(), 2);
        for (a, b) in back.parameters.iter().zip(&original.parameters) {
            assert_relative_eq!(a.extrinsic, b.extrinsic, epsilon = 1e-7);
            assert_eq!(a.intrinsic, PinholeCameraIntrinsic::prime_sense_default());
        }
    }

    #[test]
    fn test_tum_round_trip() {
        let original = trajectory();
        let mut out: Vec<u8> = Vec::new();
        write_trajectory_tum(&original, &mut out).unwrap();
        let back = read_trajectory_tum(&mut Cursor::new(out)).unwrap();
        for (a, b) in back.parameters.iter().zip(&original.parameters) {
            assert_relative_eq!(a.extrinsic, b.extrinsic, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_short_log_frame_is_rejected() {
        let text = "0 0 1\n1 0 0 0\n0 1 0 0\n0 0 1 0\n";
        assert!(matches!(read_trajectory_log(&mut Cursor::new(text)), Err(Error::Parse(_))));
    }
}
