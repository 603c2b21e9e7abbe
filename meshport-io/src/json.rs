//! Versioned JSON envelope shared by the camera and pose graph codecs
//!
//! Every object is written as `{ "class_name": ..., "version_major": 1,
//! "version_minor": 0, ...fields }`, nested objects included. Matrices are
//! flat arrays in column-major order.

use crate::error::from_json;
use meshport_core::{Error, Result};
use nalgebra::SMatrix;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

pub(crate) const VERSION_MAJOR: u32 = 1;
pub(crate) const VERSION_MINOR: u32 = 0;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Envelope<T> {
    pub class_name: String,
    pub version_major: u32,
    pub version_minor: u32,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Envelope<T> {
    pub fn new(class_name: &str, body: T) -> Self {
        Self {
            class_name: class_name.to_string(),
            version_major: VERSION_MAJOR,
            version_minor: VERSION_MINOR,
            body,
        }
    }

    /// Check the class name and major version, then hand out the body
    pub fn open(self, class_name: &str) -> Result<T> {
        if self.class_name != class_name {
            return Err(Error::Parse(format!(
                "expected class_name '{}', found '{}'",
                class_name, self.class_name
            )));
        }
        if self.version_major != VERSION_MAJOR {
            return Err(Error::Parse(format!(
                "unsupported {} version {}.{}",
                class_name, self.version_major, self.version_minor
            )));
        }
        Ok(self.body)
    }
}

pub(crate) fn read_envelope<T: DeserializeOwned>(
    reader: &mut dyn BufRead,
    class_name: &str,
) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_reader(reader).map_err(from_json)?;
    envelope.open(class_name)
}

pub(crate) fn write_envelope<T: Serialize>(
    writer: &mut dyn Write,
    class_name: &str,
    body: T,
) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &Envelope::new(class_name, body)).map_err(from_json)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Flatten a matrix to column-major values
pub(crate) fn matrix_to_vec<const R: usize, const C: usize>(matrix: &SMatrix<f64, R, C>) -> Vec<f64> {
    matrix.as_slice().to_vec()
}

/// Rebuild a matrix from column-major values, checking the length
pub(crate) fn matrix_from_vec<const R: usize, const C: usize>(
    values: &[f64],
    field: &str,
) -> Result<SMatrix<f64, R, C>> {
    if values.len() != R * C {
        return Err(Error::Parse(format!(
            "'{}' must hold {} values, found {}",
            field,
            R * C,
            values.len()
        )));
    }
    Ok(SMatrix::from_column_slice(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshport_core::Matrix4d;
    use std::io::Cursor;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Body {
        value: i32,
    }

    #[test]
    fn test_envelope_fields_are_flattened() {
        let mut out: Vec<u8> = Vec::new();
        write_envelope(&mut out, "Thing", Body { value: 3 }).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["class_name"], "Thing");
        assert_eq!(value["version_major"], 1);
        assert_eq!(value["value"], 3);

        let body: Body = read_envelope(&mut Cursor::new(out), "Thing").unwrap();
        assert_eq!(body, Body { value: 3 });
    }

    #[test]
    fn test_wrong_class_or_version_is_rejected() {
        let text = r#"{"class_name":"Other","version_major":1,"version_minor":0,"value":1}"#;
        let result: Result<Body> = read_envelope(&mut Cursor::new(text), "Thing");
        assert!(matches!(result, Err(Error::Parse(_))));

        let text = r#"{"class_name":"Thing","version_major":2,"version_minor":0,"value":1}"#;
        let result: Result<Body> = read_envelope(&mut Cursor::new(text), "Thing");
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_matrices_are_column_major() {
        let mut matrix = Matrix4d::identity();
        matrix[(0, 3)] = 5.0;
        let values = matrix_to_vec(&matrix);
        assert_eq!(values[12], 5.0);
        assert_eq!(matrix_from_vec::<4, 4>(&values, "pose").unwrap(), matrix);
        assert!(matrix_from_vec::<4, 4>(&values[..15], "pose").is_err());
    }
}
