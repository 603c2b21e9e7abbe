//! Binary feature descriptors
//!
//! Layout: `i32` keypoint count, `i32` dimension, then `count * dimension`
//! `f64` values keypoint after keypoint, all little-endian.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use meshport_core::{Error, Feature, Result};
use std::io::{BufRead, Read, Write};

fn header_value(value: i32, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::parse(format!("negative {} {}", what, value)))
}

pub(crate) fn read_feature(reader: &mut dyn BufRead) -> Result<Feature> {
    let keypoints = header_value(reader.read_i32::<LittleEndian>()?, "keypoint count")?;
    let dimension = header_value(reader.read_i32::<LittleEndian>()?, "feature dimension")?;

    let expected = keypoints
        .checked_mul(dimension)
        .and_then(|n| n.checked_mul(8))
        .ok_or_else(|| Error::parse(format!("{} x {} descriptors overflow", keypoints, dimension)))?;

    // Reading one byte past the declared payload detects trailing data
    // without trusting the header for the allocation size.
    let mut payload = Vec::new();
    reader.take(expected as u64 + 1).read_to_end(&mut payload)?;
    if payload.len() != expected {
        return Err(Error::parse(format!(
            "feature payload holds {} bytes{}, header declares {}",
            payload.len().min(expected),
            if payload.len() > expected { " and more" } else { "" },
            expected
        )));
    }

    let values: Vec<f64> = payload
        .chunks_exact(8)
        .map(|mut chunk| chunk.read_f64::<LittleEndian>())
        .collect::<std::io::Result<_>>()?;
    Ok(Feature::from_row_slice(keypoints, dimension, &values))
}

pub(crate) fn write_feature(feature: &Feature, writer: &mut dyn Write) -> Result<()> {
    let count = |n: usize, what: &str| {
        i32::try_from(n).map_err(|_| Error::Unsupported(format!("{} {} does not fit in i32", what, n)))
    };
    writer.write_i32::<LittleEndian>(count(feature.num_keypoints(), "keypoint count")?)?;
    writer.write_i32::<LittleEndian>(count(feature.dimension(), "feature dimension")?)?;
    for row in feature.data.row_iter() {
        for value in row.iter() {
            writer.write_f64::<LittleEndian>(*value)?;
        }
    }
    Ok(())
}
