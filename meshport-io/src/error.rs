//! Mapping of third-party I/O errors onto [`meshport_core::Error`]

use meshport_core::Error;
use std::io;

/// A binary read that runs out of bytes means the file is truncated, which
/// is a parse problem rather than a filesystem one.
pub(crate) fn eof_as_parse(err: Error) -> Error {
    match err {
        Error::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            Error::Parse(format!("unexpected end of data: {}", e))
        }
        other => other,
    }
}

/// ply-rs reports every problem as `io::Error`; only failures coming from
/// the operating system stay I/O errors.
pub(crate) fn from_ply(err: io::Error) -> Error {
    if err.raw_os_error().is_some() {
        Error::Io(err)
    } else {
        Error::Parse(format!("invalid PLY data: {}", err))
    }
}

pub(crate) fn from_json(err: serde_json::Error) -> Error {
    if err.is_io() {
        Error::Io(err.into())
    } else {
        Error::Parse(format!("invalid JSON: {}", err))
    }
}

pub(crate) fn from_image(err: image::ImageError) -> Error {
    use image::ImageError;
    match err {
        ImageError::IoError(e) => Error::Io(e),
        ImageError::Decoding(e) => Error::Parse(format!("invalid image data: {}", e)),
        ImageError::Unsupported(e) => Error::Unsupported(e.to_string()),
        ImageError::Limits(e) => Error::Parse(format!("image exceeds decoder limits: {}", e)),
        other => Error::Unsupported(other.to_string()),
    }
}
