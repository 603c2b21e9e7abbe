//! Raw image container

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A dense, row-major, interleaved image.
///
/// Multi-byte samples are stored in native byte order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub num_of_channels: usize,
    pub bytes_per_channel: usize,
    pub data: Vec<u8>,
}

impl Image {
    /// Wrap an existing buffer, checking its length
    pub fn from_data(
        width: usize,
        height: usize,
        num_of_channels: usize,
        bytes_per_channel: usize,
        data: Vec<u8>,
    ) -> Result<Self> {
        let image = Self {
            width,
            height,
            num_of_channels,
            bytes_per_channel,
            data,
        };
        image.validate()?;
        Ok(image)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of bytes in one row
    pub fn bytes_per_line(&self) -> usize {
        self.width * self.num_of_channels * self.bytes_per_channel
    }

    pub fn validate(&self) -> Result<()> {
        if self.data.is_empty() && self.width * self.height == 0 {
            return Ok(());
        }
        if !matches!(self.bytes_per_channel, 1 | 2 | 4) {
            return Err(Error::ShapeMismatch(format!(
                "unsupported bytes per channel: {}",
                self.bytes_per_channel
            )));
        }
        let expected = self.height * self.bytes_per_line();
        if self.data.len() != expected {
            return Err(Error::ShapeMismatch(format!(
                "image buffer holds {} bytes, expected {} ({}x{}x{}x{})",
                self.data.len(),
                expected,
                self.width,
                self.height,
                self.num_of_channels,
                self.bytes_per_channel
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_length_is_checked() {
        assert!(Image::from_data(2, 2, 3, 1, vec![0; 12]).is_ok());
        assert!(Image::from_data(2, 2, 3, 1, vec![0; 11]).is_err());
        assert!(Image::from_data(1, 1, 1, 3, vec![0; 3]).is_err());
        assert!(Image::default().validate().is_ok());
    }
}
