//! PNG and JPEG images through the `image` crate

use crate::error::from_image;
use crate::options::EncodeOptions;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageFormat};
use meshport_core::{Error, Image, Result};
use std::io::{BufRead, Write};

/// The `image` color type holding `channels` samples of `bytes` each
fn color_type(channels: usize, bytes: usize) -> Option<ColorType> {
    Some(match (channels, bytes) {
        (1, 1) => ColorType::L8,
        (2, 1) => ColorType::La8,
        (3, 1) => ColorType::Rgb8,
        (4, 1) => ColorType::Rgba8,
        (1, 2) => ColorType::L16,
        (2, 2) => ColorType::La16,
        (3, 2) => ColorType::Rgb16,
        (4, 2) => ColorType::Rgba16,
        (3, 4) => ColorType::Rgb32F,
        (4, 4) => ColorType::Rgba32F,
        _ => return None,
    })
}

fn decode(reader: &mut dyn BufRead, format: ImageFormat) -> Result<Image> {
    // The decoders want to seek, so buffer the whole stream first.
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    let decoded = image::load_from_memory_with_format(&data, format).map_err(from_image)?;

    let color = decoded.color();
    let channels = usize::from(color.channel_count());
    let bytes_per_channel = usize::from(color.bytes_per_pixel()) / channels;
    Image::from_data(
        decoded.width() as usize,
        decoded.height() as usize,
        channels,
        bytes_per_channel,
        decoded.as_bytes().to_vec(),
    )
}

pub(crate) fn read_png(reader: &mut dyn BufRead) -> Result<Image> {
    decode(reader, ImageFormat::Png)
}

pub(crate) fn read_jpg(reader: &mut dyn BufRead) -> Result<Image> {
    decode(reader, ImageFormat::Jpeg)
}

/// Dimensions and color type of an image about to be encoded
fn layout(image: &Image) -> Result<(u32, u32, ColorType)> {
    if image.is_empty() {
        return Err(Error::Unsupported("cannot encode an empty image".to_string()));
    }
    let color = color_type(image.num_of_channels, image.bytes_per_channel).ok_or_else(|| {
        Error::Unsupported(format!(
            "no pixel layout with {} channels of {} bytes",
            image.num_of_channels, image.bytes_per_channel
        ))
    })?;
    let width = u32::try_from(image.width).map_err(|_| Error::shape("image width exceeds u32"))?;
    let height = u32::try_from(image.height).map_err(|_| Error::shape("image height exceeds u32"))?;
    Ok((width, height, color))
}

pub(crate) fn write_png(image: &Image, writer: &mut dyn Write) -> Result<()> {
    let (width, height, color) = layout(image)?;
    if image.bytes_per_channel > 2 {
        return Err(Error::Unsupported(
            "PNG stores 8 or 16 bits per channel".to_string(),
        ));
    }
    PngEncoder::new(writer)
        .write_image(&image.data, width, height, color)
        .map_err(from_image)
}

pub(crate) fn write_jpg(image: &Image, options: &EncodeOptions, writer: &mut dyn Write) -> Result<()> {
    let (width, height, color) = layout(image)?;
    if !matches!(color, ColorType::L8 | ColorType::Rgb8) {
        return Err(Error::Unsupported(format!(
            "JPEG stores 8-bit gray or RGB images, not {:?}",
            color
        )));
    }
    JpegEncoder::new_with_quality(writer, options.quality)
        .write_image(&image.data, width, height, color)
        .map_err(from_image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn gradient(channels: usize, bytes: usize) -> Image {
        let (width, height) = (7, 5);
        let len = width * height * channels * bytes;
        let data = (0..len).map(|i| (i * 37 % 251) as u8).collect();
        Image::from_data(width, height, channels, bytes, data).unwrap()
    }

    #[test]
    fn test_png_keeps_every_layout() {
        for channels in 1..=4 {
            for bytes in [1, 2] {
                let image = gradient(channels, bytes);
                let mut out: Vec<u8> = Vec::new();
                write_png(&image, &mut out).unwrap();
                let back = read_png(&mut Cursor::new(out)).unwrap();
                assert_eq!(back, image, "{} channels x {} bytes", channels, bytes);
            }
        }
    }

    #[test]
    fn test_jpg_is_lossy_but_shaped() {
        let image = gradient(3, 1);
        let mut out: Vec<u8> = Vec::new();
        write_jpg(&image, &EncodeOptions::default(), &mut out).unwrap();
        let back = read_jpg(&mut Cursor::new(out)).unwrap();
        assert_eq!((back.width, back.height, back.num_of_channels), (7, 5, 3));
        assert_eq!(back.bytes_per_channel, 1);
    }

    #[test]
    fn test_unencodable_layouts() {
        let mut out: Vec<u8> = Vec::new();
        let rgba = gradient(4, 1);
        assert!(matches!(write_jpg(&rgba, &EncodeOptions::default(), &mut out), Err(Error::Unsupported(_))));
        assert!(matches!(write_png(&gradient(3, 4), &mut out), Err(Error::Unsupported(_))));
        assert!(matches!(write_png(&Image::default(), &mut out), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let result = read_png(&mut Cursor::new(b"not a png at all".to_vec()));
        assert!(matches!(result, Err(Error::Parse(_))));
    }
}
