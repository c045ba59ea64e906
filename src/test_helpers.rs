//! Shared test utilities for the constrain-img test suite.
//!
//! Real image fixtures are generated on the fly rather than checked in, so
//! every test controls the exact pixel size it starts from.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! create_test_image(&tmp.path().join("wide.jpg"), 400, 300);
//! assert_eq!(dimensions_of(&tmp.path().join("wide.jpg")), (400, 300));
//! ```

use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{AnimationDecoder, Delay, Frame, Rgb, RgbImage, Rgba, RgbaImage};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// =========================================================================
// Fixture images
// =========================================================================

/// Write a small gradient image of the given size; format follows the extension.
///
/// JPEG gets an RGB buffer since the encoder rejects alpha. PNG and GIF get
/// RGBA.
pub fn create_test_image(path: &Path, width: u32, height: u32) {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => {
            let img = RgbImage::from_fn(width, height, |x, y| {
                Rgb([(x % 256) as u8, (y % 256) as u8, 128])
            });
            img.save(path).unwrap();
        }
        _ => {
            let img = RgbaImage::from_fn(width, height, |x, y| {
                Rgba([(x % 256) as u8, (y % 256) as u8, 64, 255])
            });
            img.save(path).unwrap();
        }
    }
}

/// Pixel size of an image on disk.
pub fn dimensions_of(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).unwrap()
}

/// Write a file with an image extension but garbage content.
pub fn create_corrupt_image(path: &Path) {
    std::fs::write(path, b"this is not an image").unwrap();
}

/// Write a looping GIF with `frames` frames, each a different flat colour.
pub fn create_animated_gif(path: &Path, width: u32, height: u32, frames: u32) {
    let frames: Vec<Frame> = (0..frames)
        .map(|i| {
            let shade = (i * 60 % 256) as u8;
            let buffer = RgbaImage::from_pixel(width, height, Rgba([shade, 255 - shade, 0, 255]));
            Frame::from_parts(buffer, 0, 0, Delay::from_numer_denom_ms(100, 1))
        })
        .collect();
    let mut encoder = GifEncoder::new(File::create(path).unwrap());
    encoder.set_repeat(Repeat::Infinite).unwrap();
    encoder.encode_frames(frames).unwrap();
}

/// Number of frames in a GIF on disk.
pub fn gif_frame_count(path: &Path) -> usize {
    let decoder = GifDecoder::new(BufReader::new(File::open(path).unwrap())).unwrap();
    decoder.into_frames().count()
}
