//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header only) |
//! | Decode (JPEG, PNG) | `image::ImageReader` |
//! | Decode (GIF) | `GifDecoder::into_frames`, every frame |
//! | Resize | `resize_exact` / `imageops::resize` with `Lanczos3` |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` |
//! | Encode → PNG | `PngEncoder::new_with_quality` (quality picks the compression level) |
//! | Encode → GIF | `GifEncoder::encode_frames`, delays kept |
//!
//! Output format always follows the output extension, which mirrors the
//! input. There is no format conversion.
//!
//! Outputs are encoded into a temp file in the target directory and renamed
//! over the target, so a failed encode never truncates an existing file.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{ExportParams, Quality};
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::{self, FilterType};
use image::{AnimationDecoder, ColorType, DynamicImage, Frame, ImageDecoder, ImageReader};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Extensions this backend reads and writes. Lowercase; match case-insensitively.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Quality at or above which PNG output uses the slowest, smallest compression.
const PNG_BEST_COMPRESSION_QUALITY: u32 = 90;

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Output format, from the (case-insensitive) output extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Jpeg,
    Png,
    Gif,
}

fn output_format(path: &Path) -> Result<OutputFormat, BackendError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
        "png" => Ok(OutputFormat::Png),
        "gif" => Ok(OutputFormat::Gif),
        other => Err(BackendError::ProcessingFailed(format!(
            "Unsupported output format: {}",
            other
        ))),
    }
}

/// Encode into a temp file next to `path`, then rename it into place.
///
/// The target is only replaced once encoding has fully succeeded, so a
/// failed encode leaves an existing file (possibly the source) intact.
/// The output takes the permissions of `like`, since temp files are
/// created private.
fn write_atomically<F>(path: &Path, like: &Path, encode: F) -> Result<(), BackendError>
where
    F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> Result<(), BackendError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(BackendError::Io)?;
    {
        let mut writer = BufWriter::new(&mut temp);
        encode(&mut writer)?;
        writer.flush().map_err(BackendError::Io)?;
    }
    let permissions = std::fs::metadata(like)
        .map_err(BackendError::Io)?
        .permissions();
    temp.as_file()
        .set_permissions(permissions)
        .map_err(BackendError::Io)?;
    temp.persist(path).map_err(|e| BackendError::Io(e.error))?;
    Ok(())
}

fn encode_jpeg(
    img: &DynamicImage,
    writer: impl Write,
    quality: Quality,
) -> Result<(), BackendError> {
    // JPEG has no alpha channel and no 16-bit depth.
    let img = match img.color() {
        ColorType::L8 | ColorType::Rgb8 => img.clone(),
        _ => DynamicImage::ImageRgb8(img.to_rgb8()),
    };
    let encoder = JpegEncoder::new_with_quality(writer, quality.value() as u8);
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))
}

fn encode_png(
    img: &DynamicImage,
    writer: impl Write,
    quality: Quality,
) -> Result<(), BackendError> {
    let compression = if quality.value() >= PNG_BEST_COMPRESSION_QUALITY {
        CompressionType::Best
    } else {
        CompressionType::Default
    };
    let encoder = PngEncoder::new_with_quality(writer, compression, PngFilter::Adaptive);
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {}", e)))
}

/// Decode, resize and re-encode a still image (JPEG or PNG).
fn export_still(params: &ExportParams, format: OutputFormat) -> Result<(), BackendError> {
    let img = load_image(&params.source)?;
    let out = match params.resize {
        Some(dims) => img.resize_exact(dims.width, dims.height, FilterType::Lanczos3),
        None => img,
    };
    write_atomically(&params.output, &params.source, |writer| match format {
        OutputFormat::Jpeg => encode_jpeg(&out, writer, params.quality),
        _ => encode_png(&out, writer, params.quality),
    })
}

/// Re-encode a GIF frame by frame, so animations survive.
///
/// Each frame buffer and its offset on the canvas are scaled by the same
/// factor as the whole image; delays are kept as they are.
fn export_gif(params: &ExportParams) -> Result<(), BackendError> {
    let decode_error = |e: image::ImageError| {
        BackendError::ProcessingFailed(format!(
            "Failed to decode {}: {}",
            params.source.display(),
            e
        ))
    };

    let file = File::open(&params.source).map_err(BackendError::Io)?;
    let decoder = GifDecoder::new(BufReader::new(file)).map_err(decode_error)?;
    let (canvas_width, canvas_height) = decoder.dimensions();
    let frames = decoder.into_frames().collect_frames().map_err(decode_error)?;

    let frames: Vec<Frame> = match params.resize {
        None => frames,
        Some(target) => frames
            .into_iter()
            .map(|frame| {
                let scale_x = |v: u32| scale_axis(v, target.width, canvas_width);
                let scale_y = |v: u32| scale_axis(v, target.height, canvas_height);
                let (left, top, delay) = (frame.left(), frame.top(), frame.delay());
                let buffer = frame.into_buffer();
                let resized = imageops::resize(
                    &buffer,
                    scale_x(buffer.width()).max(1),
                    scale_y(buffer.height()).max(1),
                    FilterType::Lanczos3,
                );
                Frame::from_parts(resized, scale_x(left), scale_y(top), delay)
            })
            .collect(),
    };

    write_atomically(&params.output, &params.source, |writer| {
        let mut encoder = GifEncoder::new(writer);
        if frames.len() > 1 {
            encoder
                .set_repeat(Repeat::Infinite)
                .map_err(|e| BackendError::ProcessingFailed(format!("GIF encode failed: {}", e)))?;
        }
        encoder
            .encode_frames(frames)
            .map_err(|e| BackendError::ProcessingFailed(format!("GIF encode failed: {}", e)))
    })
}

/// `value * target / canvas`, rounded.
fn scale_axis(value: u32, target: u32, canvas: u32) -> u32 {
    (value as f64 * target as f64 / canvas.max(1) as f64).round() as u32
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "Failed to read dimensions of {}: {}",
                path.display(),
                e
            ))
        })?;
        if width == 0 || height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "Image has no pixels: {}",
                path.display()
            )));
        }
        Ok(Dimensions { width, height })
    }

    fn export(&self, params: &ExportParams) -> Result<(), BackendError> {
        match output_format(&params.output)? {
            OutputFormat::Gif => export_gif(params),
            still => export_still(params, still),
        }
    }
}
