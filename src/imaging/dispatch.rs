// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Operation dispatcher.
//!
//! Decodes a staged upload, applies the selected transform and writes the
//! artifact to `<output_dir>/<stem><suffix>`. The stem is the staged name up
//! to its first dot, so `holiday.final.png` + `rotate` gives
//! `holiday_rotated.png`.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use image::codecs::gif::{GifEncoder, Repeat};
use image::imageops::FilterType;
use image::{ColorType, Delay, DynamicImage, Frame, ImageError, ImageFormat, ImageReader};

use super::{pdf, DispatchError, Operation};
use crate::storage::StoragePaths;

/// Frame delay of the single-frame GIF animation.
pub const GIF_FRAME_DELAY_MS: u32 = 500;

/// Largest edge the ICO container can hold.
const ICO_MAX_EDGE: u32 = 256;

/// GIF quantizer speed (1 = best quality, 30 = fastest).
const GIF_QUANTIZER_SPEED: i32 = 10;

/// Artifact stem of a staged filename: everything before the first dot.
pub fn artifact_stem(staged_filename: &str) -> &str {
    staged_filename
        .split('.')
        .next()
        .unwrap_or(staged_filename)
}

/// Encoder format for an output extension, if the `image` crate can write it.
///
/// `.apng` is written as a plain PNG, which is a valid one-frame APNG.
pub fn encoder_format(extension: &str) -> Option<ImageFormat> {
    let extension = extension.to_ascii_lowercase();
    let format = if extension == "apng" {
        ImageFormat::Png
    } else {
        ImageFormat::from_extension(&extension)?
    };
    format.writing_enabled().then_some(format)
}

/// Turns staged uploads into processed artifacts.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    paths: StoragePaths,
}

impl Dispatcher {
    pub fn new(paths: &StoragePaths) -> Self {
        Self {
            paths: paths.clone(),
        }
    }

    /// Where the artifact for `staged_filename` + `operation` is written.
    pub fn output_path(&self, staged_filename: &str, operation: Operation) -> PathBuf {
        self.paths
            .artifact_path(artifact_stem(staged_filename), &operation.output_suffix())
    }

    /// Decode, transform and encode a staged upload.
    ///
    /// Returns the artifact path. On failure no artifact is left behind.
    pub fn process(&self, staged_filename: &str, operation: Operation) -> Result<PathBuf, DispatchError> {
        let source = self.paths.staged_upload(staged_filename);
        let image = decode(&source)?;

        fs::create_dir_all(self.paths.output_dir())?;
        let output = self.output_path(staged_filename, operation);

        let result = match operation {
            Operation::AnimatedSingleFrame => write_single_frame_gif(&image, &output),
            Operation::WrapAsDocument => pdf::write_pdf(&image, &output),
            _ => {
                let transformed = apply_transform(operation, &image);
                encode_by_extension(transformed.as_ref().unwrap_or(&image), &output)
            }
        };

        if let Err(e) = result {
            let _ = fs::remove_file(&output);
            return Err(e);
        }

        tracing::debug!(
            operation = %operation,
            source = %source.display(),
            artifact = %output.display(),
            "Processed image"
        );

        Ok(output)
    }
}

fn decode(path: &Path) -> Result<DynamicImage, DispatchError> {
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(ImageError::IoError)
        .and_then(|reader| reader.decode())
        .map_err(DispatchError::Decode)
}

/// The pixel transform for an operation, or `None` when the decoded image
/// is encoded unchanged.
fn apply_transform(operation: Operation, image: &DynamicImage) -> Option<DynamicImage> {
    match operation {
        Operation::Grayscale => Some(DynamicImage::ImageLuma8(image.to_luma8())),
        Operation::Resize => Some(image.resize_exact(
            Operation::RESIZE_WIDTH,
            Operation::RESIZE_HEIGHT,
            FilterType::Triangle,
        )),
        Operation::Rotate => Some(image.rotate90()),
        Operation::Flip => Some(image.fliph()),
        Operation::Reencode(_) | Operation::AnimatedSingleFrame | Operation::WrapAsDocument => {
            None
        }
    }
}

/// Write `image` with the codec implied by the path's extension.
fn encode_by_extension(image: &DynamicImage, path: &Path) -> Result<(), DispatchError> {
    let extension = path
        .extension()
        .and_then(OsStr::to_str)
        .unwrap_or_default()
        .to_string();
    let format = encoder_format(&extension)
        .ok_or_else(|| DispatchError::UnsupportedFormat(extension.clone()))?;

    let converted = convert_for_encoder(format, image);
    converted
        .as_ref()
        .unwrap_or(image)
        .save_with_format(path, format)
        .map_err(|source| DispatchError::Encode { extension, source })
}

/// Pixel layout conversion for encoders that only accept some color types.
fn convert_for_encoder(format: ImageFormat, image: &DynamicImage) -> Option<DynamicImage> {
    match format {
        ImageFormat::Jpeg => match image.color() {
            ColorType::Rgb8 | ColorType::L8 => None,
            _ => Some(DynamicImage::ImageRgb8(image.to_rgb8())),
        },
        ImageFormat::Tiff => match image.color() {
            ColorType::La8 => Some(DynamicImage::ImageRgba8(image.to_rgba8())),
            ColorType::La16 => Some(DynamicImage::ImageRgba16(image.to_rgba16())),
            _ => None,
        },
        ImageFormat::OpenExr => Some(DynamicImage::ImageRgba32F(image.to_rgba32f())),
        ImageFormat::Hdr => Some(DynamicImage::ImageRgb32F(image.to_rgb32f())),
        ImageFormat::Ico if image.width() > ICO_MAX_EDGE || image.height() > ICO_MAX_EDGE => {
            let fitted = image.thumbnail(ICO_MAX_EDGE, ICO_MAX_EDGE);
            Some(DynamicImage::ImageRgba8(fitted.to_rgba8()))
        }
        ImageFormat::Bmp | ImageFormat::Ico | ImageFormat::WebP | ImageFormat::Gif => {
            match image.color() {
                ColorType::Rgb8 | ColorType::Rgba8 => None,
                color if color.has_alpha() => Some(DynamicImage::ImageRgba8(image.to_rgba8())),
                _ => Some(DynamicImage::ImageRgb8(image.to_rgb8())),
            }
        }
        _ => None,
    }
}

fn write_single_frame_gif(image: &DynamicImage, path: &Path) -> Result<(), DispatchError> {
    let encode_error = |source: ImageError| DispatchError::Encode {
        extension: "gif".to_string(),
        source,
    };

    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut buf, GIF_QUANTIZER_SPEED);
        encoder.set_repeat(Repeat::Infinite).map_err(encode_error)?;
        let frame = Frame::from_parts(
            image.to_rgba8(),
            0,
            0,
            Delay::from_numer_denom_ms(GIF_FRAME_DELAY_MS, 1),
        );
        encoder.encode_frame(frame).map_err(encode_error)?;
    }

    fs::write(path, buf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::BufReader;
    use std::time::Duration;

    use image::codecs::gif::GifDecoder;
    use image::{AnimationDecoder, GenericImageView, GrayAlphaImage, LumaA, Rgba, RgbaImage};

    use super::*;
    use crate::imaging::ReencodeFormat;

    const WRITABLE: [ReencodeFormat; 9] = [
        ReencodeFormat::Webp,
        ReencodeFormat::Jpeg,
        ReencodeFormat::Png,
        ReencodeFormat::Bmp,
        ReencodeFormat::Tiff,
        ReencodeFormat::Apng,
        ReencodeFormat::Ico,
        ReencodeFormat::Exr,
        ReencodeFormat::Hdr,
    ];

    struct Fixture {
        dispatcher: Dispatcher,
        paths: StoragePaths,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let paths = StoragePaths::new(dir.path());
        paths.ensure_layout().unwrap();
        Fixture {
            dispatcher: Dispatcher::new(&paths),
            paths,
            _dir: dir,
        }
    }

    /// Stage a WxH PNG whose left column is red and the rest blue.
    fn stage_png(paths: &StoragePaths, name: &str, width: u32, height: u32) {
        let img = RgbaImage::from_fn(width, height, |x, _| {
            if x == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        img.save_with_format(paths.staged_upload(name), ImageFormat::Png)
            .unwrap();
    }

    fn open(path: &Path) -> DynamicImage {
        ImageReader::open(path)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap()
    }

    fn output_files(paths: &StoragePaths) -> Vec<PathBuf> {
        fs::read_dir(paths.output_dir())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }

    #[test]
    fn grayscale_is_single_channel_with_same_dimensions() {
        let f = fixture();
        stage_png(&f.paths, "photo.png", 12, 7);

        let out = f.dispatcher.process("photo.png", Operation::Grayscale).unwrap();
        assert_eq!(out, f.paths.output_dir().join("photo.png"));

        let img = open(&out);
        assert_eq!(img.color(), ColorType::L8);
        assert_eq!(img.dimensions(), (12, 7));
    }

    #[test]
    fn resize_is_always_300_by_300() {
        let f = fixture();
        for (w, h) in [(10, 20), (640, 480), (1, 1)] {
            stage_png(&f.paths, "photo.png", w, h);
            let out = f.dispatcher.process("photo.png", Operation::Resize).unwrap();
            assert!(out.ends_with("photo_resized.png"));
            assert_eq!(open(&out).dimensions(), (300, 300));
        }
    }

    #[test]
    fn rotate_swaps_width_and_height() {
        let f = fixture();
        stage_png(&f.paths, "photo.png", 10, 20);

        let out = f.dispatcher.process("photo.png", Operation::Rotate).unwrap();
        assert!(out.ends_with("photo_rotated.png"));

        let img = open(&out);
        assert_eq!(img.dimensions(), (20, 10));
        // Clockwise turn moves the red left column onto the top row.
        assert_eq!(img.get_pixel(5, 0), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn flip_mirrors_horizontally() {
        let f = fixture();
        stage_png(&f.paths, "photo.png", 4, 3);

        let out = f.dispatcher.process("photo.png", Operation::Flip).unwrap();
        assert!(out.ends_with("photo_flipped.png"));

        let img = open(&out);
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(img.get_pixel(3, 1), Rgba([255, 0, 0, 255]));
        assert_eq!(img.get_pixel(0, 1), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn writable_reencodes_produce_decodable_artifacts() {
        let f = fixture();
        stage_png(&f.paths, "photo.png", 16, 8);

        for format in WRITABLE {
            let out = f
                .dispatcher
                .process("photo.png", Operation::Reencode(format))
                .unwrap_or_else(|e| panic!("{format:?}: {e}"));
            assert_eq!(
                out.extension().and_then(OsStr::to_str),
                Some(format.extension())
            );
            assert_eq!(open(&out).dimensions(), (16, 8), "{format:?}");
        }
    }

    #[test]
    fn gray_alpha_uploads_reencode_to_every_writable_format() {
        let f = fixture();
        let img = GrayAlphaImage::from_fn(8, 8, |x, y| LumaA([(x * 30) as u8, (y * 30) as u8]));
        img.save_with_format(f.paths.staged_upload("ga.png"), ImageFormat::Png)
            .unwrap();

        for format in WRITABLE {
            let out = f
                .dispatcher
                .process("ga.png", Operation::Reencode(format))
                .unwrap_or_else(|e| panic!("{format:?}: {e}"));
            assert_eq!(open(&out).dimensions(), (8, 8), "{format:?}");
        }
    }

    #[test]
    fn ico_output_is_fitted_to_container_limit() {
        let f = fixture();
        stage_png(&f.paths, "wide.png", 512, 128);

        let out = f
            .dispatcher
            .process("wide.png", Operation::Reencode(ReencodeFormat::Ico))
            .unwrap();
        assert_eq!(open(&out).dimensions(), (256, 64));
    }

    #[test]
    fn unwritable_formats_fail_without_artifact() {
        let f = fixture();
        stage_png(&f.paths, "photo.png", 4, 4);

        for format in [ReencodeFormat::Heic, ReencodeFormat::Raw, ReencodeFormat::Dng] {
            let err = f
                .dispatcher
                .process("photo.png", Operation::Reencode(format))
                .unwrap_err();
            assert!(matches!(err, DispatchError::UnsupportedFormat(_)), "{format:?}");
        }
        assert!(output_files(&f.paths).is_empty());
    }

    #[test]
    fn gif_is_single_frame_with_half_second_delay() {
        let f = fixture();
        stage_png(&f.paths, "photo.png", 6, 6);

        let out = f
            .dispatcher
            .process("photo.png", Operation::AnimatedSingleFrame)
            .unwrap();
        assert!(out.ends_with("photo.gif"));

        let decoder = GifDecoder::new(BufReader::new(File::open(&out).unwrap())).unwrap();
        let frames = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(Duration::from(frames[0].delay()), Duration::from_millis(500));
        assert_eq!(frames[0].buffer().dimensions(), (6, 6));
    }

    #[test]
    fn pdf_wraps_the_raster() {
        let f = fixture();
        stage_png(&f.paths, "photo.png", 30, 20);

        let out = f
            .dispatcher
            .process("photo.png", Operation::WrapAsDocument)
            .unwrap();
        assert!(out.ends_with("photo.pdf"));

        let bytes = fs::read(out).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(bytes.ends_with(b"%%EOF\n"));
    }

    #[test]
    fn invalid_code_produces_nothing() {
        let f = fixture();
        stage_png(&f.paths, "photo.png", 4, 4);

        for code in ["", "sepia", "CPNG", "cpng2"] {
            let err = Operation::from_code(code).unwrap_err();
            assert!(matches!(err, DispatchError::InvalidOperation(_)));
        }
        assert!(output_files(&f.paths).is_empty());
    }

    #[test]
    fn undecodable_input_fails_without_artifact() {
        let f = fixture();
        fs::write(f.paths.staged_upload("junk.png"), b"not an image").unwrap();

        let err = f.dispatcher.process("junk.png", Operation::Rotate).unwrap_err();
        assert!(matches!(err, DispatchError::Decode(_)));

        let err = f.dispatcher.process("absent.png", Operation::Rotate).unwrap_err();
        assert!(matches!(err, DispatchError::Decode(_)));

        assert!(output_files(&f.paths).is_empty());
    }

    #[test]
    fn artifact_stem_stops_at_first_dot() {
        assert_eq!(artifact_stem("holiday.final.png"), "holiday");
        assert_eq!(artifact_stem("cat.png"), "cat");

        let f = fixture();
        assert_eq!(
            f.dispatcher.output_path("holiday.final.png", Operation::Rotate),
            f.paths.output_dir().join("holiday_rotated.png")
        );
    }

    #[test]
    fn encoder_format_lookup() {
        assert_eq!(encoder_format("PNG"), Some(ImageFormat::Png));
        assert_eq!(encoder_format("apng"), Some(ImageFormat::Png));
        assert_eq!(encoder_format("tiff"), Some(ImageFormat::Tiff));
        assert_eq!(encoder_format("heic"), None);
        assert_eq!(encoder_format("raw"), None);
        assert_eq!(encoder_format("dng"), None);
    }
}
