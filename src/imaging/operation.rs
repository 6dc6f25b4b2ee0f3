// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Operation codes accepted by the edit form.

use std::fmt;
use std::str::FromStr;

use super::DispatchError;

/// Output formats reachable through a pure re-encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReencodeFormat {
    Webp,
    Jpeg,
    Png,
    Bmp,
    Tiff,
    Heic,
    Apng,
    Ico,
    Raw,
    Dng,
    Exr,
    Hdr,
}

impl ReencodeFormat {
    /// File extension written for this format, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ReencodeFormat::Webp => "webp",
            ReencodeFormat::Jpeg => "jpg",
            ReencodeFormat::Png => "png",
            ReencodeFormat::Bmp => "bmp",
            ReencodeFormat::Tiff => "tiff",
            ReencodeFormat::Heic => "heic",
            ReencodeFormat::Apng => "apng",
            ReencodeFormat::Ico => "ico",
            ReencodeFormat::Raw => "raw",
            ReencodeFormat::Dng => "dng",
            ReencodeFormat::Exr => "exr",
            ReencodeFormat::Hdr => "hdr",
        }
    }
}

/// A validated image operation.
///
/// Parsed from the client's operation code before any file is touched, so
/// an unknown code never reaches the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Single-channel luma, written as PNG.
    Grayscale,
    /// Exact 300×300 resize, written as PNG.
    Resize,
    /// 90° clockwise rotation, written as PNG.
    Rotate,
    /// Horizontal mirror, written as PNG.
    Flip,
    /// No pixel transform, only a change of container format.
    Reencode(ReencodeFormat),
    /// Single-frame GIF animation with a 500 ms frame delay.
    AnimatedSingleFrame,
    /// One-page PDF wrapping the raster.
    WrapAsDocument,
}

impl Operation {
    pub const RESIZE_WIDTH: u32 = 300;
    pub const RESIZE_HEIGHT: u32 = 300;

    /// Every supported operation, in the order the edit form lists them.
    pub const ALL: [Operation; 18] = [
        Operation::Grayscale,
        Operation::Reencode(ReencodeFormat::Webp),
        Operation::Reencode(ReencodeFormat::Jpeg),
        Operation::Reencode(ReencodeFormat::Png),
        Operation::Reencode(ReencodeFormat::Bmp),
        Operation::Reencode(ReencodeFormat::Tiff),
        Operation::Resize,
        Operation::Rotate,
        Operation::Flip,
        Operation::AnimatedSingleFrame,
        Operation::WrapAsDocument,
        Operation::Reencode(ReencodeFormat::Heic),
        Operation::Reencode(ReencodeFormat::Apng),
        Operation::Reencode(ReencodeFormat::Ico),
        Operation::Reencode(ReencodeFormat::Raw),
        Operation::Reencode(ReencodeFormat::Dng),
        Operation::Reencode(ReencodeFormat::Exr),
        Operation::Reencode(ReencodeFormat::Hdr),
    ];

    /// Parse an operation code as submitted by the edit form.
    pub fn from_code(code: &str) -> Result<Self, DispatchError> {
        let op = match code {
            "cgray" => Operation::Grayscale,
            "cwebp" => Operation::Reencode(ReencodeFormat::Webp),
            "cjpg" => Operation::Reencode(ReencodeFormat::Jpeg),
            "cpng" => Operation::Reencode(ReencodeFormat::Png),
            "cbmp" => Operation::Reencode(ReencodeFormat::Bmp),
            "ctiff" => Operation::Reencode(ReencodeFormat::Tiff),
            "cresized" => Operation::Resize,
            "rotate" => Operation::Rotate,
            "flip" => Operation::Flip,
            "cgif" => Operation::AnimatedSingleFrame,
            "cpdf" => Operation::WrapAsDocument,
            "cheic" => Operation::Reencode(ReencodeFormat::Heic),
            "capng" => Operation::Reencode(ReencodeFormat::Apng),
            "cico" => Operation::Reencode(ReencodeFormat::Ico),
            "craw" => Operation::Reencode(ReencodeFormat::Raw),
            "cdng" => Operation::Reencode(ReencodeFormat::Dng),
            "cexr" => Operation::Reencode(ReencodeFormat::Exr),
            "chdr" => Operation::Reencode(ReencodeFormat::Hdr),
            other => return Err(DispatchError::InvalidOperation(other.to_string())),
        };
        Ok(op)
    }

    /// The operation code this variant is parsed from.
    pub fn code(self) -> &'static str {
        match self {
            Operation::Grayscale => "cgray",
            Operation::Resize => "cresized",
            Operation::Rotate => "rotate",
            Operation::Flip => "flip",
            Operation::AnimatedSingleFrame => "cgif",
            Operation::WrapAsDocument => "cpdf",
            Operation::Reencode(format) => match format {
                ReencodeFormat::Webp => "cwebp",
                ReencodeFormat::Jpeg => "cjpg",
                ReencodeFormat::Png => "cpng",
                ReencodeFormat::Bmp => "cbmp",
                ReencodeFormat::Tiff => "ctiff",
                ReencodeFormat::Heic => "cheic",
                ReencodeFormat::Apng => "capng",
                ReencodeFormat::Ico => "cico",
                ReencodeFormat::Raw => "craw",
                ReencodeFormat::Dng => "cdng",
                ReencodeFormat::Exr => "cexr",
                ReencodeFormat::Hdr => "chdr",
            },
        }
    }

    /// Text appended to the artifact stem, including the extension.
    pub fn output_suffix(self) -> String {
        match self {
            Operation::Grayscale => ".png".to_string(),
            Operation::Resize => "_resized.png".to_string(),
            Operation::Rotate => "_rotated.png".to_string(),
            Operation::Flip => "_flipped.png".to_string(),
            Operation::AnimatedSingleFrame => ".gif".to_string(),
            Operation::WrapAsDocument => ".pdf".to_string(),
            Operation::Reencode(format) => format!(".{}", format.extension()),
        }
    }

    /// Human-readable label for the edit form.
    pub fn label(self) -> &'static str {
        match self {
            Operation::Grayscale => "Convert to grayscale",
            Operation::Resize => "Resize to 300×300",
            Operation::Rotate => "Rotate 90° clockwise",
            Operation::Flip => "Flip horizontally",
            Operation::AnimatedSingleFrame => "Convert to GIF",
            Operation::WrapAsDocument => "Convert to PDF",
            Operation::Reencode(format) => match format {
                ReencodeFormat::Webp => "Convert to WebP",
                ReencodeFormat::Jpeg => "Convert to JPG",
                ReencodeFormat::Png => "Convert to PNG",
                ReencodeFormat::Bmp => "Convert to BMP",
                ReencodeFormat::Tiff => "Convert to TIFF",
                ReencodeFormat::Heic => "Convert to HEIC",
                ReencodeFormat::Apng => "Convert to APNG",
                ReencodeFormat::Ico => "Convert to ICO",
                ReencodeFormat::Raw => "Convert to RAW",
                ReencodeFormat::Dng => "Convert to DNG",
                ReencodeFormat::Exr => "Convert to EXR",
                ReencodeFormat::Hdr => "Convert to HDR",
            },
        }
    }
}

impl FromStr for Operation {
    type Err = DispatchError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Operation::from_code(code)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
