// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Single-page PDF wrapping of a raster image.
//!
//! The image is JPEG-compressed and embedded as a `/DCTDecode` XObject, so
//! the document needs no further compression support. The page is sized to
//! the image at one point per pixel.
//!
//! ## Object Layout
//!
//! ```text
//! 1 0 obj  Catalog
//! 2 0 obj  Pages (Count 1)
//! 3 0 obj  Page  (MediaBox = image size, XObject /Im0)
//! 4 0 obj  Image XObject (DCTDecode stream)
//! 5 0 obj  Content stream drawing /Im0 over the full page
//! ```

use std::fs;
use std::io::Write;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageError};

use super::DispatchError;

/// JPEG quality used for the embedded image.
const EMBEDDED_JPEG_QUALITY: u8 = 90;

/// Render `image` as a PDF document and write it to `path`.
pub fn write_pdf(image: &DynamicImage, path: &Path) -> Result<(), DispatchError> {
    let document = render_pdf(image).map_err(|source| DispatchError::Encode {
        extension: "pdf".to_string(),
        source,
    })?;
    fs::write(path, document)?;
    Ok(())
}

/// Render `image` as a complete PDF 1.4 document.
pub fn render_pdf(image: &DynamicImage) -> Result<Vec<u8>, ImageError> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let (width, height) = (rgb.width(), rgb.height());

    let mut jpeg = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(
        &mut jpeg,
        EMBEDDED_JPEG_QUALITY,
    ))?;

    let content = format!("q\n{width} 0 0 {height} 0 0 cm\n/Im0 Do\nQ\n");

    let mut writer = PdfWriter::new();
    writer.object(b"<< /Type /Catalog /Pages 2 0 R >>");
    writer.object(b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    writer.object(
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {width} {height}] \
             /Resources << /XObject << /Im0 4 0 R >> /ProcSet [/PDF /ImageC] >> \
             /Contents 5 0 R >>"
        )
        .as_bytes(),
    );
    writer.stream(
        &format!(
            "<< /Type /XObject /Subtype /Image /Width {width} /Height {height} \
             /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>",
            jpeg.len()
        ),
        &jpeg,
    );
    writer.stream(
        &format!("<< /Length {} >>", content.len()),
        content.as_bytes(),
    );

    Ok(writer.finish(1))
}

/// Minimal sequential PDF object writer that tracks xref offsets.
struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        // Binary marker comment tells transports the file is not plain text.
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    fn begin_object(&mut self) {
        self.offsets.push(self.buf.len());
        let number = self.offsets.len();
        let _ = write!(self.buf, "{number} 0 obj\n");
    }

    fn object(&mut self, body: &[u8]) {
        self.begin_object();
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn stream(&mut self, dictionary: &str, data: &[u8]) {
        self.begin_object();
        self.buf.extend_from_slice(dictionary.as_bytes());
        self.buf.extend_from_slice(b"\nstream\n");
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn finish(mut self, root: usize) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let size = self.offsets.len() + 1;

        let _ = write!(self.buf, "xref\n0 {size}\n0000000000 65535 f \n");
        for offset in &self.offsets {
            let _ = write!(self.buf, "{offset:010} 00000 n \n");
        }
        let _ = write!(
            self.buf,
            "trailer\n<< /Size {size} /Root {root} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
        );
        self.buf
    }
}
