//! Conversion pipeline: read, extract payload, decode both views, composite, write.
//!
//! Every stage either produces its output or fails with its own [`ConvertError`]
//! kind; nothing is retried and no stage falls back to another.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};

use crate::composite::{
    compose_side_by_side, encode_jpeg, SideBySide, DEFAULT_JPEG_QUALITY,
    DEFAULT_MAX_COMPOSITE_PIXELS,
};
use crate::error::{ConvertError, Result};
use crate::jpeg::{extract_xmp, is_jpeg, XmpSource};
use crate::result::{BatchItem, ConversionReport, Dimensions};
use crate::stereo::{decode_payload, locate_payload, LocatedPayload, LocatorConfig, Strategy};

/// Suffix appended to the input stem for the default output name.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "-converted";
/// Extension used when the input has none.
pub const DEFAULT_OUTPUT_EXTENSION: &str = "jpg";

/// Tunables for one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterOptions {
    pub locator: LocatorConfig,
    /// JPEG quality, 1-100.
    pub quality: u8,
    pub suffix: String,
    pub default_extension: String,
    pub max_composite_pixels: u64,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            locator: LocatorConfig::default(),
            quality: DEFAULT_JPEG_QUALITY,
            suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            default_extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
            max_composite_pixels: DEFAULT_MAX_COMPOSITE_PIXELS,
        }
    }
}

impl ConverterOptions {
    pub fn with_locator(mut self, locator: LocatorConfig) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_max_composite_pixels(mut self, max: u64) -> Self {
        self.max_composite_pixels = max;
        self
    }
}

/// Payload found in a container, with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPayload {
    pub source: XmpSource,
    pub strategy: Strategy,
    pub base64: String,
}

/// Run XMP extraction and the payload search over the candidate texts.
pub fn extract_payload(data: &[u8], config: &LocatorConfig) -> Result<ExtractedPayload> {
    let docs = extract_xmp(data);
    if docs.is_empty() {
        return Err(ConvertError::NoMetadata);
    }
    for (source, text) in docs.candidates() {
        if let Some(LocatedPayload { strategy, base64 }) = locate_payload(&text, config) {
            log::debug!("payload found in {:?} XMP", source);
            return Ok(ExtractedPayload {
                source,
                strategy,
                base64,
            });
        }
    }
    Err(ConvertError::NoSecondaryPayload)
}

/// In-memory result of [`render_side_by_side`].
#[derive(Debug, Clone)]
pub struct Rendered {
    pub composite: SideBySide,
    pub left: Dimensions,
    pub right: Dimensions,
    pub source: XmpSource,
    pub strategy: Strategy,
    pub payload_len: usize,
}

/// Build the composite from the bytes of a VR180 JPEG without touching the filesystem.
pub fn render_side_by_side(data: &[u8], options: &ConverterOptions) -> Result<Rendered> {
    if !is_jpeg(data) {
        return Err(ConvertError::InvalidImageData);
    }
    let payload = extract_payload(data, &options.locator)?;
    let right_bytes = decode_payload(&payload.base64).map_err(ConvertError::Base64DecodingFailed)?;
    log::debug!("decoded {} payload bytes", right_bytes.len());

    let left = image::load_from_memory_with_format(data, ImageFormat::Jpeg)
        .map_err(ConvertError::PrimaryImageDecodeFailed)?;
    let right = image::load_from_memory(&right_bytes).map_err(ConvertError::SecondaryImageDecodeFailed)?;

    let composite = compose_side_by_side(&left, &right, options.max_composite_pixels)?;
    Ok(Rendered {
        composite,
        left: dimensions(&left),
        right: dimensions(&right),
        source: payload.source,
        strategy: payload.strategy,
        payload_len: payload.base64.len(),
    })
}

fn dimensions(img: &DynamicImage) -> Dimensions {
    Dimensions::new(img.width(), img.height())
}

/// `<dir>/<stem><suffix>.<ext>`, keeping the input's extension or using `default_ext`.
pub fn derive_output_path(input: &Path, suffix: &str, default_ext: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| default_ext.to_string());
    input.with_file_name(format!("{stem}{suffix}.{ext}"))
}

fn read_input(input: &Path) -> Result<Vec<u8>> {
    if !input.exists() {
        return Err(ConvertError::FileNotFound(input.to_path_buf()));
    }
    fs::read(input).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ConvertError::FileNotFound(input.to_path_buf()),
        _ => ConvertError::ReadFailed {
            path: input.to_path_buf(),
            source,
        },
    })
}

/// Converts VR180 files to side-by-side JPEGs.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConverterOptions,
}

impl Converter {
    pub fn new(options: ConverterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConverterOptions {
        &self.options
    }

    /// Output path used when the caller gives none.
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        derive_output_path(input, &self.options.suffix, &self.options.default_extension)
    }

    /// Convert `input`, writing to `output` or the derived path. An existing file is overwritten.
    pub fn convert(&self, input: &Path, output: Option<&Path>) -> Result<ConversionReport> {
        let data = read_input(input)?;
        log::debug!("read {} bytes from {}", data.len(), input.display());
        let rendered = render_side_by_side(&data, &self.options)?;

        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.output_path_for(input));
        let encoded = encode_jpeg(&rendered.composite.image, self.options.quality)?;
        fs::write(&output, &encoded)
            .map_err(|e| ConvertError::SaveFailed(format!("{}: {e}", output.display())))?;
        log::debug!("wrote {} bytes to {}", encoded.len(), output.display());

        Ok(ConversionReport {
            input: input.to_path_buf(),
            output,
            left: rendered.left,
            right: rendered.right,
            composite: rendered.composite.dimensions(),
            left_offset: rendered.composite.left_offset,
            right_offset: rendered.composite.right_offset,
            source: rendered.source,
            strategy: rendered.strategy,
            payload_len: rendered.payload_len,
            output_bytes: encoded.len(),
        })
    }

    /// Convert each path to its derived output path. Failures are collected per item.
    #[cfg(not(feature = "parallel"))]
    pub fn convert_batch<P: AsRef<Path>>(&self, inputs: &[P]) -> Vec<BatchItem> {
        inputs.iter().map(|p| self.batch_item(p.as_ref())).collect()
    }

    /// Convert each path to its derived output path in parallel. Failures are collected per item.
    #[cfg(feature = "parallel")]
    pub fn convert_batch<P: AsRef<Path> + Sync>(&self, inputs: &[P]) -> Vec<BatchItem> {
        use rayon::prelude::*;
        inputs.par_iter().map(|p| self.batch_item(p.as_ref())).collect()
    }

    fn batch_item(&self, input: &Path) -> BatchItem {
        BatchItem {
            input: input.to_path_buf(),
            result: self.convert(input, None),
        }
    }
}
