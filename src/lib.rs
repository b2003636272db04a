//! # vr180-sbs
//!
//! Turn VR180 photos into side-by-side stereo JPEGs.
//!
//! A VR180 JPEG stores the left-eye view as its primary image and the right-eye
//! view as a base64 JPEG inside XMP metadata (`GImage:Data`), usually in the
//! multi-segment *extended XMP* block. This crate:
//!
//! - scans APP1 segments permissively (marker-like bytes in entropy data are tolerated),
//! - reassembles extended XMP chunks by their declared offset, whatever order they appear in,
//! - locates the payload with an ordered list of tolerant text matchers (no XML parser),
//! - decodes both views and places them side by side, each vertically centred.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use vr180_sbs::{Converter, ConverterOptions};
//!
//! let converter = Converter::new(ConverterOptions::default());
//! let report = converter.convert(Path::new("PXL_0001.vr.jpg"), None)?;
//! println!("{} -> {} ({})", report.input.display(), report.output.display(), report.composite);
//! # Ok::<(), vr180_sbs::ConvertError>(())
//! ```
//!
//! ## Memory
//!
//! The whole input, the decoded payload and both decoded views are held in memory
//! for the duration of one conversion. Conversions share no state, so distinct
//! inputs can be converted concurrently; enable the `parallel` feature for
//! [`Converter::convert_batch`] on a rayon pool.

pub mod composite;
mod convert;
mod error;
pub mod jpeg;
mod result;
pub mod stereo;

use std::path::Path;

pub use composite::{compose_side_by_side, encode_jpeg, layout, Layout, SideBySide, SurfaceFormat};
pub use convert::{
    derive_output_path, extract_payload, render_side_by_side, Converter, ConverterOptions,
    ExtractedPayload, Rendered, DEFAULT_OUTPUT_EXTENSION, DEFAULT_OUTPUT_SUFFIX,
};
pub use error::{ConvertError, Result};
pub use jpeg::{is_jpeg, XmpSource};
pub use result::{BatchItem, ConversionReport, Dimensions, Placement, XmpInspection};
pub use stereo::{LocatorConfig, Strategy};

use jpeg::{app1_segments, collect_extended_chunks, find_standard_xmp, reassemble_extended};

/// Convert `input` with default options, writing to `output` or `<stem>-converted.<ext>`.
pub fn convert_to_side_by_side(input: &Path, output: Option<&Path>) -> Result<ConversionReport> {
    Converter::default().convert(input, output)
}

/// Convert many files with default options, each to its derived output path.
pub fn convert_batch<P: AsRef<Path> + Sync>(inputs: &[P]) -> Vec<BatchItem> {
    Converter::default().convert_batch(inputs)
}

/// Describe the XMP structure of `data` and where the payload is, without decoding images.
pub fn inspect(data: &[u8], config: &LocatorConfig) -> XmpInspection {
    let mut out = XmpInspection {
        is_jpeg: is_jpeg(data),
        app1_segments: app1_segments(data).count(),
        ..XmpInspection::default()
    };

    out.standard_xmp_len = find_standard_xmp(data).map(|s| s.len());

    let mut chunks = collect_extended_chunks(data);
    out.extended_chunks = chunks.len();
    if let Some(first) = chunks.first() {
        out.extended_declared_len = Some(first.full_length);
        if chunks.iter().any(|c| c.guid != first.guid) {
            out.warnings
                .push("Extended XMP chunks carry more than one GUID".to_string());
        }
    }
    chunks.sort_by_key(|c| c.offset);
    let mut expected = 0u64;
    for c in &chunks {
        let offset = u64::from(c.offset);
        if offset != expected {
            out.warnings.push(format!(
                "Extended XMP chunk at offset {} (expected {}): {}",
                c.offset,
                expected,
                if offset > expected { "gap" } else { "overlap" }
            ));
        }
        expected = offset + c.data.len() as u64;
    }

    out.extended_xmp_len = reassemble_extended(chunks).map(|bytes| bytes.len());
    if let (Some(declared), Some(len)) = (out.extended_declared_len, out.extended_xmp_len) {
        if u64::from(declared) != len as u64 {
            out.warnings.push(format!(
                "Extended XMP reassembled to {} bytes but declares {}",
                len, declared
            ));
        }
    }

    // Same search as the conversion.
    if let Ok(found) = extract_payload(data, config) {
        out.payload_source = Some(found.source);
        out.payload_strategy = Some(found.strategy);
        out.payload_len = Some(found.base64.len());
    }
    out
}
