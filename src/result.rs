//! Report types: conversion outcome and XMP inspection.

use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::error::ConvertError;
use crate::jpeg::XmpSource;
use crate::stereo::Strategy;

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Top-left corner of a source image inside the composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Placement {
    pub x: u32,
    pub y: u32,
}

/// Result of a successful file conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ConversionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Primary (left-eye) image.
    pub left: Dimensions,
    /// Embedded (right-eye) image.
    pub right: Dimensions,
    pub composite: Dimensions,
    pub left_offset: Placement,
    pub right_offset: Placement,
    /// XMP text the payload was found in.
    pub source: XmpSource,
    /// Matcher that located the payload.
    pub strategy: Strategy,
    /// Base64 characters in the payload (whitespace removed).
    pub payload_len: usize,
    /// Size of the written JPEG.
    pub output_bytes: usize,
}

/// What the container holds, gathered without decoding any image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct XmpInspection {
    pub is_jpeg: bool,
    pub app1_segments: usize,
    /// Length in bytes of the standard XMP text.
    pub standard_xmp_len: Option<usize>,
    pub extended_chunks: usize,
    /// Length in bytes of the reassembled extended XMP.
    pub extended_xmp_len: Option<usize>,
    /// Full length declared by the first extended chunk.
    pub extended_declared_len: Option<u32>,
    pub payload_source: Option<XmpSource>,
    pub payload_strategy: Option<Strategy>,
    pub payload_len: Option<usize>,
    /// Structural oddities (mixed GUIDs, length mismatch, offset gaps).
    pub warnings: Vec<String>,
}

impl XmpInspection {
    /// `true` when a payload was located.
    pub fn has_payload(&self) -> bool {
        self.payload_len.is_some()
    }
}

/// Result of converting one item in a batch.
#[derive(Debug)]
pub struct BatchItem {
    pub input: PathBuf,
    pub result: Result<ConversionReport, ConvertError>,
}
