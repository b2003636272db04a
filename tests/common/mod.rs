//! Fixture builders: synthetic JPEGs with standard / extended XMP segments.

#![allow(dead_code)]

use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};

pub const XMP_STANDARD: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
pub const XMP_EXTENDED: &[u8] = b"http://ns.adobe.com/xmp/extension/\0";
pub const GUID: &[u8; 32] = b"0123456789ABCDEF0123456789ABCDEF";

/// Deterministic noise so the encoded JPEG is comfortably above the payload length floor.
pub fn noisy_rgb(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut state = seed;
    RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as u8
        };
        Rgb([next(), next(), next()])
    })
}

pub fn jpeg_bytes(img: &DynamicImage) -> Vec<u8> {
    let mut out = Vec::new();
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut out, 90))
        .unwrap();
    out
}

pub fn noisy_jpeg(width: u32, height: u32, seed: u64) -> Vec<u8> {
    jpeg_bytes(&DynamicImage::ImageRgb8(noisy_rgb(width, height, seed)))
}

pub fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// APP1 segment: marker, big-endian length (payload + 2), payload.
pub fn app1(payload: &[u8]) -> Vec<u8> {
    assert!(payload.len() + 2 <= u16::MAX as usize, "APP1 payload too large");
    let mut seg = vec![0xFF, 0xE1];
    seg.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    seg.extend_from_slice(payload);
    seg
}

pub fn standard_xmp_segment(xmp: &str) -> Vec<u8> {
    let mut payload = XMP_STANDARD.to_vec();
    payload.extend_from_slice(xmp.as_bytes());
    app1(&payload)
}

pub fn extended_chunk_segment(full_len: u32, offset: u32, data: &[u8]) -> Vec<u8> {
    let mut payload = XMP_EXTENDED.to_vec();
    payload.extend_from_slice(GUID);
    payload.extend_from_slice(&full_len.to_be_bytes());
    payload.extend_from_slice(&offset.to_be_bytes());
    payload.extend_from_slice(data);
    app1(&payload)
}

/// Split `xmp` into extended chunks of at most `chunk_len` bytes, in offset order.
pub fn extended_xmp_segments(xmp: &str, chunk_len: usize) -> Vec<Vec<u8>> {
    let bytes = xmp.as_bytes();
    bytes
        .chunks(chunk_len)
        .enumerate()
        .map(|(i, c)| extended_chunk_segment(bytes.len() as u32, (i * chunk_len) as u32, c))
        .collect()
}

/// Insert `segments` right after the SOI marker of `jpeg`.
pub fn with_segments(jpeg: &[u8], segments: &[Vec<u8>]) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    let mut out = jpeg[..2].to_vec();
    for s in segments {
        out.extend_from_slice(s);
    }
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// XMP packet carrying `payload` as a `GImage:Data` attribute.
pub fn gimage_attribute_xmp(payload: &str) -> String {
    format!(
        concat!(
            "<x:xmpmeta xmlns:x=\"adobe:ns:meta/\">",
            "<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\">",
            "<rdf:Description rdf:about=\"\" ",
            "xmlns:GImage=\"http://ns.google.com/photos/1.0/image/\" ",
            "GImage:Mime=\"image/jpeg\" GImage:Data=\"{}\"/>",
            "</rdf:RDF></x:xmpmeta>"
        ),
        payload
    )
}

/// Standard XMP that only points at the extended packet.
pub fn pointer_xmp() -> String {
    format!(
        concat!(
            "<x:xmpmeta xmlns:x=\"adobe:ns:meta/\"><rdf:RDF>",
            "<rdf:Description xmlns:xmpNote=\"http://ns.adobe.com/xmp/note/\" ",
            "xmpNote:HasExtendedXMP=\"{}\"/></rdf:RDF></x:xmpmeta>"
        ),
        std::str::from_utf8(GUID).unwrap()
    )
}

/// A VR180-style JPEG: `left` as the primary image, `right` embedded in standard XMP.
pub fn vr180_standard(left: &[u8], right: &[u8]) -> Vec<u8> {
    with_segments(left, &[standard_xmp_segment(&gimage_attribute_xmp(&b64(right)))])
}

/// A VR180-style JPEG with `right` in extended XMP, chunks written in reverse order.
pub fn vr180_extended_reversed(left: &[u8], right: &[u8], chunk_len: usize) -> Vec<u8> {
    let mut segments = vec![standard_xmp_segment(&pointer_xmp())];
    let mut chunks = extended_xmp_segments(&gimage_attribute_xmp(&b64(right)), chunk_len);
    chunks.reverse();
    segments.extend(chunks);
    with_segments(left, &segments)
}
