//! Standard and extended XMP extraction from APP1 segments.
//! Extended XMP (XMP spec part 3, §1.1.3.1) splits one packet across several
//! segments tagged with a GUID and a byte offset; chunks are reassembled by offset.

use std::borrow::Cow;

use crate::jpeg::segments::{app1_segments, Segment};

/// Namespace marker opening a standard XMP APP1 segment (followed by NUL).
pub const XMP_STANDARD_SIGNATURE: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
/// Namespace marker opening an extended XMP APP1 segment (followed by NUL).
pub const XMP_EXTENDED_SIGNATURE: &[u8] = b"http://ns.adobe.com/xmp/extension/\0";

/// GUID is 32 ASCII hex digits (MD5 of the extended packet).
pub const EXTENDED_GUID_LEN: usize = 32;
/// GUID + full length (u32 BE) + chunk offset (u32 BE).
pub const EXTENDED_HEADER_LEN: usize = EXTENDED_GUID_LEN + 4 + 4;

/// Which XMP text yielded the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum XmpSource {
    Standard,
    Extended,
    /// Standard followed by extended.
    Combined,
}

/// One fragment of an extended XMP packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedChunk {
    /// Byte offset of `data` within the reassembled packet.
    pub offset: u32,
    pub data: Vec<u8>,
    /// Not used for reassembly.
    pub guid: [u8; EXTENDED_GUID_LEN],
    /// Declared size of the whole packet. Not used for reassembly.
    pub full_length: u32,
}

/// Standard and extended text found in one container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmpDocuments {
    pub standard: Option<String>,
    pub extended: Option<String>,
}

impl XmpDocuments {
    /// `true` when neither packet was found.
    pub fn is_empty(&self) -> bool {
        self.standard.is_none() && self.extended.is_none()
    }

    /// Candidate texts in search order: standard, extended, standard followed by extended.
    /// Absent packets are skipped; the combined text needs both and is only
    /// built once the iterator reaches it.
    pub fn candidates(&self) -> impl Iterator<Item = (XmpSource, Cow<'_, str>)> + '_ {
        let standard = self
            .standard
            .as_deref()
            .map(|s| (XmpSource::Standard, Cow::Borrowed(s)));
        let extended = self
            .extended
            .as_deref()
            .map(|e| (XmpSource::Extended, Cow::Borrowed(e)));
        let combined = std::iter::once(()).filter_map(move |()| {
            let (s, e) = (self.standard.as_deref()?, self.extended.as_deref()?);
            let mut text = String::with_capacity(s.len() + e.len());
            text.push_str(s);
            text.push_str(e);
            Some((XmpSource::Combined, Cow::Owned(text)))
        });
        standard.into_iter().chain(extended).chain(combined)
    }
}

#[inline]
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Bytes after the standard XMP signature, if this segment carries it.
pub fn standard_xmp_bytes<'a>(seg: &Segment<'a>) -> Option<&'a [u8]> {
    let pos = find(seg.payload, XMP_STANDARD_SIGNATURE)?;
    Some(&seg.payload[pos + XMP_STANDARD_SIGNATURE.len()..])
}

/// Parse one extended XMP chunk from a segment. Returns None if the segment
/// has no extension signature or is too short for the chunk header.
pub fn parse_extended_chunk(seg: &Segment<'_>) -> Option<ExtendedChunk> {
    let pos = find(seg.payload, XMP_EXTENDED_SIGNATURE)?;
    let body = &seg.payload[pos + XMP_EXTENDED_SIGNATURE.len()..];
    if body.len() < EXTENDED_HEADER_LEN {
        return None;
    }
    let mut guid = [0u8; EXTENDED_GUID_LEN];
    guid.copy_from_slice(&body[..EXTENDED_GUID_LEN]);
    let full_length = u32::from_be_bytes([body[32], body[33], body[34], body[35]]);
    let offset = u32::from_be_bytes([body[36], body[37], body[38], body[39]]);
    Some(ExtendedChunk {
        offset,
        data: body[EXTENDED_HEADER_LEN..].to_vec(),
        guid,
        full_length,
    })
}

/// First standard XMP packet in `data` (first match wins).
pub fn find_standard_xmp(data: &[u8]) -> Option<String> {
    app1_segments(data)
        .find_map(|seg| standard_xmp_bytes(&seg))
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
}

/// Every extended XMP chunk in `data`, in discovery order.
pub fn collect_extended_chunks(data: &[u8]) -> Vec<ExtendedChunk> {
    app1_segments(data)
        .filter_map(|seg| parse_extended_chunk(&seg))
        .collect()
}

/// Sort chunks by declared offset and concatenate their data.
/// Chunks sharing an offset keep discovery order.
pub fn reassemble_extended(mut chunks: Vec<ExtendedChunk>) -> Option<Vec<u8>> {
    if chunks.is_empty() {
        return None;
    }
    chunks.sort_by_key(|c| c.offset);
    let total = chunks.iter().map(|c| c.data.len()).sum();
    let mut out = Vec::with_capacity(total);
    for chunk in &chunks {
        out.extend_from_slice(&chunk.data);
    }
    Some(out)
}

/// Reassembled extended XMP text, or None when no chunk is present.
pub fn find_extended_xmp(data: &[u8]) -> Option<String> {
    reassemble_extended(collect_extended_chunks(data))
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

/// Both XMP packets of a JPEG byte stream.
pub fn extract_xmp(data: &[u8]) -> XmpDocuments {
    let standard = find_standard_xmp(data);
    let extended = find_extended_xmp(data);
    log::trace!(
        "xmp: standard={:?} bytes, extended={:?} bytes",
        standard.as_ref().map(String::len),
        extended.as_ref().map(String::len)
    );
    XmpDocuments { standard, extended }
}
