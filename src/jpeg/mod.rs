//! JPEG container scanning: APP1 segments and the XMP packets they carry.

mod segments;
mod xmp;

pub use segments::{app1_segments, is_jpeg, Segment, Segments, APP1_MARKER, SOI_MARKER};
pub use xmp::{
    collect_extended_chunks, extract_xmp, find_extended_xmp, find_standard_xmp,
    parse_extended_chunk, reassemble_extended, standard_xmp_bytes, ExtendedChunk, XmpDocuments,
    XmpSource, EXTENDED_GUID_LEN, EXTENDED_HEADER_LEN, XMP_EXTENDED_SIGNATURE,
    XMP_STANDARD_SIGNATURE,
};
