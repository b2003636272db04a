//! Permissive APP1 segment scanner.
//! Walks the byte stream looking for `FF E1` rather than following the marker table,
//! so marker-like pairs inside unrelated data are tolerated. Read-only over the input.

/// JPEG SOI (Start of Image) marker.
pub const SOI_MARKER: [u8; 2] = [0xFF, 0xD8];
/// JPEG APP1 marker (EXIF / XMP carrier).
pub const APP1_MARKER: [u8; 2] = [0xFF, 0xE1];

/// Size of the big-endian length field that follows a marker.
const LENGTH_FIELD_LEN: usize = 2;

/// One application segment borrowed from the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub marker: [u8; 2],
    /// Declared length, including the two length bytes.
    pub length: u16,
    /// Offset of the marker in the input.
    pub offset: usize,
    /// Payload after the length field, clamped to the buffer end.
    pub payload: &'a [u8],
}

/// Check for the SOI marker at the start of `data`.
#[inline]
pub fn is_jpeg(data: &[u8]) -> bool {
    data.starts_with(&SOI_MARKER)
}

/// Iterator over APP1 segments; see [`app1_segments`].
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        let data = self.data;
        while self.pos + LENGTH_FIELD_LEN <= data.len() {
            let i = self.pos;
            if data[i] != APP1_MARKER[0] || data[i + 1] != APP1_MARKER[1] {
                self.pos += 1;
                continue;
            }
            let length_at = i + 2;
            if length_at + LENGTH_FIELD_LEN > data.len() {
                // Marker with no room for a length field.
                self.pos += 1;
                continue;
            }
            let length = u16::from_be_bytes([data[length_at], data[length_at + 1]]);
            let start = length_at + LENGTH_FIELD_LEN;
            let end = i + 2 + length as usize;
            if end < start {
                // Length below 2: the segment would end before it starts.
                self.pos += 1;
                return Some(Segment {
                    marker: APP1_MARKER,
                    length,
                    offset: i,
                    payload: &data[start..start],
                });
            }
            let end = end.min(data.len());
            self.pos = end;
            return Some(Segment {
                marker: APP1_MARKER,
                length,
                offset: i,
                payload: &data[start..end],
            });
        }
        self.pos = data.len();
        None
    }
}

/// Lazily yield every APP1 segment in `data`.
///
/// For a match the length field is read big-endian and the payload runs to
/// `marker + 2 + length` (clamped), after which scanning resumes at the segment end.
/// Anything else advances one byte.
pub fn app1_segments(data: &[u8]) -> Segments<'_> {
    Segments { data, pos: 0 }
}
