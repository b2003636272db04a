//! Right-eye payload: locating it in XMP text and turning it into image bytes.

mod locator;
mod payload;

pub use locator::{
    locate_payload, LocatedPayload, LocatorConfig, Strategy, DEFAULT_MIN_PAYLOAD_LEN,
    DEFAULT_PAYLOAD_KEY, DEFAULT_VENDOR_NAMESPACE, DEFAULT_VENDOR_TOKEN,
};
pub use payload::{accept_candidate, decode_payload};
