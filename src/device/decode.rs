use std::borrow::Cow;
use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::config::types::ValueEncoding;
use crate::error::DecodeError;

// Accepts base64 with or without trailing padding.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Turns a raw characteristic value into text.
///
/// An empty value has nothing to show and yields `None`. Invalid UTF-8 sequences are
/// replaced with U+FFFD instead of failing the read.
pub fn decode_value(value: &[u8], encoding: ValueEncoding) -> Result<Option<String>, DecodeError> {
    if value.is_empty() {
        return Ok(None);
    }

    let bytes = match encoding {
        ValueEncoding::Utf8 => Cow::Borrowed(value),
        ValueEncoding::Base64 => Cow::Owned(LENIENT_BASE64.decode(value.trim_ascii())?),
    };

    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}
