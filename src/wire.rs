//! Arithmetic BER size helpers.
//!
//! The planner needs to know how large a request would encode to without
//! carrying a codec. These follow X.690: definite-length encoding, two's
//! complement integers, minimal-length unsigned content.

/// Number of bytes the length field itself occupies (X.690 Section 8.1.3).
pub(crate) fn length_encoded_len(len: usize) -> usize {
    match len {
        0..=127 => 1,
        128..=0xFF => 2,
        0x100..=0xFFFF => 3,
        0x1_0000..=0xFF_FFFF => 4,
        _ => 5,
    }
}

/// Content length of a signed INTEGER in two's complement.
pub(crate) fn integer_content_len(value: i32) -> usize {
    let mut len = 4;
    let bytes = value.to_be_bytes();
    // Strip redundant leading bytes: 0x00 before a clear sign bit,
    // 0xFF before a set sign bit
    for i in 0..3 {
        let redundant = (bytes[i] == 0x00 && bytes[i + 1] & 0x80 == 0)
            || (bytes[i] == 0xFF && bytes[i + 1] & 0x80 != 0);
        if redundant {
            len -= 1;
        } else {
            break;
        }
    }
    len
}

/// Content length of an unsigned 32-bit value encoded as INTEGER.
///
/// A leading zero byte is required when the high bit of the first
/// significant byte is set.
pub(crate) fn unsigned32_content_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x7FFF => 2,
        0x8000..=0x7F_FFFF => 3,
        0x80_0000..=0x7FFF_FFFF => 4,
        _ => 5,
    }
}

/// Content length of an unsigned 64-bit value encoded as INTEGER.
pub(crate) fn unsigned64_content_len(value: u64) -> usize {
    let significant = (64 - value.leading_zeros()).max(1) as usize;
    // One extra byte when the top bit of the leading byte would be set
    significant / 8 + 1
}

/// Total encoded size of a tag-length-value triple given its content length.
pub(crate) fn tlv_len(content_len: usize) -> usize {
    1 + length_encoded_len(content_len) + content_len
}
