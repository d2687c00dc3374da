//! Binary codec: base64url and buffer concatenation.
//!
//! Decoding follows what browsers' `atob` accepts: ASCII whitespace
//! anywhere is dropped, `-`/`_` are mapped back to `+`/`/`, missing `=`
//! padding is restored, and non-zero trailing bits in the last symbol are
//! ignored. Encoding always emits the URL-safe alphabet without padding.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::error::{Result, VaultError};

/// Standard alphabet, padding optional, trailing bits tolerated.
pub(crate) const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a base64url (or standard base64) string.
pub fn decode_base64_url(s: &str) -> Result<Vec<u8>> {
    let mut normalized: String = s
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    while normalized.len() % 4 != 0 {
        normalized.push('=');
    }
    LENIENT
        .decode(normalized.as_bytes())
        .map_err(|e| VaultError::format("base64url", e))
}

/// Encode bytes as unpadded base64url.
pub fn encode_base64_url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// `a ‖ b` in a fresh buffer.
pub fn concat(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decodes_url_alphabet_without_padding() {
        // 0xfb 0xff encodes to "+/8=" in the standard alphabet
        assert_eq!(decode_base64_url("-_8").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode_base64_url("-_8=").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode_base64_url("+/8").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn empty_string_decodes_to_empty() {
        assert!(decode_base64_url("").unwrap().is_empty());
    }

    #[test]
    fn malformed_input_is_format_error() {
        for bad in ["a", "ab$d", "a===", "ab\u{a0}cd"] {
            let err = decode_base64_url(bad).unwrap_err();
            assert!(matches!(err, VaultError::Format { what: "base64url", .. }), "{bad}");
        }
    }

    #[test]
    fn ascii_whitespace_is_ignored() {
        assert_eq!(decode_base64_url("QUJD\nREVG").unwrap(), b"ABCDEF");
        assert_eq!(decode_base64_url(" QU\tJD\r\n").unwrap(), b"ABC");
    }

    #[test]
    fn trailing_bits_in_last_symbol_are_ignored() {
        assert_eq!(decode_base64_url("QR").unwrap(), b"A");
        assert_eq!(decode_base64_url("QR==").unwrap(), b"A");
    }

    #[test]
    fn concat_places_b_after_a() {
        let a = [1u8, 2, 3];
        let b = [9u8, 8];
        let out = concat(&a, &b);
        assert_eq!(out, vec![1, 2, 3, 9, 8]);
        assert_eq!(a, [1, 2, 3]);
        assert_eq!(b, [9, 8]);
    }

    proptest! {
        #[test]
        fn encode_then_decode_recovers_bytes(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let text = encode_base64_url(&bytes);
            prop_assert!(!text.contains('=') && !text.contains('+') && !text.contains('/'));
            prop_assert_eq!(decode_base64_url(&text).unwrap(), bytes);
        }

        #[test]
        fn concat_length_and_offsets(
            a in proptest::collection::vec(any::<u8>(), 0..64),
            b in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let out = concat(&a, &b);
            prop_assert_eq!(out.len(), a.len() + b.len());
            prop_assert_eq!(&out[..a.len()], &a[..]);
            prop_assert_eq!(&out[a.len()..], &b[..]);
        }
    }
}
