use encoding_rs::Encoding;
use std::borrow::Cow;
use std::path::Path;

use rsqa_utils::error::FixtureError;

pub(crate) const DEFAULT_CHARSET: &str = "UTF-8";

/// Resolve a charset label such as `UTF-8`, `ISO-8859-1` or `windows-1252`.
pub(crate) fn resolve(label: &str) -> Result<&'static Encoding, FixtureError> {
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| FixtureError::UnknownEncoding {
        label: label.to_string(),
    })
}

/// Decode `bytes` without BOM sniffing. Malformed sequences become U+FFFD.
pub(crate) fn decode<'a>(encoding: &'static Encoding, bytes: &'a [u8], path: &Path) -> Cow<'a, str> {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        tracing::warn!(
            path = %path.display(),
            charset = encoding.name(),
            "Malformed input replaced while decoding"
        );
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_common_labels() {
        assert_eq!(resolve("UTF-8").unwrap(), encoding_rs::UTF_8);
        assert_eq!(resolve("utf8").unwrap(), encoding_rs::UTF_8);
        // ISO-8859-1 maps to windows-1252 per the WHATWG encoding standard
        assert_eq!(resolve("ISO-8859-1").unwrap(), encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn test_resolve_unknown_label() {
        let err = resolve("EBCDIC-nope").unwrap_err();
        assert!(matches!(err, FixtureError::UnknownEncoding { ref label } if label == "EBCDIC-nope"));
    }

    #[test]
    fn test_decode_latin1_and_lossy_utf8() {
        let path = Path::new("fixture.csv");
        let latin = resolve("ISO-8859-1").unwrap();
        assert_eq!(decode(latin, b"caf\xe9", path), "café");
        assert_eq!(decode(encoding_rs::UTF_8, b"a\xffb", path), "a\u{FFFD}b");
    }

    #[test]
    fn test_decode_keeps_bom() {
        let text = decode(encoding_rs::UTF_8, b"\xEF\xBB\xBFid", Path::new("x"));
        assert_eq!(text, "\u{FEFF}id");
    }
}
