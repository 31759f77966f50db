use std::fmt::Write;

/// Uppercase hex of each UTF-16 code unit, concatenated without padding.
///
/// `"A\t"` renders as `"419"`; characters outside the BMP render as their
/// surrogate pair.
#[must_use]
pub fn to_hex(value: &str) -> String {
    let mut out = String::with_capacity(value.len() * 2);
    for unit in value.encode_utf16() {
        let _ = write!(out, "{unit:X}");
    }
    out
}
