//! Character encoding handling for byte input
//!
//! Values arriving over the C ABI are raw bytes. The charset is taken from an
//! optional Content-Type value and defaults to UTF-8; the bytes are then
//! transcoded to UTF-8 before the fragment is loaded. Bytes that are not
//! valid in the chosen charset are an error rather than being replaced, so a
//! value is never checked in a form different from the one it was sent in.
//!
//! # Examples
//!
//! ```rust
//! use safe_html_validator::charset::{decode_input, extract_charset_from_content_type};
//!
//! assert_eq!(
//!     extract_charset_from_content_type("text/html; charset=ISO-8859-1"),
//!     Some("ISO-8859-1".to_string())
//! );
//!
//! let text = decode_input(b"Caf\xE9", Some("text/plain; charset=ISO-8859-1")).unwrap();
//! assert_eq!(text, "Café");
//! ```

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

use crate::error::ValidationError;

/// Default charset when the Content-Type does not name one
const DEFAULT_CHARSET: &str = "UTF-8";

/// Extract charset from a Content-Type value
///
/// # Supported Formats
///
/// - `text/html; charset=UTF-8`
/// - `text/html; charset="UTF-8"`
/// - `text/html;charset=UTF-8` (no space)
/// - `text/html; charset=UTF-8; boundary=...` (multiple parameters)
///
/// # Examples
///
/// ```rust
/// use safe_html_validator::charset::extract_charset_from_content_type;
///
/// assert_eq!(
///     extract_charset_from_content_type("text/html; charset=\"ISO-8859-1\""),
///     Some("ISO-8859-1".to_string())
/// );
/// assert_eq!(extract_charset_from_content_type("text/html"), None);
/// ```
pub fn extract_charset_from_content_type(content_type: &str) -> Option<String> {
    static CHARSET_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let regex =
        CHARSET_REGEX.get_or_init(|| Regex::new(r#"(?i)charset\s*=\s*"?([^";,\s]+)"?"#).ok());
    let regex = regex.as_ref()?;

    regex
        .captures(content_type)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Charset to decode with: the Content-Type's, uppercased, or UTF-8
pub fn detect_charset(content_type: Option<&str>) -> String {
    content_type
        .and_then(extract_charset_from_content_type)
        .map(|charset| charset.to_uppercase())
        .unwrap_or_else(|| DEFAULT_CHARSET.to_string())
}

/// Decode `bytes` to UTF-8 using the charset named by `content_type`
///
/// # Errors
///
/// - `ValidationError::EncodingError` if the charset is unknown to
///   `encoding_rs` or the bytes are malformed for it
pub fn decode_input<'a>(
    bytes: &'a [u8],
    content_type: Option<&str>,
) -> Result<Cow<'a, str>, ValidationError> {
    let charset = detect_charset(content_type);

    if charset.eq_ignore_ascii_case(DEFAULT_CHARSET) {
        return std::str::from_utf8(bytes).map(Cow::Borrowed).map_err(|e| {
            ValidationError::EncodingError(format!(
                "Invalid UTF-8 at byte position {}: {}",
                e.valid_up_to(),
                e
            ))
        });
    }

    let encoding = encoding_rs::Encoding::for_label(charset.as_bytes()).ok_or_else(|| {
        ValidationError::EncodingError(format!("Unsupported charset '{}'", charset))
    })?;

    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or_else(|| {
            ValidationError::EncodingError(format!(
                "Invalid byte sequence for charset '{}'",
                charset
            ))
        })
}
