//! Validator facade: configuration in, verdict out
//!
//! [`SafeHtmlValidator`] owns a [`Safelist`] built once from a
//! [`SafeHtmlConfig`] and answers whether individual values are safe to
//! accept. It holds no per-call state, so one instance can serve any number of
//! threads at once.
//!
//! # Examples
//!
//! ```rust
//! use safe_html_validator::{Preset, SafeHtmlConfig, SafeHtmlValidator, TagSpec};
//!
//! let validator = SafeHtmlValidator::new(
//!     &SafeHtmlConfig::new(Preset::Basic)
//!         .with_tag_spec(TagSpec::new("custom").with_attributes(["data-x"])),
//! );
//!
//! assert!(validator.is_valid(Some(r#"<custom data-x="1">ok</custom>"#)));
//! assert!(!validator.is_valid(Some(r#"<custom data-y="1">ok</custom>"#)));
//! assert!(validator.is_valid(None));
//! ```

use crate::charset::decode_input;
use crate::checker::is_conformant;
use crate::config::SafeHtmlConfig;
use crate::error::ValidationError;
use crate::fragment::load_fragment;
use crate::safelist::Safelist;

/// Checks values against one immutable safelist
#[derive(Debug, Clone)]
pub struct SafeHtmlValidator {
    safelist: Safelist,
    base_uri: String,
}

impl SafeHtmlValidator {
    /// Validator for `config`
    pub fn new(config: &SafeHtmlConfig) -> Self {
        Self::with_safelist(config.safelist(), config.base_uri.clone())
    }

    /// Validator for an already built safelist
    pub fn with_safelist(safelist: Safelist, base_uri: impl Into<String>) -> Self {
        Self {
            safelist,
            base_uri: base_uri.into(),
        }
    }

    /// The safelist values are checked against
    pub fn safelist(&self) -> &Safelist {
        &self.safelist
    }

    /// Base URI recorded on loaded fragments
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Whether `value` contains only markup the safelist permits
    ///
    /// An absent value is valid. Any present value, however malformed, is
    /// parsed and checked; there is no error outcome.
    pub fn is_valid(&self, value: Option<&str>) -> bool {
        match value {
            None => true,
            Some(value) => is_conformant(&load_fragment(value, &self.base_uri), &self.safelist),
        }
    }

    /// [`is_valid`](Self::is_valid) for raw bytes in the charset named by
    /// `content_type` (UTF-8 when absent)
    ///
    /// # Errors
    ///
    /// - `ValidationError::EncodingError` if the bytes cannot be decoded; the
    ///   value is never judged in a lossy form
    pub fn is_valid_bytes(
        &self,
        value: Option<&[u8]>,
        content_type: Option<&str>,
    ) -> Result<bool, ValidationError> {
        match value {
            None => Ok(true),
            Some(bytes) => {
                let text = decode_input(bytes, content_type)?;
                Ok(self.is_valid(Some(text.as_ref())))
            }
        }
    }
}

impl From<SafeHtmlConfig> for SafeHtmlValidator {
    fn from(config: SafeHtmlConfig) -> Self {
        Self::new(&config)
    }
}
