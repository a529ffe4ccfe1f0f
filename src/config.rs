//! Declarative validator configuration
//!
//! A [`SafeHtmlConfig`] names a baseline [`Preset`] and the extensions layered
//! on top of it. It can be built in code or read from JSON:
//!
//! ```rust
//! use safe_html_validator::config::SafeHtmlConfig;
//! use safe_html_validator::safelist::Preset;
//!
//! let config = SafeHtmlConfig::from_json(r#"{
//!     "preset": "basic",
//!     "base_uri": "https://example.com/",
//!     "additional_tags": ["mark"],
//!     "additional_tags_with_attributes": [
//!         { "name": "custom", "attributes": ["data-x"] },
//!         {
//!             "name": "video",
//!             "attributes_with_protocols": [{ "name": "src", "protocols": ["https"] }]
//!         }
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(config.preset, Preset::Basic);
//! let safelist = config.safelist();
//! assert!(safelist.is_safe_tag("mark"));
//! assert!(!safelist.is_safe_attribute("video", "src", "http://example.com/v.mp4"));
//! ```
//!
//! Omitted fields take the documented defaults: the
//! `RELAXED` preset, an empty base URI and no extensions.

use serde::Deserialize;

use crate::error::ValidationError;
use crate::safelist::{Preset, Safelist, TagSpec};

/// Preset plus additive tag, attribute and protocol extensions
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SafeHtmlConfig {
    /// Baseline safelist
    pub preset: Preset,
    /// Base URI recorded on loaded fragments
    pub base_uri: String,
    /// Tags allowed without attributes
    pub additional_tags: Vec<String>,
    /// Tags allowed together with their attributes
    pub additional_tags_with_attributes: Vec<TagSpec>,
}

impl SafeHtmlConfig {
    /// Configuration with the given preset and no extensions
    pub fn new(preset: Preset) -> Self {
        Self {
            preset,
            ..Self::default()
        }
    }

    /// Read a configuration from JSON
    ///
    /// # Errors
    ///
    /// - `ValidationError::UnknownPreset` if `preset` names no known preset
    /// - `ValidationError::InvalidConfig` for malformed JSON or unknown fields
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let value: serde_json::Value = serde_json::from_str(json).map_err(invalid_config)?;
        if let Some(name) = value.get("preset").and_then(serde_json::Value::as_str) {
            name.parse::<Preset>()?;
        }
        serde_json::from_value(value).map_err(invalid_config)
    }

    /// Set the base URI
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = base_uri.into();
        self
    }

    /// Allow extra tags without attributes
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.additional_tags
            .extend(tags.into_iter().map(Into::into));
        self
    }

    /// Allow an extra tag with its attributes
    pub fn with_tag_spec(mut self, spec: TagSpec) -> Self {
        self.additional_tags_with_attributes.push(spec);
        self
    }

    /// Build the safelist this configuration describes
    pub fn safelist(&self) -> Safelist {
        Safelist::build(
            self.preset,
            &self.additional_tags,
            &self.additional_tags_with_attributes,
        )
    }
}

fn invalid_config(error: serde_json::Error) -> ValidationError {
    ValidationError::InvalidConfig(error.to_string())
}
