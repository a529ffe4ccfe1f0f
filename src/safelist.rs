//! Safelist of permitted tags, attributes and URI protocols
//!
//! A [`Safelist`] starts from one of the named [`Preset`]s and can only grow:
//! tags, attributes, protocols and enforced attribute values are unioned in,
//! never removed. Once handed to a validator it is only ever read, so a
//! single instance can be shared by any number of concurrent checks.
//!
//! All names are compared case-insensitively and stored in ASCII lowercase.
//!
//! # Examples
//!
//! ```
//! use safe_html_validator::safelist::{Preset, Safelist, TagSpec};
//!
//! let safelist = Safelist::build(
//!     Preset::Basic,
//!     &["mark"],
//!     &[TagSpec::new("custom").with_attributes(["data-x"])],
//! );
//!
//! assert!(safelist.is_safe_tag("mark"));
//! assert!(safelist.is_safe_attribute("custom", "data-x", "1"));
//! assert!(!safelist.is_safe_attribute("custom", "data-y", "1"));
//! assert!(!safelist.is_safe_attribute("a", "href", "javascript:alert(1)"));
//! ```

use serde::Deserialize;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::uri;

/// Reserved tag key whose attributes apply to every tag
pub const ALL_TAGS: &str = ":all";

const SIMPLE_TEXT_TAGS: &[&str] = &["b", "em", "i", "strong", "u"];

const BASIC_TAGS: &[&str] = &[
    "a",
    "b",
    "blockquote",
    "br",
    "cite",
    "code",
    "dd",
    "dl",
    "dt",
    "em",
    "i",
    "li",
    "ol",
    "p",
    "pre",
    "q",
    "small",
    "span",
    "strike",
    "strong",
    "sub",
    "sup",
    "u",
    "ul",
];

const BASIC_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href"]),
    ("blockquote", &["cite"]),
    ("q", &["cite"]),
];

const BASIC_PROTOCOLS: &[(&str, &str, &[&str])] = &[
    ("a", "href", &["ftp", "http", "https", "mailto"]),
    ("blockquote", "cite", &["http", "https"]),
    ("cite", "cite", &["http", "https"]),
];

const IMAGE_ATTRIBUTES: &[&str] = &["align", "alt", "height", "src", "title", "width"];

const RELAXED_TAGS: &[&str] = &[
    "a",
    "b",
    "blockquote",
    "br",
    "caption",
    "cite",
    "code",
    "col",
    "colgroup",
    "dd",
    "div",
    "dl",
    "dt",
    "em",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "i",
    "img",
    "li",
    "ol",
    "p",
    "pre",
    "q",
    "small",
    "span",
    "strike",
    "strong",
    "sub",
    "sup",
    "table",
    "tbody",
    "td",
    "tfoot",
    "th",
    "thead",
    "tr",
    "u",
    "ul",
];

const RELAXED_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href", "title"]),
    ("blockquote", &["cite"]),
    ("col", &["span", "width"]),
    ("colgroup", &["span", "width"]),
    ("img", IMAGE_ATTRIBUTES),
    ("ol", &["start", "type"]),
    ("q", &["cite"]),
    ("table", &["summary", "width"]),
    ("td", &["abbr", "axis", "colspan", "rowspan", "width"]),
    ("th", &["abbr", "axis", "colspan", "rowspan", "scope", "width"]),
    ("ul", &["type"]),
];

const RELAXED_PROTOCOLS: &[(&str, &str, &[&str])] = &[
    ("a", "href", &["ftp", "http", "https", "mailto"]),
    ("blockquote", "cite", &["http", "https"]),
    ("cite", "cite", &["http", "https"]),
    ("img", "src", &["http", "https"]),
    ("q", "cite", &["http", "https"]),
];

/// Named baseline safelists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Preset {
    /// No tags at all; only text passes
    None,
    /// Inline emphasis tags, no attributes
    SimpleText,
    /// Common inline and block text tags with restricted link protocols
    Basic,
    /// [`Preset::Basic`] plus `img` with `http`/`https` sources
    BasicWithImages,
    /// Structural, table and inline tags with a wider attribute set
    #[default]
    Relaxed,
}

impl Preset {
    /// Every preset, from most to least restrictive
    pub const ALL: [Preset; 5] = [
        Preset::None,
        Preset::SimpleText,
        Preset::Basic,
        Preset::BasicWithImages,
        Preset::Relaxed,
    ];

    /// Canonical identifier, as accepted by [`Preset::from_str`]
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::None => "NONE",
            Preset::SimpleText => "SIMPLE_TEXT",
            Preset::Basic => "BASIC",
            Preset::BasicWithImages => "BASIC_WITH_IMAGES",
            Preset::Relaxed => "RELAXED",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = ValidationError;

    /// Parse a preset identifier
    ///
    /// Matching ignores ASCII case and treats `-` like `_`, so
    /// `basic-with-images` and `BASIC_WITH_IMAGES` are the same preset.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Preset::ALL
            .into_iter()
            .find(|preset| preset.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownPreset(s.to_string()))
    }
}

impl TryFrom<String> for Preset {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Attribute allowed on a tag, optionally restricted to URI protocols
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeSpec {
    /// Attribute name
    pub name: String,
    /// Allowed URI schemes; empty leaves the value unrestricted
    #[serde(default)]
    pub protocols: Vec<String>,
}

impl AttributeSpec {
    /// Attribute with no protocol restriction
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            protocols: Vec::new(),
        }
    }

    /// Restrict the attribute value to the given URI schemes
    pub fn with_protocols<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protocols.extend(protocols.into_iter().map(Into::into));
        self
    }
}

/// Extra tag to allow, together with its attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagSpec {
    /// Tag name
    pub name: String,
    /// Attributes allowed on the tag with any value
    #[serde(default)]
    pub attributes: Vec<String>,
    /// Attributes allowed on the tag, each with its own protocol list
    #[serde(default)]
    pub attributes_with_protocols: Vec<AttributeSpec>,
}

impl TagSpec {
    /// Tag with no attributes
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Allow the given attributes with any value
    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .extend(attributes.into_iter().map(Into::into));
        self
    }

    /// Allow an attribute whose value must use one of `protocols`
    pub fn with_protocols<I, S>(mut self, attribute: impl Into<String>, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes_with_protocols
            .push(AttributeSpec::new(attribute).with_protocols(protocols));
        self
    }
}

/// Permitted tags, attributes and URI protocols
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Safelist {
    tags: HashSet<String>,
    attributes: HashMap<String, HashSet<String>>,
    enforced_attributes: HashMap<String, HashMap<String, String>>,
    protocols: HashMap<String, HashMap<String, HashSet<String>>>,
}

impl Safelist {
    /// Empty safelist, equivalent to [`Preset::None`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Safelist holding exactly the tables of `preset`
    pub fn from_preset(preset: Preset) -> Self {
        let mut safelist = Self::new();
        match preset {
            Preset::None => {}
            Preset::SimpleText => {
                safelist.add_tags(SIMPLE_TEXT_TAGS);
            }
            Preset::Basic => safelist.add_basic(),
            Preset::BasicWithImages => {
                safelist.add_basic();
                safelist
                    .add_tags(["img"])
                    .add_attributes("img", IMAGE_ATTRIBUTES)
                    .add_protocols("img", "src", ["http", "https"]);
            }
            Preset::Relaxed => {
                safelist.add_tags(RELAXED_TAGS);
                for (tag, attributes) in RELAXED_ATTRIBUTES {
                    safelist.add_attributes(tag, *attributes);
                }
                for (tag, attribute, protocols) in RELAXED_PROTOCOLS {
                    safelist.add_protocols(tag, attribute, *protocols);
                }
            }
        }
        safelist
    }

    /// Build a safelist from a preset plus additive extensions
    ///
    /// `extra_tags` are allowed with no attributes of their own. Each
    /// [`TagSpec`] adds its tag, its plain attributes, and every
    /// attribute-with-protocols entry; a non-empty protocol list is unioned
    /// into the restriction for that (tag, attribute) pair.
    pub fn build<S: AsRef<str>>(preset: Preset, extra_tags: &[S], tag_specs: &[TagSpec]) -> Self {
        let mut safelist = Self::from_preset(preset);
        safelist.add_tags(extra_tags);
        for spec in tag_specs {
            safelist.add_tag_spec(spec);
        }
        safelist
    }

    fn add_basic(&mut self) {
        self.add_tags(BASIC_TAGS);
        for (tag, attributes) in BASIC_ATTRIBUTES {
            self.add_attributes(tag, *attributes);
        }
        for (tag, attribute, protocols) in BASIC_PROTOCOLS {
            self.add_protocols(tag, attribute, *protocols);
        }
        self.add_enforced_attribute("a", "rel", "nofollow");
    }

    /// Union one tag specification into the safelist
    pub fn add_tag_spec(&mut self, spec: &TagSpec) -> &mut Self {
        self.add_tags([spec.name.as_str()]);
        if !spec.attributes.is_empty() {
            self.add_attributes(&spec.name, &spec.attributes);
        }
        for attribute in &spec.attributes_with_protocols {
            self.add_attributes(&spec.name, [attribute.name.as_str()]);
            if !attribute.protocols.is_empty() {
                self.add_protocols(&spec.name, &attribute.name, &attribute.protocols);
            }
        }
        self
    }

    /// Allow tags
    pub fn add_tags<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags
            .extend(tags.into_iter().filter_map(|tag| normalize(tag.as_ref())));
        self
    }

    /// Allow attributes on `tag`; use [`ALL_TAGS`] to allow them everywhere
    ///
    /// The tag itself is not added to the allowed tags.
    pub fn add_attributes<I, S>(&mut self, tag: &str, attributes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(tag) = normalize(tag) else {
            return self;
        };
        let names: Vec<String> = attributes
            .into_iter()
            .filter_map(|attribute| normalize(attribute.as_ref()))
            .collect();
        if !names.is_empty() {
            self.attributes.entry(tag).or_default().extend(names);
        }
        self
    }

    /// Restrict the values of `tag`'s `attribute` to URIs with one of `protocols`
    ///
    /// A trailing `:` on a protocol is ignored, so `https:` and `https` are
    /// the same entry.
    pub fn add_protocols<I, S>(&mut self, tag: &str, attribute: &str, protocols: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (Some(tag), Some(attribute)) = (normalize(tag), normalize(attribute)) else {
            return self;
        };
        let schemes: Vec<String> = protocols
            .into_iter()
            .filter_map(|protocol| normalize(protocol.as_ref().trim().trim_end_matches(':')))
            .collect();
        if !schemes.is_empty() {
            self.protocols
                .entry(tag)
                .or_default()
                .entry(attribute)
                .or_default()
                .extend(schemes);
        }
        self
    }

    /// Accept `attribute="value"` on `tag` even when the attribute is not allowed
    ///
    /// The value must match exactly; any other value of the attribute is
    /// still judged by the ordinary attribute rules.
    pub fn add_enforced_attribute(&mut self, tag: &str, attribute: &str, value: &str) -> &mut Self {
        if let (Some(tag), Some(attribute)) = (normalize(tag), normalize(attribute)) {
            self.enforced_attributes
                .entry(tag)
                .or_default()
                .insert(attribute, value.to_string());
        }
        self
    }

    /// Whether elements named `tag` are allowed
    pub fn is_safe_tag(&self, tag: &str) -> bool {
        self.tags.contains(&*lowercase(tag))
    }

    /// Whether `attribute="value"` is allowed on an element named `tag`
    ///
    /// The tag's own attribute set is consulted first, then its enforced
    /// attributes, then the [`ALL_TAGS`] entries. When the attribute is
    /// allowed and carries a protocol restriction, the value's scheme must
    /// be one of the listed protocols; values without a scheme pass.
    pub fn is_safe_attribute(&self, tag: &str, attribute: &str, value: &str) -> bool {
        let tag = lowercase(tag);
        let attribute = lowercase(attribute);
        self.attribute_allowed_on(&tag, &attribute, value)
            || (tag != ALL_TAGS && self.attribute_allowed_on(ALL_TAGS, &attribute, value))
    }

    fn attribute_allowed_on(&self, tag: &str, attribute: &str, value: &str) -> bool {
        let declared = self
            .attributes
            .get(tag)
            .is_some_and(|names| names.contains(attribute));
        if declared {
            return match self.protocols_for(tag, attribute) {
                Some(protocols) => protocol_permitted(value, protocols),
                None => true,
            };
        }

        self.enforced_attributes
            .get(tag)
            .and_then(|enforced| enforced.get(attribute))
            .is_some_and(|expected| expected == value)
    }

    /// Allowed protocols for `tag`'s `attribute`, if it is restricted
    pub fn protocols_for(&self, tag: &str, attribute: &str) -> Option<&HashSet<String>> {
        self.protocols
            .get(&*lowercase(tag))
            .and_then(|attributes| attributes.get(&*lowercase(attribute)))
    }

    /// Allowed tag names, in no particular order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Whether every tag, attribute, protocol and enforced value of `self`
    /// is also present in `other`
    pub fn is_subset_of(&self, other: &Safelist) -> bool {
        self.tags.is_subset(&other.tags)
            && self.attributes.iter().all(|(tag, names)| {
                other
                    .attributes
                    .get(tag)
                    .is_some_and(|theirs| names.is_subset(theirs))
            })
            && self.enforced_attributes.iter().all(|(tag, enforced)| {
                enforced.iter().all(|(attribute, value)| {
                    other
                        .enforced_attributes
                        .get(tag)
                        .and_then(|theirs| theirs.get(attribute))
                        == Some(value)
                })
            })
            && self.protocols.iter().all(|(tag, attributes)| {
                attributes.iter().all(|(attribute, schemes)| {
                    other
                        .protocols
                        .get(tag)
                        .and_then(|theirs| theirs.get(attribute))
                        .is_some_and(|theirs| schemes.is_subset(theirs))
                })
            })
    }
}

impl From<Preset> for Safelist {
    fn from(preset: Preset) -> Self {
        Safelist::from_preset(preset)
    }
}

fn protocol_permitted(value: &str, protocols: &HashSet<String>) -> bool {
    match uri::scheme(value) {
        Some(scheme) => protocols.contains(&scheme),
        None => true,
    }
}

fn normalize(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_ascii_lowercase())
    }
}

fn lowercase(name: &str) -> Cow<'_, str> {
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(name.to_ascii_lowercase())
    } else {
        Cow::Borrowed(name)
    }
}
