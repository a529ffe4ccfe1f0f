//! Safe HTML Validator - Rust FFI Library
//!
//! This library decides whether a user-supplied string contains only the HTML
//! markup permitted by a configurable safelist. It never sanitizes; a value is
//! either accepted as written or rejected.
//!
//! # Architecture
//!
//! The library is structured into several modules:
//! - `safelist`: preset safelists and the tag, attribute and protocol rules
//! - `config`: declarative validator configuration (JSON via serde)
//! - `parser`: lenient, context-free markup parsing on the html5ever tokenizer
//! - `fragment`: the body-fragment document a value is loaded into
//! - `checker`: the conformance walk over a fragment
//! - `uri`: URI scheme extraction for protocol checks
//! - `charset`: decoding of raw input bytes
//! - `validator`: the `SafeHtmlValidator` facade
//! - `ffi`: C-compatible FFI interface
//!
//! # Safety
//!
//! All FFI functions are marked `unsafe` and include safety documentation.
//! Memory allocated by Rust must be freed by Rust via the provided cleanup
//! functions.

// Module declarations
pub mod charset;
pub mod checker;
pub mod config;
pub mod error;
pub mod ffi;
pub mod fragment;
pub mod parser;
pub mod safelist;
pub mod uri;
pub mod validator;

// Re-export main types for convenience
pub use checker::is_conformant;
pub use config::SafeHtmlConfig;
pub use error::ValidationError;
pub use ffi::{SafeHtmlResult, SafeHtmlValidatorHandle};
pub use fragment::{FragmentDocument, load_fragment};
pub use safelist::{AttributeSpec, Preset, Safelist, TagSpec};
pub use validator::SafeHtmlValidator;
