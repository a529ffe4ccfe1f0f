//! FFI (Foreign Function Interface) layer for C integration
//!
//! This module exposes the validator to C callers through an opaque handle
//! built once from a JSON configuration and reused for every value.
//!
//! # FFI Boundary Contract
//!
//! ## String Representation
//!
//! **All strings use UTF-8 bytes + length representation (NOT NUL-terminated C strings)**
//!
//! - Pointer field: `*const u8` / `*mut u8` (points to bytes)
//! - Length field: `usize` (byte count, no NUL terminator included)
//!
//! A value pointer of NULL with a length of 0 means the value is *absent*,
//! which is valid by definition. A non-NULL pointer with length 0 is an empty
//! value, which is also valid. NULL with a non-zero length is rejected with
//! `ERROR_INVALID_INPUT`.
//!
//! ## Memory Management
//!
//! - Rust allocates the handle and any error message
//! - C must release the handle with `safe_html_validator_free()` and every
//!   populated result with `safe_html_result_free()`
//! - Never call C `free()` on Rust-allocated memory
//!
//! ```rust
//! use safe_html_validator::ffi::*;
//! use std::ptr;
//!
//! let config = br#"{ "preset": "SIMPLE_TEXT" }"#;
//! let mut result = SafeHtmlResult::default();
//! let handle = unsafe { safe_html_validator_new(config.as_ptr(), config.len(), &mut result) };
//! assert!(!handle.is_null());
//!
//! let value = b"<b>hello</b>";
//! unsafe {
//!     safe_html_validate(handle, value.as_ptr(), value.len(), ptr::null(), 0, &mut result)
//! };
//! assert_eq!(result.error_code, ERROR_SUCCESS);
//! assert_eq!(result.valid, 1);
//!
//! unsafe {
//!     safe_html_result_free(&mut result);
//!     safe_html_validator_free(handle);
//! }
//! ```
//!
//! ## Error Handling Contract
//!
//! **Success Case:**
//! - `error_code = 0`, `error_message = NULL`, `error_len = 0`
//! - `valid` is 1 when the value conforms to the safelist, 0 otherwise
//!
//! **Error Case:**
//! - `error_code != 0` (see error code constants below)
//! - `error_message` points to a UTF-8 description of `error_len` bytes
//! - `valid` is 0
//!
//! **Panic Safety:**
//! - Every entry point uses `catch_unwind`; C never sees Rust unwinding
//!
//! ## Thread Safety
//!
//! The handle is immutable after creation. Concurrent `safe_html_validate()`
//! calls on one handle are safe as long as each call uses its own result.

use std::panic;
use std::ptr;
use std::slice;

use crate::config::SafeHtmlConfig;
use crate::error::ValidationError;
use crate::validator::SafeHtmlValidator;

// ============================================================================
// Error Code Constants
// ============================================================================

/// Success - no error occurred
pub const ERROR_SUCCESS: u32 = 0;

/// Configuration JSON malformed or containing unknown fields
pub const ERROR_INVALID_CONFIG: u32 = 1;

/// Character encoding error (invalid bytes, unsupported charset)
pub const ERROR_ENCODING: u32 = 2;

/// Configuration names an unknown safelist preset
pub const ERROR_UNKNOWN_PRESET: u32 = 3;

/// Invalid input data (NULL pointers, invalid parameters)
pub const ERROR_INVALID_INPUT: u32 = 5;

/// Internal error (unexpected condition, panic caught)
pub const ERROR_INTERNAL: u32 = 99;

// ============================================================================
// FFI Data Structures
// ============================================================================

/// Outcome of a validator call
///
/// # C Compatibility
///
/// `#[repr(C)]` layout:
///
/// ```c
/// typedef struct {
///     uint8_t  valid;
///     uint32_t error_code;
///     uint8_t *error_message;
///     size_t   error_len;
/// } safe_html_result_t;
/// ```
///
/// # Memory Ownership
///
/// `error_message` is owned by Rust and released by `safe_html_result_free()`.
#[repr(C)]
#[derive(Debug)]
pub struct SafeHtmlResult {
    /// 1 if the value conforms to the safelist, 0 otherwise or on error
    pub valid: u8,

    /// Error code: 0=success, non-zero=error (see ERROR_* constants)
    pub error_code: u32,

    /// Error message (UTF-8 bytes, NOT NUL-terminated, NULL on success)
    pub error_message: *mut u8,

    /// Length of error message in bytes (0 if error_message is NULL)
    pub error_len: usize,
}

impl Default for SafeHtmlResult {
    fn default() -> Self {
        Self {
            valid: 0,
            error_code: ERROR_SUCCESS,
            error_message: ptr::null_mut(),
            error_len: 0,
        }
    }
}

/// Opaque handle to a configured validator
///
/// # Lifecycle
///
/// 1. Create: `safe_html_validator_new()` returns a handle
/// 2. Use: pass the handle to `safe_html_validate()` for each value
/// 3. Destroy: `safe_html_validator_free()` deallocates the handle
pub struct SafeHtmlValidatorHandle {
    validator: SafeHtmlValidator,
}

fn reset_result(result: &mut SafeHtmlResult) {
    result.valid = 0;
    result.error_code = ERROR_SUCCESS;
    result.error_message = ptr::null_mut();
    result.error_len = 0;
}

fn set_error_result(result: &mut SafeHtmlResult, error_code: u32, error_message: String) {
    let error_bytes = error_message.into_bytes().into_boxed_slice();
    result.valid = 0;
    result.error_code = error_code;
    result.error_len = error_bytes.len();
    result.error_message = Box::into_raw(error_bytes) as *mut u8;
}

fn set_panic_result(result: &mut SafeHtmlResult, context: &str) {
    let error = ValidationError::InternalError(format!("panic during {context}"));
    set_error_result(result, error.code(), error.to_string());
}

fn required_ref<'a, T>(ptr: *const T, name: &str) -> Result<&'a T, ValidationError> {
    if ptr.is_null() {
        return Err(ValidationError::InvalidInput(format!(
            "{name} pointer is NULL"
        )));
    }

    // SAFETY: Caller provided a non-NULL pointer and accepts the FFI contract
    // that this points to a valid, properly aligned value.
    Ok(unsafe { &*ptr })
}

fn optional_bytes<'a>(
    ptr: *const u8,
    len: usize,
    name: &str,
) -> Result<Option<&'a [u8]>, ValidationError> {
    if ptr.is_null() {
        if len == 0 {
            return Ok(None);
        }
        return Err(ValidationError::InvalidInput(format!(
            "{name}_len > 0 with NULL {name} pointer"
        )));
    }

    if len == 0 {
        return Ok(Some(&[][..]));
    }

    // SAFETY: Pointer was validated as non-NULL above; caller guarantees `len`
    // bytes are valid and readable for the duration of this call.
    Ok(Some(unsafe { slice::from_raw_parts(ptr, len) }))
}

fn optional_utf8<'a>(
    ptr: *const u8,
    len: usize,
    name: &str,
) -> Result<Option<&'a str>, ValidationError> {
    match optional_bytes(ptr, len, name)? {
        None => Ok(None),
        Some([]) => Ok(None),
        Some(bytes) => std::str::from_utf8(bytes).map(Some).map_err(|e| {
            ValidationError::InvalidInput(format!("{name} is not valid UTF-8: {e}"))
        }),
    }
}

fn create_inner(config_json: Option<&str>) -> Result<SafeHtmlValidatorHandle, ValidationError> {
    let config = match config_json {
        Some(json) => SafeHtmlConfig::from_json(json)?,
        None => SafeHtmlConfig::default(),
    };
    Ok(SafeHtmlValidatorHandle {
        validator: SafeHtmlValidator::new(&config),
    })
}

fn free_buffer(ptr_field: &mut *mut u8, len_field: &mut usize) {
    if (*ptr_field).is_null() {
        return;
    }

    let raw = ptr::slice_from_raw_parts_mut(*ptr_field, *len_field);
    // SAFETY: `raw` was allocated by `Box<[u8]>` via `Box::into_raw`.
    let _ = unsafe { Box::from_raw(raw) };
    *ptr_field = ptr::null_mut();
    *len_field = 0;
}

// ============================================================================
// FFI Functions
// ============================================================================

/// Create a validator from a JSON configuration
///
/// # Parameters
///
/// - `config_json` / `config_json_len`: UTF-8 JSON configuration (see
///   [`SafeHtmlConfig`]); NULL/0 selects the default configuration
///   (`RELAXED` preset, no extensions)
/// - `result`: optional; when non-NULL it is reset and receives the error on
///   failure. It must be released with `safe_html_result_free()` afterwards.
///
/// # Returns
///
/// - Non-NULL handle on success
/// - NULL on invalid configuration, unknown preset or caught panic
///
/// # Example (C)
///
/// ```c
/// const char *config = "{\"preset\":\"BASIC\",\"additional_tags\":[\"mark\"]}";
/// safe_html_result_t result;
/// safe_html_validator_t *validator =
///     safe_html_validator_new((const uint8_t *)config, strlen(config), &result);
/// if (validator == NULL) {
///     log_error(result.error_code, result.error_message, result.error_len);
/// }
/// safe_html_result_free(&result);
/// ```
///
/// # Safety
///
/// - `config_json` must point to `config_json_len` readable bytes when non-NULL
/// - `result` must be NULL or point to a writable `SafeHtmlResult`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safe_html_validator_new(
    config_json: *const u8,
    config_json_len: usize,
    result: *mut SafeHtmlResult,
) -> *mut SafeHtmlValidatorHandle {
    // SAFETY: `result` is either NULL or a valid writable pointer per contract.
    let mut result_ref = unsafe { result.as_mut() };
    if let Some(result_ref) = result_ref.as_deref_mut() {
        reset_result(result_ref);
    }

    let outcome = panic::catch_unwind(|| {
        let json = optional_utf8(config_json, config_json_len, "config_json")?;
        create_inner(json)
    });

    match outcome {
        Ok(Ok(handle)) => Box::into_raw(Box::new(handle)),
        Ok(Err(e)) => {
            if let Some(result_ref) = result_ref {
                set_error_result(result_ref, e.code(), e.to_string());
            }
            ptr::null_mut()
        }
        Err(_) => {
            if let Some(result_ref) = result_ref {
                set_panic_result(result_ref, "creating validator");
            }
            ptr::null_mut()
        }
    }
}

/// Validate one value against the handle's safelist
///
/// # Parameters
///
/// - `handle`: validator from `safe_html_validator_new()`; must be non-NULL
/// - `value` / `value_len`: the value's bytes. NULL/0 is an absent value
///   (valid); non-NULL/0 is an empty value (valid)
/// - `content_type` / `content_type_len`: optional Content-Type whose charset
///   parameter selects the decoding; NULL/0 means UTF-8
/// - `result`: must be non-NULL; previous contents are overwritten
///
/// # Behavior
///
/// **On Success:** `error_code` is 0 and `valid` holds the verdict.
///
/// **On Error:** `error_code` is one of `ERROR_INVALID_INPUT`,
/// `ERROR_ENCODING` or `ERROR_INTERNAL`, `valid` is 0, and `error_message`
/// describes the problem.
///
/// # Example (C)
///
/// ```c
/// safe_html_result_t result;
/// safe_html_validate(validator, value, value_len, NULL, 0, &result);
/// if (result.error_code == 0 && result.valid) {
///     accept(value, value_len);
/// }
/// safe_html_result_free(&result);
/// ```
///
/// # Safety
///
/// - Non-NULL pointers must reference readable memory of the stated length
/// - `handle` must not have been freed
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safe_html_validate(
    handle: *const SafeHtmlValidatorHandle,
    value: *const u8,
    value_len: usize,
    content_type: *const u8,
    content_type_len: usize,
    result: *mut SafeHtmlResult,
) {
    if result.is_null() {
        // Cannot report error if result pointer is NULL.
        return;
    }

    // SAFETY: `result` was validated as non-NULL above.
    let result_ref = unsafe { &mut *result };
    reset_result(result_ref);

    let outcome = panic::catch_unwind(|| -> Result<bool, ValidationError> {
        let handle_ref = required_ref(handle, "Validator handle")?;
        let value = optional_bytes(value, value_len, "value")?;
        let content_type = optional_utf8(content_type, content_type_len, "content_type")?;
        handle_ref.validator.is_valid_bytes(value, content_type)
    });

    match outcome {
        Ok(Ok(valid)) => result_ref.valid = u8::from(valid),
        Ok(Err(e)) => set_error_result(result_ref, e.code(), e.to_string()),
        Err(_) => set_panic_result(result_ref, "validation"),
    }
}

/// Free memory held by a result
///
/// Safe to call more than once; after the first call the message pointer is
/// NULL and later calls are no-ops. NULL `result` is ignored.
///
/// # Safety
///
/// `result` must be NULL or point to a result populated by this library.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safe_html_result_free(result: *mut SafeHtmlResult) {
    if result.is_null() {
        return;
    }

    // SAFETY: `result` was validated as non-NULL above.
    let result_ref = unsafe { &mut *result };
    // NOTE: error_message is NOT a NUL-terminated C string, so it is not
    // released through CString::from_raw().
    free_buffer(&mut result_ref.error_message, &mut result_ref.error_len);
    result_ref.valid = 0;
    result_ref.error_code = ERROR_SUCCESS;
}

/// Destroy a validator handle
///
/// NULL is ignored.
///
/// # Safety
///
/// `handle` must be NULL or come from `safe_html_validator_new()`, must not
/// have been freed before, and must not be in use by another thread.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safe_html_validator_free(handle: *mut SafeHtmlValidatorHandle) {
    if handle.is_null() {
        return;
    }

    // SAFETY: `handle` was validated as non-NULL above and was originally
    // created by `Box::into_raw` in `safe_html_validator_new`.
    unsafe { drop(Box::from_raw(handle)) };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(result: &SafeHtmlResult) -> String {
        // SAFETY: test-only view of a Rust-allocated message buffer.
        let bytes = unsafe { slice::from_raw_parts(result.error_message, result.error_len) };
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn test_optional_bytes_contract() {
        assert_eq!(optional_bytes(ptr::null(), 0, "value"), Ok(None));
        assert!(matches!(
            optional_bytes(ptr::null(), 3, "value"),
            Err(ValidationError::InvalidInput(_))
        ));
        let data = b"abc";
        assert_eq!(optional_bytes(data.as_ptr(), 0, "value"), Ok(Some(&[][..])));
        assert_eq!(
            optional_bytes(data.as_ptr(), 3, "value"),
            Ok(Some(&b"abc"[..]))
        );
    }

    #[test]
    fn test_create_with_unknown_preset_reports_error() {
        let config = br#"{ "preset": "EVERYTHING" }"#;
        let mut result = SafeHtmlResult::default();
        let handle = unsafe { safe_html_validator_new(config.as_ptr(), config.len(), &mut result) };
        assert!(handle.is_null());
        assert_eq!(result.error_code, ERROR_UNKNOWN_PRESET);
        assert!(message(&result).contains("EVERYTHING"));
        unsafe { safe_html_result_free(&mut result) };
        assert!(result.error_message.is_null());
        assert_eq!(result.error_len, 0);
    }

    #[test]
    fn test_panic_result_uses_internal_error() {
        let mut result = SafeHtmlResult::default();
        set_panic_result(&mut result, "validation");
        assert_eq!(result.error_code, ERROR_INTERNAL);
        assert_eq!(result.valid, 0);
        assert!(message(&result).contains("panic during validation"));
        unsafe { safe_html_result_free(&mut result) };
    }

    #[test]
    fn test_validate_without_result_is_a_no_op() {
        unsafe { safe_html_validate(ptr::null(), ptr::null(), 0, ptr::null(), 0, ptr::null_mut()) };
    }

    #[test]
    fn test_validate_with_null_handle() {
        let mut result = SafeHtmlResult::default();
        unsafe { safe_html_validate(ptr::null(), ptr::null(), 0, ptr::null(), 0, &mut result) };
        assert_eq!(result.error_code, ERROR_INVALID_INPUT);
        assert_eq!(result.valid, 0);
        unsafe { safe_html_result_free(&mut result) };
    }
}
